//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value;

use isg_docs_server::auth::Claims;
use isg_docs_server::documents::{Company, DangerClass, DocumentKind};
use isg_docs_server::history::{HistoryError, InMemoryReportHistory, ReportHistory, ReportSnapshot};
use isg_docs_server::layout::FontSet;
use isg_docs_server::word_renderer::{TransportError, WordRenderer};
use isg_docs_server::{AppConfig, AppState};

pub const JWT_SECRET: &str = "integration-test-secret";

pub fn company(id: &str, name: &str) -> Company {
    Company {
        id: id.to_string(),
        name: name.to_string(),
        address: Some("Organize Sanayi Bölgesi 3. Cadde No: 12".to_string()),
        registration_number: Some("1234567.890".to_string()),
        employer: Some("Ayşe Yılmaz".to_string()),
        danger_class: DangerClass::Tehlikeli,
    }
}

/// Word renderer stand-in; fails for companies whose name is listed.
pub struct MockWordRenderer {
    failing: Vec<String>,
    pub calls: AtomicUsize,
}

impl MockWordRenderer {
    pub fn new() -> Self {
        Self::failing_for(&[])
    }

    pub fn failing_for(names: &[&str]) -> Self {
        Self {
            failing: names.iter().map(|n| n.to_string()).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WordRenderer for MockWordRenderer {
    async fn render(&self, kind: DocumentKind, data: &Value) -> Result<Vec<u8>, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let name = data["company"]["name"].as_str().unwrap_or_default();
        if self.failing.iter().any(|f| f == name) {
            return Err(TransportError::Status {
                status: 502,
                body: "upstream unavailable".to_string(),
            });
        }
        Ok(format!("PK\u{3}\u{4} {} {}", kind.slug(), name).into_bytes())
    }
}

/// History store that rejects every snapshot.
pub struct FailingHistory {
    pub attempts: AtomicUsize,
}

impl FailingHistory {
    pub fn new() -> Self {
        Self {
            attempts: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ReportHistory for FailingHistory {
    async fn save(&self, _snapshot: &ReportSnapshot) -> Result<(), HistoryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(HistoryError::Status(500))
    }
}

pub fn access_token() -> String {
    token_of_type("access")
}

pub fn token_of_type(token_type: &str) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: "user-42".to_string(),
        username: "isg.uzmani".to_string(),
        exp: (now + 900) as usize,
        iat: now as usize,
        token_type: token_type.to_string(),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(JWT_SECRET.as_bytes()))
        .expect("Failed to encode token")
}

pub fn bearer() -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", access_token()))
}

pub fn test_config() -> AppConfig {
    AppConfig {
        jwt_secret: JWT_SECRET.to_string(),
        progress_reset_delay: Duration::from_millis(50),
        ..AppConfig::default()
    }
}

pub fn test_state(word: Arc<dyn WordRenderer>, history: Arc<InMemoryReportHistory>) -> AppState {
    AppState::with_parts(test_config(), FontSet::builtin(), word, history)
}

/// Poll until `check` holds or two seconds have passed.
pub async fn eventually<F: Fn() -> bool>(check: F) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
