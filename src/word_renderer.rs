//! Client for the out-of-process Word (.docx) renderer.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::documents::DocumentKind;

/// Characters of a failed response body kept in the error.
const ERROR_BODY_LIMIT: usize = 200;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Word renderer is not configured")]
    NotConfigured,
    #[error("Word renderer request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Word renderer returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Word renderer returned an empty document")]
    Empty,
}

#[async_trait]
pub trait WordRenderer: Send + Sync {
    /// Render the kind's record and return the `.docx` bytes.
    async fn render(&self, kind: DocumentKind, data: &Value) -> Result<Vec<u8>, TransportError>;
}

/// `POST {base_url}/render/{kind}` with the JSON record as body.
pub struct HttpWordRenderer {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpWordRenderer {
    pub fn new(client: reqwest::Client, base_url: &str, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl WordRenderer for HttpWordRenderer {
    async fn render(&self, kind: DocumentKind, data: &Value) -> Result<Vec<u8>, TransportError> {
        let url = format!("{}/render/{}", self.base_url, kind.slug());
        log::debug!("Requesting Word document from {}", url);

        let response = self.client.post(&url).timeout(self.timeout).json(data).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: error_excerpt(&body),
            });
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(TransportError::Empty);
        }
        Ok(bytes.to_vec())
    }
}

fn error_excerpt(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(ERROR_BODY_LIMIT) {
        Some((cut, _)) => format!("{}…", &body[..cut]),
        None => body.to_string(),
    }
}

/// Stand-in when no renderer URL is configured; every Word job fails on its own.
pub struct DisabledWordRenderer;

#[async_trait]
impl WordRenderer for DisabledWordRenderer {
    async fn render(&self, _kind: DocumentKind, _data: &Value) -> Result<Vec<u8>, TransportError> {
        Err(TransportError::NotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_renderer_fails_every_job() {
        let err = DisabledWordRenderer
            .render(DocumentKind::WorkPermit, &Value::Null)
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::NotConfigured));
    }

    #[tokio::test]
    async fn test_unreachable_renderer_is_transport_error() {
        let renderer = HttpWordRenderer::new(reqwest::Client::new(), "http://127.0.0.1:9/", Duration::from_secs(2));
        let err = renderer
            .render(DocumentKind::EmergencyPlan, &Value::Null)
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Request(_)));
    }

    #[test]
    fn test_error_body_is_cut_short() {
        let page = format!("<html><body>{}</body></html>", "Sunucu hatası ".repeat(50));
        let excerpt = error_excerpt(&page);
        assert_eq!(excerpt.chars().count(), ERROR_BODY_LIMIT + 1);
        assert!(excerpt.starts_with("<html><body>Sunucu hatası"));
        assert!(excerpt.ends_with('…'));

        assert_eq!(error_excerpt("  bad gateway \n"), "bad gateway");
    }
}
