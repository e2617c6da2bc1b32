use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use uuid::Uuid;

use crate::auth::JwtKeys;
use crate::batch::{BatchHandle, Orchestrator};
use crate::config::AppConfig;
use crate::history::{start_history_worker, HistorySender, HttpReportHistory, InMemoryReportHistory, ReportHistory};
use crate::layout::FontSet;
use crate::word_renderer::{DisabledWordRenderer, HttpWordRenderer, WordRenderer};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub jwt: JwtKeys,
    pub orchestrator: Orchestrator,
    pub batches: Cache<Uuid, Arc<BatchHandle>>,
}

impl AppState {
    /// Build the HTTP client, load the font family once and wire the collaborators.
    pub async fn new(config: AppConfig) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(900))
            .user_agent("isg-docs-server/1.0")
            .build()?;

        let fonts = FontSet::load(&config.fonts, &http_client).await;

        let word: Arc<dyn WordRenderer> = match &config.word_renderer_url {
            Some(url) => Arc::new(HttpWordRenderer::new(http_client.clone(), url, config.http_timeout)),
            None => {
                log::warn!("WORD_RENDERER_URL not set, Word output is disabled");
                Arc::new(DisabledWordRenderer)
            }
        };

        let history: Arc<dyn ReportHistory> = match &config.report_history_url {
            Some(url) => Arc::new(HttpReportHistory::new(http_client.clone(), url)),
            None => {
                log::warn!("REPORT_HISTORY_URL not set, report snapshots are kept in memory");
                Arc::new(InMemoryReportHistory::new())
            }
        };

        Ok(Self::with_parts(config, fonts, word, history))
    }

    /// Assemble a state from ready collaborators and start the history worker.
    pub fn with_parts(
        config: AppConfig,
        fonts: FontSet,
        word: Arc<dyn WordRenderer>,
        history: Arc<dyn ReportHistory>,
    ) -> Self {
        // Create channel for the report history worker
        let (history_sender, receiver) = HistorySender::channel();
        tokio::spawn(start_history_worker(receiver, history));

        let orchestrator = Orchestrator::new(Arc::new(fonts), word, history_sender, config.progress_reset_delay);

        // expiry only; a size bound could evict a batch that is still running
        let batches = Cache::builder().time_to_live(config.batch_ttl).build();

        Self {
            jwt: JwtKeys::from_secret(&config.jwt_secret),
            config: Arc::new(config),
            orchestrator,
            batches,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_batches_expire_by_ttl_only() {
        let config = AppConfig {
            jwt_secret: "state-test-secret".to_string(),
            batch_ttl: Duration::from_secs(42),
            ..AppConfig::default()
        };
        let state = AppState::with_parts(
            config,
            FontSet::builtin(),
            Arc::new(DisabledWordRenderer),
            Arc::new(InMemoryReportHistory::new()),
        );

        let policy = state.batches.policy();
        assert_eq!(policy.max_capacity(), None);
        assert_eq!(policy.time_to_live(), Some(Duration::from_secs(42)));
    }
}
