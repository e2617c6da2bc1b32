use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::layout::FontSource;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{key} must be set")]
    Missing { key: &'static str },
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub port: u16,
    pub fonts: FontSource,
    pub word_renderer_url: Option<String>,
    pub report_history_url: Option<String>,
    pub jwt_secret: String,
    pub progress_reset_delay: Duration,
    pub batch_ttl: Duration,
    pub http_timeout: Duration,
    pub allowed_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 8080,
            fonts: FontSource::Builtin,
            word_renderer_url: None,
            report_history_url: None,
            jwt_secret: String::new(),
            progress_reset_delay: Duration::from_millis(1500),
            batch_ttl: Duration::from_secs(600),
            http_timeout: Duration::from_secs(60),
            allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:8080".to_string(),
            ],
        }
    }
}

impl AppConfig {
    /// Read the process environment (after `.env` has been loaded).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(addr) = var("BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(port) = var("PORT") {
            config.port = parse("PORT", &port)?;
        }

        if let Some(dir) = var("FONT_DIR") {
            config.fonts = FontSource::Directory(PathBuf::from(dir));
        } else if let Some(url) = var("FONT_URL") {
            config.fonts = FontSource::Url(url);
        }

        config.word_renderer_url = var("WORD_RENDERER_URL");
        config.report_history_url = var("REPORT_HISTORY_URL");

        config.jwt_secret = var("JWT_SECRET").ok_or(ConfigError::Missing { key: "JWT_SECRET" })?;

        if let Some(ms) = var("PROGRESS_RESET_DELAY_MS") {
            config.progress_reset_delay = Duration::from_millis(parse("PROGRESS_RESET_DELAY_MS", &ms)?);
        }
        if let Some(secs) = var("BATCH_TTL_SECS") {
            config.batch_ttl = Duration::from_secs(parse("BATCH_TTL_SECS", &secs)?);
        }
        if let Some(secs) = var("HTTP_TIMEOUT_SECS") {
            config.http_timeout = Duration::from_secs(parse("HTTP_TIMEOUT_SECS", &secs)?);
        }

        if let Some(origins) = var("ALLOWED_ORIGINS") {
            config.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }

        Ok(config)
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.bind_addr.clone(), self.port)
    }
}

fn parse<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        message: format!("'{}': {}", value, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[("JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(config.bind_address(), ("0.0.0.0".to_string(), 8080));
        assert!(matches!(config.fonts, FontSource::Builtin));
        assert!(config.word_renderer_url.is_none());
        assert_eq!(config.progress_reset_delay, Duration::from_millis(1500));
        assert_eq!(config.batch_ttl, Duration::from_secs(600));
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("PORT", "9090"),
            ("FONT_URL", "https://cdn.example.com/fonts"),
            ("WORD_RENDERER_URL", "http://word:3000"),
            ("JWT_SECRET", "s3cret"),
            ("PROGRESS_RESET_DELAY_MS", "250"),
            ("REPORT_HISTORY_URL", "  "),
            ("ALLOWED_ORIGINS", "https://panel.example.com, http://localhost:5173"),
        ])
        .unwrap();
        assert_eq!(config.port, 9090);
        assert!(matches!(config.fonts, FontSource::Url(ref u) if u == "https://cdn.example.com/fonts"));
        assert_eq!(config.word_renderer_url.as_deref(), Some("http://word:3000"));
        assert!(config.report_history_url.is_none());
        assert_eq!(config.jwt_secret, "s3cret");
        assert_eq!(config.progress_reset_delay, Duration::from_millis(250));
        assert_eq!(config.allowed_origins, vec!["https://panel.example.com", "http://localhost:5173"]);
    }

    #[test]
    fn test_font_dir_wins_over_url() {
        let config = config(&[("FONT_DIR", "/fonts"), ("FONT_URL", "http://x"), ("JWT_SECRET", "s3cret")]).unwrap();
        assert!(matches!(config.fonts, FontSource::Directory(_)));
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let err = config(&[("BATCH_TTL_SECS", "ten"), ("JWT_SECRET", "s3cret")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "BATCH_TTL_SECS", .. }));
    }

    #[test]
    fn test_missing_jwt_secret_is_rejected() {
        assert_eq!(config(&[]).unwrap_err(), ConfigError::Missing { key: "JWT_SECRET" });
        assert_eq!(
            config(&[("JWT_SECRET", "   ")]).unwrap_err(),
            ConfigError::Missing { key: "JWT_SECRET" }
        );
    }
}
