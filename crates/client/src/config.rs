use std::time::Duration;

use mecca_core::error::CoreError;

/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for a backend running locally.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL without trailing slash (default: `http://localhost:5001`).
    pub base_url: String,
    /// Interval between status polls (default: 1 second).
    pub poll_interval: Duration,
    /// Timeout for ordinary API calls (default: 30 seconds).
    pub request_timeout: Duration,
    /// Timeout for the regenerate call, which re-renders the whole video
    /// (default: 10 minutes).
    pub regenerate_timeout: Duration,
    /// Timeout for thumbnail generation and regeneration (default: 2 minutes).
    pub thumbnail_timeout: Duration,
}

pub const DEFAULT_BASE_URL: &str = "http://localhost:5001";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_REGENERATE_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_THUMBNAIL_TIMEOUT_SECS: u64 = 120;

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            regenerate_timeout: Duration::from_secs(DEFAULT_REGENERATE_TIMEOUT_SECS),
            thumbnail_timeout: Duration::from_secs(DEFAULT_THUMBNAIL_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                         | Default                 |
    /// |---------------------------------|-------------------------|
    /// | `MECCA_BASE_URL`                | `http://localhost:5001` |
    /// | `MECCA_POLL_INTERVAL_MS`        | `1000`                  |
    /// | `MECCA_REQUEST_TIMEOUT_SECS`    | `30`                    |
    /// | `MECCA_REGENERATE_TIMEOUT_SECS` | `600`                   |
    /// | `MECCA_THUMBNAIL_TIMEOUT_SECS`  | `120`                   |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("MECCA_BASE_URL")
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let poll_ms = parse_u64(&lookup, "MECCA_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS)?;
        if poll_ms == 0 {
            return Err(CoreError::Validation(
                "MECCA_POLL_INTERVAL_MS must be greater than 0".to_string(),
            ));
        }

        let request_timeout_secs = parse_u64(
            &lookup,
            "MECCA_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;
        let regenerate_timeout_secs = parse_u64(
            &lookup,
            "MECCA_REGENERATE_TIMEOUT_SECS",
            DEFAULT_REGENERATE_TIMEOUT_SECS,
        )?;
        let thumbnail_timeout_secs = parse_u64(
            &lookup,
            "MECCA_THUMBNAIL_TIMEOUT_SECS",
            DEFAULT_THUMBNAIL_TIMEOUT_SECS,
        )?;

        Ok(Self {
            base_url,
            poll_interval: Duration::from_millis(poll_ms),
            request_timeout: Duration::from_secs(request_timeout_secs),
            regenerate_timeout: Duration::from_secs(regenerate_timeout_secs),
            thumbnail_timeout: Duration::from_secs(thumbnail_timeout_secs),
        })
    }

    /// Override the base URL, normalising a trailing slash away.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

fn parse_u64<F>(lookup: &F, key: &str, default: u64) -> Result<u64, CoreError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            CoreError::Validation(format!("{key} must be a valid u64 (got '{raw}')"))
        }),
    }
}
