use std::env;
use std::time::Duration;

use serde::Serialize;

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const MIN_HTTP_TIMEOUT_SECS: u64 = 2;
const DEFAULT_DEMO_DELAY_MS: u64 = 600;

/// Fantasy platform the backend should pull the user's leagues from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Website {
    #[default]
    Sleeper,
    Fleaflicker,
}

impl Website {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sleeper" => Some(Self::Sleeper),
            "fleaflicker" => Some(Self::Fleaflicker),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Sleeper => "Sleeper",
            Self::Fleaflicker => "Fleaflicker",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Self::Sleeper => Self::Fleaflicker,
            Self::Fleaflicker => Self::Sleeper,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendMode {
    Http { base_url: String },
    Demo,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: BackendMode,
    pub http_timeout: Duration,
    pub website: Website,
    pub demo_delay: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendMode::Demo,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            website: Website::default(),
            demo_delay: Duration::from_millis(DEFAULT_DEMO_DELAY_MS),
        }
    }
}

impl AppConfig {
    /// Reads `FF_*` variables. Call after the `.env` files are loaded.
    pub fn from_env() -> Self {
        let base_url = env::var("FF_API_BASE")
            .ok()
            .map(|raw| raw.trim().trim_end_matches('/').to_string())
            .filter(|raw| !raw.is_empty());
        let backend = match base_url {
            Some(base_url) if !env_flag("FF_DEMO") => BackendMode::Http { base_url },
            _ => BackendMode::Demo,
        };
        let website = env::var("FF_WEBSITE")
            .ok()
            .and_then(|raw| Website::parse(&raw))
            .unwrap_or_default();

        Self {
            backend,
            http_timeout: Duration::from_secs(
                env_u64("FF_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)
                    .max(MIN_HTTP_TIMEOUT_SECS),
            ),
            website,
            demo_delay: Duration::from_millis(env_u64("FF_DEMO_DELAY_MS", DEFAULT_DEMO_DELAY_MS)),
        }
    }

    pub fn backend_label(&self) -> String {
        match &self.backend {
            BackendMode::Http { base_url } => base_url.clone(),
            BackendMode::Demo => "demo backend".to_string(),
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|val| val.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str) -> bool {
    matches!(
        env::var(key)
            .map(|val| val.trim().to_ascii_lowercase())
            .as_deref(),
        Ok("1" | "true" | "yes" | "on")
    )
}
