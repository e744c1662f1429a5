//! Errors surfaced to the user by the fetch pipeline.
//!
//! Fetchers work with `anyhow::Result` internally; the provider maps failures into
//! [`FetchError`] when it hands results back to the UI thread. Reasons are rendered
//! to strings up front so deltas stay `Clone`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// No session identity exists, so no request was sent.
    #[error("no session identity; request not sent")]
    IdentityMissing,

    #[error("failed to load league names: {0}")]
    CatalogUnavailable(String),

    #[error("failed to load league {league}: {reason}")]
    RosterUnavailable { league: String, reason: String },

    #[error("failed to get data for user: {0}")]
    RegistrationFailed(String),

    #[error("last run info unavailable: {0}")]
    LastRunUnavailable(String),
}

impl FetchError {
    pub fn catalog(err: &anyhow::Error) -> Self {
        Self::CatalogUnavailable(format!("{err:#}"))
    }

    pub fn roster(league: &str, err: &anyhow::Error) -> Self {
        Self::RosterUnavailable {
            league: league.to_string(),
            reason: format!("{err:#}"),
        }
    }

    pub fn registration(err: &anyhow::Error) -> Self {
        Self::RegistrationFailed(format!("{err:#}"))
    }

    pub fn last_run(err: &anyhow::Error) -> Self {
        Self::LastRunUnavailable(format!("{err:#}"))
    }
}
