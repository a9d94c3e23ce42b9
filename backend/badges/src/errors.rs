//! Application-wide error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BadgeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Render error: {0}")]
    Render(String),
}

impl BadgeError {
    /// `true` when the upstream request was abandoned by the client timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_timeout())
    }
}

pub type Result<T> = std::result::Result<T, BadgeError>;
