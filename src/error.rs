//! Error types for the watcher

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatcherError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to extract {what} from {url}")]
    Extract { what: &'static str, url: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("notification error: {0}")]
    Notify(String),

    #[error("email build error: {0}")]
    Email(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WatcherError>;
