//! Error types for the ebooks bot
//!
//! Every variant that reaches `main` is fatal. Recoverable conditions
//! (a failed follow-back, an unknown stream event) are logged at the call
//! site and never surface as a `BotError`.

use std::path::PathBuf;

/// Errors raised by the bot
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{endpoint} returned {status}: {body}")]
    Api {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Streaming connection failed: {0}")]
    Stream(String),

    #[error("Malformed stream event: {0}")]
    MalformedEvent(String),

    #[error("Event stream closed")]
    StreamClosed,

    #[error("Failed to load credentials from {path}: {reason}")]
    Credentials { path: PathBuf, reason: String },

    #[error("Failed to persist corpus to {path}: {reason}")]
    Persist { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BotError>;
