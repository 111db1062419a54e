//! Error type for the capture side.

/// Errors raised while capturing, storing or showing descriptor payloads.
#[derive(thiserror::Error, Debug)]
pub enum CaptureError {
    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Corrupt stored record {key}: {message}")]
    CorruptRecord { key: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Extraction error: {0}")]
    Extract(#[from] camquiz::QuizError),

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CaptureError {
    pub fn transport(url: &str, message: impl Into<String>) -> Self {
        CaptureError::Transport {
            url: url.to_string(),
            message: message.into(),
        }
    }
}

/// Convenience result type.
pub type CaptureResult<T> = Result<T, CaptureError>;
