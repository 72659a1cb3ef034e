//! Gemini client error types.

use thiserror::Error;

pub type GenAiResult<T> = Result<T, GenAiError>;

#[derive(Debug, Error)]
pub enum GenAiError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Gemini API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No image data in response")]
    NoImageData,

    #[error("Request blocked: {0}")]
    Blocked(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GenAiError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Whether a caller could reasonably try the same request again.
    ///
    /// The studio flows never retry on their own; this only informs the
    /// status code shown to the user.
    pub fn is_retryable(&self) -> bool {
        match self {
            GenAiError::Network(_) => true,
            GenAiError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(GenAiError::Api { status: 503, body: String::new() }.is_retryable());
        assert!(GenAiError::Api { status: 429, body: String::new() }.is_retryable());
        assert!(!GenAiError::Api { status: 400, body: String::new() }.is_retryable());
        assert!(!GenAiError::NoImageData.is_retryable());
    }
}
