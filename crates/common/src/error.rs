//! Error types for TestDeck

use thiserror::Error;

/// Result type alias using TestDeck Error
pub type Result<T> = std::result::Result<T, Error>;

/// TestDeck error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Resource not found: {kind} with id {id}")]
    NotFound { kind: String, id: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Remote returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn not_found(kind: &str, id: impl Into<String>) -> Self {
        Error::NotFound {
            kind: kind.to_string(),
            id: id.into(),
        }
    }

    /// Whether the failure came from the network path rather than the request itself.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Transport(_) => true,
            Error::Remote { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(Error::Transport("connection reset".into()).is_transient());
        assert!(Error::Remote { status: 503, message: "busy".into() }.is_transient());
        assert!(!Error::Remote { status: 404, message: "gone".into() }.is_transient());
        assert!(!Error::InvalidInput("empty".into()).is_transient());
    }

    #[test]
    fn test_not_found_display() {
        let err = Error::not_found("suite", "s-1");
        assert_eq!(err.to_string(), "Resource not found: suite with id s-1");
    }
}
