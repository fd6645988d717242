use crate::migrations::MigrationError;
use thiserror::Error;
use sqlx::Error as SqlxError;
use reqwest::Error as ReqwestError;
use serde_json::Error as JsonError;
use std::io::Error as IoError;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Storage error: {0}")]
    Storage(#[from] SqlxError),

    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),

    #[error("Network error: {0}")]
    Network(#[from] ReqwestError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] JsonError),

    #[error("IO error: {0}")]
    Io(#[from] IoError),

    #[error("invalid secret")]
    Authentication,

    #[error("{0}")]
    InvalidInput(String),

    #[error("unsupported round")]
    UnsupportedRound,

    #[error("no repo found for this email+task; round1 likely not done")]
    NoPriorRound { email: String, task: String },

    #[error("Site generation failed: {0}")]
    Generation(String),

    #[error("Git command failed: {0}")]
    Git(String),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Callback responded with status {0}")]
    CallbackStatus(u16),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// Coarse classification used to pick the HTTP status for a failed submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad shared secret.
    Auth,
    /// The request itself is unacceptable; nothing downstream was touched.
    Validation,
    /// A collaborator (generator, publisher, store) failed mid-workflow.
    Downstream,
}

impl RelayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RelayError::Authentication => ErrorKind::Auth,
            RelayError::InvalidInput(_)
            | RelayError::UnsupportedRound
            | RelayError::NoPriorRound { .. } => ErrorKind::Validation,
            _ => ErrorKind::Downstream,
        }
    }
}

impl From<anyhow::Error> for RelayError {
    fn from(err: anyhow::Error) -> Self {
        RelayError::Unknown(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(RelayError::Authentication.kind(), ErrorKind::Auth);
        assert_eq!(RelayError::UnsupportedRound.kind(), ErrorKind::Validation);
        assert_eq!(
            RelayError::NoPriorRound { email: "a@b.c".into(), task: "t".into() }.kind(),
            ErrorKind::Validation
        );
        assert_eq!(RelayError::Git("boom".into()).kind(), ErrorKind::Downstream);
        assert_eq!(RelayError::CallbackStatus(500).kind(), ErrorKind::Downstream);
    }

    #[test]
    fn test_client_facing_messages() {
        assert_eq!(RelayError::Authentication.to_string(), "invalid secret");
        assert_eq!(RelayError::UnsupportedRound.to_string(), "unsupported round");
    }
}
