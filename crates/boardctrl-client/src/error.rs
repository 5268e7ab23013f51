//! Error types for the signage backend client

use reqwest::StatusCode;
use std::io;
use thiserror::Error;

/// Result type alias for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur while talking to the signage backend
#[derive(Error, Debug)]
pub enum ClientError {
    /// No credential is stored; the user has to log in first
    #[error("Not authenticated: no stored credential")]
    NotAuthenticated,

    /// The backend rejected the stored credential (expired or invalid)
    #[error("Credential rejected by the backend")]
    Unauthorized,

    /// Login was refused for the given user name and password
    #[error("Invalid user name or password")]
    InvalidCredentials,

    /// The backend answered with an unexpected status
    #[error("Backend returned {status}: {body}")]
    Status {
        /// HTTP status
        status: StatusCode,
        /// Response body, possibly empty
        body: String,
    },

    /// Transport or decoding failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Credential file could not be read or written
    #[error("Credential store error: {0}")]
    Io(#[from] io::Error),

    /// Credential file could not be parsed
    #[error("Credential store is corrupt: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// Whether the error means the user has to sign in again
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::NotAuthenticated | Self::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_classification() {
        assert!(ClientError::NotAuthenticated.is_auth());
        assert!(ClientError::Unauthorized.is_auth());
        assert!(!ClientError::InvalidCredentials.is_auth());
        assert!(
            !ClientError::Status {
                status: StatusCode::NOT_FOUND,
                body: String::new(),
            }
            .is_auth()
        );
    }

    #[test]
    fn test_status_display() {
        let error = ClientError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "boom".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Backend returned 500 Internal Server Error: boom"
        );
    }
}
