//! Error types for the rotation engine

use crate::display::DisplayError;
use boardctrl_client::ClientError;
use boardctrl_core::BoardId;
use std::{error::Error as StdError, fmt};

/// Result type alias for rotation operations
pub type Result<T> = std::result::Result<T, RotationError>;

/// Errors that end a presentation request or an engine operation
#[derive(Debug)]
pub enum RotationError {
    /// The backend rejected the stored credential, or none was stored
    AuthExpired,

    /// The slide listing failed for a reason other than authentication
    SlidesUnavailable {
        /// Board whose slides were requested
        board_id: BoardId,
        /// Underlying failure
        source: ClientError,
    },

    /// The display surface could not be opened
    SurfaceUnavailable {
        /// Underlying failure
        source: DisplayError,
    },

    /// Backend client error outside of a presentation
    Client(ClientError),

    /// Validation or configuration error from the core crate
    Core(boardctrl_core::Error),

    /// Configuration error
    Configuration {
        /// Error message
        message: String,
    },

    /// I/O error
    Io(std::io::Error),

    /// The rotation task ended abnormally
    Shutdown {
        /// Error message
        message: String,
    },
}

impl RotationError {
    /// Create a new configuration error
    #[must_use]
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a new shutdown error
    #[must_use]
    pub fn shutdown<S: Into<String>>(message: S) -> Self {
        Self::Shutdown {
            message: message.into(),
        }
    }
}

impl fmt::Display for RotationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuthExpired => write!(f, "Session expired, sign in again"),
            Self::SlidesUnavailable { board_id, source } => {
                write!(f, "Slides for board {board_id} not found: {source}")
            }
            Self::SurfaceUnavailable { source } => {
                write!(f, "Display surface unavailable: {source}")
            }
            Self::Client(err) => write!(f, "Backend error: {err}"),
            Self::Core(err) => write!(f, "{err}"),
            Self::Configuration { message } => write!(f, "Configuration error: {message}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::Shutdown { message } => write!(f, "Shutdown error: {message}"),
        }
    }
}

impl StdError for RotationError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::SlidesUnavailable { source, .. } | Self::Client(source) => Some(source),
            Self::SurfaceUnavailable { source } => Some(source),
            Self::Core(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

// From implementations for automatic conversions
impl From<ClientError> for RotationError {
    fn from(err: ClientError) -> Self {
        Self::Client(err)
    }
}

impl From<boardctrl_core::Error> for RotationError {
    fn from(err: boardctrl_core::Error) -> Self {
        Self::Core(err)
    }
}

impl From<std::io::Error> for RotationError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = RotationError::SlidesUnavailable {
            board_id: BoardId(3),
            source: ClientError::InvalidCredentials,
        };
        assert!(error.to_string().contains("board 3"));
        assert!(error.source().is_some());

        let error = RotationError::SurfaceUnavailable {
            source: DisplayError::blocked("popup blocked"),
        };
        assert!(error.to_string().contains("popup blocked"));

        assert_eq!(
            RotationError::AuthExpired.to_string(),
            "Session expired, sign in again"
        );
    }

    #[test]
    fn test_conversions() {
        let error = RotationError::from(boardctrl_core::Error::validation("url", "bad"));
        assert!(matches!(error, RotationError::Core(_)));

        let error = RotationError::from(ClientError::NotAuthenticated);
        assert!(matches!(error, RotationError::Client(_)));

        let error = RotationError::configuration("bad sink");
        let debug = format!("{error:?}");
        assert!(debug.contains("Configuration"));
    }
}
