//! Error types for tedlt-cli

use std::path::PathBuf;

use tedlt_core::ErrorKind;

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from the resolution engine
    #[error(transparent)]
    Core(#[from] tedlt_core::Error),

    /// A configuration document failed to parse or is invalid
    #[error("{}: {source}", .path.display())]
    Document {
        path: PathBuf,
        source: tedlt_core::Error,
    },

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON output could not be rendered
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }

    /// Engine error classification, when the failure came from the engine
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            CliError::Core(e) | CliError::Document { source: e, .. } => Some(e.kind()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_error_names_the_file() {
        let error = CliError::Document {
            path: PathBuf::from("conf/tedlt.toml"),
            source: tedlt_core::Error::invalid_document("profile names must not be empty"),
        };
        assert_eq!(
            error.to_string(),
            "conf/tedlt.toml: Invalid configuration: profile names must not be empty"
        );
        assert_eq!(error.kind(), Some(ErrorKind::InvalidDocument));
    }

    #[test]
    fn user_errors_have_no_kind() {
        assert_eq!(CliError::user("nothing to do").kind(), None);
    }
}
