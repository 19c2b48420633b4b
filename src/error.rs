//! Error types for the seafile_api crate.

use thiserror::Error;

/// Errors that can occur when talking to a Seafile server.
#[derive(Error, Debug)]
pub enum SeafileError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Operation not implemented: {0}")]
    NotImplemented(&'static str),

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to decode JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SeafileError {
    /// Turn a 404 from the server into [`SeafileError::NotFound`] carrying
    /// `message`; any other error is returned untouched.
    pub(crate) fn or_not_found(self, message: &str) -> Self {
        match self {
            SeafileError::ApiError { status: 404, .. } => {
                SeafileError::NotFound(message.to_string())
            }
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SeafileError::NotFound(_))
    }
}

/// Result type alias for SeafileError.
pub type Result<T> = std::result::Result<T, SeafileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_404_becomes_not_found() {
        let err = SeafileError::ApiError {
            status: 404,
            message: "Not Found".to_string(),
        }
        .or_not_found("The requested file does not exist");

        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "The requested file does not exist");
    }

    #[test]
    fn test_other_statuses_pass_through() {
        let err = SeafileError::ApiError {
            status: 500,
            message: "boom".to_string(),
        }
        .or_not_found("The requested dir does not exist");

        assert!(matches!(err, SeafileError::ApiError { status: 500, .. }));
    }
}
