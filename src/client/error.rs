//! Client error types.

use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors raised while talking to the tool server.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection, timeout or body decoding failure.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The configured server URL cannot carry request paths.
    #[error("Invalid server URL {0}")]
    InvalidUrl(String),

    /// The server answered with a non-success status.
    #[error("Server returned {status}: {detail}")]
    Status { status: u16, detail: String },
}

impl ClientError {
    /// Whether the server reported that the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error() {
        let err = ClientError::Status {
            status: 404,
            detail: "Tool 'x' not found".into(),
        };
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Server returned 404: Tool 'x' not found");
    }
}
