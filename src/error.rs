use std::fmt;

use thiserror::Error;

/// Result type for building and transporting requests
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building a request or talking to the transport
///
/// These never reach dispatch callbacks directly; the dispatcher folds them
/// into a [`RestClientError`].
#[derive(Error, Debug)]
pub enum Error {
    /// Network-related errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// URL parsing errors
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The request body could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Timeout errors
    #[error("Request timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Invalid request configuration
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new timeout error
    pub fn timeout(duration: std::time::Duration) -> Self {
        Error::Timeout { duration }
    }

    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Error::Serialization(message.into())
    }

    /// Create a new invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Error::InvalidRequest(message.into())
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Timeout { .. } => true,
            Error::Network(e) => e.is_timeout(),
            _ => false,
        }
    }
}

impl From<http::header::InvalidHeaderName> for Error {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Error::InvalidRequest(format!("Invalid header name: {}", err))
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Error::InvalidRequest(format!("Invalid header value: {}", err))
    }
}

/// Classification of a failed dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A response arrived with a status other than 200
    HttpError,
    /// The body could not be decoded, or was missing
    JsonParsingError,
    /// The transport produced no response at all
    RequestTimedOut,
    /// Reserved for failures outside the other categories
    OtherError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::HttpError => "HTTP error",
            ErrorKind::JsonParsingError => "JSON parsing error",
            ErrorKind::RequestTimedOut => "request timed out",
            ErrorKind::OtherError => "other error",
        };
        f.write_str(name)
    }
}

/// The error handed to failure callbacks
///
/// `http_status_code` is `0` when no response was received.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} ({http_status_code}): {message}")]
pub struct RestClientError {
    kind: ErrorKind,
    http_status_code: u16,
    message: String,
}

impl RestClientError {
    /// Create a new error of the given kind
    pub fn new(kind: ErrorKind, http_status_code: u16, message: impl Into<String>) -> Self {
        Self {
            kind,
            http_status_code,
            message: message.into(),
        }
    }

    /// Non-200 response
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::HttpError, status, message)
    }

    /// Body decode failure or missing body
    pub fn json_parsing(status: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::JsonParsingError, status, message)
    }

    /// No response from the transport
    pub fn timed_out(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RequestTimedOut, 0, message)
    }

    /// Anything else
    pub fn other(status: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::OtherError, status, message)
    }

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Get the HTTP status code, `0` when there was no response
    pub fn status(&self) -> u16 {
        self.http_status_code
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<Error> for RestClientError {
    fn from(err: Error) -> Self {
        match err {
            Error::Network(_) | Error::Timeout { .. } => RestClientError::timed_out(err.to_string()),
            other => RestClientError::other(0, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_display() {
        let err = RestClientError::http(404, "not here");
        assert_eq!(err.to_string(), "HTTP error (404): not here");
        assert_eq!(err.kind(), ErrorKind::HttpError);
        assert_eq!(err.status(), 404);
        assert_eq!(err.message(), "not here");
    }

    #[test]
    fn test_timed_out_has_zero_status() {
        let err = RestClientError::timed_out("connection refused");
        assert_eq!(err.kind(), ErrorKind::RequestTimedOut);
        assert_eq!(err.status(), 0);
    }

    #[test]
    fn test_from_transport_timeout() {
        let err: RestClientError = Error::timeout(Duration::from_secs(3)).into();
        assert_eq!(err.kind(), ErrorKind::RequestTimedOut);
        assert_eq!(err.status(), 0);
        assert!(err.message().contains("3s"));
    }

    #[test]
    fn test_from_build_error_is_other() {
        let err: RestClientError = Error::serialization("bad map key").into();
        assert_eq!(err.kind(), ErrorKind::OtherError);
        assert!(Error::timeout(Duration::from_secs(1)).is_timeout());
        assert!(!Error::config("x").is_timeout());
    }
}
