//! Fetch results and their failure classification.

use thiserror::Error;

/// A completed HTTP exchange. Any status code, body already read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

/// Why a fetch produced no response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("failed to read response body: {0}")]
    Body(String),
    #[error("http client error: {0}")]
    Client(String),
}

impl FetchError {
    /// Timeouts are worth retrying; the others are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_body() || e.is_decode() {
            Self::Body(e.to_string())
        } else if e.is_builder() {
            Self::Client(e.to_string())
        } else {
            Self::Connection(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(FetchResponse::ok("").is_success());
        assert!(FetchResponse::new(404, "").is_not_found());
        assert!(FetchResponse::new(503, "").is_server_error());
        assert!(!FetchResponse::new(403, "").is_server_error());
        assert!(!FetchResponse::new(301, "").is_success());
    }

    #[test]
    fn test_only_timeout_is_retryable() {
        assert!(FetchError::Timeout.is_retryable());
        assert!(!FetchError::Connection("refused".into()).is_retryable());
        assert!(!FetchError::Body("eof".into()).is_retryable());
    }
}
