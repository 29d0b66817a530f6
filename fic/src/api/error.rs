use thiserror::Error;

use super::common::ApiErrorDetails;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error (HTTP {status}): {message}")]
    ApiError {
        status: u16,
        message: String,
        #[source]
        details: Option<Box<ApiErrorDetails>>,
    },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("Too many requests, rate limited")]
    RateLimited,

    #[error("Service unavailable, retry later")]
    ServiceUnavailable,

    #[error("Invalid client configuration: {0}")]
    Config(String),
}

/// How callers should react to a failed request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NotFound,
    Conflict,
    Fatal,
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::ApiError { status, .. } => Some(*status),
            ApiError::RequestError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn classify(&self) -> FailureKind {
        match self.status() {
            Some(404) => FailureKind::NotFound,
            Some(409) => FailureKind::Conflict,
            _ => FailureKind::Fatal,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.classify() == FailureKind::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(status: u16) -> ApiError {
        ApiError::ApiError {
            status,
            message: String::new(),
            details: None,
        }
    }

    #[test]
    fn classify_maps_status_codes() {
        assert_eq!(api_error(404).classify(), FailureKind::NotFound);
        assert_eq!(api_error(409).classify(), FailureKind::Conflict);
        assert_eq!(api_error(400).classify(), FailureKind::Fatal);
        assert_eq!(api_error(500).classify(), FailureKind::Fatal);
    }

    #[test]
    fn transport_level_errors_are_fatal() {
        assert_eq!(ApiError::ServiceUnavailable.classify(), FailureKind::Fatal);
        assert_eq!(ApiError::Timeout(30).classify(), FailureKind::Fatal);
        assert_eq!(
            ApiError::AuthError("bad token".into()).classify(),
            FailureKind::Fatal
        );
    }

    #[test]
    fn error_message_includes_status() {
        let msg = api_error(409).to_string();
        assert!(msg.contains("409"));
    }
}
