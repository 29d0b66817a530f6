//! Waiting on asynchronous ERI operations
//!
//! Every mutating ERI call returns while the work is still `Processing`.
//! [`Poller`] re-reads the resource until it settles and
//! [`delete_with_retry`] keeps retrying deletes the API rejects with 409
//! because a sibling operation is still running.

pub mod poller;
pub mod retry;
pub mod status;

pub use poller::{Flow, Poller};
pub use retry::delete_with_retry;
pub use status::OperationStatus;

use crate::api::{ApiError, FailureKind};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

#[derive(Debug, Error)]
pub enum OperationError {
    #[error("{id} was not found")]
    NotFound { id: String },

    #[error("{id} is locked by another operation: {source}")]
    Conflict {
        id: String,
        #[source]
        source: ApiError,
    },

    #[error("{id} went into status {status:?}")]
    Failed { id: String, status: String },

    #[error("timeout while waiting for {id} to become {}", .targets.join(" or "))]
    Timeout {
        id: String,
        targets: Vec<String>,
        #[source]
        last_error: Option<ApiError>,
    },

    #[error(transparent)]
    Transport(#[from] ApiError),

    #[error("invalid poll descriptor: {0}")]
    InvalidDescriptor(String),
}

impl OperationError {
    /// Maps a failed mutating call onto the operation taxonomy
    pub fn from_api(id: &str, err: ApiError) -> Self {
        match err.classify() {
            FailureKind::NotFound => OperationError::NotFound { id: id.to_string() },
            FailureKind::Conflict => OperationError::Conflict {
                id: id.to_string(),
                source: err,
            },
            FailureKind::Fatal => OperationError::Transport(err),
        }
    }
}

/// Delays and limits used for every poll run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTimings {
    pub timeout: Duration,
    pub delay: Duration,
    pub min_interval: Duration,
}

impl Default for PollTimings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(600),
            delay: Duration::from_secs(10),
            min_interval: Duration::from_secs(3),
        }
    }
}

impl PollTimings {
    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    /// The same timings with the timeout cut down to what is left before
    /// `deadline`
    pub fn until(self, deadline: Instant) -> Self {
        Self {
            timeout: deadline.saturating_duration_since(Instant::now()),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timings() {
        let timings = PollTimings::default();
        assert_eq!(timings.timeout, Duration::from_secs(600));
        assert_eq!(timings.delay, Duration::from_secs(10));
        assert_eq!(timings.min_interval, Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn until_keeps_the_remaining_budget() {
        let timings = PollTimings::default();
        let deadline = Instant::now() + timings.timeout;
        tokio::time::advance(Duration::from_secs(590)).await;

        let rest = timings.until(deadline);
        assert_eq!(rest.timeout, Duration::from_secs(10));
        assert_eq!(rest.min_interval, timings.min_interval);

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(timings.until(deadline).timeout.is_zero());
    }

    #[test]
    fn from_api_classifies() {
        let conflict = ApiError::ApiError {
            status: 409,
            message: "locked".into(),
            details: None,
        };
        assert!(matches!(
            OperationError::from_api("F1", conflict),
            OperationError::Conflict { .. }
        ));

        let missing = ApiError::ApiError {
            status: 404,
            message: String::new(),
            details: None,
        };
        assert!(matches!(
            OperationError::from_api("F1", missing),
            OperationError::NotFound { .. }
        ));

        assert!(matches!(
            OperationError::from_api("F1", ApiError::ServiceUnavailable),
            OperationError::Transport(_)
        ));
    }

    #[test]
    fn timeout_message_names_targets() {
        let err = OperationError::Timeout {
            id: "F040123456789".into(),
            targets: vec!["Deleted".into()],
            last_error: None,
        };
        assert_eq!(
            err.to_string(),
            "timeout while waiting for F040123456789 to become Deleted"
        );
    }
}
