use super::{OperationError, OperationStatus, PollTimings};
use crate::api::{ApiError, FailureKind};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

/// Upper bound for the growing wait between two status checks
const MAX_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Decides what a 404 from the status check means
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Create, update and (de)activation; the resource must keep existing
    Apply,
    /// The resource is going away, so 404 is the end state
    Delete,
}

/// One polling run against a single remote resource
#[derive(Debug, Clone)]
pub struct Poller {
    id: String,
    pending: Vec<OperationStatus>,
    target: Vec<OperationStatus>,
    timeout: Duration,
    delay: Duration,
    min_interval: Duration,
    flow: Flow,
}

impl Poller {
    pub fn new(
        id: impl Into<String>,
        pending: &[OperationStatus],
        target: &[OperationStatus],
        flow: Flow,
        timings: PollTimings,
    ) -> Result<Self, OperationError> {
        if pending.is_empty() || target.is_empty() {
            return Err(OperationError::InvalidDescriptor(
                "pending and target statuses must not be empty".to_string(),
            ));
        }
        if let Some(overlap) = pending.iter().find(|s| target.contains(s)) {
            return Err(OperationError::InvalidDescriptor(format!(
                "status {} is both pending and target",
                overlap
            )));
        }

        Ok(Self {
            id: id.into(),
            pending: pending.to_vec(),
            target: target.to_vec(),
            timeout: timings.timeout,
            delay: timings.delay,
            min_interval: timings.min_interval,
            flow,
        })
    }

    /// Processing -> Completed, used after create, update and activate
    pub fn until_completed(id: impl Into<String>, timings: PollTimings) -> Self {
        Self::settled(
            id.into(),
            vec![OperationStatus::Processing],
            vec![OperationStatus::Completed],
            Flow::Apply,
            timings,
        )
    }

    /// Processing|Completed -> Deleted, used after connection and router deletes
    pub fn until_deleted(id: impl Into<String>, timings: PollTimings) -> Self {
        Self::settled(
            id.into(),
            vec![OperationStatus::Processing, OperationStatus::Completed],
            vec![OperationStatus::Deleted],
            Flow::Delete,
            timings,
        )
    }

    /// Processing -> Deleted, for resources that never report Completed while
    /// going away
    pub fn until_removed(id: impl Into<String>, timings: PollTimings) -> Self {
        Self::settled(
            id.into(),
            vec![OperationStatus::Processing],
            vec![OperationStatus::Deleted],
            Flow::Delete,
            timings,
        )
    }

    fn settled(
        id: String,
        pending: Vec<OperationStatus>,
        target: Vec<OperationStatus>,
        flow: Flow,
        timings: PollTimings,
    ) -> Self {
        Self {
            id,
            pending,
            target,
            timeout: timings.timeout,
            delay: timings.delay,
            min_interval: timings.min_interval,
            flow,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Runs `check` until the status reaches a target.
    ///
    /// Returns the last snapshot, or None when a delete flow saw the
    /// resource disappear.
    pub async fn run<T, F, Fut>(&self, mut check: F) -> Result<Option<T>, OperationError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(T, OperationStatus), ApiError>>,
    {
        let deadline = Instant::now() + self.timeout;
        let mut last_status: Option<OperationStatus> = None;

        debug!(
            "Waiting for {} to become {}",
            self.id,
            self.target_names().join(", ")
        );
        sleep(self.delay.min(self.timeout)).await;

        let mut wait = self.min_interval;
        loop {
            if Instant::now() >= deadline {
                return Err(self.timeout_error(last_status));
            }

            match check().await {
                Ok((snapshot, status)) => {
                    debug!("{} is {}", self.id, status);
                    if self.target.contains(&status) {
                        info!("{} reached {}", self.id, status);
                        return Ok(Some(snapshot));
                    }
                    if status == OperationStatus::Error || !self.pending.contains(&status) {
                        return Err(OperationError::Failed {
                            id: self.id.clone(),
                            status: status.to_string(),
                        });
                    }
                    last_status = Some(status);
                }
                Err(e) => match (e.classify(), self.flow) {
                    (FailureKind::NotFound, Flow::Delete) => {
                        info!("{} is gone", self.id);
                        return Ok(None);
                    }
                    (FailureKind::NotFound, Flow::Apply) => {
                        return Err(OperationError::NotFound {
                            id: self.id.clone(),
                        });
                    }
                    _ => return Err(OperationError::Transport(e)),
                },
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(self.timeout_error(last_status));
            }
            sleep(wait.min(remaining)).await;
            wait = (wait * 2).min(MAX_POLL_INTERVAL.max(self.min_interval));
        }
    }

    fn target_names(&self) -> Vec<String> {
        self.target.iter().map(|s| s.to_string()).collect()
    }

    fn timeout_error(&self, last_status: Option<OperationStatus>) -> OperationError {
        debug!(
            "Gave up on {} after {:?}, last status {:?}",
            self.id, self.timeout, last_status
        );
        OperationError::Timeout {
            id: self.id.clone(),
            targets: self.target_names(),
            last_error: None,
        }
    }
}
