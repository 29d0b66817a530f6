use super::OperationError;
use crate::api::{ApiError, FailureKind};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

/// Runs a delete call, retrying while the API answers 409.
///
/// A 404 means somebody already removed the resource and counts as success.
/// Any other failure is returned at once.
pub async fn delete_with_retry<F, Fut>(
    id: &str,
    timeout: Duration,
    interval: Duration,
    mut op: F,
) -> Result<(), OperationError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), ApiError>>,
{
    let deadline = Instant::now() + timeout;
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        let err = match op().await {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        match err.classify() {
            FailureKind::NotFound => {
                debug!("{} already deleted", id);
                return Ok(());
            }
            FailureKind::Conflict => {
                warn!("Delete of {} conflicted (attempt {}), retrying", id, attempt);
                let remaining = deadline.saturating_duration_since(Instant::now());
                if !remaining.is_zero() {
                    sleep(interval.min(remaining)).await;
                }
                if Instant::now() >= deadline {
                    return Err(OperationError::Timeout {
                        id: id.to_string(),
                        targets: vec!["Deleted".to_string()],
                        last_error: Some(err),
                    });
                }
            }
            FailureKind::Fatal => return Err(OperationError::Transport(err)),
        }
    }
}
