//! Router components: NAT, firewall and NAT global IP address sets
//!
//! Components are not created or destroyed. They are activated on a router
//! that already owns them and deactivated again on delete. Every change on a
//! router's components takes the router lock first.

pub mod resource_firewall;
pub mod resource_global_ip_address_set;
pub mod resource_nat;

pub use resource_firewall::FirewallResource;
pub use resource_global_ip_address_set::GlobalIpAddressSetResource;
pub use resource_nat::NatResource;

use crate::api::ApiError;
use crate::id::ComponentId;
use crate::operation::{delete_with_retry, OperationError, OperationStatus, PollTimings};
use crate::resources::common::wait_completed;
use std::future::Future;
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tokio::time::Instant;

/// Routing groups a component rule may reference
pub const COMPONENT_GROUP_NAMES: &[&str] = &["group_1", "group_2", "group_3", "group_4"];

/// Reads the `router/component` id out of a state, `Ok(None)` when it was
/// never set
pub fn component_id(state: &DynamicValue) -> Result<Option<ComponentId>, Diagnostic> {
    let Some(raw) = state.get_string_opt(&AttributePath::new("id")) else {
        return Ok(None);
    };
    raw.parse::<ComponentId>()
        .map(Some)
        .map_err(|e| Diagnostic::error("Invalid component id", e.to_string()))
}

/// Deactivates a component and waits for the router to settle. A 409 from
/// the deactivate call is retried like a delete, and a component the API no
/// longer knows counts as deactivated. Both steps share `timings.timeout`.
pub async fn deactivate_and_wait<T, U, D, DFut, F, Fut>(
    id: &str,
    timings: PollTimings,
    mut deactivate: D,
    check: F,
) -> Result<(), OperationError>
where
    D: FnMut() -> DFut,
    DFut: Future<Output = Result<U, ApiError>>,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(T, OperationStatus), ApiError>>,
{
    let deadline = Instant::now() + timings.timeout;
    delete_with_retry(id, timings.timeout, timings.min_interval, || {
        let call = deactivate();
        async move { call.await.map(|_| ()) }
    })
    .await?;

    match wait_completed(id, timings.until(deadline), check).await {
        Ok(_) | Err(OperationError::NotFound { .. }) => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn status_error(status: u16) -> ApiError {
        ApiError::ApiError {
            status,
            message: "busy".into(),
            details: None,
        }
    }

    fn timings() -> PollTimings {
        PollTimings {
            timeout: Duration::from_secs(60),
            delay: Duration::ZERO,
            min_interval: Duration::from_secs(3),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn conflicting_deactivate_is_retried() {
        let calls = AtomicUsize::new(0);

        let result = deactivate_and_wait(
            "F052000000335",
            timings(),
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n <= 2 {
                        Err(status_error(409))
                    } else {
                        Ok(())
                    }
                }
            },
            || async { Ok(((), OperationStatus::Completed)) },
        )
        .await;

        assert!(result.is_ok(), "{:?}", result);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_component_counts_as_deactivated() {
        let result = deactivate_and_wait(
            "F052000000335",
            timings(),
            || async { Err::<(), _>(status_error(404)) },
            || async { Err::<((), OperationStatus), _>(status_error(404)) },
        )
        .await;

        assert!(result.is_ok(), "{:?}", result);
    }

    #[tokio::test(start_paused = true)]
    async fn conflict_and_wait_share_one_timeout() {
        let start = Instant::now();

        let result = deactivate_and_wait(
            "F052000000335",
            timings(),
            move || async move {
                if Instant::now().duration_since(start) < Duration::from_secs(50) {
                    Err(status_error(409))
                } else {
                    Ok(())
                }
            },
            || async { Ok(((), OperationStatus::Processing)) },
        )
        .await;

        assert!(matches!(result, Err(OperationError::Timeout { .. })), "{:?}", result);
        assert!(start.elapsed() <= Duration::from_secs(60));
    }

    #[test]
    fn component_id_needs_both_parts() {
        let mut state = DynamicValue::object();
        assert!(component_id(&state).unwrap().is_none());

        state
            .set_string(&AttributePath::new("id"), "F022000000335".to_string())
            .unwrap();
        assert_eq!(
            component_id(&state).unwrap_err().summary,
            "Invalid component id"
        );

        state
            .set_string(
                &AttributePath::new("id"),
                "F022000000335/F052000000335".to_string(),
            )
            .unwrap();
        let id = component_id(&state).unwrap().unwrap();
        assert_eq!(id.component_id, "F052000000335");
    }
}
