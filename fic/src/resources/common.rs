//! Plumbing shared by every resource adapter

use crate::api::common::HasOperationStatus;
use crate::api::ApiError;
use crate::operation::{delete_with_retry, OperationError, OperationStatus, PollTimings, Poller};
use crate::provider_data::FicProviderData;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tfplug::context::Context;
use tfplug::schema::AttributeType;
use tfplug::types::{Diagnostic, DynamicValue};
use tokio::time::Instant;

pub const BANDWIDTHS: &[&str] = &[
    "10M", "20M", "30M", "40M", "50M", "100M", "200M", "300M", "400M", "500M", "1G", "2G", "3G",
    "4G", "5G", "10G",
];

/// ECL and UNO connections stop at 1G
pub const BANDWIDTHS_UP_TO_1G: &[&str] = &[
    "10M", "20M", "30M", "40M", "50M", "100M", "200M", "300M", "400M", "500M", "1G",
];

pub const GROUP_NAMES: &[&str] = &[
    "group_1", "group_2", "group_3", "group_4", "group_5", "group_6", "group_7", "group_8",
];

pub const ROUTE_FILTER_IN: &[&str] = &["fullRoute", "noRoute"];
pub const ROUTE_FILTER_OUT: &[&str] = &["fullRoute", "fullRouteWithDefaultRoute", "noRoute"];
pub const QOS_TYPES: &[&str] = &["guarantee"];

/// List of objects with the given attribute types, used for computed
/// nested values
pub fn object_list(fields: &[(&str, AttributeType)]) -> AttributeType {
    AttributeType::List(Box::new(AttributeType::Object(
        fields
            .iter()
            .map(|(name, t)| (name.to_string(), t.clone()))
            .collect::<HashMap<_, _>>(),
    )))
}

pub fn string_list() -> AttributeType {
    AttributeType::List(Box::new(AttributeType::String))
}

pub fn not_configured() -> Diagnostic {
    Diagnostic::error(
        "Provider not configured",
        "Provider data was not properly configured",
    )
}

/// Pulls [`FicProviderData`] out of the value handed to configure
pub fn provider_data_from(
    provider_data: Option<Arc<dyn Any + Send + Sync>>,
) -> Result<FicProviderData, Diagnostic> {
    match provider_data {
        Some(data) => data
            .downcast_ref::<FicProviderData>()
            .cloned()
            .ok_or_else(|| {
                Diagnostic::error(
                    "Invalid provider data",
                    "Failed to extract FicProviderData from provider data",
                )
            }),
        None => Err(Diagnostic::error(
            "No provider data",
            "No provider data was provided to the resource",
        )),
    }
}

pub fn decode<T: DeserializeOwned>(value: &DynamicValue, what: &str) -> Result<T, Diagnostic> {
    value.decode().map_err(|e| {
        Diagnostic::error(
            format!("Invalid {} configuration", what),
            e.to_string(),
        )
    })
}

/// Treats an explicit null like a missing field, for optional lists and
/// nested blocks
pub fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub fn encode<T: Serialize>(model: &T) -> Result<DynamicValue, Diagnostic> {
    DynamicValue::from_typed(model)
        .map_err(|e| Diagnostic::error("Failed to build state", e.to_string()))
}

pub fn api_error(summary: impl Into<String>, err: &ApiError) -> Diagnostic {
    Diagnostic::error(summary, format!("API error: {}", err))
}

pub fn operation_error(summary: impl Into<String>, err: &OperationError) -> Diagnostic {
    Diagnostic::error(summary, err.to_string())
}

/// Poll timings whose timeout never outlives the request context
pub fn bounded_timings(ctx: &Context, timings: PollTimings) -> PollTimings {
    PollTimings {
        timeout: ctx.bounded(timings.timeout),
        ..timings
    }
}

/// Turns a fetched resource into the pair the poller expects
pub fn with_status<T: HasOperationStatus>(
    result: Result<T, ApiError>,
) -> Result<(T, OperationStatus), ApiError> {
    result.map(|value| {
        let status = value.operation_status();
        (value, status)
    })
}

/// A 404 on read means the resource is gone
pub fn found<T>(result: Result<T, ApiError>) -> Result<Option<T>, ApiError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Waits for Processing -> Completed and returns the settled snapshot
pub async fn wait_completed<T, F, Fut>(
    id: &str,
    timings: PollTimings,
    check: F,
) -> Result<T, OperationError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(T, OperationStatus), ApiError>>,
{
    Poller::until_completed(id, timings)
        .run(check)
        .await?
        .ok_or_else(|| OperationError::NotFound { id: id.to_string() })
}

/// Deletes through the conflict retry, then waits until the resource is gone.
/// Both steps share one `timings.timeout`.
pub async fn delete_and_wait<T, D, DFut, F, Fut>(
    id: &str,
    timings: PollTimings,
    delete: D,
    check: F,
) -> Result<(), OperationError>
where
    D: FnMut() -> DFut,
    DFut: Future<Output = Result<(), ApiError>>,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(T, OperationStatus), ApiError>>,
{
    let deadline = Instant::now() + timings.timeout;
    delete_with_retry(id, timings.timeout, timings.min_interval, delete).await?;
    Poller::until_deleted(id, timings.until(deadline))
        .run(check)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn missing_provider_data_is_reported() {
        let err = provider_data_from(None).unwrap_err();
        assert_eq!(err.summary, "No provider data");

        let err = provider_data_from(Some(Arc::new(42u8) as Arc<dyn Any + Send + Sync>)).unwrap_err();
        assert_eq!(err.summary, "Invalid provider data");
    }

    #[test]
    fn not_found_reads_as_none() {
        let missing: Result<(), ApiError> = Err(ApiError::ApiError {
            status: 404,
            message: "not found".into(),
            details: None,
        });
        assert!(found(missing).unwrap().is_none());

        let broken: Result<(), ApiError> = Err(ApiError::ServiceUnavailable);
        assert!(found(broken).is_err());
    }

    #[test]
    fn null_lists_decode_as_empty() {
        #[derive(Deserialize)]
        struct Rules {
            #[serde(default, deserialize_with = "null_default")]
            rules: Vec<String>,
        }

        let rules: Rules = serde_json::from_str(r#"{"rules": null}"#).unwrap();
        assert!(rules.rules.is_empty());
        let rules: Rules = serde_json::from_str("{}").unwrap();
        assert!(rules.rules.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn delete_and_wait_stays_within_one_timeout() {
        let timings = PollTimings::default();
        let start = Instant::now();

        let result = delete_and_wait(
            "F040123456789",
            timings,
            move || async move {
                if start.elapsed() < Duration::from_secs(590) {
                    Err(ApiError::ApiError {
                        status: 409,
                        message: "locked".into(),
                        details: None,
                    })
                } else {
                    Ok(())
                }
            },
            || async { Ok(((), OperationStatus::Processing)) },
        )
        .await;

        assert!(
            matches!(result, Err(OperationError::Timeout { .. })),
            "{:?}",
            result
        );
        assert!(start.elapsed() <= timings.timeout);
    }

    #[tokio::test]
    async fn timings_follow_context_deadline() {
        let ctx = Context::new().with_timeout(Duration::from_secs(5)).await;
        let timings = bounded_timings(&ctx, PollTimings::default());
        assert!(timings.timeout <= Duration::from_secs(5));
        assert_eq!(timings.min_interval, Duration::from_secs(3));

        let unbounded = bounded_timings(&Context::new(), PollTimings::default());
        assert_eq!(unbounded.timeout, Duration::from_secs(600));
    }
}
