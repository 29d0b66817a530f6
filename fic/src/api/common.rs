//! Common types and utilities for the ERI API

use crate::operation::OperationStatus;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Error body returned alongside 4xx/5xx responses
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(alias = "errorCode")]
    pub code: Option<String>,
    #[serde(alias = "errorMessage")]
    pub message: Option<String>,
}

#[derive(Debug, thiserror::Error)]
#[error("API error details: code={code:?}, message={message:?}")]
pub struct ApiErrorDetails {
    pub code: Option<String>,
    pub message: Option<String>,
}

/// A resource whose JSON representation is wrapped in a root key, e.g.
/// `{"router": {...}}`
pub trait FicApiResource: DeserializeOwned {
    const ROOT_KEY: &'static str;
}

/// Anything the poller can read a lifecycle status from
pub trait HasOperationStatus {
    fn operation_status(&self) -> OperationStatus;
}

/// Wraps a request body under `key`
pub fn envelope<'a, B: Serialize>(key: &'a str, body: &'a B) -> HashMap<&'a str, &'a B> {
    HashMap::from([(key, body)])
}

/// AS path prepend is `OFF` or a count in configuration; the API wants null
/// or an integer
pub mod as_path_prepend {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value.as_deref() {
            None | Some("") | Some("OFF") => serializer.serialize_none(),
            Some(v) => match v.parse::<i64>() {
                Ok(n) => serializer.serialize_i64(n),
                Err(_) => Err(serde::ser::Error::custom(format!(
                    "AS path prepend must be OFF or a number, got {:?}",
                    v
                ))),
            },
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Some(match Option::<i64>::deserialize(deserializer)? {
            Some(n) => n.to_string(),
            None => "OFF".to_string(),
        }))
    }
}
