use serde::{Deserialize, Deserializer};
use std::fmt;

/// Lifecycle status reported by the ERI API for asynchronous operations
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OperationStatus {
    Processing,
    Completed,
    Deleted,
    Error,
    /// Anything the API reports that we do not know how to handle
    Unknown(String),
}

impl OperationStatus {
    pub fn as_str(&self) -> &str {
        match self {
            OperationStatus::Processing => "Processing",
            OperationStatus::Completed => "Completed",
            OperationStatus::Deleted => "Deleted",
            OperationStatus::Error => "Error",
            OperationStatus::Unknown(s) => s,
        }
    }
}

impl From<&str> for OperationStatus {
    fn from(s: &str) -> Self {
        match s {
            "Processing" => OperationStatus::Processing,
            "Completed" => OperationStatus::Completed,
            "Deleted" => OperationStatus::Deleted,
            "Error" => OperationStatus::Error,
            other => OperationStatus::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OperationStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(OperationStatus::from(raw.as_deref().unwrap_or_default()))
    }
}

impl Default for OperationStatus {
    fn default() -> Self {
        OperationStatus::Unknown(String::new())
    }
}
