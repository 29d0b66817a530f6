//! Client for the FIC ERI REST API

pub mod auth;
pub mod client;
pub mod common;
pub mod connections;
pub mod error;
pub mod firewalls;
pub mod global_ip_address_sets;
pub mod nats;
pub mod pool;
pub mod ports;
pub mod routers;
pub mod switches;

#[cfg(test)]
pub mod test_helpers;

pub use client::{Client, RetryConfig};
pub use error::{ApiError, FailureKind};
pub use pool::TlsSettings;
