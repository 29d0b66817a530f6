//! Composite resource identifiers
//!
//! Components live under a router, so their Terraform id joins the parent
//! ids with `/`: `router/nat`, `router/firewall` and `router/nat/set`.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdError {
    #[error("invalid id {id:?}: expected {expected} parts separated by '/', got {actual}")]
    WrongPartCount {
        id: String,
        expected: usize,
        actual: usize,
    },

    #[error("invalid id {0:?}: empty part")]
    EmptyPart(String),
}

pub fn join(parts: &[&str]) -> String {
    parts.join("/")
}

pub fn split(id: &str, expected: usize) -> Result<Vec<&str>, IdError> {
    let parts: Vec<&str> = id.split('/').collect();
    if parts.len() != expected {
        return Err(IdError::WrongPartCount {
            id: id.to_string(),
            expected,
            actual: parts.len(),
        });
    }
    if parts.iter().any(|p| p.is_empty()) {
        return Err(IdError::EmptyPart(id.to_string()));
    }
    Ok(parts)
}

/// `routerID/componentID` for NAT and firewall components
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentId {
    pub router_id: String,
    pub component_id: String,
}

impl ComponentId {
    pub fn new(router_id: impl Into<String>, component_id: impl Into<String>) -> Self {
        Self {
            router_id: router_id.into(),
            component_id: component_id.into(),
        }
    }
}

impl FromStr for ComponentId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = split(s, 2)?;
        Ok(Self::new(parts[0], parts[1]))
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&join(&[&self.router_id, &self.component_id]))
    }
}

/// `routerID/natID/setID`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalIpAddressSetId {
    pub router_id: String,
    pub nat_id: String,
    pub set_id: String,
}

impl GlobalIpAddressSetId {
    pub fn new(
        router_id: impl Into<String>,
        nat_id: impl Into<String>,
        set_id: impl Into<String>,
    ) -> Self {
        Self {
            router_id: router_id.into(),
            nat_id: nat_id.into(),
            set_id: set_id.into(),
        }
    }
}

impl FromStr for GlobalIpAddressSetId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = split(s, 3)?;
        Ok(Self::new(parts[0], parts[1], parts[2]))
    }
}

impl fmt::Display for GlobalIpAddressSetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&join(&[&self.router_id, &self.nat_id, &self.set_id]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_id_parses() {
        let id: ComponentId = "F022000000001/F052000000001".parse().unwrap();
        assert_eq!(id.router_id, "F022000000001");
        assert_eq!(id.component_id, "F052000000001");
        assert_eq!(id.to_string(), "F022000000001/F052000000001");
    }

    #[test]
    fn component_id_rejects_wrong_count() {
        let err = "F022000000001".parse::<ComponentId>().unwrap_err();
        assert_eq!(
            err,
            IdError::WrongPartCount {
                id: "F022000000001".into(),
                expected: 2,
                actual: 1
            }
        );
        assert!("a/b/c".parse::<ComponentId>().is_err());
    }

    #[test]
    fn rejects_empty_segments() {
        assert_eq!(
            "F022000000001/".parse::<ComponentId>(),
            Err(IdError::EmptyPart("F022000000001/".into()))
        );
    }

    #[test]
    fn global_ip_address_set_id_parses() {
        let id: GlobalIpAddressSetId = "F022000000001/F052000000001/F092000000001".parse().unwrap();
        assert_eq!(id.nat_id, "F052000000001");
        assert_eq!(id.set_id, "F092000000001");
        assert_eq!(id.to_string(), "F022000000001/F052000000001/F092000000001");
    }
}
