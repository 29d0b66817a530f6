//! Switch listing and lookup

use super::ports::VlanRange;
use super::{ApiError, Client};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PortType {
    #[serde(rename = "type")]
    pub port_type: String,
    #[serde(default)]
    pub available: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SwitchVlanRange {
    pub range: String,
    #[serde(default)]
    pub available: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Switch {
    pub id: String,
    #[serde(default)]
    pub switch_name: String,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub port_types: Vec<PortType>,
    #[serde(default, rename = "numberOfAvailableVlans")]
    pub number_of_available_vlans: i64,
    #[serde(default)]
    pub vlan_ranges: Vec<SwitchVlanRange>,
}

impl Switch {
    pub fn offers(&self, port_type: &str) -> bool {
        self.port_types
            .iter()
            .any(|pt| pt.available && pt.port_type == port_type)
    }

    /// Available VLAN ranges only
    pub fn available_vlan_ranges(&self) -> Result<Vec<VlanRange>, ApiError> {
        self.vlan_ranges
            .iter()
            .filter(|r| r.available)
            .map(|r| r.range.parse().map_err(ApiError::ParseError))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct SwitchList {
    #[serde(default)]
    switches: Vec<Switch>,
}

/// Criteria used to pick a single switch. Empty strings match anything.
#[derive(Debug, Clone, Default)]
pub struct SwitchFilter {
    pub name: Option<String>,
    pub area: Option<String>,
    pub location: Option<String>,
    pub port_type: String,
}

impl SwitchFilter {
    fn matches(&self, switch: &Switch) -> bool {
        fn field_ok(wanted: &Option<String>, actual: &str) -> bool {
            match wanted.as_deref() {
                None | Some("") => true,
                Some(w) => w == actual,
            }
        }
        field_ok(&self.name, &switch.switch_name)
            && field_ok(&self.area, &switch.area)
            && field_ok(&self.location, &switch.location)
            && switch.offers(&self.port_type)
    }

    /// Returns the one switch matching the filter
    pub fn select<'s>(&self, switches: &'s [Switch]) -> Result<&'s Switch, String> {
        let mut matches = switches.iter().filter(|s| self.matches(s));
        match (matches.next(), matches.next()) {
            (None, _) => Err(
                "your query returned no results. Please change your search criteria and try again"
                    .to_string(),
            ),
            (Some(_), Some(_)) => Err(
                "your query returned more than one result. Please try a more specific search criteria"
                    .to_string(),
            ),
            (Some(found), None) => Ok(found),
        }
    }
}

pub struct SwitchesApi<'a> {
    client: &'a Client,
}

impl<'a> SwitchesApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /switches
    pub async fn list(&self) -> Result<Vec<Switch>, ApiError> {
        let list: SwitchList = self.client.get("/switches").await?;
        Ok(list.switches)
    }
}
