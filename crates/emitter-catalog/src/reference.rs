//! Static reference entities: countermeasure library and scenarios

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Countermeasure {
    pub id: String,
    pub name: String,
    /// jamming, deception, chaff, flare, cyber
    pub technique_type: String,
    pub description: String,
    pub success_rate: f64,
    /// low, medium, high
    pub resource_cost: String,
    pub applicable_threats: Vec<String>,
    #[serde(default)]
    pub side_effects: Option<String>,
}

impl Countermeasure {
    /// Case-insensitive match against the applicable threat list
    pub fn applies_to(&self, threat_type: &str) -> bool {
        self.applicable_threats
            .iter()
            .any(|t| t.eq_ignore_ascii_case(threat_type))
    }
}

/// A named operating picture that can be loaded into the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub name: String,
    pub description: String,
    pub region: String,
    pub center_lat: f64,
    pub center_lng: f64,
    pub zoom: u8,
    /// Names of sample emitters that make up the scenario
    pub emitters: Vec<String>,
    pub threat_summary: String,
}
