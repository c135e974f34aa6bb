//! Emitter records and their classification enums

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{CatalogError, Result, DEFAULT_CONFIDENCE};

/// Declared severity of an emitter.
///
/// The four ordinal levels are the only input to scoring. Anything else a
/// client sends is kept verbatim in `Unrecognized` so it survives a round trip
/// and scores with the neutral fallback instead of being rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ThreatLevel {
    Critical,
    High,
    Medium,
    Low,
    Unrecognized(String),
}

impl ThreatLevel {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Unrecognized(raw) => raw,
        }
    }
}

impl From<String> for ThreatLevel {
    fn from(raw: String) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "critical" => Self::Critical,
            "high" => Self::High,
            "medium" => Self::Medium,
            "low" => Self::Low,
            _ => Self::Unrecognized(raw),
        }
    }
}

impl From<&str> for ThreatLevel {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<ThreatLevel> for String {
    fn from(level: ThreatLevel) -> Self {
        match level {
            ThreatLevel::Unrecognized(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Affiliation {
    #[default]
    Hostile,
    Friendly,
    Neutral,
    Unknown,
}

impl Affiliation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hostile => "hostile",
            Self::Friendly => "friendly",
            Self::Neutral => "neutral",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Affiliation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a stored emitter came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Registered explicitly through the API
    #[default]
    Operator,
    /// Loaded by scenario activation; replaced on the next activation
    Simulation,
}

/// A detected or simulated electromagnetic source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emitter {
    pub id: String,
    pub name: String,
    /// radar, communication, jammer, iff, elint, sonar, ...
    pub emitter_type: String,
    /// aircraft, ship, ground, satellite, uav, missile
    pub platform: String,
    pub origin: String,
    pub threat_level: ThreatLevel,
    /// MHz
    pub frequency_min: f64,
    /// MHz
    pub frequency_max: f64,
    #[serde(default)]
    pub prf: Option<f64>,
    /// Microseconds
    #[serde(default)]
    pub pulse_width: Option<f64>,
    #[serde(default)]
    pub modulation_type: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub altitude: f64,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub affiliation: Affiliation,
    #[serde(default)]
    pub source: Provenance,
    #[serde(default = "Utc::now")]
    pub last_detected: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn default_confidence() -> f64 {
    DEFAULT_CONFIDENCE
}

fn default_active() -> bool {
    true
}

impl Emitter {
    /// Reject records the simulator cannot observe meaningfully.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::EmptyName);
        }

        for (field, value) in [
            ("latitude", self.latitude),
            ("longitude", self.longitude),
            ("frequency_min", self.frequency_min),
            ("frequency_max", self.frequency_max),
            ("confidence", self.confidence),
        ] {
            if !value.is_finite() {
                return Err(CatalogError::NonFinite { field });
            }
        }

        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(CatalogError::InvalidCoordinate {
                field: "latitude",
                value: self.latitude,
            });
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(CatalogError::InvalidCoordinate {
                field: "longitude",
                value: self.longitude,
            });
        }

        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(CatalogError::InvalidConfidence {
                value: self.confidence,
            });
        }

        if self.frequency_min > self.frequency_max {
            return Err(CatalogError::InvalidFrequencyRange {
                min: self.frequency_min,
                max: self.frequency_max,
            });
        }

        Ok(())
    }

    /// Midpoint of the emitter's frequency band (MHz)
    pub fn center_frequency(&self) -> f64 {
        (self.frequency_min + self.frequency_max) / 2.0
    }

    pub fn is_hostile(&self) -> bool {
        self.affiliation == Affiliation::Hostile
    }

    /// Copy as a new record: fresh id and timestamps, tagged with `source`.
    pub fn reissue(&self, source: Provenance) -> Emitter {
        let now = Utc::now();
        Emitter {
            id: uuid::Uuid::new_v4().to_string(),
            source,
            last_detected: now,
            created_at: now,
            ..self.clone()
        }
    }
}

/// Registration payload for a new emitter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEmitter {
    pub name: String,
    pub emitter_type: String,
    pub platform: String,
    pub origin: String,
    pub threat_level: ThreatLevel,
    pub frequency_min: f64,
    pub frequency_max: f64,
    #[serde(default)]
    pub prf: Option<f64>,
    #[serde(default)]
    pub pulse_width: Option<f64>,
    #[serde(default)]
    pub modulation_type: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub altitude: Option<f64>,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub affiliation: Affiliation,
}

impl NewEmitter {
    /// Stamp identity and creation time. The result is not validated.
    pub fn into_emitter(self, source: Provenance) -> Emitter {
        let now = Utc::now();
        Emitter {
            id: uuid::Uuid::new_v4().to_string(),
            name: self.name,
            emitter_type: self.emitter_type,
            platform: self.platform,
            origin: self.origin,
            threat_level: self.threat_level,
            frequency_min: self.frequency_min,
            frequency_max: self.frequency_max,
            prf: self.prf,
            pulse_width: self.pulse_width,
            modulation_type: self.modulation_type,
            latitude: self.latitude,
            longitude: self.longitude,
            altitude: self.altitude.unwrap_or(0.0),
            confidence: self.confidence,
            is_active: true,
            affiliation: self.affiliation,
            source,
            last_detected: now,
            created_at: now,
        }
    }
}

/// Optional affiliation / threat-level filter for emitter listings
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EmitterFilter {
    pub affiliation: Option<Affiliation>,
    pub threat_level: Option<ThreatLevel>,
}

impl EmitterFilter {
    pub fn hostile() -> Self {
        Self {
            affiliation: Some(Affiliation::Hostile),
            threat_level: None,
        }
    }

    pub fn matches(&self, emitter: &Emitter) -> bool {
        self.affiliation.map_or(true, |a| a == emitter.affiliation)
            && self
                .threat_level
                .as_ref()
                .map_or(true, |t| *t == emitter.threat_level)
    }
}
