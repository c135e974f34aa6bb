//! Emitter Catalog
//!
//! Data model for the EW decision-support gateway: detected or simulated
//! electromagnetic emitters, the countermeasure library, and the static
//! scenario definitions. Also carries the built-in sample catalog the gateway
//! falls back to when its store is empty.

use thiserror::Error;

pub mod emitter;
pub mod reference;
pub mod samples;

pub use emitter::{Affiliation, Emitter, EmitterFilter, NewEmitter, Provenance, ThreatLevel};
pub use reference::{Countermeasure, Scenario};
pub use samples::{recommend_countermeasures, SampleCatalog, SAMPLE_EMITTER_COUNT};

/// Default detection confidence for a freshly registered emitter
pub const DEFAULT_CONFIDENCE: f64 = 0.85;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    #[error("Emitter name must not be empty")]
    EmptyName,
    #[error("Non-finite value in field {field}")]
    NonFinite { field: &'static str },
    #[error("Coordinate out of range: {field}={value}")]
    InvalidCoordinate { field: &'static str, value: f64 },
    #[error("Confidence must be within [0, 1], got {value}")]
    InvalidConfidence { value: f64 },
    #[error("Invalid frequency range: min {min} MHz > max {max} MHz")]
    InvalidFrequencyRange { min: f64, max: f64 },
    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
