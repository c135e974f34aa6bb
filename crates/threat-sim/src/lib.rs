//! Threat Simulation
//!
//! Turns catalog emitters into the two derived records the dashboard consumes:
//! - `SignalUpdate`: a point-in-time observation with bounded sensor jitter
//! - `ThreatAssessment`: a rule-table score, kill-chain phase and action list
//!
//! Both are pure functions of the emitter and an injected `rand::Rng`, so a
//! seeded `StdRng` reproduces any run exactly.

use emitter_catalog::CatalogError;
use thiserror::Error;

pub mod signal;
pub mod threat;
pub mod timeline;

pub use signal::{ConfidenceBounds, SignalGenerator, SignalUpdate};
pub use threat::{KillChainPhase, ThreatAssessment, ThreatReport, ThreatScorer};
pub use timeline::{threat_timeline, TimelineEvent};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Malformed emitter {id}: {source}")]
    MalformedEmitter {
        id: String,
        #[source]
        source: CatalogError,
    },
}

pub type Result<T> = std::result::Result<T, SimError>;

pub(crate) fn validated(emitter: &emitter_catalog::Emitter) -> Result<()> {
    emitter.validate().map_err(|source| SimError::MalformedEmitter {
        id: emitter.id.clone(),
        source,
    })
}
