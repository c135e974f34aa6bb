//! Signal Update Generator
//!
//! Simulates sensor noise on top of a catalog emitter. Each call draws fresh
//! deviates from the supplied RNG; the emitter itself is never modified.

use chrono::{DateTime, Utc};
use emitter_catalog::{Affiliation, Emitter, ThreatLevel};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{validated, Result};

/// Baseline received signal strength (dBm)
pub const BASE_SIGNAL_DBM: f64 = -50.0;
/// Half-width of the signal strength deviate (dB)
pub const SIGNAL_JITTER_DB: f64 = 10.0;
/// Half-width of the position deviate, per axis (degrees)
pub const POSITION_JITTER_DEG: f64 = 0.01;
/// Half-width of the frequency deviate around the band midpoint (MHz)
pub const FREQUENCY_JITTER_MHZ: f64 = 5.0;
/// Half-width of the confidence drift
pub const CONFIDENCE_DRIFT: f64 = 0.02;

/// Clamp range applied to jittered confidence.
///
/// The ceiling is always enforced. The floor is optional: `None` lets
/// confidence drift below zero for very low-confidence emitters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBounds {
    pub floor: Option<f64>,
    pub ceiling: f64,
}

impl ConfidenceBounds {
    /// Ceiling only, no floor
    pub fn upper_only() -> Self {
        Self {
            floor: None,
            ceiling: 1.0,
        }
    }

    pub fn clamp(&self, confidence: f64) -> f64 {
        let floored = match self.floor {
            Some(floor) => confidence.max(floor),
            None => confidence,
        };
        floored.min(self.ceiling)
    }
}

impl Default for ConfidenceBounds {
    fn default() -> Self {
        Self {
            floor: Some(0.0),
            ceiling: 1.0,
        }
    }
}

/// Ephemeral observation of one emitter; never persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalUpdate {
    pub emitter_id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// dBm
    pub signal_strength: f64,
    /// MHz
    pub frequency: f64,
    pub confidence: f64,
    pub affiliation: Affiliation,
    pub threat_level: ThreatLevel,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SignalGenerator {
    bounds: ConfidenceBounds,
}

impl SignalGenerator {
    pub fn new(bounds: ConfidenceBounds) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> ConfidenceBounds {
        self.bounds
    }

    /// Produce one jittered observation of `emitter`, stamped now.
    pub fn observe<R: Rng + ?Sized>(&self, emitter: &Emitter, rng: &mut R) -> Result<SignalUpdate> {
        self.observe_at(emitter, rng, Utc::now())
    }

    /// Same as [`observe`](Self::observe) with an explicit capture time.
    pub fn observe_at<R: Rng + ?Sized>(
        &self,
        emitter: &Emitter,
        rng: &mut R,
        timestamp: DateTime<Utc>,
    ) -> Result<SignalUpdate> {
        validated(emitter)?;

        let drift = rng.gen_range(-CONFIDENCE_DRIFT..CONFIDENCE_DRIFT);
        let d_lat = rng.gen_range(-POSITION_JITTER_DEG..POSITION_JITTER_DEG);
        let d_lon = rng.gen_range(-POSITION_JITTER_DEG..POSITION_JITTER_DEG);
        let d_signal = rng.gen_range(-SIGNAL_JITTER_DB..SIGNAL_JITTER_DB);
        let d_freq = rng.gen_range(-FREQUENCY_JITTER_MHZ..FREQUENCY_JITTER_MHZ);

        Ok(SignalUpdate {
            emitter_id: emitter.id.clone(),
            name: emitter.name.clone(),
            latitude: emitter.latitude + d_lat,
            longitude: emitter.longitude + d_lon,
            signal_strength: BASE_SIGNAL_DBM + d_signal,
            frequency: emitter.center_frequency() + d_freq,
            confidence: self.bounds.clamp(emitter.confidence + drift),
            affiliation: emitter.affiliation,
            threat_level: emitter.threat_level.clone(),
            timestamp,
        })
    }

    /// Observe every emitter in `working_set` with one shared RNG.
    pub fn observe_all<R: Rng + ?Sized>(
        &self,
        working_set: &[Emitter],
        rng: &mut R,
    ) -> Result<Vec<SignalUpdate>> {
        let now = Utc::now();
        working_set
            .iter()
            .map(|emitter| self.observe_at(emitter, rng, now))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SimError;
    use emitter_catalog::{NewEmitter, Provenance};
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn emitter(fmin: f64, fmax: f64, confidence: f64) -> Emitter {
        NewEmitter {
            name: "Test Radar".to_string(),
            emitter_type: "radar".to_string(),
            platform: "ground".to_string(),
            origin: "Test".to_string(),
            threat_level: ThreatLevel::High,
            frequency_min: fmin,
            frequency_max: fmax,
            prf: None,
            pulse_width: None,
            modulation_type: None,
            latitude: 45.0,
            longitude: 7.0,
            altitude: None,
            confidence,
            affiliation: Affiliation::Hostile,
        }
        .into_emitter(Provenance::Operator)
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let generator = SignalGenerator::default();
        let source = emitter(3000.0, 3200.0, 0.85);
        let at = Utc::now();

        let a = generator.observe_at(&source, &mut StdRng::seed_from_u64(7), at).unwrap();
        let b = generator.observe_at(&source, &mut StdRng::seed_from_u64(7), at).unwrap();
        let c = generator.observe_at(&source, &mut StdRng::seed_from_u64(8), at).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_source_emitter_untouched() {
        let generator = SignalGenerator::default();
        let source = emitter(3000.0, 3200.0, 0.85);
        let before = source.clone();
        let mut rng = StdRng::seed_from_u64(1);

        let update = generator.observe(&source, &mut rng).unwrap();

        assert_eq!(source, before);
        assert_eq!(update.emitter_id, source.id);
        assert_eq!(update.name, source.name);
        assert_eq!(update.affiliation, source.affiliation);
        assert_eq!(update.threat_level, source.threat_level);
    }

    #[test]
    fn test_ceiling_clamps_high_confidence() {
        let generator = SignalGenerator::default();
        let source = emitter(100.0, 200.0, 1.0);
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..200 {
            let update = generator.observe(&source, &mut rng).unwrap();
            assert!(update.confidence <= 1.0);
            assert!(update.confidence >= 1.0 - CONFIDENCE_DRIFT);
        }
    }

    #[test]
    fn test_default_floor_keeps_confidence_non_negative() {
        let generator = SignalGenerator::default();
        let source = emitter(100.0, 200.0, 0.0);
        let mut rng = StdRng::seed_from_u64(4);

        for _ in 0..200 {
            let update = generator.observe(&source, &mut rng).unwrap();
            assert!(update.confidence >= 0.0);
        }
    }

    #[test]
    fn test_upper_only_bounds_allow_negative_confidence() {
        // Without a floor, a zero-confidence emitter drifts below zero about
        // half the time.
        let generator = SignalGenerator::new(ConfidenceBounds::upper_only());
        let source = emitter(100.0, 200.0, 0.0);
        let mut rng = StdRng::seed_from_u64(5);

        let negatives = (0..200)
            .map(|_| generator.observe(&source, &mut rng).unwrap())
            .filter(|u| u.confidence < 0.0)
            .count();

        assert!(negatives > 0);
        assert!(negatives < 200);
    }

    #[test]
    fn test_rejects_inverted_band() {
        let generator = SignalGenerator::default();
        let source = emitter(500.0, 100.0, 0.85);
        let mut rng = StdRng::seed_from_u64(1);

        let err = generator.observe(&source, &mut rng).unwrap_err();
        assert!(matches!(err, SimError::MalformedEmitter { .. }));
    }

    #[test]
    fn test_rejects_missing_position() {
        let generator = SignalGenerator::default();
        let mut source = emitter(100.0, 200.0, 0.85);
        source.longitude = f64::NAN;
        let mut rng = StdRng::seed_from_u64(1);

        assert!(generator.observe(&source, &mut rng).is_err());
    }

    #[test]
    fn test_observe_all_shares_timestamp() {
        let generator = SignalGenerator::default();
        let set = vec![emitter(100.0, 200.0, 0.5), emitter(300.0, 400.0, 0.6)];
        let mut rng = StdRng::seed_from_u64(11);

        let updates = generator.observe_all(&set, &mut rng).unwrap();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].timestamp, updates[1].timestamp);
    }

    proptest! {
        #[test]
        fn prop_observation_stays_in_jitter_envelope(
            fmin in 1.0f64..20_000.0,
            width in 0.0f64..5_000.0,
            confidence in 0.0f64..=1.0,
            seed in any::<u64>(),
        ) {
            let generator = SignalGenerator::new(ConfidenceBounds::upper_only());
            let source = emitter(fmin, fmin + width, confidence);
            let mut rng = StdRng::seed_from_u64(seed);

            let update = generator.observe(&source, &mut rng).unwrap();
            let mean = source.center_frequency();

            prop_assert!(update.frequency >= mean - FREQUENCY_JITTER_MHZ);
            prop_assert!(update.frequency <= mean + FREQUENCY_JITTER_MHZ);
            prop_assert!(update.confidence <= 1.0);
            prop_assert!(update.confidence >= confidence - CONFIDENCE_DRIFT);
            prop_assert!(update.confidence <= (confidence + CONFIDENCE_DRIFT).min(1.0));
            prop_assert!((update.latitude - source.latitude).abs() <= POSITION_JITTER_DEG + 1e-9);
            prop_assert!((update.longitude - source.longitude).abs() <= POSITION_JITTER_DEG + 1e-9);
            prop_assert!(update.signal_strength >= BASE_SIGNAL_DBM - SIGNAL_JITTER_DB);
            prop_assert!(update.signal_strength <= BASE_SIGNAL_DBM + SIGNAL_JITTER_DB);
        }
    }
}
