//! Threat Scorer
//!
//! Fixed rule table, not a model:
//!
//! | threat_level | base |   | affiliation | multiplier |
//! |--------------|------|---|-------------|------------|
//! | critical     | 0.95 |   | hostile     | 1.2        |
//! | high         | 0.75 |   | friendly    | 0.1        |
//! | medium       | 0.50 |   | neutral     | 1.0        |
//! | low          | 0.25 |   | unknown     | 1.0        |
//! | (other)      | 0.50 |   |             |            |
//!
//! The product is capped at 1.0 and then banded into an action list.

use chrono::{DateTime, Utc};
use emitter_catalog::{Affiliation, Emitter, ThreatLevel};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{validated, Result};

/// Score fallback for threat levels outside the table
pub const UNRECOGNIZED_BASE_SCORE: f64 = 0.5;
/// Scores above this are imminent: ECM actions and a time-to-impact estimate
pub const IMMINENT_THRESHOLD: f64 = 0.7;
/// Scores above this (and at or below `IMMINENT_THRESHOLD`) call for preparation
pub const ELEVATED_THRESHOLD: f64 = 0.4;
/// Scores above this count as critical in a `ThreatReport`
pub const CRITICAL_THRESHOLD: f64 = 0.8;
/// Time-to-impact draw range (seconds)
pub const TIME_TO_IMPACT_RANGE: (f64, f64) = (30.0, 300.0);

const IMMINENT_ACTIONS: &[&str] = &["Activate ECM", "Deploy decoys", "Maneuver to minimize exposure"];
const ELEVATED_ACTIONS: &[&str] = &["Continue monitoring", "Prepare countermeasures"];
const ROUTINE_ACTIONS: &[&str] = &["Track for intelligence", "Log to database"];

/// Position in the notional detect → track → engage → intercept sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KillChainPhase {
    Detection,
    Tracking,
    Engagement,
    Intercept,
    /// Non-hostile emitters are watched, not prosecuted
    Monitoring,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatAssessment {
    pub emitter_id: String,
    pub emitter_name: String,
    pub threat_score: f64,
    pub kill_chain_phase: KillChainPhase,
    /// Seconds; present only for imminent threats
    pub time_to_impact: Option<f64>,
    pub recommended_actions: Vec<String>,
    pub assessed_at: DateTime<Utc>,
}

pub fn base_score(level: &ThreatLevel) -> f64 {
    match level {
        ThreatLevel::Critical => 0.95,
        ThreatLevel::High => 0.75,
        ThreatLevel::Medium => 0.5,
        ThreatLevel::Low => 0.25,
        ThreatLevel::Unrecognized(_) => UNRECOGNIZED_BASE_SCORE,
    }
}

pub fn affiliation_multiplier(affiliation: Affiliation) -> f64 {
    match affiliation {
        Affiliation::Hostile => 1.2,
        Affiliation::Friendly => 0.1,
        Affiliation::Neutral | Affiliation::Unknown => 1.0,
    }
}

/// Action band for a final score
pub fn recommended_actions(score: f64) -> &'static [&'static str] {
    if score > IMMINENT_THRESHOLD {
        IMMINENT_ACTIONS
    } else if score > ELEVATED_THRESHOLD {
        ELEVATED_ACTIONS
    } else {
        ROUTINE_ACTIONS
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreatScorer;

impl ThreatScorer {
    pub fn new() -> Self {
        Self
    }

    /// Deterministic part of the assessment
    pub fn score(&self, level: &ThreatLevel, affiliation: Affiliation) -> f64 {
        (base_score(level) * affiliation_multiplier(affiliation)).min(1.0)
    }

    pub fn assess<R: Rng + ?Sized>(&self, emitter: &Emitter, rng: &mut R) -> Result<ThreatAssessment> {
        self.assess_at(emitter, rng, Utc::now())
    }

    /// Assess with an explicit timestamp. Draws at most two deviates: the
    /// phase (hostile only) and then the time-to-impact (imminent only).
    pub fn assess_at<R: Rng + ?Sized>(
        &self,
        emitter: &Emitter,
        rng: &mut R,
        assessed_at: DateTime<Utc>,
    ) -> Result<ThreatAssessment> {
        validated(emitter)?;

        let threat_score = self.score(&emitter.threat_level, emitter.affiliation);

        // Hostile emitters are only ever placed in the first two phases.
        let kill_chain_phase = if emitter.is_hostile() {
            if rng.gen_bool(0.5) {
                KillChainPhase::Detection
            } else {
                KillChainPhase::Tracking
            }
        } else {
            KillChainPhase::Monitoring
        };

        let time_to_impact = (threat_score > IMMINENT_THRESHOLD).then(|| {
            let (lo, hi) = TIME_TO_IMPACT_RANGE;
            rng.gen_range(lo..=hi)
        });

        debug!(
            "Assessed {} ({}/{}): score={:.3} phase={:?}",
            emitter.name, emitter.threat_level, emitter.affiliation, threat_score, kill_chain_phase
        );

        Ok(ThreatAssessment {
            emitter_id: emitter.id.clone(),
            emitter_name: emitter.name.clone(),
            threat_score,
            kill_chain_phase,
            time_to_impact,
            recommended_actions: recommended_actions(threat_score)
                .iter()
                .map(|a| a.to_string())
                .collect(),
            assessed_at,
        })
    }
}

/// Response body for a fleet-wide assessment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreatReport {
    pub total_threats: usize,
    pub critical_count: usize,
    /// Highest score first
    pub assessments: Vec<ThreatAssessment>,
    pub timestamp: DateTime<Utc>,
}

impl ThreatReport {
    pub fn from_assessments(mut assessments: Vec<ThreatAssessment>) -> Self {
        assessments.sort_by(|a, b| b.threat_score.total_cmp(&a.threat_score));
        let critical_count = assessments
            .iter()
            .filter(|a| a.threat_score > CRITICAL_THRESHOLD)
            .count();

        Self {
            total_threats: assessments.len(),
            critical_count,
            assessments,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emitter_catalog::{NewEmitter, Provenance};
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn emitter(level: &str, affiliation: Affiliation) -> Emitter {
        NewEmitter {
            name: format!("{} {}", affiliation, level),
            emitter_type: "radar".to_string(),
            platform: "ship".to_string(),
            origin: "Test".to_string(),
            threat_level: ThreatLevel::from(level),
            frequency_min: 3000.0,
            frequency_max: 3100.0,
            prf: None,
            pulse_width: None,
            modulation_type: None,
            latitude: 0.0,
            longitude: 0.0,
            altitude: None,
            confidence: 0.85,
            affiliation,
        }
        .into_emitter(Provenance::Operator)
    }

    fn actions(assessment: &ThreatAssessment) -> Vec<&str> {
        assessment.recommended_actions.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_critical_hostile_is_capped_and_imminent() {
        let scorer = ThreatScorer::new();
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..50 {
            let a = scorer.assess(&emitter("critical", Affiliation::Hostile), &mut rng).unwrap();
            assert_eq!(a.threat_score, 1.0);
            assert!(matches!(
                a.kill_chain_phase,
                KillChainPhase::Detection | KillChainPhase::Tracking
            ));
            assert_eq!(
                actions(&a),
                ["Activate ECM", "Deploy decoys", "Maneuver to minimize exposure"]
            );
            let tti = a.time_to_impact.expect("imminent threats carry a time-to-impact");
            assert!((30.0..=300.0).contains(&tti));
        }
    }

    #[test]
    fn test_low_friendly_is_routine() {
        let scorer = ThreatScorer::new();
        let mut rng = StdRng::seed_from_u64(1);

        let a = scorer.assess(&emitter("low", Affiliation::Friendly), &mut rng).unwrap();
        assert!((a.threat_score - 0.025).abs() < 1e-12);
        assert_eq!(a.kill_chain_phase, KillChainPhase::Monitoring);
        assert_eq!(actions(&a), ["Track for intelligence", "Log to database"]);
        assert_eq!(a.time_to_impact, None);
    }

    #[test]
    fn test_unrecognized_level_falls_back_to_midpoint() {
        let scorer = ThreatScorer::new();
        let mut rng = StdRng::seed_from_u64(1);

        let a = scorer
            .assess(&emitter("unknown_value", Affiliation::Neutral), &mut rng)
            .unwrap();
        assert_eq!(a.threat_score, 0.5);
        assert_eq!(a.kill_chain_phase, KillChainPhase::Monitoring);
        assert_eq!(actions(&a), ["Continue monitoring", "Prepare countermeasures"]);
        assert_eq!(a.time_to_impact, None);
    }

    #[test]
    fn test_hostile_phase_uses_both_options() {
        let scorer = ThreatScorer::new();
        let mut rng = StdRng::seed_from_u64(9);
        let source = emitter("medium", Affiliation::Hostile);

        let phases: Vec<KillChainPhase> = (0..100)
            .map(|_| scorer.assess(&source, &mut rng).unwrap().kill_chain_phase)
            .collect();

        assert!(phases.contains(&KillChainPhase::Detection));
        assert!(phases.contains(&KillChainPhase::Tracking));
        assert!(!phases.contains(&KillChainPhase::Engagement));
        assert!(!phases.contains(&KillChainPhase::Intercept));
    }

    #[test]
    fn test_action_band_edges() {
        assert_eq!(recommended_actions(0.7), ELEVATED_ACTIONS);
        assert_eq!(recommended_actions(0.7000001), IMMINENT_ACTIONS);
        assert_eq!(recommended_actions(0.4), ROUTINE_ACTIONS);
        assert_eq!(recommended_actions(0.4000001), ELEVATED_ACTIONS);
    }

    #[test]
    fn test_score_table() {
        let scorer = ThreatScorer::new();
        // high hostile: 0.75 * 1.2 = 0.9
        assert!((scorer.score(&ThreatLevel::High, Affiliation::Hostile) - 0.9).abs() < 1e-12);
        // medium hostile: 0.5 * 1.2 = 0.6
        assert!((scorer.score(&ThreatLevel::Medium, Affiliation::Hostile) - 0.6).abs() < 1e-12);
        assert_eq!(scorer.score(&ThreatLevel::Low, Affiliation::Unknown), 0.25);
        assert_eq!(scorer.score(&ThreatLevel::Critical, Affiliation::Neutral), 0.95);
    }

    #[test]
    fn test_rejects_malformed_emitter() {
        let scorer = ThreatScorer::new();
        let mut source = emitter("high", Affiliation::Hostile);
        source.frequency_min = 5000.0;
        let mut rng = StdRng::seed_from_u64(1);

        assert!(scorer.assess(&source, &mut rng).is_err());
    }

    #[test]
    fn test_report_sorted_and_counted() {
        let scorer = ThreatScorer::new();
        let mut rng = StdRng::seed_from_u64(5);
        let emitters = [
            emitter("low", Affiliation::Hostile),
            emitter("critical", Affiliation::Hostile),
            emitter("medium", Affiliation::Hostile),
            emitter("high", Affiliation::Hostile),
        ];

        let assessments = emitters
            .iter()
            .map(|e| scorer.assess(e, &mut rng).unwrap())
            .collect();
        let report = ThreatReport::from_assessments(assessments);

        assert_eq!(report.total_threats, 4);
        // critical (1.0) and high (0.9) exceed 0.8
        assert_eq!(report.critical_count, 2);
        assert!(report
            .assessments
            .windows(2)
            .all(|w| w[0].threat_score >= w[1].threat_score));
        assert_eq!(report.assessments[0].threat_score, 1.0);
    }

    #[test]
    fn test_wire_format() {
        let scorer = ThreatScorer::new();
        let mut rng = StdRng::seed_from_u64(5);
        let a = scorer.assess(&emitter("low", Affiliation::Friendly), &mut rng).unwrap();

        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["kill_chain_phase"], "monitoring");
        assert!(json["time_to_impact"].is_null());
    }

    fn level_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("critical".to_string()),
            Just("high".to_string()),
            Just("medium".to_string()),
            Just("low".to_string()),
            "[a-z_]{1,12}",
        ]
    }

    fn affiliation_strategy() -> impl Strategy<Value = Affiliation> {
        prop_oneof![
            Just(Affiliation::Hostile),
            Just(Affiliation::Friendly),
            Just(Affiliation::Neutral),
            Just(Affiliation::Unknown),
        ]
    }

    proptest! {
        #[test]
        fn prop_same_seed_same_assessment(
            level in level_strategy(),
            affiliation in affiliation_strategy(),
            seed in any::<u64>(),
        ) {
            let scorer = ThreatScorer::new();
            let source = emitter(&level, affiliation);
            let at = Utc::now();

            let a = scorer.assess_at(&source, &mut StdRng::seed_from_u64(seed), at).unwrap();
            let b = scorer.assess_at(&source, &mut StdRng::seed_from_u64(seed), at).unwrap();

            prop_assert_eq!(&a, &b);
            prop_assert!(a.threat_score <= 1.0);
            prop_assert!(a.threat_score >= 0.0);
            prop_assert_eq!(a.time_to_impact.is_some(), a.threat_score > IMMINENT_THRESHOLD);
        }
    }
}
