//! Built-in sample catalog
//!
//! Served whenever the gateway's store holds no emitters, and used as the
//! source for scenario activation. All platforms and factions are fictional.

use chrono::Utc;

use crate::emitter::{Affiliation, Emitter, Provenance, ThreatLevel};
use crate::reference::{Countermeasure, Scenario};
use crate::{CatalogError, Result, DEFAULT_CONFIDENCE};

struct EmitterSeed {
    name: &'static str,
    emitter_type: &'static str,
    platform: &'static str,
    origin: &'static str,
    threat_level: &'static str,
    band_mhz: (f64, f64),
    prf: Option<f64>,
    pulse_width: Option<f64>,
    modulation: Option<&'static str>,
    position: (f64, f64),
    affiliation: Affiliation,
}

#[allow(clippy::too_many_arguments)]
const fn seed(
    name: &'static str,
    emitter_type: &'static str,
    platform: &'static str,
    origin: &'static str,
    threat_level: &'static str,
    band_mhz: (f64, f64),
    prf: Option<f64>,
    pulse_width: Option<f64>,
    modulation: Option<&'static str>,
    position: (f64, f64),
    affiliation: Affiliation,
) -> EmitterSeed {
    EmitterSeed {
        name,
        emitter_type,
        platform,
        origin,
        threat_level,
        band_mhz,
        prf,
        pulse_width,
        modulation,
        position,
        affiliation,
    }
}

const EMITTERS: &[EmitterSeed] = &[
    // Northern Strait
    seed("Kestrel-class Frigate Search Radar", "radar", "ship", "Redland", "critical", (3100.0, 3500.0), Some(3000.0), Some(1.5), Some("pulse"), (25.2, 120.5), Affiliation::Hostile),
    seed("Longwatch Early Warning Array", "radar", "ground", "Redland", "high", (1200.0, 1400.0), Some(500.0), Some(50.0), Some("pulse"), (25.8, 119.2), Affiliation::Hostile),
    seed("Harrier-9 Terminal Seeker", "radar", "missile", "Redland", "critical", (9000.0, 10000.0), Some(10000.0), Some(0.5), Some("chirp"), (25.5, 120.8), Affiliation::Hostile),
    seed("Blue Task Group Volume Search", "radar", "ship", "Blueland", "low", (2900.0, 3100.0), Some(4000.0), Some(1.0), Some("pulse"), (24.8, 121.2), Affiliation::Friendly),
    seed("Overwatch AEW Orbit", "radar", "aircraft", "Blueland", "low", (400.0, 450.0), Some(300.0), Some(10.0), Some("pulse"), (24.5, 122.0), Affiliation::Friendly),
    // River Corridor
    seed("Commercial Quadcopter Control Link", "communication", "uav", "Unknown", "medium", (2400.0, 2483.0), None, None, Some("FHSS"), (50.45, 30.52), Affiliation::Unknown),
    seed("Loiter Drone Datalink", "communication", "uav", "Redland", "high", (868.0, 915.0), None, None, Some("FM"), (50.48, 30.55), Affiliation::Hostile),
    seed("Long-Range SAM Engagement Radar", "radar", "ground", "Redland", "critical", (2000.0, 4000.0), Some(8000.0), Some(0.2), Some("pulse"), (50.6, 30.3), Affiliation::Hostile),
    // Northern Sea
    seed("Barrage Jammer Pod", "jammer", "aircraft", "Redland", "high", (8000.0, 12000.0), None, None, Some("noise"), (57.2, 19.8), Affiliation::Hostile),
    seed("Merchant Navigation Radar", "radar", "ship", "Neutral Flag", "low", (9380.0, 9440.0), Some(1500.0), Some(0.25), Some("pulse"), (56.8, 20.4), Affiliation::Neutral),
];

/// Number of emitters in the built-in catalog
pub const SAMPLE_EMITTER_COUNT: usize = EMITTERS.len();

type CountermeasureRow = (
    &'static str,
    &'static str,
    &'static str,
    f64,
    &'static str,
    &'static [&'static str],
    Option<&'static str>,
);

const COUNTERMEASURES: &[CountermeasureRow] = &[
    ("Noise Jamming Pod", "jamming", "Wideband noise raises the victim receiver noise floor", 0.78, "medium", &["radar", "missile_seeker"], Some("Reveals own position to passive ESM")),
    ("Towed Decoy", "deception", "Towed repeater presents a stronger false target to terminal seekers", 0.85, "high", &["anti_ship_missile", "radar"], None),
    ("Chaff Corridor", "chaff", "Dipole cloud masks the platform from pulse radars", 0.65, "low", &["radar", "missile_seeker"], Some("Short-lived; wind dependent")),
    ("Directed IR Countermeasure", "flare", "Laser dazzle against IR-guided threats", 0.72, "high", &["uav", "cruise_missile"], None),
    ("Datalink Disruption", "cyber", "Protocol-aware jamming of UAV command and video links", 0.82, "medium", &["communication", "uav_datalink"], Some("May affect friendly ISM-band links")),
];

/// Built-in emitters, countermeasures and scenarios
#[derive(Debug, Clone)]
pub struct SampleCatalog {
    emitters: Vec<Emitter>,
    countermeasures: Vec<Countermeasure>,
    scenarios: Vec<Scenario>,
}

impl SampleCatalog {
    /// Build the catalog; ids are assigned once here and stay stable for the
    /// life of the process.
    pub fn builtin() -> Self {
        let now = Utc::now();

        let emitters = EMITTERS
            .iter()
            .map(|seed| Emitter {
                id: uuid::Uuid::new_v4().to_string(),
                name: seed.name.to_string(),
                emitter_type: seed.emitter_type.to_string(),
                platform: seed.platform.to_string(),
                origin: seed.origin.to_string(),
                threat_level: ThreatLevel::from(seed.threat_level),
                frequency_min: seed.band_mhz.0,
                frequency_max: seed.band_mhz.1,
                prf: seed.prf,
                pulse_width: seed.pulse_width,
                modulation_type: seed.modulation.map(str::to_string),
                latitude: seed.position.0,
                longitude: seed.position.1,
                altitude: 0.0,
                confidence: DEFAULT_CONFIDENCE,
                is_active: true,
                affiliation: seed.affiliation,
                source: Provenance::Simulation,
                last_detected: now,
                created_at: now,
            })
            .collect();

        let countermeasures = COUNTERMEASURES
            .iter()
            .map(|&(name, technique, description, success_rate, cost, threats, side_effects)| {
                Countermeasure {
                    id: uuid::Uuid::new_v4().to_string(),
                    name: name.to_string(),
                    technique_type: technique.to_string(),
                    description: description.to_string(),
                    success_rate,
                    resource_cost: cost.to_string(),
                    applicable_threats: threats.iter().map(|t| t.to_string()).collect(),
                    side_effects: side_effects.map(str::to_string),
                }
            })
            .collect();

        Self {
            emitters,
            countermeasures,
            scenarios: builtin_scenarios(),
        }
    }

    pub fn emitters(&self) -> &[Emitter] {
        &self.emitters
    }

    pub fn countermeasures(&self) -> &[Countermeasure] {
        &self.countermeasures
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn emitter(&self, id: &str) -> Option<&Emitter> {
        self.emitters.iter().find(|e| e.id == id)
    }

    pub fn emitter_by_name(&self, name: &str) -> Option<&Emitter> {
        self.emitters.iter().find(|e| e.name == name)
    }

    pub fn scenario(&self, id: &str) -> Result<&Scenario> {
        self.scenarios
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| CatalogError::NotFound(format!("scenario {}", id)))
    }

    /// Resolve a scenario's emitter names; unknown names are skipped.
    pub fn scenario_emitters(&self, scenario: &Scenario) -> Vec<Emitter> {
        scenario
            .emitters
            .iter()
            .filter_map(|name| self.emitter_by_name(name))
            .cloned()
            .collect()
    }
}

/// Countermeasures applicable to `threat_type`, best success rate first
pub fn recommend_countermeasures(
    countermeasures: &[Countermeasure],
    threat_type: &str,
) -> Vec<Countermeasure> {
    let mut matches: Vec<Countermeasure> = countermeasures
        .iter()
        .filter(|cm| cm.applies_to(threat_type))
        .cloned()
        .collect();
    matches.sort_by(|a, b| b.success_rate.total_cmp(&a.success_rate));
    matches
}

fn builtin_scenarios() -> Vec<Scenario> {
    let scenario = |id: &str, name: &str, description: &str, region: &str, lat: f64, lng: f64, zoom: u8, emitters: &[&str], summary: &str| Scenario {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        region: region.to_string(),
        center_lat: lat,
        center_lng: lng,
        zoom,
        emitters: emitters.iter().map(|e| e.to_string()).collect(),
        threat_summary: summary.to_string(),
    };

    vec![
        scenario(
            "northern-strait",
            "Northern Strait Transit",
            "Blue task group transits a contested strait under surface and missile radar coverage",
            "Northern Strait",
            25.0,
            121.0,
            7,
            &[
                "Kestrel-class Frigate Search Radar",
                "Longwatch Early Warning Array",
                "Harrier-9 Terminal Seeker",
                "Blue Task Group Volume Search",
                "Overwatch AEW Orbit",
            ],
            "Dense surface radar picture with an active terminal seeker",
        ),
        scenario(
            "river-corridor",
            "River Corridor Drone Activity",
            "Mixed commercial and military UAV links near a long-range SAM site",
            "River Corridor",
            50.45,
            30.52,
            10,
            &[
                "Commercial Quadcopter Control Link",
                "Loiter Drone Datalink",
                "Long-Range SAM Engagement Radar",
            ],
            "UAV datalinks inside an engagement envelope",
        ),
        scenario(
            "northern-sea",
            "Northern Sea Patrol",
            "Maritime patrol with airborne jamming and neutral shipping",
            "Northern Sea",
            57.0,
            20.0,
            6,
            &["Barrage Jammer Pod", "Merchant Navigation Radar"],
            "Stand-off jamming against a cluttered maritime picture",
        ),
    ]
}
