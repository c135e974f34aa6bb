//! Emitter store
//!
//! In-process document store for operator-entered and scenario emitters,
//! plus the countermeasure library. When nothing has been stored the
//! built-in sample set stands in, so the dashboard always has data.

use emitter_catalog::{
    Affiliation, Countermeasure, Emitter, EmitterFilter, Provenance, SampleCatalog,
};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub tracked: usize,
    pub hostile: usize,
    pub friendly: usize,
}

pub struct EmitterStore {
    samples: Arc<SampleCatalog>,
    emitters: RwLock<Vec<Emitter>>,
    countermeasures: RwLock<Vec<Countermeasure>>,
}

impl EmitterStore {
    pub fn new(samples: Arc<SampleCatalog>) -> Self {
        Self {
            samples,
            emitters: RwLock::new(Vec::new()),
            countermeasures: RwLock::new(Vec::new()),
        }
    }

    /// Stored emitters matching `filter`, or the matching samples if the
    /// store is empty.
    pub fn list(&self, filter: &EmitterFilter) -> Vec<Emitter> {
        let emitters = self.emitters.read();
        let source: &[Emitter] = if emitters.is_empty() {
            self.samples.emitters()
        } else {
            &emitters
        };

        source.iter().filter(|e| filter.matches(e)).cloned().collect()
    }

    /// Looks up samples only while the store is empty, matching `list`.
    pub fn get(&self, id: &str) -> Option<Emitter> {
        let emitters = self.emitters.read();
        if emitters.is_empty() {
            return self.samples.emitter(id).cloned();
        }
        emitters.iter().find(|e| e.id == id).cloned()
    }

    pub fn insert(&self, emitter: Emitter) {
        debug!("Stored emitter {} ({})", emitter.name, emitter.id);
        self.emitters.write().push(emitter);
    }

    /// Returns `false` if no stored emitter has `id`. Samples cannot be removed.
    pub fn remove(&self, id: &str) -> bool {
        let mut emitters = self.emitters.write();
        let before = emitters.len();
        emitters.retain(|e| e.id != id);
        emitters.len() != before
    }

    /// Drop every simulation emitter and load copies of `templates` in their
    /// place, each with a fresh id. Operator emitters are kept. Returns the
    /// number loaded.
    pub fn replace_simulation(&self, templates: &[Emitter]) -> usize {
        let mut emitters = self.emitters.write();
        emitters.retain(|e| e.source != Provenance::Simulation);
        emitters.extend(templates.iter().map(|e| e.reissue(Provenance::Simulation)));
        templates.len()
    }

    /// Load the sample countermeasures if none are stored yet. Returns the
    /// number added.
    pub fn seed_countermeasures(&self) -> usize {
        let mut countermeasures = self.countermeasures.write();
        if !countermeasures.is_empty() {
            return 0;
        }
        countermeasures.extend_from_slice(self.samples.countermeasures());
        info!("Seeded {} countermeasures", countermeasures.len());
        countermeasures.len()
    }

    pub fn countermeasures(&self) -> Vec<Countermeasure> {
        self.countermeasures.read().clone()
    }

    pub fn stats(&self) -> StoreStats {
        let effective = self.list(&EmitterFilter::default());
        StoreStats {
            tracked: effective.len(),
            hostile: effective
                .iter()
                .filter(|e| e.affiliation == Affiliation::Hostile)
                .count(),
            friendly: effective
                .iter()
                .filter(|e| e.affiliation == Affiliation::Friendly)
                .count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emitter_catalog::{NewEmitter, ThreatLevel};

    fn store() -> EmitterStore {
        EmitterStore::new(Arc::new(SampleCatalog::builtin()))
    }

    fn operator_emitter(name: &str, affiliation: Affiliation) -> Emitter {
        NewEmitter {
            name: name.to_string(),
            emitter_type: "radar".to_string(),
            platform: "ground".to_string(),
            origin: "unknown".to_string(),
            threat_level: ThreatLevel::Medium,
            frequency_min: 2900.0,
            frequency_max: 3100.0,
            prf: None,
            pulse_width: None,
            modulation_type: None,
            latitude: 10.0,
            longitude: 20.0,
            altitude: None,
            confidence: 0.7,
            affiliation,
        }
        .into_emitter(Provenance::Operator)
    }

    #[test]
    fn test_empty_store_falls_back_to_samples() {
        let store = store();
        let all = store.list(&EmitterFilter::default());
        assert_eq!(all.len(), 10);

        let hostile = store.list(&EmitterFilter::hostile());
        assert!(!hostile.is_empty());
        assert!(hostile.iter().all(|e| e.affiliation == Affiliation::Hostile));
    }

    #[test]
    fn test_stored_emitters_shadow_samples() {
        let store = store();
        store.insert(operator_emitter("Site Alpha", Affiliation::Unknown));

        let all = store.list(&EmitterFilter::default());
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Site Alpha");
        assert!(store.list(&EmitterFilter::hostile()).is_empty());
    }

    #[test]
    fn test_get_falls_back_only_while_empty() {
        let catalog = Arc::new(SampleCatalog::builtin());
        let store = EmitterStore::new(catalog.clone());
        let sample = &catalog.emitters()[0];
        assert_eq!(store.get(&sample.id).as_ref(), Some(sample));

        let stored = operator_emitter("Site Bravo", Affiliation::Hostile);
        let stored_id = stored.id.clone();
        store.insert(stored);

        assert_eq!(store.get(&stored_id).unwrap().name, "Site Bravo");
        assert!(store.get(&sample.id).is_none());
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn test_deleted_scenario_emitter_stays_deleted() {
        let catalog = Arc::new(SampleCatalog::builtin());
        let store = EmitterStore::new(catalog.clone());
        store.replace_simulation(&catalog.emitters()[5..8]);

        let loaded = store.list(&EmitterFilter::default());
        assert!(loaded.iter().all(|e| catalog.emitter(&e.id).is_none()));

        let id = loaded[0].id.clone();
        assert!(store.remove(&id));
        assert!(store.get(&id).is_none());
        assert!(!store.remove(&id));
    }

    #[test]
    fn test_remove() {
        let store = store();
        let emitter = operator_emitter("Site Charlie", Affiliation::Hostile);
        let id = emitter.id.clone();
        store.insert(emitter);

        assert!(store.remove(&id));
        assert!(!store.remove(&id));
    }

    #[test]
    fn test_replace_simulation_keeps_operator_entries() {
        let catalog = Arc::new(SampleCatalog::builtin());
        let store = EmitterStore::new(catalog.clone());
        store.insert(operator_emitter("Site Delta", Affiliation::Friendly));

        assert_eq!(store.replace_simulation(&catalog.emitters()[..3]), 3);
        assert_eq!(store.list(&EmitterFilter::default()).len(), 4);

        assert_eq!(store.replace_simulation(&catalog.emitters()[5..7]), 2);

        let all = store.list(&EmitterFilter::default());
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].name, "Site Delta");
        assert_eq!(all[0].source, Provenance::Operator);
    }

    #[test]
    fn test_seed_countermeasures_once() {
        let store = store();
        assert!(store.countermeasures().is_empty());
        assert_eq!(store.seed_countermeasures(), 5);
        assert_eq!(store.seed_countermeasures(), 0);
        assert_eq!(store.countermeasures().len(), 5);
    }

    #[test]
    fn test_stats_over_effective_list() {
        let store = store();
        let stats = store.stats();
        assert_eq!(stats.tracked, 10);
        assert_eq!(stats.hostile, 6);
        assert_eq!(stats.friendly, 2);

        store.insert(operator_emitter("Site Echo", Affiliation::Hostile));
        assert_eq!(
            store.stats(),
            StoreStats {
                tracked: 1,
                hostile: 1,
                friendly: 0
            }
        );
    }
}
