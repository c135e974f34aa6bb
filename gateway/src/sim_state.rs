//! Shared gateway state
//!
//! Built once in `main` and cloned into every handler and connection task.
//! All fields are `Arc`s or `Copy`, so a clone is a handful of refcount bumps.

use emitter_catalog::SampleCatalog;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use threat_sim::{SignalGenerator, ThreatScorer};

use crate::chat::ChatClient;
use crate::config::GatewayConfig;
use crate::realtime::{BattlefieldFeed, SubscriberRegistry};
use crate::store::EmitterStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub catalog: Arc<SampleCatalog>,
    pub store: Arc<EmitterStore>,
    pub subscribers: Arc<SubscriberRegistry>,
    pub feed: Arc<BattlefieldFeed>,
    pub scorer: ThreatScorer,
    pub generator: SignalGenerator,
    pub chat: Arc<ChatClient>,
    pub rng: Arc<RngSource>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(config: GatewayConfig) -> Self {
        let catalog = Arc::new(SampleCatalog::builtin());
        let subscribers = Arc::new(SubscriberRegistry::new());
        let feed = Arc::new(BattlefieldFeed::new(
            config.feed,
            catalog.emitters(),
            subscribers.clone(),
        ));

        Self {
            store: Arc::new(EmitterStore::new(catalog.clone())),
            generator: SignalGenerator::new(config.feed.bounds),
            scorer: ThreatScorer::new(),
            chat: Arc::new(ChatClient::new(config.llm.clone())),
            rng: Arc::new(RngSource::new(config.sim_seed)),
            metrics: Arc::new(Metrics::new()),
            config: Arc::new(config),
            catalog,
            subscribers,
            feed,
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let emitters = self.store.stats();
        MetricsSnapshot {
            emitters_tracked: emitters.tracked,
            hostile_count: emitters.hostile,
            friendly_count: emitters.friendly,
            subscribers: self.subscribers.len(),
            batches_sent: self.feed.batches_sent(),
            assessments_run: self.metrics.assessments(),
            uptime_secs: self.metrics.uptime_secs(),
        }
    }
}

// ============================================================================
// Randomness
// ============================================================================

/// Hands out independent RNGs. With a seed, the n-th RNG is seeded from
/// `seed + n`, so a run is reproducible given the same request order.
#[derive(Debug)]
pub struct RngSource {
    seed: Option<u64>,
    issued: AtomicU64,
}

impl RngSource {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            seed,
            issued: AtomicU64::new(0),
        }
    }

    pub fn next_rng(&self) -> StdRng {
        let n = self.issued.fetch_add(1, Ordering::Relaxed);
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(n)),
            None => StdRng::from_entropy(),
        }
    }
}

// ============================================================================
// Metrics
// ============================================================================

#[derive(Debug)]
pub struct Metrics {
    started: Instant,
    assessments: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            assessments: AtomicU64::new(0),
        }
    }

    pub fn record_assessments(&self, n: usize) {
        self.assessments.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn assessments(&self) -> u64 {
        self.assessments.load(Ordering::Relaxed)
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub emitters_tracked: usize,
    pub hostile_count: usize,
    pub friendly_count: usize,
    pub subscribers: usize,
    pub batches_sent: u64,
    pub assessments_run: u64,
    pub uptime_secs: u64,
}
