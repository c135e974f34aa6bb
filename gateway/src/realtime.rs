//! Real-time Battlefield Feed
//!
//! Two pieces:
//! - `SubscriberRegistry`: the set of live subscriber channels, with
//!   fan-out that isolates per-channel failures
//! - `BattlefieldFeed`: the per-subscriber loop that emits one batch of
//!   jittered signal updates per tick
//!
//! Each connected client gets its own loop on its own task. Loops share only
//! the read-only working set and the registry.

use chrono::{DateTime, Utc};
use emitter_catalog::Emitter;
use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use threat_sim::{ConfidenceBounds, SignalGenerator, SignalUpdate, SimError};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, trace, warn};

/// Outbound buffer per subscriber, in messages
pub const SUBSCRIBER_BUFFER: usize = 32;

// ============================================================================
// Wire messages
// ============================================================================

/// Everything pushed to a subscriber, discriminated by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedMessage {
    /// One tick of the live feed
    BattlefieldUpdate {
        data: Vec<SignalUpdate>,
        timestamp: DateTime<Utc>,
    },
    /// A scenario replaced the simulation emitters
    ScenarioActivated {
        scenario_id: String,
        emitters_loaded: usize,
        timestamp: DateTime<Utc>,
    },
}

pub type FeedSender = mpsc::Sender<Arc<FeedMessage>>;
pub type FeedReceiver = mpsc::Receiver<Arc<FeedMessage>>;

pub fn subscriber_channel() -> (FeedSender, FeedReceiver) {
    mpsc::channel(SUBSCRIBER_BUFFER)
}

// ============================================================================
// Subscriber Registry
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Outcome of one fan-out
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BroadcastReport {
    pub delivered: usize,
    /// Receiver gone; expected on disconnect
    pub closed: Vec<SubscriberId>,
    /// Buffer full; the subscriber is not keeping up
    pub lagging: Vec<SubscriberId>,
}

/// Live subscriber channels.
///
/// The lock is only held for map operations and non-blocking sends, never
/// across an await.
#[derive(Default)]
pub struct SubscriberRegistry {
    next_id: AtomicU64,
    channels: RwLock<HashMap<SubscriberId, FeedSender>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, sender: FeedSender) -> SubscriberId {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.channels.write().insert(id, sender);
        id
    }

    /// Returns `false` if `id` was not registered.
    pub fn deregister(&self, id: SubscriberId) -> bool {
        self.channels.write().remove(&id).is_some()
    }

    pub fn contains(&self, id: SubscriberId) -> bool {
        self.channels.read().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.channels.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.read().is_empty()
    }

    /// Offer `message` to every channel. A failing channel never stops
    /// delivery to the rest and is left registered; its own loop removes it.
    pub fn broadcast(&self, message: FeedMessage) -> BroadcastReport {
        let message = Arc::new(message);
        let mut report = BroadcastReport::default();

        let channels = self.channels.read();
        for (&id, sender) in channels.iter() {
            match sender.try_send(Arc::clone(&message)) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Closed(_)) => {
                    debug!("Broadcast skipped closed subscriber {}", id);
                    report.closed.push(id);
                }
                Err(TrySendError::Full(_)) => {
                    warn!("Subscriber {} buffer full, dropped broadcast", id);
                    report.lagging.push(id);
                }
            }
        }

        report
    }
}

// ============================================================================
// Broadcast Loop
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedConfig {
    pub interval: Duration,
    /// Number of emitters observed per batch
    pub working_set: usize,
    pub bounds: ConfidenceBounds,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            working_set: 5,
            bounds: ConfidenceBounds::default(),
        }
    }
}

pub struct BattlefieldFeed {
    interval: Duration,
    working_set: Arc<[Emitter]>,
    generator: SignalGenerator,
    registry: Arc<SubscriberRegistry>,
    batches_sent: AtomicU64,
}

impl BattlefieldFeed {
    /// `emitters` is truncated to `config.working_set`.
    pub fn new(config: FeedConfig, emitters: &[Emitter], registry: Arc<SubscriberRegistry>) -> Self {
        let take = config.working_set.min(emitters.len());
        if take < config.working_set {
            warn!(
                "Feed working set of {} limited to the {} emitters available",
                config.working_set, take
            );
        }
        Self {
            interval: config.interval,
            working_set: emitters[..take].to_vec().into(),
            generator: SignalGenerator::new(config.bounds),
            registry,
            batches_sent: AtomicU64::new(0),
        }
    }

    pub fn working_set(&self) -> &[Emitter] {
        &self.working_set
    }

    /// Total batches delivered across all subscribers
    pub fn batches_sent(&self) -> u64 {
        self.batches_sent.load(Ordering::Relaxed)
    }

    pub fn next_batch<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<FeedMessage, SimError> {
        let data = self.generator.observe_all(&self.working_set, rng)?;
        Ok(FeedMessage::BattlefieldUpdate {
            data,
            timestamp: Utc::now(),
        })
    }

    /// Serve one subscriber until its channel closes.
    ///
    /// The first batch goes out immediately, then one per interval. On exit
    /// the subscriber is removed from the registry. Returns the number of
    /// batches delivered.
    pub async fn stream(&self, id: SubscriberId, sender: FeedSender, mut rng: StdRng) -> u64 {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut delivered = 0u64;

        loop {
            ticker.tick().await;

            let batch = match self.next_batch(&mut rng) {
                Ok(batch) => batch,
                Err(e) => {
                    error!("Feed for {} stopped: {}", id, e);
                    break;
                }
            };

            if sender.send(Arc::new(batch)).await.is_err() {
                debug!("Subscriber {} disconnected after {} batches", id, delivered);
                break;
            }

            delivered += 1;
            self.batches_sent.fetch_add(1, Ordering::Relaxed);
            trace!("Batch {} delivered to {}", delivered, id);
        }

        self.registry.deregister(id);
        delivered
    }
}
