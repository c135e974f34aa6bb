//! Notional engagement timeline for the dashboard's event strip

use chrono::{DateTime, Duration, DurationRound, Utc};
use serde::{Deserialize, Serialize};

/// Minutes between consecutive timeline events
pub const EVENT_SPACING_MIN: i64 = 5;

const EVENTS: &[(&str, &str, &str)] = &[
    ("Radar contact detected - frigate search radar", "detection", "critical"),
    ("Tracking initiated on surface group", "tracking", "high"),
    ("New emitter - early warning array active", "detection", "high"),
    ("Terminal seeker active", "engagement", "critical"),
    ("ECM deployed - noise jamming pod", "countermeasure", "info"),
    ("Threat neutralized - decoy success", "resolution", "success"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub event: String,
    pub phase: String,
    pub severity: String,
    /// Minutes relative to `now` (zero or negative)
    pub offset_minutes: i64,
}

/// Newest event first, each `EVENT_SPACING_MIN` minutes older than the last,
/// anchored at `now` truncated to the minute.
pub fn threat_timeline(now: DateTime<Utc>) -> Vec<TimelineEvent> {
    let anchor = now.duration_trunc(Duration::minutes(1)).unwrap_or(now);

    EVENTS
        .iter()
        .enumerate()
        .map(|(i, &(event, phase, severity))| {
            let offset_minutes = -(i as i64) * EVENT_SPACING_MIN;
            TimelineEvent {
                id: uuid::Uuid::new_v4().to_string(),
                timestamp: anchor + Duration::minutes(offset_minutes),
                event: event.to_string(),
                phase: phase.to_string(),
                severity: severity.to_string(),
                offset_minutes,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_timeline_spacing() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 45).unwrap();
        let timeline = threat_timeline(now);

        assert_eq!(timeline.len(), EVENTS.len());
        assert_eq!(timeline[0].offset_minutes, 0);
        assert_eq!(timeline[0].timestamp.second(), 0);
        assert_eq!(timeline[0].timestamp.minute(), 30);

        for pair in timeline.windows(2) {
            assert_eq!(pair[0].offset_minutes - pair[1].offset_minutes, EVENT_SPACING_MIN);
            assert_eq!(pair[0].timestamp - pair[1].timestamp, Duration::minutes(EVENT_SPACING_MIN));
        }
    }
}
