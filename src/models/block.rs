use crate::models::event::UsageEvent;
use chrono::{DateTime, Duration, Timelike, Utc};

use crate::utils::WINDOW_DURATION_HOURS;

/// A fixed-length usage window opened by its first event.
#[derive(Clone, Debug)]
pub struct UsageBlock {
    /// RFC 3339 rendering of `start`
    pub id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub entries: Vec<UsageEvent>,
    pub total_tokens: u64,
    pub is_active: bool,
}

impl UsageBlock {
    /// Open an empty block for an event at `ts`; the start is floored to the hour.
    pub fn open_at(ts: DateTime<Utc>) -> Self {
        let start = floor_to_hour(ts);
        Self {
            id: start.to_rfc3339(),
            start,
            end: start + Duration::hours(WINDOW_DURATION_HOURS),
            entries: Vec::new(),
            total_tokens: 0,
            is_active: false,
        }
    }

    pub fn push(&mut self, event: UsageEvent) {
        self.total_tokens = self.total_tokens.saturating_add(event.total_tokens());
        self.entries.push(event);
    }

    /// Timestamp of the most recent entry, if any.
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.entries.last().map(|e| e.timestamp)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Truncate to the start of the hour in UTC. A timestamp logged with a
/// half-hour offset (`15:45+05:30`) floors to `10:00Z`, not to its own
/// local hour (`15:00+05:30`, i.e. `09:30Z`).
pub fn floor_to_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_minute(0)
        .and_then(|d| d.with_second(0))
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(ts)
}
