//! # Window Module
//!
//! Derived metrics for the block picked by `usage::select_active`, shaped as
//! the record the status line and `--json` output consume.

use chrono::{DateTime, TimeZone, Utc};
use std::fmt::Display;

use crate::models::UsageBlock;
use crate::usage::{UsageConfig, WindowSelection, aggregate, select_active};

/// Which of the three outcomes the snapshot landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    Active,
    Expired,
    NoData,
}

impl WindowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
            Self::NoData => "no_data",
        }
    }
}

/// Usage summary for the current (or most recent) block.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSummary {
    pub state: WindowState,
    /// Block end in the caller's timezone, `HH:MM`
    pub reset_time_local: Option<String>,
    pub total_tokens: Option<u64>,
    /// `total_tokens / budget`, not clamped
    pub usage_ratio: Option<f64>,
    /// `usage_ratio * 100`, not clamped
    pub usage_percent: Option<f64>,
    pub block_id: Option<String>,
    pub block_start: Option<DateTime<Utc>>,
    pub block_end: Option<DateTime<Utc>>,
    pub last_activity: Option<DateTime<Utc>>,
    pub entry_count: Option<usize>,
    /// Number of blocks built in this run
    pub session_blocks: usize,
}

impl WindowSummary {
    pub fn no_data() -> Self {
        Self {
            state: WindowState::NoData,
            reset_time_local: None,
            total_tokens: None,
            usage_ratio: None,
            usage_percent: None,
            block_id: None,
            block_start: None,
            block_end: None,
            last_activity: None,
            entry_count: None,
            session_blocks: 0,
        }
    }

    pub fn from_selection<Tz>(
        selection: WindowSelection<'_>,
        session_blocks: usize,
        token_budget: f64,
        tz: &Tz,
    ) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let Some(block) = selection.block() else {
            return Self {
                session_blocks,
                ..Self::no_data()
            };
        };
        let state = match selection {
            WindowSelection::Active(_) => WindowState::Active,
            _ => WindowState::Expired,
        };
        let ratio = usage_ratio(block.total_tokens, token_budget);
        Self {
            state,
            reset_time_local: Some(format_reset_time(block.end, tz)),
            total_tokens: Some(block.total_tokens),
            usage_ratio: Some(ratio),
            usage_percent: Some(ratio * 100.0),
            block_id: Some(block.id.clone()),
            block_start: Some(block.start),
            block_end: Some(block.end),
            last_activity: block.last_activity(),
            entry_count: Some(block.entries.len()),
            session_blocks,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == WindowState::Active
    }

    /// Minutes until the block resets; zero once it has passed.
    pub fn remaining_minutes(&self, now: DateTime<Utc>) -> Option<i64> {
        self.block_end.map(|end| (end - now).num_minutes().max(0))
    }
}

pub fn usage_ratio(total_tokens: u64, token_budget: f64) -> f64 {
    if token_budget > 0.0 {
        total_tokens as f64 / token_budget
    } else {
        0.0
    }
}

pub fn format_reset_time<Tz>(end: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    end.with_timezone(tz).format("%H:%M").to_string()
}

/// Summarise a set of already-built blocks at `now`.
pub fn summarize<Tz>(
    blocks: &mut [UsageBlock],
    now: DateTime<Utc>,
    token_budget: f64,
    tz: &Tz,
) -> WindowSummary
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let count = blocks.len();
    let selection = select_active(blocks, now);
    WindowSummary::from_selection(selection, count, token_budget, tz)
}

/// Full snapshot pipeline over raw log lines: ingest, build, select, summarise.
pub fn evaluate<I, S, Tz>(lines: I, now: DateTime<Utc>, config: &UsageConfig, tz: &Tz) -> WindowSummary
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut blocks = aggregate(lines, now, config);
    summarize(&mut blocks, now, config.token_budget, tz)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UsageEvent;
    use chrono::FixedOffset;

    fn block_with(tokens: u64) -> UsageBlock {
        let ts = Utc.with_ymd_and_hms(2024, 3, 5, 22, 40, 0).unwrap();
        let mut b = UsageBlock::open_at(ts);
        b.push(UsageEvent::new(ts, tokens, 0));
        b
    }

    #[test]
    fn ratio_is_not_capped() {
        assert_eq!(usage_ratio(44_000, 88_000.0), 0.5);
        assert_eq!(usage_ratio(176_000, 88_000.0), 2.0);
        assert_eq!(usage_ratio(10, 0.0), 0.0);
    }

    #[test]
    fn reset_time_uses_given_zone() {
        let b = block_with(1);
        // start floors to 22:00 UTC, end is 03:00 UTC next day
        assert_eq!(format_reset_time(b.end, &Utc), "03:00");
        let plus_five_thirty = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        assert_eq!(format_reset_time(b.end, &plus_five_thirty), "08:30");
    }

    #[test]
    fn expired_summary_keeps_totals() {
        let b = block_with(22_000);
        let s = WindowSummary::from_selection(WindowSelection::Expired(&b), 4, 88_000.0, &Utc);
        assert_eq!(s.state, WindowState::Expired);
        assert_eq!(s.total_tokens, Some(22_000));
        assert_eq!(s.usage_percent, Some(25.0));
        assert_eq!(s.session_blocks, 4);
        assert_eq!(s.entry_count, Some(1));
    }

    #[test]
    fn no_data_summary_is_empty() {
        let s = WindowSummary::from_selection(WindowSelection::NoData, 0, 88_000.0, &Utc);
        assert_eq!(s, WindowSummary::no_data());
        assert_eq!(s.remaining_minutes(Utc::now()), None);
    }

    #[test]
    fn remaining_minutes_clamps_at_zero() {
        let b = block_with(1);
        let s = WindowSummary::from_selection(WindowSelection::Active(&b), 1, 88_000.0, &Utc);
        assert_eq!(s.remaining_minutes(b.end - chrono::Duration::minutes(42)), Some(42));
        assert_eq!(s.remaining_minutes(b.end + chrono::Duration::hours(1)), Some(0));
    }
}
