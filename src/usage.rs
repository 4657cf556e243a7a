//! # Usage Module
//!
//! Turns Claude Code JSONL logs into rolling 5-hour usage blocks.
//!
//! ## Key Functions
//!
//! - `scan_usage`: Reads every log file under the Claude data directories
//! - `ingest`: Decodes, filters and deduplicates raw log lines into events
//! - `build_blocks`: Groups events into 5-hour blocks, closing early on idle gaps
//! - `select_active`: Marks live blocks and picks the one that represents "now"
//!
//! Every stage is best effort. Malformed lines, bad timestamps and unreadable
//! files are skipped; an empty result is reported as "no data", never as an error.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::models::{TranscriptLine, UsageBlock, UsageEvent};
use crate::utils::{
    ACTIVE_RECENCY_MINUTES, IDLE_GAP_HOURS, LOOKBACK_HOURS, MIN_ACTIVE_ENTRIES, TOKEN_BUDGET,
};

/// Runtime knobs for one aggregation run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UsageConfig {
    /// Events older than `now - lookback` are ignored
    pub lookback: Duration,
    /// Denominator for the usage ratio
    pub token_budget: f64,
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            lookback: Duration::hours(LOOKBACK_HOURS),
            token_budget: TOKEN_BUDGET,
        }
    }
}

/// Why a log line did not become a usage event.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IngestError {
    #[error("line is not valid JSON")]
    InvalidJson,
    #[error("not an assistant record")]
    NotAssistant,
    #[error("missing timestamp")]
    MissingTimestamp,
    #[error("unparseable timestamp {0:?}")]
    InvalidTimestamp(String),
    #[error("older than lookback cutoff")]
    OutsideLookback,
    #[error("duplicate of {0}")]
    Duplicate(String),
    #[error("no usage object")]
    NoUsage,
    #[error("zero input and output tokens")]
    ZeroTokens,
}

/// Outcome of active-block selection.
#[derive(Debug, Clone, Copy)]
pub enum WindowSelection<'a> {
    Active(&'a UsageBlock),
    Expired(&'a UsageBlock),
    NoData,
}

impl<'a> WindowSelection<'a> {
    pub fn block(&self) -> Option<&'a UsageBlock> {
        match *self {
            Self::Active(b) | Self::Expired(b) => Some(b),
            Self::NoData => None,
        }
    }
}

/// Parse an ISO-8601 timestamp; offset-less values are read as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Decode one log line into an event, without dedup (see [`Ingestor`]).
pub fn parse_usage_line(line: &str, cutoff: DateTime<Utc>) -> Result<UsageEvent, IngestError> {
    let parsed: TranscriptLine =
        serde_json::from_str(line.trim()).map_err(|_| IngestError::InvalidJson)?;
    if !parsed.is_type("assistant") {
        return Err(IngestError::NotAssistant);
    }
    let raw_ts = parsed
        .timestamp
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or(IngestError::MissingTimestamp)?;
    let timestamp =
        parse_timestamp(raw_ts).ok_or_else(|| IngestError::InvalidTimestamp(raw_ts.to_string()))?;
    if timestamp < cutoff {
        return Err(IngestError::OutsideLookback);
    }

    let dedup_key = match (parsed.effective_message_id(), parsed.effective_request_id()) {
        (Some(mid), Some(rid)) if !mid.is_empty() && !rid.is_empty() => {
            Some(format!("{mid}:{rid}"))
        }
        _ => None,
    };

    let usage = parsed
        .usage()
        .filter(|u| !u.is_empty())
        .ok_or(IngestError::NoUsage)?;
    let input_tokens = usage.input_tokens.unwrap_or(0);
    let output_tokens = usage.output_tokens.unwrap_or(0);

    Ok(UsageEvent {
        timestamp,
        input_tokens,
        output_tokens,
        dedup_key,
    })
}

/// Accumulates events from any number of log sources through one dedup set.
///
/// The first event accepted for a dedup key wins. A key is only remembered
/// once its event is accepted, so a zero-token line never shadows a later
/// real one.
#[derive(Debug)]
pub struct Ingestor {
    cutoff: DateTime<Utc>,
    seen: HashSet<String>,
    events: Vec<UsageEvent>,
    skipped: usize,
}

impl Ingestor {
    pub fn new(now: DateTime<Utc>, lookback: Duration) -> Self {
        Self {
            cutoff: now - lookback,
            seen: HashSet::new(),
            events: Vec::new(),
            skipped: 0,
        }
    }

    /// Feed one raw line. Returns the skip reason when the line is dropped.
    pub fn push_line(&mut self, line: &str) -> Result<(), IngestError> {
        let result = self.accept(line);
        if let Err(ref reason) = result {
            self.skipped += 1;
            trace!(%reason, "skipped log line");
        }
        result
    }

    fn accept(&mut self, line: &str) -> Result<(), IngestError> {
        if line.trim().is_empty() {
            return Err(IngestError::InvalidJson);
        }
        let event = parse_usage_line(line, self.cutoff)?;
        if let Some(key) = event.dedup_key.as_deref() {
            if self.seen.contains(key) {
                return Err(IngestError::Duplicate(key.to_string()));
            }
        }
        if event.input_tokens == 0 && event.output_tokens == 0 {
            return Err(IngestError::ZeroTokens);
        }
        if let Some(key) = event.dedup_key.clone() {
            self.seen.insert(key);
        }
        self.events.push(event);
        Ok(())
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events in arrival order; [`build_blocks`] sorts them.
    pub fn finish(self) -> Vec<UsageEvent> {
        debug!(
            accepted = self.events.len(),
            skipped = self.skipped,
            "ingest finished"
        );
        self.events
    }
}

/// Decode, filter and deduplicate raw lines from one or more logs.
pub fn ingest<I, S>(lines: I, now: DateTime<Utc>, lookback: Duration) -> Vec<UsageEvent>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut ingestor = Ingestor::new(now, lookback);
    for line in lines {
        let _ = ingestor.push_line(line.as_ref());
    }
    ingestor.finish()
}

/// Group events into blocks in one chronological pass.
///
/// A new block starts when there is no open block, when the event is at or
/// past the open block's end, or when it follows the block's last entry by
/// at least the idle gap. The two time clauses are independent: one caps
/// block length, the other ends a block after a silence.
pub fn build_blocks(mut events: Vec<UsageEvent>) -> Vec<UsageBlock> {
    events.sort_by_key(|e| e.timestamp);
    let idle_gap = Duration::hours(IDLE_GAP_HOURS);

    let mut blocks: Vec<UsageBlock> = Vec::new();
    let mut current: Option<UsageBlock> = None;

    for event in events {
        let needs_new = match current.as_ref() {
            None => true,
            Some(block) => {
                event.timestamp >= block.end
                    || block
                        .last_activity()
                        .map(|last| event.timestamp - last >= idle_gap)
                        .unwrap_or(false)
            }
        };
        if needs_new {
            if let Some(done) = current.take() {
                if !done.is_empty() {
                    blocks.push(done);
                }
            }
            current = Some(UsageBlock::open_at(event.timestamp));
        }
        if let Some(block) = current.as_mut() {
            block.push(event);
        }
    }
    if let Some(done) = current {
        if !done.is_empty() {
            blocks.push(done);
        }
    }
    debug!(blocks = blocks.len(), "built usage blocks");
    blocks
}

/// Whether `block` counts as live usage at `now`.
pub fn is_block_active(block: &UsageBlock, now: DateTime<Utc>) -> bool {
    let recent = block
        .last_activity()
        .map(|last| now - last <= Duration::minutes(ACTIVE_RECENCY_MINUTES))
        .unwrap_or(false);
    block.end > now && block.entries.len() >= MIN_ACTIVE_ENTRIES && recent
}

/// Mark `is_active` on every block, then pick the block that represents now.
///
/// The latest-starting active block wins. With no active block the
/// latest-starting block is reported as expired; with no blocks, no data.
pub fn select_active(blocks: &mut [UsageBlock], now: DateTime<Utc>) -> WindowSelection<'_> {
    for block in blocks.iter_mut() {
        block.is_active = is_block_active(block, now);
    }
    let blocks: &[UsageBlock] = blocks;
    if let Some(active) = blocks
        .iter()
        .filter(|b| b.is_active)
        .max_by_key(|b| b.start)
    {
        return WindowSelection::Active(active);
    }
    match blocks.iter().max_by_key(|b| b.start) {
        Some(latest) => WindowSelection::Expired(latest),
        None => WindowSelection::NoData,
    }
}

/// Ingest raw lines and build blocks (activity is not marked yet).
pub fn aggregate<I, S>(lines: I, now: DateTime<Utc>, config: &UsageConfig) -> Vec<UsageBlock>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    build_blocks(ingest(lines, now, config.lookback))
}

/// JSONL files at `<base>/*.jsonl` and `<base>/projects/*/*.jsonl`.
pub fn find_log_files(base: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let roots = [(base.to_path_buf(), 1), (base.join("projects"), 2)];
    for (root, depth) in roots {
        if !root.is_dir() {
            continue;
        }
        for entry in WalkDir::new(&root)
            .min_depth(depth)
            .max_depth(depth)
            .sort_by_file_name()
            .into_iter()
            .flatten()
        {
            let path = entry.path();
            if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "jsonl") {
                files.push(path.to_path_buf());
            }
        }
    }
    files
}

/// Read every log file under `paths` into one deduplicated event list.
pub fn scan_usage(paths: &[PathBuf], now: DateTime<Utc>, config: &UsageConfig) -> Vec<UsageEvent> {
    let mut ingestor = Ingestor::new(now, config.lookback);
    let mut files_read = 0usize;
    for base in paths {
        for path in find_log_files(base) {
            let file = match File::open(&path) {
                Ok(f) => f,
                Err(err) => {
                    debug!(path = %path.display(), error = %err, "cannot open log file");
                    continue;
                }
            };
            files_read += 1;
            let reader = BufReader::new(file);
            for line in reader.lines() {
                let line = match line {
                    Ok(l) => l,
                    Err(_) => continue,
                };
                let _ = ingestor.push_line(&line);
            }
        }
    }
    debug!(
        files = files_read,
        events = ingestor.len(),
        skipped = ingestor.skipped(),
        "scanned usage logs"
    );
    ingestor.finish()
}
