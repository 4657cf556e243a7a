//! # Context Monitor
//!
//! A Claude Code statusline that shows where the current conversation sits in
//! its context window and where the account sits in its rolling 5-hour usage
//! block.
//!
//! ## Overview
//!
//! Usage events are read from the JSONL logs under the Claude data
//! directories, deduplicated, and grouped into 5-hour blocks that also close
//! after a 2-hour idle gap. The block that is still open, has at least three
//! entries and saw activity in the last 30 minutes is the active one; its end
//! is the reset time and its token total over the budget is the usage ratio.
//!
//! ## Features
//!
//! - `git` (default): Enables repository inspection via gix
//! - `colors` (default): Enables terminal color output via owo-colors

/// Command-line argument parsing and configuration
pub mod cli;

/// Context window estimation from the session transcript
pub mod context;

/// Status line segments and JSON output
pub mod display;

/// Git repository inspection (feature-gated)
#[cfg(feature = "git")]
pub mod git;

/// Data models for hooks, log lines, events, blocks, and Git info
pub mod models;

/// Event ingestion, block construction and active-block selection
pub mod usage;

/// Constants, paths, env parsing and formatting helpers
pub mod utils;

/// Derived window metrics and the summary record
pub mod window;
