use chrono::Duration;
use std::env;
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::Args;
use crate::usage::UsageConfig;

// Window constants shared with Claude usage monitors. Changing any of these
// changes which block is reported as current, so they stay fixed; only the
// lookback and budget can be overridden at runtime.
pub const LOOKBACK_HOURS: i64 = 192;
pub const WINDOW_DURATION_HOURS: i64 = 5;
pub const IDLE_GAP_HOURS: i64 = 2;
pub const MIN_ACTIVE_ENTRIES: usize = 3;
pub const ACTIVE_RECENCY_MINUTES: i64 = 30;
pub const TOKEN_BUDGET: f64 = 88_000.0;

pub const DEFAULT_CONTEXT_LIMIT: u64 = 200_000;
const EXTENDED_CONTEXT_LIMIT: u64 = 1_000_000;

/// Claude data directories to scan. An explicit comma-separated list wins;
/// otherwise `~/.claude` and the XDG `claude` config dir, when present.
pub fn claude_paths(override_env: Option<&str>) -> Vec<PathBuf> {
    let mut paths = vec![];
    if let Some(list) = override_env {
        for p in list.split(',') {
            let p = p.trim();
            if p.is_empty() {
                continue;
            }
            let pb = PathBuf::from(p);
            if pb.is_dir() {
                paths.push(pb);
            }
        }
        if !paths.is_empty() {
            return paths;
        }
    }
    let basedirs = directories::BaseDirs::new();
    let home = basedirs
        .as_ref()
        .map(|b| b.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~"));
    let xdg_config = basedirs
        .as_ref()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| home.join(".config"));
    for base in [home.join(".claude"), xdg_config.join("claude")] {
        if base.is_dir() && !paths.contains(&base) {
            paths.push(base);
        }
    }
    paths
}

pub fn read_stdin() -> anyhow::Result<Vec<u8>> {
    let mut buf = Vec::new();
    std::io::stdin().read_to_end(&mut buf)?;
    Ok(buf)
}

/// Four-cell progress bar; partial cells round down.
pub fn progress_bar(percent: f64, segments: usize) -> String {
    let ratio = (percent / 100.0).clamp(0.0, 1.0);
    let filled = ((ratio * segments as f64) as usize).min(segments);
    format!("{}{}", "█".repeat(filled), "▁".repeat(segments - filled))
}

pub(crate) fn parse_bool_env(var: &str) -> bool {
    if let Ok(val) = env::var(var) {
        let trimmed = val.trim();
        trimmed == "1" || trimmed.eq_ignore_ascii_case("true")
    } else {
        false
    }
}

pub(crate) fn parse_u64_env(var: &str) -> Option<u64> {
    env::var(var)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
}

// CLAUDE_CONTEXT_LIMIT always wins; a "[1m]" tag in the display name means
// the extended 1M context; everything else gets 200k.
pub fn context_limit_for_display(display_name: &str) -> u64 {
    if let Some(v) = parse_u64_env("CLAUDE_CONTEXT_LIMIT") {
        if v > 0 {
            return v;
        }
    }
    let dn = display_name.to_lowercase();
    if dn.contains("[1m]") || (dn.contains("1m") && dn.contains("context")) {
        return EXTENDED_CONTEXT_LIMIT;
    }
    DEFAULT_CONTEXT_LIMIT
}

pub fn colors_enabled() -> bool {
    env::var_os("NO_COLOR").is_none()
}

/// Resolve runtime knobs: CLI flags (which already fold in their env vars) over defaults.
pub fn resolve_usage_config(args: &Args) -> UsageConfig {
    let mut config = UsageConfig::default();
    if let Some(hours) = args.lookback_hours {
        if hours > 0 {
            config.lookback = Duration::hours(hours as i64);
        }
    }
    if let Some(budget) = args.token_budget {
        if budget > 0 {
            config.token_budget = budget as f64;
        }
    }
    config
}

/// Logs go to stderr; stdout carries the status line.
pub fn setup_tracing(debug: bool) {
    let filter = if debug || parse_bool_env("CLAUDE_DEBUG") {
        EnvFilter::new("context_monitor=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .try_init();
}
