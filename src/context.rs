//! Context window estimation from the tail of a session transcript.
//!
//! Claude's own system warnings are trusted first, then real token counts
//! from recent assistant messages, then a rough estimate from conversation
//! depth and text length.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::models::{ContextInfo, ContextMethod, ContextWarning, TranscriptLine};

static CONTEXT_LOW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Context low \((\d+)% remaining\)").unwrap());
static CONTEXT_AUTO_COMPACT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Context left until auto-compact: (\d+)%").unwrap());

const TAIL_LINES: usize = 30;
const USAGE_MESSAGES: usize = 5;
const ESTIMATE_MESSAGES: usize = 15;

pub fn parse_context_from_transcript(path: Option<&Path>, context_limit: u64) -> ContextInfo {
    let Some(path) = path else {
        return ContextInfo::fallback(ContextMethod::NoTranscript);
    };
    if !path.exists() {
        return ContextInfo::fallback(ContextMethod::FileMissing);
    }
    match fs::read_to_string(path) {
        Ok(text) => context_from_lines(text.lines(), context_limit),
        Err(err) => {
            debug!(path = %path.display(), error = %err, "cannot read transcript");
            ContextInfo::fallback(ContextMethod::Error)
        }
    }
}

/// Estimate context usage from transcript lines (oldest first).
pub fn context_from_lines<'a, I>(lines: I, context_limit: u64) -> ContextInfo
where
    I: IntoIterator<Item = &'a str>,
{
    let all: Vec<&str> = lines.into_iter().collect();
    let start = all.len().saturating_sub(TAIL_LINES);
    // Newest first; undecodable lines drop out here
    let recent: Vec<TranscriptLine> = all[start..]
        .iter()
        .rev()
        .filter_map(|l| serde_json::from_str(l.trim()).ok())
        .collect();

    if let Some(info) = system_warning(&recent) {
        return info;
    }
    if let Some(info) = real_tokens(&recent, context_limit) {
        return info;
    }
    if let Some(info) = depth_estimate(&recent) {
        return info;
    }
    ContextInfo::fallback(ContextMethod::Default)
}

fn system_warning(recent: &[TranscriptLine]) -> Option<ContextInfo> {
    for line in recent.iter().filter(|l| l.is_type("system_message")) {
        let content = line.content_str().unwrap_or("");
        let hit = CONTEXT_LOW_RE
            .captures(content)
            .map(|c| (c, ContextWarning::Low))
            .or_else(|| {
                CONTEXT_AUTO_COMPACT_RE
                    .captures(content)
                    .map(|c| (c, ContextWarning::AutoCompact))
            });
        if let Some((caps, warning)) = hit {
            let Ok(left) = caps[1].parse::<u32>() else {
                continue;
            };
            return Some(ContextInfo {
                percent: 100.0 - f64::from(left),
                warning: Some(warning),
                accurate: true,
                ..ContextInfo::fallback(ContextMethod::ClaudeSystem)
            });
        }
    }
    None
}

fn real_tokens(recent: &[TranscriptLine], context_limit: u64) -> Option<ContextInfo> {
    let mut max_tokens = 0u64;
    let mut cache_tokens = 0u64;
    let usages = recent
        .iter()
        .filter(|l| l.is_type("assistant"))
        .filter_map(|l| l.usage())
        .filter(|u| !u.is_empty())
        .take(USAGE_MESSAGES);
    for usage in usages {
        let current = usage.context_tokens();
        if current > max_tokens {
            max_tokens = current;
            cache_tokens = usage.cache_tokens();
        }
    }
    if max_tokens == 0 {
        return None;
    }
    let limit = context_limit.max(1) as f64;
    let percent = (max_tokens as f64 / limit * 100.0).min(99.0);
    let method = if cache_tokens > 0 {
        ContextMethod::RealTokensWithCache
    } else {
        ContextMethod::RealTokensBasic
    };
    Some(ContextInfo {
        percent,
        accurate: true,
        tokens_used: Some(max_tokens),
        cache_tokens: (cache_tokens > 0).then_some(cache_tokens),
        ..ContextInfo::fallback(method)
    })
}

fn depth_estimate(recent: &[TranscriptLine]) -> Option<ContextInfo> {
    let conversation: Vec<&TranscriptLine> = recent
        .iter()
        .filter(|l| l.is_type("assistant") || l.is_type("user"))
        .take(ESTIMATE_MESSAGES)
        .collect();
    if conversation.is_empty() {
        return None;
    }
    let depth = conversation.len();
    let content_length: usize = conversation
        .iter()
        .filter_map(|l| l.message.as_ref())
        .map(|m| m.text_len())
        .sum();
    let base = (depth as f64 * 1.5).min(20.0);
    let content_factor = (content_length as f64 / 1000.0).min(30.0);
    Some(ContextInfo {
        percent: (base + content_factor).min(85.0),
        messages: Some(depth),
        content_length: Some(content_length),
        ..ContextInfo::fallback(ContextMethod::EnhancedEstimate)
    })
}
