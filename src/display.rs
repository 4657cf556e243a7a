use chrono::{DateTime, Local, Utc};
use std::path::Path;

#[cfg(feature = "colors")]
use owo_colors::OwoColorize;

use crate::models::hook::HookWorkspace;
use crate::models::{ContextInfo, ContextWarning, GitInfo, HookJson};
#[cfg(feature = "colors")]
use crate::utils::colors_enabled;
use crate::utils::progress_bar;
use crate::window::{WindowState, WindowSummary};

const BAR_SEGMENTS: usize = 4;
// Usage percent is shown scaled down so a typical heavy block still fits the bar
const USAGE_DISPLAY_SCALE: f64 = 1.5;

/// Terminal tones used by the status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Alert,
    Red,
    Orange,
    Yellow,
    Green,
    Folder,
    Muted,
}

#[cfg(feature = "colors")]
pub fn tint(text: &str, tone: Tone) -> String {
    if !colors_enabled() {
        return text.to_string();
    }
    match tone {
        Tone::Alert => text.red().bold().to_string(),
        Tone::Red => text.red().to_string(),
        Tone::Orange => text.bright_red().to_string(),
        Tone::Yellow => text.yellow().to_string(),
        Tone::Green => text.green().to_string(),
        Tone::Folder => text.bright_yellow().to_string(),
        Tone::Muted => text.bright_black().to_string(),
    }
}

// Plain output when built without the "colors" feature
#[cfg(not(feature = "colors"))]
pub fn tint(text: &str, _tone: Tone) -> String {
    text.to_string()
}

/// Directory relative to the project root, else the last path component.
pub fn directory_display(workspace: &HookWorkspace) -> String {
    let current = workspace.current_dir.as_deref().filter(|s| !s.is_empty());
    let project = workspace.project_dir.as_deref().filter(|s| !s.is_empty());
    match (current, project) {
        (Some(cur), Some(proj)) => match cur.strip_prefix(proj) {
            Some(rest) => {
                let rel = rest.trim_start_matches('/');
                if rel.is_empty() {
                    basename(proj)
                } else {
                    rel.to_string()
                }
            }
            None => basename(cur),
        },
        (None, Some(proj)) => basename(proj),
        (Some(cur), None) => basename(cur),
        (None, None) => "unknown".to_string(),
    }
}

fn basename(p: &str) -> String {
    Path::new(p)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| p.to_string())
}

pub fn git_display(git: Option<&GitInfo>) -> String {
    let Some(gi) = git else {
        return "🌿-".to_string();
    };
    let mut seg = format!("🌿{}", gi.label());
    if let Some(a) = gi.ahead.filter(|a| *a > 0) {
        seg.push_str(&format!("↑{a}"));
    }
    if let Some(b) = gi.behind.filter(|b| *b > 0) {
        seg.push_str(&format!("↓{b}"));
    }
    if gi.is_clean == Some(false) {
        seg.push_str(" *");
    }
    seg
}

fn context_tone(info: &ContextInfo) -> (&'static str, Tone) {
    let pct = info.percent;
    if info.warning.is_some() {
        return ("🔴", Tone::Alert);
    }
    if info.method.is_real_tokens() {
        return match pct {
            p if p >= 90.0 => ("🔴", Tone::Red),
            p if p >= 75.0 => ("🟠", Tone::Orange),
            p if p >= 50.0 => ("🟡", Tone::Yellow),
            _ => ("🟢", Tone::Green),
        };
    }
    let (orange_at, yellow_at) = if info.accurate { (85.0, 70.0) } else { (80.0, 60.0) };
    if pct >= orange_at {
        ("🟠", Tone::Orange)
    } else if pct >= yellow_at {
        ("🟡", Tone::Yellow)
    } else {
        ("🟢", Tone::Green)
    }
}

pub fn context_display(info: &ContextInfo) -> String {
    let (icon, tone) = context_tone(info);
    let bar = tint(&progress_bar(info.percent, BAR_SEGMENTS), tone);
    let marker = if info.method.is_real_tokens() {
        if info.cache_tokens.is_some() { "✓" } else { "" }
    } else if info.accurate {
        ""
    } else {
        "~"
    };
    let tokens = match info.tokens_used {
        Some(t) if t > 0 && info.method.is_real_tokens() => format!(" ({}k)", t / 1000),
        _ => String::new(),
    };
    format!("{icon} {bar} {marker}{:.0}%{tokens}", info.percent)
}

pub fn reset_display(summary: &WindowSummary) -> String {
    match (summary.state, summary.reset_time_local.as_deref()) {
        (WindowState::Expired, _) => "L.R. EXPIRED".to_string(),
        (WindowState::Active, Some(t)) => format!("L.R. @ {t}🕐"),
        _ => "L.R. @ --:--".to_string(),
    }
}

pub fn usage_display(summary: &WindowSummary) -> String {
    match summary.state {
        WindowState::NoData => "C.U. 🔵??%".to_string(),
        WindowState::Expired => format!("C.U. 🔴{}", tint("█████EXP", Tone::Red)),
        WindowState::Active => {
            let percent = summary.usage_percent.unwrap_or(0.0);
            let shown = (percent / USAGE_DISPLAY_SCALE).min(100.0);
            let (icon, tone) = match percent {
                p if p >= 95.0 => ("🔴", Tone::Alert),
                p if p >= 90.0 => ("🔴", Tone::Red),
                p if p >= 75.0 => ("🟠", Tone::Orange),
                p if p >= 60.0 => ("🟡", Tone::Yellow),
                _ => ("🟢", Tone::Green),
            };
            let bar = tint(&progress_bar(shown, BAR_SEGMENTS), tone);
            format!("C.U. {icon} {bar} {shown:.0}%")
        }
    }
}

pub fn clock_display(now: DateTime<Local>) -> String {
    format!("⌚ {}", now.format("%H:%M %b %d"))
}

fn separator() -> String {
    format!(" {} ", tint("|", Tone::Muted))
}

/// `📁 dir git | context | reset usage clock`
pub fn build_status_line(
    hook: &HookJson,
    git: Option<&GitInfo>,
    context: &ContextInfo,
    summary: &WindowSummary,
    now: DateTime<Local>,
) -> String {
    let folder = tint(&format!("📁 {}", directory_display(&hook.workspace)), Tone::Folder);
    let section1 = format!("{folder} {}", git_display(git));
    let section2 = context_display(context);
    let section3 = format!(
        "{} {} {}",
        reset_display(summary),
        usage_display(summary),
        clock_display(now)
    );
    let sep = separator();
    format!("{section1}{sep}{section2}{sep}{section3}")
}

/// Degraded line used when the hook payload could not be read.
pub fn build_fallback_line(
    cwd: &Path,
    git: Option<&GitInfo>,
    summary: &WindowSummary,
    now: DateTime<Local>,
) -> String {
    let dir = basename(&cwd.to_string_lossy());
    let folder = tint(&format!("📁 {dir}"), Tone::Folder);
    let error = tint("[Error]", Tone::Red);
    let section3 = format!(
        "{} {} {}",
        reset_display(summary),
        usage_display(summary),
        clock_display(now)
    );
    let sep = separator();
    format!("{folder} {}{sep}{error}{sep}{section3}", git_display(git))
}

pub fn build_json_output(
    hook: &HookJson,
    git: Option<&GitInfo>,
    context: &ContextInfo,
    summary: &WindowSummary,
    now: DateTime<Utc>,
) -> serde_json::Value {
    let warning = context.warning.map(|w| match w {
        ContextWarning::Low => "low",
        ContextWarning::AutoCompact => "auto_compact",
    });
    serde_json::json!({
        "model": hook.model_display_name(),
        "directory": directory_display(&hook.workspace),
        "cwd": hook.workspace.current_dir,
        "project_dir": hook.workspace.project_dir,
        "git": {
            "branch": git.and_then(|g| g.branch.clone()),
            "short_commit": git.and_then(|g| g.short_commit.clone()),
            "is_clean": git.and_then(|g| g.is_clean),
            "ahead": git.and_then(|g| g.ahead),
            "behind": git.and_then(|g| g.behind),
        },
        "context": {
            "percent": (context.percent * 10.0).round() / 10.0,
            "method": context.method.as_str(),
            "accurate": context.accurate,
            "warning": warning,
            "tokens_used": context.tokens_used,
            "cache_tokens": context.cache_tokens,
        },
        "window": {
            "state": summary.state.as_str(),
            "reset_time_local": summary.reset_time_local,
            "total_tokens": summary.total_tokens,
            "usage_ratio": summary.usage_ratio,
            "usage_percent": summary.usage_percent.map(|v| (v * 10.0).round() / 10.0),
            "block_id": summary.block_id,
            "start": summary.block_start.map(|d| d.to_rfc3339()),
            "end": summary.block_end.map(|d| d.to_rfc3339()),
            "last_activity": summary.last_activity.map(|d| d.to_rfc3339()),
            "entries": summary.entry_count,
            "remaining_minutes": summary.remaining_minutes(now),
            "session_blocks": summary.session_blocks,
        },
        "generated_at": now.to_rfc3339(),
    })
}

pub fn print_json_output(
    hook: &HookJson,
    git: Option<&GitInfo>,
    context: &ContextInfo,
    summary: &WindowSummary,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    let json = build_json_output(hook, git, context, summary, now);
    println!("{}", serde_json::to_string(&json)?);
    Ok(())
}
