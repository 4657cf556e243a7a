use anyhow::{Context, Result};
use chrono::{Local, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use context_monitor::cli::Args;
use context_monitor::context::parse_context_from_transcript;
use context_monitor::display::{build_fallback_line, build_status_line, print_json_output};
use context_monitor::models::{GitInfo, HookJson};
use context_monitor::usage::{build_blocks, scan_usage};
use context_monitor::utils::{
    claude_paths, context_limit_for_display, read_stdin, resolve_usage_config, setup_tracing,
};
use context_monitor::window::{WindowSummary, summarize};

fn main() -> Result<()> {
    let args = Args::parse();
    setup_tracing(args.debug);

    let stdin = read_stdin().unwrap_or_default();
    if stdin.iter().all(u8::is_ascii_whitespace) {
        println!("Claude Code\n❯ [waiting for valid input]");
        return Ok(());
    }

    let summary = usage_summary(&args);
    let now_local = Local::now();

    let hook: HookJson = match serde_json::from_slice(&stdin).context("parse hook json") {
        Ok(h) => h,
        Err(err) => {
            warn!(error = %err, "falling back to degraded status line");
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            let git = git_info(&args, &cwd);
            println!(
                "{}",
                build_fallback_line(&cwd, git.as_ref(), &summary, now_local)
            );
            return Ok(());
        }
    };

    let git_dir = hook
        .workspace
        .project_dir
        .as_deref()
        .or(hook.workspace.current_dir.as_deref())
        .map(PathBuf::from)
        .or_else(|| std::env::current_dir().ok());
    let git = git_dir.as_deref().and_then(|d| git_info(&args, d));

    let context_limit = context_limit_for_display(hook.model_display_name());
    let transcript = hook
        .transcript_path
        .as_deref()
        .filter(|p| !p.is_empty())
        .map(Path::new);
    let context = parse_context_from_transcript(transcript, context_limit);
    debug!(method = context.method.as_str(), percent = context.percent, "context estimate");

    if args.json {
        print_json_output(&hook, git.as_ref(), &context, &summary, Utc::now())
            .context("write json output")?;
    } else {
        println!(
            "{}",
            build_status_line(&hook, git.as_ref(), &context, &summary, now_local)
        );
    }
    Ok(())
}

/// Snapshot of the usage window; an empty or unreadable log set is "no data".
fn usage_summary(args: &Args) -> WindowSummary {
    let config = resolve_usage_config(args);
    let paths = claude_paths(args.claude_config_dir.as_deref());
    let now = Utc::now();
    let events = scan_usage(&paths, now, &config);
    let mut blocks = build_blocks(events);
    let summary = summarize(&mut blocks, now, config.token_budget, &Local);
    debug!(
        state = summary.state.as_str(),
        blocks = summary.session_blocks,
        total_tokens = ?summary.total_tokens,
        reset = ?summary.reset_time_local,
        "usage window"
    );
    summary
}

#[cfg(feature = "git")]
fn git_info(args: &Args, dir: &Path) -> Option<GitInfo> {
    if args.no_git {
        return None;
    }
    context_monitor::git::read_git_info(dir)
}

#[cfg(not(feature = "git"))]
fn git_info(_args: &Args, _dir: &Path) -> Option<GitInfo> {
    None
}
