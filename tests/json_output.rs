use chrono::{Local, TimeZone, Utc};
use serde_json::Value;

use context_monitor::display::{build_json_output, build_status_line, reset_display, usage_display};
use context_monitor::models::hook::{HookJson, HookModel, HookWorkspace};
use context_monitor::models::{ContextInfo, ContextMethod, GitInfo, UsageBlock, UsageEvent};
use context_monitor::usage::WindowSelection;
use context_monitor::window::{WindowState, WindowSummary};

fn hook() -> HookJson {
    HookJson {
        session_id: Some("s1".to_string()),
        transcript_path: Some("/tmp/transcript.jsonl".to_string()),
        model: HookModel {
            id: Some("claude-sonnet-4".to_string()),
            display_name: Some("Sonnet 4".to_string()),
        },
        workspace: HookWorkspace {
            current_dir: Some("/tmp/project/src".to_string()),
            project_dir: Some("/tmp/project".to_string()),
        },
    }
}

fn active_summary(tokens: u64) -> WindowSummary {
    let ts = Utc.with_ymd_and_hms(2024, 1, 1, 10, 15, 0).unwrap();
    let mut block = UsageBlock::open_at(ts);
    for _ in 0..3 {
        block.push(UsageEvent::new(ts, tokens / 3, 0));
    }
    WindowSummary::from_selection(WindowSelection::Active(&block), 1, 88_000.0, &Utc)
}

#[test]
fn json_output_shape() {
    let summary = active_summary(1500);
    let context = ContextInfo::fallback(ContextMethod::Default);
    let git = GitInfo {
        branch: Some("main".into()),
        ..GitInfo::default()
    };
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 11, 12, 0).unwrap();
    let json: Value = build_json_output(&hook(), Some(&git), &context, &summary, now);

    for key in ["model", "directory", "git", "context", "window", "generated_at"] {
        assert!(json.get(key).is_some(), "missing key: {}", key);
    }
    assert_eq!(json["directory"], "src");
    assert_eq!(json["git"]["branch"], "main");
    assert_eq!(json["context"]["method"], "default");
    assert_eq!(json["window"]["state"], "active");
    assert_eq!(json["window"]["reset_time_local"], "15:00");
    assert_eq!(json["window"]["total_tokens"], 1500);
    assert_eq!(json["window"]["remaining_minutes"], 228);
    assert_eq!(json["window"]["entries"], 3);
    assert!(json["window"]["usage_ratio"].is_number());
}

#[test]
fn json_output_no_data_has_nulls() {
    let json = build_json_output(
        &HookJson::default(),
        None,
        &ContextInfo::fallback(ContextMethod::NoTranscript),
        &WindowSummary::no_data(),
        Utc::now(),
    );
    assert_eq!(json["model"], "Claude");
    assert_eq!(json["directory"], "unknown");
    assert_eq!(json["window"]["state"], "no_data");
    assert!(json["window"]["total_tokens"].is_null());
    assert!(json["git"]["branch"].is_null());
}

#[test]
fn reset_and_usage_segments() {
    let summary = active_summary(1500);
    assert_eq!(reset_display(&summary), "L.R. @ 15:00🕐");
    assert!(usage_display(&summary).starts_with("C.U. 🟢"));

    let expired = WindowSummary {
        state: WindowState::Expired,
        ..active_summary(1500)
    };
    assert_eq!(reset_display(&expired), "L.R. EXPIRED");
    assert!(usage_display(&expired).contains("EXP"));

    let none = WindowSummary::no_data();
    assert_eq!(reset_display(&none), "L.R. @ --:--");
    assert_eq!(usage_display(&none), "C.U. 🔵??%");
}

#[test]
fn heavy_usage_is_scaled_for_display() {
    // 132k of 88k is 150%, shown as 100% with the alert icon
    let summary = active_summary(132_000);
    let seg = usage_display(&summary);
    assert!(seg.starts_with("C.U. 🔴"));
    assert!(seg.ends_with("100%"));
}

#[test]
fn status_line_has_three_sections() {
    let line = build_status_line(
        &hook(),
        None,
        &ContextInfo::fallback(ContextMethod::Default),
        &active_summary(1500),
        Local::now(),
    );
    assert!(line.contains("📁"));
    assert!(line.contains("🌿-"));
    assert!(line.contains("L.R. @ 15:00"));
    assert!(line.contains("⌚"));
    assert_eq!(line.matches('|').count(), 2);
}
