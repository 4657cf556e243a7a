use chrono::{DateTime, Duration, TimeZone, Utc};

use context_monitor::models::UsageEvent;
use context_monitor::usage::{UsageConfig, WindowSelection, aggregate, build_blocks, select_active};
use context_monitor::window::{WindowState, evaluate};

fn at(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, h, m, 0).unwrap()
}

fn assistant_line(ts: &str, input: u64, output: u64, mid: &str, rid: &str) -> String {
    serde_json::json!({
        "type": "assistant",
        "timestamp": ts,
        "requestId": rid,
        "message": {
            "id": mid,
            "usage": {"input_tokens": input, "output_tokens": output}
        }
    })
    .to_string()
}

#[test]
fn three_recent_events_make_an_active_block() {
    let lines = vec![
        assistant_line("2024-01-01T10:15:00Z", 200, 300, "m1", "r1"),
        assistant_line("2024-01-01T10:45:00Z", 250, 250, "m2", "r2"),
        assistant_line("2024-01-01T11:10:00Z", 100, 400, "m3", "r3"),
    ];
    let now = at(11, 12);
    let config = UsageConfig::default();

    let mut blocks = aggregate(&lines, now, &config);
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].start, at(10, 0));
    assert_eq!(blocks[0].end, at(15, 0));
    assert_eq!(blocks[0].total_tokens, 1500);
    assert!(matches!(select_active(&mut blocks, now), WindowSelection::Active(_)));
    assert!(blocks[0].is_active);

    let summary = evaluate(&lines, now, &config, &Utc);
    assert_eq!(summary.state, WindowState::Active);
    assert_eq!(summary.reset_time_local.as_deref(), Some("15:00"));
    assert_eq!(summary.total_tokens, Some(1500));
    let ratio = summary.usage_ratio.unwrap();
    assert!((ratio - 1500.0 / 88_000.0).abs() < 1e-12);
    assert_eq!(summary.session_blocks, 1);
}

#[test]
fn replayed_log_lines_do_not_double_count() {
    let lines = vec![
        assistant_line("2024-01-01T10:15:00Z", 200, 300, "m1", "r1"),
        assistant_line("2024-01-01T10:45:00Z", 250, 250, "m2", "r2"),
    ];
    let mut replayed = lines.clone();
    replayed.extend(lines.iter().cloned());
    let now = at(11, 0);
    let config = UsageConfig::default();
    let once = evaluate(&lines, now, &config, &Utc);
    let twice = evaluate(&replayed, now, &config, &Utc);
    assert_eq!(once.total_tokens, Some(1000));
    assert_eq!(once, twice);
}

#[test]
fn idle_gap_inside_window_opens_second_block() {
    let events = vec![
        UsageEvent::new(at(10, 0), 100, 0),
        UsageEvent::new(at(13, 0), 100, 0),
    ];
    let blocks = build_blocks(events);
    assert_eq!(blocks.len(), 2);
    // the second event is still inside the first block's nominal window
    assert!(at(13, 0) < blocks[0].end);
    assert_eq!(blocks[0].entries.len(), 1);
    assert_eq!(blocks[1].entries.len(), 1);
}

#[test]
fn finished_block_reports_expired_not_no_data() {
    let lines = vec![
        assistant_line("2024-01-01T03:05:00Z", 10, 10, "a", "1"),
        assistant_line("2024-01-01T03:20:00Z", 10, 10, "b", "2"),
        assistant_line("2024-01-01T03:40:00Z", 10, 10, "c", "3"),
    ];
    let summary = evaluate(&lines, at(9, 0), &UsageConfig::default(), &Utc);
    assert_eq!(summary.state, WindowState::Expired);
    assert_eq!(summary.total_tokens, Some(60));
    assert_eq!(summary.reset_time_local.as_deref(), Some("08:00"));
}

#[test]
fn garbage_and_empty_input_is_no_data() {
    let lines = ["", "not json", "{\"type\":\"assistant\"}", "[1,2,3]"];
    let summary = evaluate(lines, at(9, 0), &UsageConfig::default(), &Utc);
    assert_eq!(summary.state, WindowState::NoData);
    assert_eq!(summary.total_tokens, None);

    let empty: [&str; 0] = [];
    let summary = evaluate(empty, at(9, 0), &UsageConfig::default(), &Utc);
    assert_eq!(summary.state, WindowState::NoData);
}

#[test]
fn custom_budget_and_lookback() {
    let lines = vec![
        assistant_line("2023-12-28T10:00:00Z", 5_000, 0, "old", "1"),
        assistant_line("2024-01-01T10:50:00Z", 5_000, 5_000, "a", "2"),
        assistant_line("2024-01-01T10:55:00Z", 5_000, 5_000, "b", "3"),
        assistant_line("2024-01-01T11:00:00Z", 5_000, 5_000, "c", "4"),
    ];
    let config = UsageConfig {
        lookback: Duration::hours(24),
        token_budget: 60_000.0,
    };
    let mut blocks = aggregate(&lines, at(11, 5), &config);
    assert_eq!(blocks.len(), 1);
    assert!(matches!(select_active(&mut blocks, at(11, 5)), WindowSelection::Active(_)));

    let summary = evaluate(&lines, at(11, 5), &config, &Utc);
    assert_eq!(summary.usage_percent, Some(50.0));

    // the default 8-day lookback keeps the December event as its own block
    let summary = evaluate(&lines, at(11, 5), &UsageConfig::default(), &Utc);
    assert_eq!(summary.session_blocks, 2);
}
