use redump::dump::RunListing;
use serde_json::json;

use super::{render_capture_human, render_replay_human, render_runs_human, runs_json};

#[test]
fn runs_table_lists_namespaces_with_gaps() {
    let runs = runs_json(&[
        RunListing {
            namespace: "1700000000-250".to_string(),
            sequences: vec![0, 1, 3],
        },
        RunListing {
            namespace: "crash".to_string(),
            sequences: vec![0],
        },
    ]);
    assert_eq!(runs["runs"][0]["replayable"], 2);
    assert_eq!(runs["runs"][0]["first_gap"], 2);
    assert_eq!(runs["runs"][0]["last_replayable"], 1);
    assert_eq!(runs["runs"][1]["last_replayable"], 0);
    assert_eq!(
        runs["runs"][0]["started_at"],
        "2023-11-14T22:13:20.000250Z"
    );
    assert!(runs["runs"][1]["started_at"].is_null());

    let output = render_runs_human(&runs).expect("table output");
    assert!(output.starts_with("NAMESPACE"));
    assert!(output.contains("1700000000-250"));
    assert!(output.contains("crash"));
}

#[test]
fn empty_dump_has_placeholder() {
    assert_eq!(
        render_runs_human(&json!({ "runs": [] })).as_deref(),
        Some("No dump records found.")
    );
}

#[test]
fn capture_summary_renders_key_lines() {
    let output = render_capture_human(&json!({
        "run_id": "1700000000-1",
        "inputs": 3,
        "skipped": 0,
        "truncated": 1,
        "purged": 3,
        "counters": { "decode_errors": 2 }
    }))
    .expect("capture output");

    assert!(output.contains("Run: 1700000000-1"));
    assert!(output.contains("Records Purged: 3"));
    assert!(output.contains("Decode Errors: 2"));
}

#[test]
fn replay_summary_names_stop_reason() {
    let gap = render_replay_human(&json!({
        "prefix": "crash",
        "replayed": 2,
        "first_missing": 2,
        "skipped": 0,
        "counters": { "decode_errors": 0, "reassembled": 1 }
    }))
    .expect("replay output");
    assert!(gap.contains("Stopped: record 2 missing"));

    let limited = render_replay_human(&json!({
        "prefix": "crash",
        "replayed": 5,
        "first_missing": null,
        "skipped": 0,
        "counters": { "decode_errors": 0, "reassembled": 0 }
    }))
    .expect("replay output");
    assert!(limited.contains("Stopped: limit reached"));
}
