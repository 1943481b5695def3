use chrono::SecondsFormat;
use redump::dump::RunListing;
use serde_json::{Value, json};

/// JSON shape shared by `list --json` and the human table.
pub fn runs_json(runs: &[RunListing]) -> Value {
    let runs: Vec<Value> = runs
        .iter()
        .map(|run| {
            json!({
                "namespace": run.namespace,
                "records": run.record_count(),
                "replayable": run.contiguous(),
                "first_gap": run.first_gap(),
                "last_replayable": run.last_replayable(),
                "started_at": run
                    .run_id()
                    .and_then(|id| id.started_at())
                    .map(|at| at.to_rfc3339_opts(SecondsFormat::Micros, true)),
            })
        })
        .collect();
    json!({ "runs": runs })
}

pub fn render_runs_human(response: &Value) -> Option<String> {
    let runs = response.get("runs")?.as_array()?;
    if runs.is_empty() {
        return Some("No dump records found.".to_string());
    }

    let mut rows: Vec<[String; 5]> = Vec::with_capacity(runs.len());
    for run in runs {
        let namespace = run
            .get("namespace")
            .and_then(Value::as_str)
            .unwrap_or("?")
            .to_string();
        let records = run
            .get("records")
            .and_then(Value::as_u64)
            .map(|v| v.to_string())
            .unwrap_or_else(|| "?".to_string());
        let replayable = run
            .get("replayable")
            .and_then(Value::as_u64)
            .map(|v| v.to_string())
            .unwrap_or_else(|| "?".to_string());
        let first_gap = run
            .get("first_gap")
            .and_then(Value::as_u64)
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".to_string());
        let started = run
            .get("started_at")
            .and_then(Value::as_str)
            .unwrap_or("-")
            .to_string();
        rows.push([namespace, records, replayable, first_gap, started]);
    }

    let headers = ["NAMESPACE", "RECORDS", "REPLAYABLE", "FIRST_GAP", "STARTED"];
    let mut widths = headers.map(str::len);
    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(cell.len());
        }
    }

    let mut out = String::new();
    out.push_str(&table_row(&headers.map(String::from), &widths));
    out.push_str(&table_row(&widths.map(|w| "-".repeat(w)), &widths));
    for row in &rows {
        out.push_str(&table_row(row, &widths));
    }

    Some(out.trim_end().to_string())
}

fn table_row(cells: &[String; 5], widths: &[usize; 5]) -> String {
    format!(
        "{:<w0$}  {:>w1$}  {:>w2$}  {:>w3$}  {:<w4$}\n",
        cells[0],
        cells[1],
        cells[2],
        cells[3],
        cells[4],
        w0 = widths[0],
        w1 = widths[1],
        w2 = widths[2],
        w3 = widths[3],
        w4 = widths[4]
    )
}

pub fn render_capture_human(summary: &Value) -> Option<String> {
    let counters = summary.get("counters")?;
    Some(format!(
        "Run: {}\nInputs: {}\nSkipped: {}\nTruncated: {}\nRecords Purged: {}\nDecode Errors: {}",
        summary.get("run_id")?.as_str()?,
        summary.get("inputs")?.as_u64()?,
        summary.get("skipped")?.as_u64()?,
        summary.get("truncated")?.as_u64()?,
        summary.get("purged")?.as_u64()?,
        counters.get("decode_errors")?.as_u64()?
    ))
}

pub fn render_replay_human(summary: &Value) -> Option<String> {
    let counters = summary.get("counters")?;
    let stopped = match summary.get("first_missing")?.as_u64() {
        Some(sequence) => format!("record {sequence} missing"),
        None => "limit reached".to_string(),
    };
    Some(format!(
        "Prefix: {}\nReplayed: {}\nStopped: {}\nSkipped: {}\nDecode Errors: {}\nReassembled: {}",
        summary.get("prefix")?.as_str()?,
        summary.get("replayed")?.as_u64()?,
        stopped,
        summary.get("skipped")?.as_u64()?,
        counters.get("decode_errors")?.as_u64()?,
        counters.get("reassembled")?.as_u64()?
    ))
}

#[cfg(test)]
#[path = "format_tests.rs"]
mod tests;
