use serde::Serialize;
use tracing::{info, trace, warn};

use crate::adapter::{Invocation, invoke};
use crate::buffer::InputBuffer;
use crate::config::HarnessConfig;
use crate::decode::Decode;
use crate::dump::DumpDir;
use crate::error::{HarnessError, Result};
use crate::session::{DecodeCounters, SharedState};

#[derive(Debug, Clone, Serialize)]
pub struct ReplaySummary {
    pub prefix: String,
    pub replayed: u64,
    /// Sequence whose absence ended the replay; `None` when `limit` did.
    pub first_missing: Option<u64>,
    pub skipped: u64,
    pub counters: DecodeCounters,
}

/// Feeds records `prefix.0`, `prefix.1`, ... to `decoder` in order, against
/// one shared state, until a record is missing or `limit` is reached.
///
/// Read-only: records are never removed, so a replay can be repeated.
pub fn run_replay<D: Decode>(
    dump: &DumpDir,
    prefix: &str,
    decoder: &D,
    config: &HarnessConfig,
    limit: Option<u64>,
) -> Result<ReplaySummary> {
    let mut state = SharedState::start(config);
    let mut buffer = InputBuffer::new();
    let mut sequence = 0;
    let mut skipped = 0;
    let mut first_missing = None;

    loop {
        if limit.is_some_and(|limit| sequence >= limit) {
            break;
        }
        let Some(mut file) = dump.open(prefix, sequence)? else {
            first_missing = Some(sequence);
            break;
        };
        if let Err(source) = buffer.fill_from(&mut file) {
            return Err(HarnessError::Replay {
                path: dump.record_path(prefix, sequence),
                source,
            });
        }
        trace!(prefix, sequence, len = buffer.len(), "replaying record");

        if invoke(decoder, &mut state, buffer.as_slice()) == Invocation::Skipped {
            skipped += 1;
            warn!(prefix, sequence, "packet pool exhausted; record skipped");
        }
        drop(file);
        sequence += 1;
    }

    let counters = state.stop();
    info!(prefix, replayed = sequence, "replay complete");
    Ok(ReplaySummary {
        prefix: prefix.to_string(),
        replayed: sequence,
        first_missing,
        skipped,
        counters,
    })
}

#[cfg(test)]
#[path = "replay_tests.rs"]
mod tests;
