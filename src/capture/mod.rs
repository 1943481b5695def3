mod source;

pub use source::{FileInput, InputSource, MemoryInput};

use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::adapter::{Invocation, invoke};
use crate::buffer::InputBuffer;
use crate::config::HarnessConfig;
use crate::decode::Decode;
use crate::dump::{DumpDir, RunId};
use crate::error::Result;
use crate::session::{DecodeCounters, SharedState};

/// How many iterations one capture process runs before finishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationBudget {
    /// A single input per process.
    Once,
    /// A persistent loop of at most `n` inputs.
    Persistent(u64),
    /// Until the source runs dry.
    Unbounded,
}

impl IterationBudget {
    pub fn allows(&self, completed: u64) -> bool {
        match self {
            IterationBudget::Once => completed == 0,
            IterationBudget::Persistent(limit) => completed < *limit,
            IterationBudget::Unbounded => true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CaptureSummary {
    pub run_id: RunId,
    pub inputs: u64,
    pub skipped: u64,
    pub truncated: u64,
    pub purged: u64,
    pub counters: DecodeCounters,
}

/// One capture run, driven an input at a time.
///
/// Every input is written to the dump directory before the decoder sees it.
/// Records are only removed by [`CaptureSession::finish`]; dropping a session
/// (including while unwinding out of a decoder panic) leaves them on disk.
pub struct CaptureSession<'a> {
    dump: &'a DumpDir,
    run_id: RunId,
    namespace: String,
    sequence: u64,
    state: SharedState,
    buffer: InputBuffer,
    skipped: u64,
    truncated: u64,
}

impl<'a> CaptureSession<'a> {
    pub fn begin(dump: &'a DumpDir, config: &HarnessConfig) -> Result<Self> {
        dump.ensure_exists()?;
        let run_id = RunId::now();
        let state = SharedState::start(config);
        debug!(run = %run_id, dump_dir = %dump.path().display(), "capture run started");
        Ok(Self {
            dump,
            run_id,
            namespace: run_id.to_string(),
            sequence: 0,
            state,
            buffer: InputBuffer::new(),
            skipped: 0,
            truncated: 0,
        })
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Sequence number the next input will be recorded under.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Records and decodes an input handed in by an outer loop.
    pub fn process<D: Decode>(&mut self, decoder: &D, input: &[u8]) -> Result<Invocation> {
        self.buffer.fill_from_slice(input);
        self.step(decoder)
    }

    /// Pulls the next input from `source`, then records and decodes it.
    /// Returns `Ok(false)` once the source is exhausted.
    pub fn process_next<S, D>(&mut self, source: &mut S, decoder: &D) -> Result<bool>
    where
        S: InputSource,
        D: Decode,
    {
        if !source.next_input(&mut self.buffer)? {
            return Ok(false);
        }
        self.step(decoder)?;
        Ok(true)
    }

    fn step<D: Decode>(&mut self, decoder: &D) -> Result<Invocation> {
        let sequence = self.sequence;
        if self.buffer.was_truncated() {
            self.truncated += 1;
            debug!(sequence, kept = self.buffer.len(), "input truncated");
        }

        self.dump
            .record(&self.namespace, sequence, self.buffer.as_slice())?;
        trace!(run = %self.run_id, sequence, len = self.buffer.len(), "input recorded");

        let invocation = invoke(decoder, &mut self.state, self.buffer.as_slice());
        if invocation == Invocation::Skipped {
            self.skipped += 1;
            warn!(run = %self.run_id, sequence, "packet pool exhausted; input skipped");
        }

        self.sequence += 1;
        Ok(invocation)
    }

    /// Clean completion: removes every record of the run and tears down the
    /// shared state.
    pub fn finish(self) -> CaptureSummary {
        let purged = self.dump.purge(&self.namespace, self.sequence);
        let counters = self.state.stop();
        info!(
            run = %self.run_id,
            inputs = self.sequence,
            skipped = self.skipped,
            purged,
            "capture run complete"
        );
        CaptureSummary {
            run_id: self.run_id,
            inputs: self.sequence,
            skipped: self.skipped,
            truncated: self.truncated,
            purged,
            counters,
        }
    }
}

/// Records every input from `source` and feeds it to `decoder` until the
/// budget or the source runs out, then purges the run.
///
/// A contract violation returns immediately without purging. A panic in
/// the decoder unwinds straight through; either way the records written so
/// far stay on disk, the last one being the input that was in flight.
pub fn run_capture<S, D>(
    dump: &DumpDir,
    source: &mut S,
    decoder: &D,
    budget: IterationBudget,
    config: &HarnessConfig,
) -> Result<CaptureSummary>
where
    S: InputSource,
    D: Decode,
{
    let mut session = CaptureSession::begin(dump, config)?;
    while budget.allows(session.sequence()) {
        if !session.process_next(source, decoder)? {
            break;
        }
    }
    Ok(session.finish())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
