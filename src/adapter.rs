use tracing::trace;

use crate::decode::Decode;
use crate::session::SharedState;

/// What happened to one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation {
    /// The decoder ran; `secondary` packets were drained afterwards.
    Decoded { secondary: usize },
    /// No packet could be acquired, so the decoder never saw the input.
    Skipped,
}

/// Runs `decoder` over `input` the same way for capture and replay.
///
/// Acquires a packet, binds the input, decodes, drains every secondary
/// packet back into the pool, then releases the packet. On return the
/// secondary queue is empty and nothing acquired here is still outstanding.
pub fn invoke<D: Decode>(decoder: &D, state: &mut SharedState, input: &[u8]) -> Invocation {
    let Some(mut packet) = state.pool.acquire() else {
        state.counters.skipped += 1;
        return Invocation::Skipped;
    };
    packet.set_data(input);
    state.counters.inputs += 1;
    state.counters.bytes += input.len() as u64;

    if let Err(err) = decoder.decode(state, &mut packet, input) {
        state.counters.decode_errors += 1;
        trace!(error = %err, len = input.len(), "decoder reported failure");
    }

    let mut secondary = 0;
    while let Some(extra) = state.queue.pop() {
        state.pool.release(extra);
        secondary += 1;
    }
    state.counters.secondary += secondary as u64;
    state.pool.release(packet);

    Invocation::Decoded { secondary }
}

#[cfg(test)]
#[path = "adapter_tests.rs"]
mod tests;
