use serde::Serialize;
use tracing::debug;

use crate::config::HarnessConfig;
use crate::decode::transport_flow;
use crate::defrag::{DefragTracker, FragmentKey};
use crate::flow::FlowTable;
use crate::packet::{Packet, PacketPool, PacketQueue};

/// Per-run decode counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DecodeCounters {
    pub inputs: u64,
    pub bytes: u64,
    pub ipv4: u64,
    pub ipv6: u64,
    pub fragments: u64,
    pub reassembled: u64,
    pub reassembly_dropped: u64,
    pub secondary: u64,
    pub decode_errors: u64,
    pub skipped: u64,
}

/// Everything decoding mutates across inputs within one run.
///
/// Created once by [`SharedState::start`] and handed by `&mut` to every
/// decode call; [`SharedState::stop`] consumes it, so a stopped run cannot
/// be fed again.
#[derive(Debug)]
pub struct SharedState {
    pub(crate) defrag: DefragTracker,
    pub(crate) flows: FlowTable,
    pub(crate) pool: PacketPool,
    pub(crate) queue: PacketQueue,
    pub(crate) counters: DecodeCounters,
}

impl SharedState {
    /// Fresh trackers in quiet mode: nothing above `trace` per packet.
    pub fn start(config: &HarnessConfig) -> Self {
        let state = Self {
            defrag: DefragTracker::new(config.effective_max_defrag_trackers()),
            flows: FlowTable::new(config.effective_max_flows()),
            pool: PacketPool::new(config.effective_pool_size()),
            queue: PacketQueue::new(),
            counters: DecodeCounters::default(),
        };
        debug!(
            pool_size = state.pool.capacity(),
            "shared decoder state initialized"
        );
        state
    }

    pub fn stop(self) -> DecodeCounters {
        debug!(
            inputs = self.counters.inputs,
            flows = self.flows.len(),
            partial_datagrams = self.defrag.len(),
            reassembled = self.defrag.completed(),
            "shared decoder state torn down"
        );
        self.counters
    }

    pub fn counters(&self) -> &DecodeCounters {
        &self.counters
    }

    pub fn flows(&self) -> &FlowTable {
        &self.flows
    }

    pub fn defrag(&self) -> &DefragTracker {
        &self.defrag
    }

    pub fn pool(&self) -> &PacketPool {
        &self.pool
    }

    /// Secondary packets waiting to be drained.
    pub fn pending_secondary(&self) -> usize {
        self.queue.len()
    }

    /// Takes a packet from the pool for a decoder that wants to emit
    /// secondary output.
    pub fn acquire_secondary(&mut self) -> Option<Packet> {
        self.pool.acquire()
    }

    /// Queues a secondary packet; the adapter releases it once the current
    /// decode call returns.
    pub fn push_secondary(&mut self, packet: Packet) {
        self.queue.push(packet);
    }

    pub(crate) fn emit_reassembled(&mut self, key: FragmentKey, datagram: &[u8]) {
        let Some(mut pseudo) = self.acquire_secondary() else {
            self.counters.reassembly_dropped += 1;
            return;
        };
        pseudo.set_data(datagram);
        pseudo.set_network(key.src, key.dst, key.protocol);
        pseudo.mark_pseudo();
        if let Some(flow) = transport_flow(key.protocol, key.src, key.dst, datagram) {
            self.flows.update(flow, datagram.len());
            pseudo.set_flow(flow);
        }
        self.counters.reassembled += 1;
        self.push_secondary(pseudo);
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
