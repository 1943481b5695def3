use std::collections::HashMap;
use std::net::IpAddr;

use serde::Serialize;
use tracing::trace;

pub const DEFAULT_MAX_FLOWS: usize = 65536;

/// Direction-independent 5-tuple. Both directions of a conversation map to
/// the same key because the lower endpoint is always stored first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlowKey {
    pub protocol: u8,
    pub lo: (IpAddr, u16),
    pub hi: (IpAddr, u16),
}

impl FlowKey {
    pub fn new(protocol: u8, src: IpAddr, src_port: u16, dst: IpAddr, dst_port: u16) -> Self {
        let a = (src, src_port);
        let b = (dst, dst_port);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        Self { protocol, lo, hi }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FlowStats {
    pub packets: u64,
    pub bytes: u64,
}

/// Session tracker: per-flow packet/byte counters that persist across
/// decode calls for the whole run.
#[derive(Debug)]
pub struct FlowTable {
    flows: HashMap<FlowKey, FlowStats>,
    max_flows: usize,
    dropped: u64,
}

impl FlowTable {
    pub fn new(max_flows: usize) -> Self {
        Self {
            flows: HashMap::new(),
            max_flows,
            dropped: 0,
        }
    }

    /// Counts one packet against `key`. Returns false when the table is full
    /// and the flow was not already tracked.
    pub fn update(&mut self, key: FlowKey, bytes: usize) -> bool {
        if !self.flows.contains_key(&key) && self.flows.len() >= self.max_flows {
            self.dropped += 1;
            trace!(?key, "flow table full; flow not tracked");
            return false;
        }
        let stats = self.flows.entry(key).or_default();
        stats.packets += 1;
        stats.bytes += bytes as u64;
        true
    }

    pub fn get(&self, key: &FlowKey) -> Option<FlowStats> {
        self.flows.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

#[cfg(test)]
#[path = "flow_tests.rs"]
mod tests;
