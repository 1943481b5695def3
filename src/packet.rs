use std::collections::VecDeque;
use std::net::IpAddr;

use crate::flow::FlowKey;

pub const DEFAULT_POOL_SIZE: usize = 1024;

/// One decode unit. Lives for a single adapter call and always goes back to
/// the pool it came from.
#[derive(Debug, Default)]
pub struct Packet {
    data: Vec<u8>,
    addrs: Option<(IpAddr, IpAddr)>,
    protocol: Option<u8>,
    flow: Option<FlowKey>,
    pseudo: bool,
}

impl Packet {
    pub fn set_data(&mut self, bytes: &[u8]) {
        self.data.clear();
        self.data.extend_from_slice(bytes);
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Source and destination address, once the network layer decoded.
    pub fn addrs(&self) -> Option<(IpAddr, IpAddr)> {
        self.addrs
    }

    pub fn protocol(&self) -> Option<u8> {
        self.protocol
    }

    pub fn flow(&self) -> Option<FlowKey> {
        self.flow
    }

    /// Set for packets synthesized by the decoder (reassembled datagrams).
    pub fn is_pseudo(&self) -> bool {
        self.pseudo
    }

    pub(crate) fn set_network(&mut self, src: IpAddr, dst: IpAddr, protocol: u8) {
        self.addrs = Some((src, dst));
        self.protocol = Some(protocol);
    }

    pub(crate) fn set_flow(&mut self, flow: FlowKey) {
        self.flow = Some(flow);
    }

    pub(crate) fn mark_pseudo(&mut self) {
        self.pseudo = true;
    }

    fn reset(&mut self) {
        self.data.clear();
        self.addrs = None;
        self.protocol = None;
        self.flow = None;
        self.pseudo = false;
    }
}

/// Bounded packet allocator. Released packets keep their allocation and are
/// handed out again.
#[derive(Debug)]
pub struct PacketPool {
    free: Vec<Packet>,
    capacity: usize,
    outstanding: usize,
    exhausted: u64,
}

impl PacketPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Vec::new(),
            capacity,
            outstanding: 0,
            exhausted: 0,
        }
    }

    /// Returns `None` once `capacity` packets are checked out.
    pub fn acquire(&mut self) -> Option<Packet> {
        if self.outstanding >= self.capacity {
            self.exhausted += 1;
            return None;
        }
        self.outstanding += 1;
        Some(self.free.pop().unwrap_or_default())
    }

    pub fn release(&mut self, mut packet: Packet) {
        packet.reset();
        self.outstanding = self.outstanding.saturating_sub(1);
        if self.free.len() < self.capacity {
            self.free.push(packet);
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Number of `acquire` calls that came back empty.
    pub fn exhausted(&self) -> u64 {
        self.exhausted
    }
}

/// FIFO of packets produced as a side effect of decoding.
#[derive(Debug, Default)]
pub struct PacketQueue {
    packets: VecDeque<Packet>,
}

impl PacketQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, packet: Packet) {
        self.packets.push_back(packet);
    }

    pub fn pop(&mut self) -> Option<Packet> {
        self.packets.pop_front()
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }
}

#[cfg(test)]
#[path = "packet_tests.rs"]
mod tests;
