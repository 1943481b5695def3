mod ipv4;
mod ipv6;
mod kind;

pub use kind::{Decode, DecoderKind};

use std::net::IpAddr;

use thiserror::Error;

use crate::defrag::{FragmentKey, FragmentOutcome};
use crate::flow::FlowKey;
use crate::packet::Packet;
use crate::session::SharedState;

pub const PROTO_TCP: u8 = 6;
pub const PROTO_UDP: u8 = 17;

/// Failures a decoder reports back. The harness counts these and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("{layer} header truncated: need {needed} bytes, have {available}")]
    Truncated {
        layer: &'static str,
        needed: usize,
        available: usize,
    },
    #[error("unexpected IP version {found}, expected {expected}")]
    Version { expected: u8, found: u8 },
    #[error("invalid IPv4 header length {0}")]
    HeaderLength(usize),
    #[error("declared length {declared} exceeds available {available}")]
    TotalLength { declared: usize, available: usize },
    #[error("fragment overlaps previously received data")]
    FragmentOverlap,
    #[error("fragment data lies past the end of the datagram")]
    FragmentLength,
    #[error("fragment extends datagram past {max} bytes")]
    FragmentTooLarge { max: usize },
    #[error("unsupported: {0}")]
    Unsupported(&'static str),
}

pub type DecodeResult = Result<(), DecodeError>;

/// Source and destination port of a TCP or UDP header.
pub(crate) fn transport_ports(protocol: u8, payload: &[u8]) -> Option<(u16, u16)> {
    if !matches!(protocol, PROTO_TCP | PROTO_UDP) || payload.len() < 4 {
        return None;
    }
    let src = u16::from_be_bytes([payload[0], payload[1]]);
    let dst = u16::from_be_bytes([payload[2], payload[3]]);
    Some((src, dst))
}

pub(crate) fn transport_flow(
    protocol: u8,
    src: IpAddr,
    dst: IpAddr,
    payload: &[u8],
) -> Option<FlowKey> {
    let (sp, dp) = transport_ports(protocol, payload)?;
    Some(FlowKey::new(protocol, src, sp, dst, dp))
}

fn track_transport(
    state: &mut SharedState,
    packet: &mut Packet,
    src: IpAddr,
    dst: IpAddr,
    protocol: u8,
    payload: &[u8],
) {
    packet.set_network(src, dst, protocol);
    if let Some(flow) = transport_flow(protocol, src, dst, payload) {
        state.flows.update(flow, payload.len());
        packet.set_flow(flow);
    }
}

fn reassemble(
    state: &mut SharedState,
    key: FragmentKey,
    offset: usize,
    more_fragments: bool,
    payload: &[u8],
) -> DecodeResult {
    state.counters.fragments += 1;
    match state.defrag.insert(key, offset, more_fragments, payload)? {
        FragmentOutcome::Pending => Ok(()),
        FragmentOutcome::Complete(datagram) => {
            state.emit_reassembled(key, &datagram);
            Ok(())
        }
    }
}
