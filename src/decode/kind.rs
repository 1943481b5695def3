use std::fmt;

use serde::Serialize;

use super::{DecodeResult, ipv4, ipv6};
use crate::packet::Packet;
use crate::session::SharedState;

/// Decoder entry point: one call per input, with the run's shared state.
///
/// The return value is informational only; the harness counts failures but
/// never changes course because of them.
pub trait Decode {
    fn decode(&self, state: &mut SharedState, packet: &mut Packet, data: &[u8]) -> DecodeResult;
}

/// The decoders a run can be pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DecoderKind {
    Ipv4,
    Ipv6,
}

impl Decode for DecoderKind {
    fn decode(&self, state: &mut SharedState, packet: &mut Packet, data: &[u8]) -> DecodeResult {
        match self {
            DecoderKind::Ipv4 => ipv4::decode(state, packet, data),
            DecoderKind::Ipv6 => ipv6::decode(state, packet, data),
        }
    }
}

impl fmt::Display for DecoderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DecoderKind::Ipv4 => "ipv4",
            DecoderKind::Ipv6 => "ipv6",
        };
        f.write_str(s)
    }
}
