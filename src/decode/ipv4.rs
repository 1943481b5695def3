use std::net::{IpAddr, Ipv4Addr};

use super::{DecodeError, DecodeResult, reassemble, track_transport};
use crate::defrag::FragmentKey;
use crate::packet::Packet;
use crate::session::SharedState;

const HEADER_MIN: usize = 20;
const FLAG_MORE_FRAGMENTS: u16 = 0x2000;
const OFFSET_MASK: u16 = 0x1fff;

pub(super) fn decode(state: &mut SharedState, packet: &mut Packet, data: &[u8]) -> DecodeResult {
    state.counters.ipv4 += 1;
    if data.len() < HEADER_MIN {
        return Err(DecodeError::Truncated {
            layer: "ipv4",
            needed: HEADER_MIN,
            available: data.len(),
        });
    }

    let version = data[0] >> 4;
    if version != 4 {
        return Err(DecodeError::Version {
            expected: 4,
            found: version,
        });
    }

    let header_len = usize::from(data[0] & 0x0f) * 4;
    if header_len < HEADER_MIN || header_len > data.len() {
        return Err(DecodeError::HeaderLength(header_len));
    }

    // Trailing bytes past the total length (link padding) are ignored.
    let total_len = usize::from(u16::from_be_bytes([data[2], data[3]]));
    if total_len < header_len || total_len > data.len() {
        return Err(DecodeError::TotalLength {
            declared: total_len,
            available: data.len(),
        });
    }

    let id = u16::from_be_bytes([data[4], data[5]]);
    let flags_offset = u16::from_be_bytes([data[6], data[7]]);
    let more_fragments = flags_offset & FLAG_MORE_FRAGMENTS != 0;
    let offset = usize::from(flags_offset & OFFSET_MASK) * 8;
    let protocol = data[9];
    let src = IpAddr::V4(Ipv4Addr::new(data[12], data[13], data[14], data[15]));
    let dst = IpAddr::V4(Ipv4Addr::new(data[16], data[17], data[18], data[19]));
    let payload = &data[header_len..total_len];

    if more_fragments || offset > 0 {
        packet.set_network(src, dst, protocol);
        let key = FragmentKey {
            src,
            dst,
            id: u32::from(id),
            protocol,
        };
        return reassemble(state, key, offset, more_fragments, payload);
    }

    track_transport(state, packet, src, dst, protocol, payload);
    Ok(())
}

#[cfg(test)]
#[path = "ipv4_tests.rs"]
mod tests;
