use std::net::{IpAddr, Ipv6Addr};

use super::{DecodeError, DecodeResult, reassemble, track_transport};
use crate::defrag::FragmentKey;
use crate::packet::Packet;
use crate::session::SharedState;

const HEADER_LEN: usize = 40;
const FRAGMENT_HEADER_LEN: usize = 8;
const MAX_EXTENSION_HEADERS: usize = 8;

const NEXT_HOP_BY_HOP: u8 = 0;
const NEXT_ROUTING: u8 = 43;
const NEXT_FRAGMENT: u8 = 44;
const NEXT_DEST_OPTS: u8 = 60;

fn truncated(needed: usize, available: usize) -> DecodeError {
    DecodeError::Truncated {
        layer: "ipv6",
        needed,
        available,
    }
}

fn addr(bytes: &[u8]) -> IpAddr {
    let mut octets = [0u8; 16];
    octets.copy_from_slice(&bytes[..16]);
    IpAddr::V6(Ipv6Addr::from(octets))
}

pub(super) fn decode(state: &mut SharedState, packet: &mut Packet, data: &[u8]) -> DecodeResult {
    state.counters.ipv6 += 1;
    if data.len() < HEADER_LEN {
        return Err(truncated(HEADER_LEN, data.len()));
    }

    let version = data[0] >> 4;
    if version != 6 {
        return Err(DecodeError::Version {
            expected: 6,
            found: version,
        });
    }

    let payload_len = usize::from(u16::from_be_bytes([data[4], data[5]]));
    let end = HEADER_LEN + payload_len;
    if end > data.len() {
        return Err(DecodeError::TotalLength {
            declared: end,
            available: data.len(),
        });
    }

    let src = addr(&data[8..24]);
    let dst = addr(&data[24..40]);
    let mut next = data[6];
    let mut cursor = HEADER_LEN;

    for _ in 0..MAX_EXTENSION_HEADERS {
        match next {
            NEXT_HOP_BY_HOP | NEXT_ROUTING | NEXT_DEST_OPTS => {
                if cursor + 2 > end {
                    return Err(truncated(cursor + 2, end));
                }
                let ext_len = (usize::from(data[cursor + 1]) + 1) * 8;
                if cursor + ext_len > end {
                    return Err(truncated(cursor + ext_len, end));
                }
                next = data[cursor];
                cursor += ext_len;
            }
            NEXT_FRAGMENT => {
                if cursor + FRAGMENT_HEADER_LEN > end {
                    return Err(truncated(cursor + FRAGMENT_HEADER_LEN, end));
                }
                let protocol = data[cursor];
                let offset_flags = u16::from_be_bytes([data[cursor + 2], data[cursor + 3]]);
                let offset = usize::from(offset_flags >> 3) * 8;
                let more_fragments = offset_flags & 0x1 != 0;
                let id = u32::from_be_bytes([
                    data[cursor + 4],
                    data[cursor + 5],
                    data[cursor + 6],
                    data[cursor + 7],
                ]);
                packet.set_network(src, dst, protocol);
                let key = FragmentKey {
                    src,
                    dst,
                    id,
                    protocol,
                };
                let payload = &data[cursor + FRAGMENT_HEADER_LEN..end];
                return reassemble(state, key, offset, more_fragments, payload);
            }
            _ => {
                track_transport(state, packet, src, dst, next, &data[cursor..end]);
                return Ok(());
            }
        }
    }

    Err(DecodeError::Unsupported("ipv6 extension header chain too long"))
}

#[cfg(test)]
#[path = "ipv6_tests.rs"]
mod tests;
