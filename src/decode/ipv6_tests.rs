use crate::config::HarnessConfig;
use crate::decode::{Decode, DecodeError, DecoderKind};
use crate::packet::Packet;
use crate::session::SharedState;

fn ipv6(next_header: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = vec![0x60, 0, 0, 0];
    out.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    out.extend_from_slice(&[next_header, 64]);
    let mut src = [0u8; 16];
    src[0] = 0x20;
    src[1] = 0x01;
    src[15] = 1;
    let mut dst = src;
    dst[15] = 2;
    out.extend_from_slice(&src);
    out.extend_from_slice(&dst);
    out.extend_from_slice(payload);
    out
}

fn fragment_header(next_header: u8, offset: u16, more: bool, id: u32) -> Vec<u8> {
    let offset_flags = (offset / 8) << 3 | u16::from(more);
    let mut out = vec![next_header, 0];
    out.extend_from_slice(&offset_flags.to_be_bytes());
    out.extend_from_slice(&id.to_be_bytes());
    out
}

fn decode(state: &mut SharedState, data: &[u8]) -> Result<Packet, DecodeError> {
    let mut packet = Packet::default();
    packet.set_data(data);
    DecoderKind::Ipv6.decode(state, &mut packet, data)?;
    Ok(packet)
}

#[test]
fn tcp_segment_registers_flow() {
    let mut state = SharedState::start(&HarnessConfig::default());
    let tcp = [0x9c, 0x40, 0x01, 0xbb, 0, 0, 0, 1];
    let packet = decode(&mut state, &ipv6(6, &tcp)).unwrap();
    assert_eq!(packet.protocol(), Some(6));
    assert!(packet.flow().is_some());
    assert_eq!(state.flows().len(), 1);
    assert_eq!(state.counters().ipv6, 1);
}

#[test]
fn extension_headers_are_skipped() {
    let mut state = SharedState::start(&HarnessConfig::default());
    // Hop-by-hop (8 bytes) -> UDP.
    let mut payload = vec![17, 0, 0, 0, 0, 0, 0, 0];
    payload.extend_from_slice(&[0x00, 0x35, 0x00, 0x35, 0, 8, 0, 0]);
    let packet = decode(&mut state, &ipv6(0, &payload)).unwrap();
    assert_eq!(packet.protocol(), Some(17));
    assert!(packet.flow().is_some());
}

#[test]
fn truncated_extension_header_is_rejected() {
    let mut state = SharedState::start(&HarnessConfig::default());
    // Claims 16 bytes of routing header, only 8 present.
    let payload = [17, 1, 0, 0, 0, 0, 0, 0];
    assert!(matches!(
        decode(&mut state, &ipv6(43, &payload)),
        Err(DecodeError::Truncated { layer: "ipv6", .. })
    ));
}

#[test]
fn short_or_wrong_version_input_is_rejected() {
    let mut state = SharedState::start(&HarnessConfig::default());
    assert!(matches!(
        decode(&mut state, &[0x60; 12]),
        Err(DecodeError::Truncated { needed: 40, .. })
    ));

    let mut data = ipv6(59, b"");
    data[0] = 0x40;
    assert_eq!(
        decode(&mut state, &data).unwrap_err(),
        DecodeError::Version {
            expected: 6,
            found: 4
        }
    );
}

#[test]
fn payload_length_past_input_is_rejected() {
    let mut state = SharedState::start(&HarnessConfig::default());
    let mut data = ipv6(59, b"abcd");
    data[4..6].copy_from_slice(&100u16.to_be_bytes());
    assert_eq!(
        decode(&mut state, &data).unwrap_err(),
        DecodeError::TotalLength {
            declared: 140,
            available: 44
        }
    );
}

#[test]
fn fragment_header_feeds_reassembly() {
    let mut state = SharedState::start(&HarnessConfig::default());
    let datagram = [0x13, 0x88, 0x00, 0x35, 0, 16, 0, 0, b'a', b'b', b'c', b'd', b'e', b'f', b'g', b'h'];

    let mut first = fragment_header(17, 0, true, 99);
    first.extend_from_slice(&datagram[..8]);
    let mut second = fragment_header(17, 8, false, 99);
    second.extend_from_slice(&datagram[8..]);

    decode(&mut state, &ipv6(44, &first)).unwrap();
    assert_eq!(state.pending_secondary(), 0);
    decode(&mut state, &ipv6(44, &second)).unwrap();
    assert_eq!(state.pending_secondary(), 1);
    assert_eq!(state.counters().reassembled, 1);

    let pseudo = state.queue.pop().unwrap();
    assert_eq!(pseudo.data(), &datagram);
    state.pool.release(pseudo);
}
