//! Tests for the fixed fragment header layout.

use rstest::rstest;

use crate::fragment::*;

fn framing() -> MessageFraming {
    MessageFraming {
        message_id: MessageId::new(0x0102_0304),
        fragment_count: 3,
        nominal_length: 6,
        message_length: 13,
        payload_hash: 0xdead_beef,
    }
}

fn encoded(count: u16, index: u16, nominal: u16, tags_length: u16) -> [u8; HEADER_LEN] {
    let framing = MessageFraming {
        fragment_count: count,
        nominal_length: nominal,
        ..framing()
    };
    FragmentHeader::new(framing, FragmentIndex::new(index), tags_length).encode()
}

#[test]
fn header_encodes_big_endian_fields_at_fixed_offsets() {
    let header = FragmentHeader::new(framing(), FragmentIndex::new(2), 4);
    assert_eq!(
        header.encode(),
        [
            0x00, 0x01, // marker
            0x00, 0x03, // fragment count
            0x00, 0x02, // fragment index
            0x00, 0x06, // nominal length
            0x01, 0x02, 0x03, 0x04, // message id
            0x00, 0x00, 0x00, 0x0d, // message length
            0xde, 0xad, 0xbe, 0xef, // payload hash
            0x00, 0x04, // tags length
            0x00, 0x00, // reserved
        ]
    );
}

#[test]
fn header_round_trips_and_ignores_trailing_bytes() {
    let header = FragmentHeader::new(framing(), FragmentIndex::new(2), 4);
    let mut wire = header.encode().to_vec();
    wire.extend_from_slice(b"body");
    let decoded = FragmentHeader::decode(&wire).expect("valid header");
    assert_eq!(decoded, header);
    assert!(decoded.is_last_fragment());
    assert_eq!(decoded.framing().last_index(), FragmentIndex::new(2));
}

#[test]
fn header_decode_ignores_reserved_bytes() {
    let mut wire = encoded(3, 0, 6, 0);
    wire[22] = 0xff;
    wire[23] = 0x01;
    assert!(FragmentHeader::decode(&wire).is_ok());
}

#[rstest]
#[case::empty(0)]
#[case::one_short(HEADER_LEN - 1)]
fn header_decode_rejects_short_buffers(#[case] len: usize) {
    let wire = encoded(3, 0, 6, 0);
    assert_eq!(
        FragmentHeader::decode(&wire[..len]),
        Err(DecodeError::TooShort { len })
    );
}

#[rstest]
#[case::future_version([0, 2])]
#[case::swapped([1, 0])]
fn header_decode_rejects_foreign_markers(#[case] marker: [u8; 2]) {
    let mut wire = encoded(3, 0, 6, 0);
    wire[..2].copy_from_slice(&marker);
    assert_eq!(
        FragmentHeader::decode(&wire),
        Err(DecodeError::UnknownMarker { found: marker })
    );
}

#[rstest]
#[case::zero_count(encoded(0, 0, 6, 0), HeaderViolation::ZeroFragmentCount)]
#[case::zero_nominal(encoded(3, 0, 0, 0), HeaderViolation::ZeroNominalLength)]
#[case::index_past_end(
    encoded(3, 3, 6, 0),
    HeaderViolation::IndexOutOfRange { index: FragmentIndex::new(3), count: 3 }
)]
#[case::tags_on_first(
    encoded(3, 0, 6, 2),
    HeaderViolation::TagsOnNonFinalFragment { index: FragmentIndex::zero() }
)]
#[case::tags_wider_than_fragment(
    encoded(3, 2, 6, 7),
    HeaderViolation::TagsExceedNominal { tags_length: 7, nominal_length: 6 }
)]
fn header_decode_rejects_contradictory_fields(
    #[case] wire: [u8; HEADER_LEN],
    #[case] violation: HeaderViolation,
) {
    assert_eq!(
        FragmentHeader::decode(&wire),
        Err(DecodeError::InvalidHeader(violation))
    );
}
