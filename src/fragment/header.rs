//! The fixed 24-byte fragment header shared by encoder and decoder.
//!
//! Layout (all fields big-endian):
//!
//! ```text
//!  0      2        4        6        8            12               16             20          22         24
//!  +------+--------+--------+--------+------------+----------------+--------------+-----------+----------+
//!  |marker| count  | index  |nominal | message id | message length | payload hash | tags len  | reserved |
//!  +------+--------+--------+--------+------------+----------------+--------------+-----------+----------+
//! ```

use super::{DecodeError, FragmentIndex, HeaderViolation, MessageId};
use crate::byte_order::{read_network_u16, read_network_u32, write_network_u16, write_network_u32};

/// Marker identifying version 0 of the fragmentation scheme.
pub const PROTOCOL_MARKER: [u8; 2] = [0, 1];

/// Size of the encoded header in bytes. Never varies.
pub const HEADER_LEN: usize = 24;

const COUNT_OFFSET: usize = 2;
const INDEX_OFFSET: usize = 4;
const NOMINAL_OFFSET: usize = 6;
const MESSAGE_ID_OFFSET: usize = 8;
const MESSAGE_LENGTH_OFFSET: usize = 12;
const HASH_OFFSET: usize = 16;
const TAGS_LENGTH_OFFSET: usize = 20;

/// Fields that describe a message as a whole and therefore repeat, unchanged,
/// in every one of its fragments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageFraming {
    /// Identifier of the message.
    pub message_id: MessageId,
    /// Total number of fragments composing the message.
    pub fragment_count: u16,
    /// Configured content bytes per fragment (not any fragment's actual size).
    pub nominal_length: u16,
    /// Length of the original payload in bytes.
    pub message_length: u32,
    /// Hash of the complete original payload.
    pub payload_hash: u32,
}

impl MessageFraming {
    /// Index of the fragment that carries the tag block.
    #[must_use]
    pub const fn last_index(&self) -> FragmentIndex {
        FragmentIndex::new(self.fragment_count.saturating_sub(1))
    }
}

/// Header describing a single fragment.
///
/// # Examples
///
/// ```
/// use wirefrag::fragment::{FragmentHeader, FragmentIndex, MessageFraming, MessageId, HEADER_LEN};
///
/// let framing = MessageFraming {
///     message_id: MessageId::new(7),
///     fragment_count: 2,
///     nominal_length: 6,
///     message_length: 9,
///     payload_hash: 0xfeed,
/// };
/// let header = FragmentHeader::new(framing, FragmentIndex::new(1), 3);
/// let bytes = header.encode();
/// assert_eq!(bytes.len(), HEADER_LEN);
/// assert_eq!(FragmentHeader::decode(&bytes), Ok(header));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FragmentHeader {
    framing: MessageFraming,
    fragment_index: FragmentIndex,
    tags_length: u16,
}

impl FragmentHeader {
    /// Create a new fragment header.
    #[must_use]
    pub const fn new(
        framing: MessageFraming,
        fragment_index: FragmentIndex,
        tags_length: u16,
    ) -> Self {
        Self {
            framing,
            fragment_index,
            tags_length,
        }
    }

    /// Message-wide fields repeated in every fragment.
    #[must_use]
    pub const fn framing(&self) -> &MessageFraming { &self.framing }

    /// Return the logical message identifier.
    #[must_use]
    pub const fn message_id(&self) -> MessageId { self.framing.message_id }

    /// Return the fragment position relative to the message.
    #[must_use]
    pub const fn fragment_index(&self) -> FragmentIndex { self.fragment_index }

    /// Length of the tag block carried by this fragment.
    #[must_use]
    pub const fn tags_length(&self) -> u16 { self.tags_length }

    /// Report whether this is the final fragment of its message.
    #[must_use]
    pub const fn is_last_fragment(&self) -> bool {
        self.fragment_index
            .is_last_of(self.framing.fragment_count)
    }

    /// Encode the header into its fixed wire representation.
    #[must_use]
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0_u8; HEADER_LEN];
        self.write_to(&mut buf);
        buf
    }

    /// Write the header into the first [`HEADER_LEN`] bytes of `buf`.
    ///
    /// The reserved trailing bytes are zero-filled.
    ///
    /// # Panics
    ///
    /// Panics if `buf` is shorter than [`HEADER_LEN`].
    pub fn write_to(&self, buf: &mut [u8]) {
        let framing = &self.framing;
        put(buf, 0, &PROTOCOL_MARKER);
        put(buf, COUNT_OFFSET, &write_network_u16(framing.fragment_count));
        put(buf, INDEX_OFFSET, &write_network_u16(self.fragment_index.get()));
        put(buf, NOMINAL_OFFSET, &write_network_u16(framing.nominal_length));
        put(buf, MESSAGE_ID_OFFSET, &write_network_u32(framing.message_id.get()));
        put(buf, MESSAGE_LENGTH_OFFSET, &write_network_u32(framing.message_length));
        put(buf, HASH_OFFSET, &write_network_u32(framing.payload_hash));
        put(buf, TAGS_LENGTH_OFFSET, &write_network_u16(self.tags_length));
        put(buf, TAGS_LENGTH_OFFSET + 2, &[0, 0]);
    }

    /// Decode a header from the front of `bytes`.
    ///
    /// Trailing bytes beyond [`HEADER_LEN`] are ignored; the reserved field is
    /// not inspected.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::TooShort`] when fewer than [`HEADER_LEN`] bytes
    /// are available, [`DecodeError::UnknownMarker`] when the protocol marker
    /// is foreign, and [`DecodeError::InvalidHeader`] when the fields
    /// contradict each other.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let Some(raw) = bytes.get(..HEADER_LEN) else {
            return Err(DecodeError::TooShort { len: bytes.len() });
        };

        let marker = field::<2>(raw, 0);
        if marker != PROTOCOL_MARKER {
            return Err(DecodeError::UnknownMarker { found: marker });
        }

        let framing = MessageFraming {
            message_id: MessageId::new(read_network_u32(field(raw, MESSAGE_ID_OFFSET))),
            fragment_count: read_network_u16(field(raw, COUNT_OFFSET)),
            nominal_length: read_network_u16(field(raw, NOMINAL_OFFSET)),
            message_length: read_network_u32(field(raw, MESSAGE_LENGTH_OFFSET)),
            payload_hash: read_network_u32(field(raw, HASH_OFFSET)),
        };
        let header = Self {
            framing,
            fragment_index: FragmentIndex::new(read_network_u16(field(raw, INDEX_OFFSET))),
            tags_length: read_network_u16(field(raw, TAGS_LENGTH_OFFSET)),
        };
        header.validate()?;
        Ok(header)
    }

    fn validate(&self) -> Result<(), HeaderViolation> {
        let count = self.framing.fragment_count;
        if count == 0 {
            return Err(HeaderViolation::ZeroFragmentCount);
        }
        if self.framing.nominal_length == 0 {
            return Err(HeaderViolation::ZeroNominalLength);
        }
        if self.fragment_index.get() >= count {
            return Err(HeaderViolation::IndexOutOfRange {
                index: self.fragment_index,
                count,
            });
        }
        if self.tags_length > 0 && !self.is_last_fragment() {
            return Err(HeaderViolation::TagsOnNonFinalFragment {
                index: self.fragment_index,
            });
        }
        if self.tags_length > self.framing.nominal_length {
            return Err(HeaderViolation::TagsExceedNominal {
                tags_length: self.tags_length,
                nominal_length: self.framing.nominal_length,
            });
        }
        Ok(())
    }
}

fn put(buf: &mut [u8], offset: usize, bytes: &[u8]) {
    buf[offset..offset + bytes.len()].copy_from_slice(bytes);
}

fn field<const N: usize>(raw: &[u8], offset: usize) -> [u8; N] {
    let mut out = [0_u8; N];
    out.copy_from_slice(&raw[offset..offset + N]);
    out
}
