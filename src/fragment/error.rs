//! Error types emitted by the fragmentation layer.
//!
//! Outbound failures ([`FragmentationError`]) are returned synchronously to
//! the caller and mean nothing was sent. Inbound failures are local to one
//! datagram ([`DecodeError`]) or one message key ([`ReassemblyError`]) and
//! never affect unrelated traffic.

use std::num::NonZeroUsize;

use thiserror::Error;

use super::{FragmentIndex, MessageId};

/// Errors produced while fragmenting outbound messages.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FragmentationError {
    /// The fragment size cannot hold a header plus at least one content byte,
    /// or leaves more content than the 16-bit length field can describe.
    #[error(
        "fragment size {max_fragment_size} must be between {min} and {max} bytes",
        min = super::MIN_FRAGMENT_SIZE,
        max = super::MAX_FRAGMENT_SIZE
    )]
    Configuration { max_fragment_size: usize },
    /// The encoded tag block alone exceeds one fragment's content budget.
    #[error("cannot store {tags_length} bytes of tags in {nominal_length} bytes per fragment")]
    TagsTooLarge {
        tags_length: usize,
        nominal_length: u16,
    },
    /// A tag is empty or contains the zero byte used as the separator.
    #[error("tag {position} is empty or contains a zero byte")]
    InvalidTag { position: usize },
    /// The payload length does not fit the 32-bit length field.
    #[error("payload of {len} bytes exceeds the 32-bit message length field")]
    MessageTooLarge { len: usize },
    /// The message would need more fragments than the 16-bit count allows.
    #[error("message needs {required} fragments, more than the 16-bit count allows")]
    TooManyFragments { required: usize },
}

/// Reasons a header is rejected even though its marker and length are fine.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum HeaderViolation {
    /// A message cannot consist of zero fragments.
    #[error("fragment count is zero")]
    ZeroFragmentCount,
    /// The nominal fragment length must be at least one byte.
    #[error("nominal fragment length is zero")]
    ZeroNominalLength,
    /// The index lies outside `[0, count)`.
    #[error("fragment index {index} is not below fragment count {count}")]
    IndexOutOfRange { index: FragmentIndex, count: u16 },
    /// Only the final fragment may carry a tag block.
    #[error("fragment {index} carries tags but is not the final fragment")]
    TagsOnNonFinalFragment { index: FragmentIndex },
    /// A tag block never exceeds the nominal length.
    #[error("tag block of {tags_length} bytes exceeds nominal length {nominal_length}")]
    TagsExceedNominal {
        tags_length: u16,
        nominal_length: u16,
    },
    /// A fragment body never exceeds the nominal length.
    #[error("fragment body of {len} bytes exceeds nominal length {nominal_length}")]
    BodyTooLong { len: usize, nominal_length: u16 },
    /// The final fragment body must at least contain its tag block.
    #[error("fragment body of {len} bytes cannot hold its {tags_length}-byte tag block")]
    BodyShorterThanTags { len: usize, tags_length: u16 },
}

/// Errors produced while parsing a single inbound datagram.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Fewer bytes than a header.
    #[error("datagram too short: {len} bytes")]
    TooShort { len: usize },
    /// The datagram belongs to another protocol or protocol version.
    #[error("unknown protocol marker {found:02x?}")]
    UnknownMarker { found: [u8; 2] },
    /// The header fields contradict each other.
    #[error("invalid fragment header: {0}")]
    InvalidHeader(#[from] HeaderViolation),
}

impl DecodeError {
    /// Short, stable label used for logs and metrics.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::TooShort { .. } => "too_short",
            Self::UnknownMarker { .. } => "unknown_marker",
            Self::InvalidHeader(_) => "invalid_header",
        }
    }
}

/// Errors produced by the [`Reassembler`](crate::fragment::Reassembler).
///
/// Every variant means the fragment was not accepted. Except for
/// [`ReassemblyError::CapacityExceeded`] and [`ReassemblyError::MessageTooLarge`],
/// which refuse admission of a new message, the partial state for the key
/// has also been discarded.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ReassemblyError {
    /// A fragment's framing contradicts the earlier fragments of the message.
    #[error("fragment framing for message {message_id} changed mid-stream")]
    InconsistentHeader { message_id: MessageId },
    /// The fully assembled payload failed its integrity check.
    #[error("payload hash mismatch for message {message_id}: declared {declared:#010x}, computed {computed:#010x}")]
    HashMismatch {
        message_id: MessageId,
        declared: u32,
        computed: u32,
    },
    /// Too many messages are already in flight.
    #[error("reassembly capacity of {limit} in-flight messages exhausted")]
    CapacityExceeded { limit: NonZeroUsize },
    /// The declared message length exceeds the configured cap.
    #[error("message {message_id} declares {declared} bytes, above the {limit} byte cap")]
    MessageTooLarge {
        message_id: MessageId,
        declared: u32,
        limit: NonZeroUsize,
    },
    /// The fragment body or count does not match the message's packing.
    #[error("fragment {index} of message {message_id} does not fit the message layout")]
    InvalidFragment {
        message_id: MessageId,
        index: FragmentIndex,
    },
    /// The assembled tag block is not valid UTF-8.
    #[error("tag block of message {message_id} is not valid UTF-8")]
    MalformedTags { message_id: MessageId },
}

impl ReassemblyError {
    /// Short, stable label used for logs and metrics.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::InconsistentHeader { .. } => "inconsistent_header",
            Self::HashMismatch { .. } => "hash_mismatch",
            Self::CapacityExceeded { .. } => "capacity_exceeded",
            Self::MessageTooLarge { .. } => "message_too_large",
            Self::InvalidFragment { .. } => "invalid_fragment",
            Self::MalformedTags { .. } => "malformed_tags",
        }
    }

    /// Report whether the error signals data corruption rather than a
    /// protocol or resource failure.
    #[must_use]
    pub const fn is_corruption(&self) -> bool { matches!(self, Self::HashMismatch { .. }) }
}
