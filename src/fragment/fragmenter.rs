//! Outbound helper that splits logical messages into wire fragments.
//!
//! [`Fragmenter`] is pure and stateless beyond its configured size: identical
//! messages always produce identical fragment sequences, so a retry path can
//! resend a message and the receiver sees byte-identical fragments.

use std::num::NonZeroU16;

use bytes::{BufMut, Bytes, BytesMut};

use super::{
    Fragment,
    FragmentHeader,
    FragmentIndex,
    FragmentLayout,
    FragmentationError,
    HEADER_LEN,
    MessageFraming,
    MessageId,
    payload_hash,
    tags,
};
use crate::message::Message;

/// Smallest wire size that fits a header plus one content byte.
pub const MIN_FRAGMENT_SIZE: usize = HEADER_LEN + 1;

/// Largest wire size whose content length still fits the 16-bit field.
pub const MAX_FRAGMENT_SIZE: usize = HEADER_LEN + u16::MAX as usize;

/// Content bytes per fragment at the default 1400-byte wire size.
const DEFAULT_NOMINAL_LENGTH: NonZeroU16 = NonZeroU16::new(1376).unwrap();

/// Splits messages into fragments no larger than a configured wire size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fragmenter {
    nominal_length: NonZeroU16,
}

impl Default for Fragmenter {
    fn default() -> Self {
        Self {
            nominal_length: DEFAULT_NOMINAL_LENGTH,
        }
    }
}

impl Fragmenter {
    /// Create a fragmenter whose fragments, header included, never exceed
    /// `max_fragment_size` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentationError::Configuration`] unless
    /// `max_fragment_size` lies within
    /// [`MIN_FRAGMENT_SIZE`]`..=`[`MAX_FRAGMENT_SIZE`].
    pub fn new(max_fragment_size: usize) -> Result<Self, FragmentationError> {
        max_fragment_size
            .checked_sub(HEADER_LEN)
            .and_then(|content| u16::try_from(content).ok())
            .and_then(NonZeroU16::new)
            .map(|nominal_length| Self { nominal_length })
            .ok_or(FragmentationError::Configuration { max_fragment_size })
    }

    /// Content bytes available per fragment.
    #[must_use]
    pub const fn nominal_length(&self) -> NonZeroU16 { self.nominal_length }

    /// Wire size ceiling per fragment, header included.
    #[must_use]
    pub const fn max_fragment_size(&self) -> usize {
        HEADER_LEN + self.nominal_length.get() as usize
    }

    /// Split `message` into fragments.
    ///
    /// Every fragment but the last carries payload only. The last carries the
    /// encoded tag block followed by the remaining payload.
    ///
    /// # Examples
    ///
    /// ```
    /// use wirefrag::{Message, fragment::{Fragmenter, MessageId}};
    ///
    /// let fragmenter = Fragmenter::new(30).expect("valid size");
    /// let message = Message::new(MessageId::new(1), vec![0x41; 13]).with_tags(["a", "bb"]);
    /// let batch = fragmenter.fragment(&message).expect("fragment message");
    /// assert_eq!(batch.len(), 3);
    /// assert_eq!(batch.fragments()[2].raw_body(), b"a\0bbA");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`FragmentationError::InvalidTag`] or
    /// [`FragmentationError::TagsTooLarge`] when the tags cannot be packed,
    /// [`FragmentationError::MessageTooLarge`] when the payload length does
    /// not fit the 32-bit field, and [`FragmentationError::TooManyFragments`]
    /// when more than `u16::MAX` fragments would be required.
    pub fn fragment(&self, message: &Message) -> Result<FragmentBatch, FragmentationError> {
        let payload = message.payload();
        let message_length = u32::try_from(payload.len())
            .map_err(|_| FragmentationError::MessageTooLarge { len: payload.len() })?;

        let nominal = usize::from(self.nominal_length.get());
        let tag_block = tags::encode(message.tags())?;
        let tags_length = u16::try_from(tag_block.len())
            .ok()
            .filter(|len| usize::from(*len) <= nominal)
            .ok_or(FragmentationError::TagsTooLarge {
                tags_length: tag_block.len(),
                nominal_length: self.nominal_length.get(),
            })?;

        let required = FragmentLayout::fragment_count_for(payload.len(), tag_block.len(), nominal);
        let fragment_count = u16::try_from(required)
            .map_err(|_| FragmentationError::TooManyFragments { required })?;

        let framing = MessageFraming {
            message_id: message.message_id(),
            fragment_count,
            nominal_length: self.nominal_length.get(),
            message_length,
            payload_hash: payload_hash(payload),
        };
        let layout = FragmentLayout::new(payload.len(), nominal, required);

        let fragments: Vec<Fragment> = (0..fragment_count)
            .map(FragmentIndex::new)
            .map(|index| {
                let chunk = payload.slice(layout.chunk_range(index));
                if index.is_last_of(fragment_count) {
                    let header = FragmentHeader::new(framing, index, tags_length);
                    Fragment::new(header, final_body(&tag_block, chunk))
                } else {
                    Fragment::new(FragmentHeader::new(framing, index, 0), chunk)
                }
            })
            .collect();

        tracing::trace!(
            message_id = %framing.message_id,
            fragments = fragments.len(),
            message_length,
            tags_length,
            "fragmented message"
        );
        crate::metrics::inc_fragments_encoded(fragments.len());
        Ok(FragmentBatch::new(message.message_id(), fragments))
    }
}

fn final_body(tag_block: &Bytes, chunk: Bytes) -> Bytes {
    if tag_block.is_empty() {
        return chunk;
    }
    let mut body = BytesMut::with_capacity(tag_block.len() + chunk.len());
    body.put_slice(tag_block);
    body.put_slice(&chunk);
    body.freeze()
}

/// Collection of fragments produced for a single logical message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FragmentBatch {
    message_id: MessageId,
    fragments: Vec<Fragment>,
}

impl FragmentBatch {
    fn new(message_id: MessageId, fragments: Vec<Fragment>) -> Self {
        debug_assert!(!fragments.is_empty(), "fragment batches must not be empty");
        Self {
            message_id,
            fragments,
        }
    }

    /// Return the [`MessageId`] shared by all fragments.
    #[must_use]
    pub const fn message_id(&self) -> MessageId { self.message_id }

    /// Return the fragments in index order.
    #[must_use]
    pub fn fragments(&self) -> &[Fragment] { self.fragments.as_slice() }

    /// Number of fragments in the batch.
    #[expect(
        clippy::len_without_is_empty,
        reason = "batches are guaranteed non-empty"
    )]
    #[must_use]
    pub fn len(&self) -> usize { self.fragments.len() }

    /// Whether the message required more than one fragment.
    #[must_use]
    pub fn is_fragmented(&self) -> bool { self.len() > 1 }

    /// Encode every fragment into a datagram, in index order.
    pub fn datagrams(&self) -> impl Iterator<Item = Bytes> + '_ {
        self.fragments.iter().map(Fragment::encode)
    }

    /// Consume the batch, returning all fragments.
    #[must_use]
    pub fn into_fragments(self) -> Vec<Fragment> { self.fragments }
}

impl IntoIterator for FragmentBatch {
    type Item = Fragment;
    type IntoIter = std::vec::IntoIter<Fragment>;

    fn into_iter(self) -> Self::IntoIter { self.fragments.into_iter() }
}
