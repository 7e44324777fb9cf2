//! Logical messages carried by the fragmentation protocol.

use bytes::Bytes;

use crate::fragment::MessageId;

/// Payload bytes plus ordered tag metadata.
///
/// The same type is handed to the [`Fragmenter`](crate::fragment::Fragmenter)
/// and returned by the [`Reassembler`](crate::fragment::Reassembler) once a
/// message is complete, so a successful round trip compares equal.
///
/// # Examples
///
/// ```
/// use wirefrag::{Message, fragment::MessageId};
///
/// let message = Message::new(MessageId::new(3), &b"disk full"[..]).with_tags(["host=a", "sev=warn"]);
/// assert_eq!(message.payload().as_ref(), b"disk full");
/// assert_eq!(message.tags(), ["host=a", "sev=warn"]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    message_id: MessageId,
    payload: Bytes,
    tags: Vec<String>,
}

impl Message {
    /// Create an untagged message.
    #[must_use]
    pub fn new(message_id: MessageId, payload: impl Into<Bytes>) -> Self {
        Self {
            message_id,
            payload: payload.into(),
            tags: Vec::new(),
        }
    }

    /// Replace the tags, preserving their order.
    #[must_use]
    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Identifier shared by the message's fragments.
    #[must_use]
    pub const fn message_id(&self) -> MessageId { self.message_id }

    /// Borrow the payload.
    #[must_use]
    pub const fn payload(&self) -> &Bytes { &self.payload }

    /// Borrow the tags in their original order.
    #[must_use]
    pub fn tags(&self) -> &[String] { &self.tags }

    /// Consume the message, returning payload and tags.
    #[must_use]
    pub fn into_parts(self) -> (MessageId, Bytes, Vec<String>) {
        (self.message_id, self.payload, self.tags)
    }
}
