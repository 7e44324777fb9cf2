use derive_more::{Display, From, Into};

/// Identifier of a logical message on the wire.
///
/// Identifiers are 32 bits wide and senders are free to wrap or reuse them;
/// the receiver scopes them per sender endpoint.
///
/// # Examples
///
/// ```
/// use wirefrag::fragment::MessageId;
/// let id = MessageId::new(42);
/// assert_eq!(id.get(), 42);
/// assert_eq!(id.wrapping_next(), MessageId::new(43));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Into)]
#[display("{_0}")]
pub struct MessageId(u32);

impl MessageId {
    /// Create a new identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self { Self(value) }

    /// Return the inner numeric identifier.
    #[must_use]
    pub const fn get(self) -> u32 { self.0 }

    /// Return the following identifier, wrapping at `u32::MAX`.
    #[must_use]
    pub const fn wrapping_next(self) -> Self { Self(self.0.wrapping_add(1)) }
}
