//! Zero-based fragment positioning within logical messages.
//!
//! Provides [`FragmentIndex`], a type-safe wrapper around the 16-bit index
//! field carried in every fragment header.

use std::num::TryFromIntError;

use derive_more::{Display, From};

/// Zero-based ordinal describing a fragment's position within its message.
///
/// # Examples
///
/// ```
/// use wirefrag::fragment::FragmentIndex;
/// let index = FragmentIndex::new(3);
/// assert_eq!(index.get(), 3);
/// assert!(index.is_last_of(4));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From)]
#[display("{_0}")]
pub struct FragmentIndex(u16);

impl FragmentIndex {
    /// Construct an index from a `u16` value.
    #[must_use]
    pub const fn new(value: u16) -> Self { Self(value) }

    /// Return the first valid fragment index.
    #[must_use]
    pub const fn zero() -> Self { Self(0) }

    /// Return the underlying numeric value.
    #[must_use]
    pub const fn get(self) -> u16 { self.0 }

    /// Report whether this index is the final one of a `fragment_count`
    /// fragment message.
    #[must_use]
    pub const fn is_last_of(self, fragment_count: u16) -> bool {
        fragment_count > 0 && self.0 == fragment_count - 1
    }

    /// The index as a `usize`, for offset arithmetic and bitmap lookups.
    #[must_use]
    pub const fn as_usize(self) -> usize { self.0 as usize }
}

impl TryFrom<usize> for FragmentIndex {
    type Error = TryFromIntError;

    fn try_from(value: usize) -> Result<Self, Self::Error> { u16::try_from(value).map(Self) }
}

impl From<FragmentIndex> for u16 {
    fn from(value: FragmentIndex) -> Self { value.0 }
}
