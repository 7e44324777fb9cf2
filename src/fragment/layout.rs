//! Packing rule mapping payload bytes onto fragment indices.
//!
//! Payload bytes are laid out front to back, `nominal` bytes per fragment.
//! The final fragment carries the tag block followed by whatever payload is
//! left. When a large tag block pushes the fragment count up, the last regular
//! fragment may come up short and the final fragment may carry tags only; the
//! final body still never exceeds `nominal` bytes.

use std::ops::Range;

use super::{FragmentIndex, MessageFraming};

/// Byte layout of one message across its fragments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FragmentLayout {
    nominal: usize,
    message_length: usize,
    fragment_count: usize,
}

impl FragmentLayout {
    /// Number of fragments needed for `message_length` payload bytes plus a
    /// `tags_length` byte tag block. Never zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use wirefrag::fragment::FragmentLayout;
    /// assert_eq!(FragmentLayout::fragment_count_for(13, 4, 6), 3);
    /// assert_eq!(FragmentLayout::fragment_count_for(12, 0, 6), 2);
    /// assert_eq!(FragmentLayout::fragment_count_for(0, 0, 6), 1);
    /// ```
    #[must_use]
    pub fn fragment_count_for(message_length: usize, tags_length: usize, nominal: usize) -> usize {
        (message_length + tags_length).div_ceil(nominal.max(1)).max(1)
    }

    /// Layout with an explicit fragment count.
    #[must_use]
    pub fn new(message_length: usize, nominal: usize, fragment_count: usize) -> Self {
        Self {
            nominal: nominal.max(1),
            message_length,
            fragment_count: fragment_count.max(1),
        }
    }

    /// Layout declared by a fragment header.
    #[must_use]
    pub fn from_framing(framing: &MessageFraming) -> Self {
        Self::new(
            framing.message_length as usize,
            usize::from(framing.nominal_length),
            usize::from(framing.fragment_count),
        )
    }

    /// Total number of fragments.
    #[must_use]
    pub const fn fragment_count(&self) -> usize { self.fragment_count }

    /// Report whether the fragment count could have been produced for this
    /// payload length with some tag block of at most `nominal` bytes.
    #[must_use]
    pub fn is_plausible(&self) -> bool {
        let fewest = Self::fragment_count_for(self.message_length, 0, self.nominal);
        let most = Self::fragment_count_for(self.message_length, self.nominal, self.nominal);
        (fewest..=most).contains(&self.fragment_count)
    }

    /// Range of payload bytes carried by the fragment at `index`.
    ///
    /// For the final fragment this excludes the tag block that precedes the
    /// chunk in its body.
    #[must_use]
    pub fn chunk_range(&self, index: FragmentIndex) -> Range<usize> {
        let index = index.as_usize();
        let start = index
            .saturating_mul(self.nominal)
            .min(self.message_length);
        if index + 1 >= self.fragment_count {
            return start..self.message_length;
        }
        let end = start.saturating_add(self.nominal).min(self.message_length);
        start..end
    }
}
