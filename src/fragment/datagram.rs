//! Wire representation of a single fragment.
//!
//! A [`Fragment`] is the unit exchanged in both directions: the
//! [`Fragmenter`](crate::fragment::Fragmenter) produces them and
//! [`Fragment::decode`] parses them back out of inbound datagrams. The body is
//! kept opaque on the wire; [`Fragment::body`] exposes the final fragment's
//! tag block and payload chunk as separate slices.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use super::{DecodeError, FragmentHeader, HEADER_LEN, HeaderViolation};

/// Header and body of one fragment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fragment {
    header: FragmentHeader,
    body: Bytes,
}

/// A fragment body split according to its position in the message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FragmentBody<'a> {
    /// Any fragment except the last: payload bytes only.
    Regular { chunk: &'a [u8] },
    /// The last fragment: tag block followed by the payload remainder.
    Final { tags: &'a [u8], chunk: &'a [u8] },
}

impl<'a> FragmentBody<'a> {
    /// Payload bytes carried by this body.
    #[must_use]
    pub const fn chunk(&self) -> &'a [u8] {
        match *self {
            Self::Regular { chunk } | Self::Final { chunk, .. } => chunk,
        }
    }
}

impl Fragment {
    /// Construct a fragment from its parts.
    #[must_use]
    pub fn new(header: FragmentHeader, body: Bytes) -> Self { Self { header, body } }

    /// Return the fragment header.
    #[must_use]
    pub const fn header(&self) -> &FragmentHeader { &self.header }

    /// Return the raw body bytes, tag block included.
    #[must_use]
    pub fn raw_body(&self) -> &[u8] { &self.body }

    /// Split the body into its tag block and payload chunk.
    ///
    /// A decoded fragment's body always holds its full tag block, so the split
    /// point is in range.
    #[must_use]
    pub fn body(&self) -> FragmentBody<'_> {
        if self.header.is_last_fragment() {
            let split = usize::from(self.header.tags_length()).min(self.body.len());
            let (tags, chunk) = self.body.split_at(split);
            FragmentBody::Final { tags, chunk }
        } else {
            FragmentBody::Regular { chunk: &self.body }
        }
    }

    /// Total size of the fragment on the wire.
    #[must_use]
    pub fn wire_len(&self) -> usize { HEADER_LEN + self.body.len() }

    /// Encode the fragment into a datagram.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.wire_len());
        buf.put_slice(&self.header.encode());
        buf.put_slice(&self.body);
        buf.freeze()
    }

    /// Parse one inbound datagram.
    ///
    /// Only per-datagram checks happen here; whether the fragment fits the
    /// message it claims to belong to is left to the reassembler.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::TooShort`] for datagrams shorter than a header,
    /// [`DecodeError::UnknownMarker`] for foreign protocols, and
    /// [`DecodeError::InvalidHeader`] when the header contradicts itself or
    /// the body length.
    pub fn decode(mut datagram: Bytes) -> Result<Self, DecodeError> {
        let header = FragmentHeader::decode(&datagram)?;
        let body = datagram.split_off(HEADER_LEN);

        let nominal_length = header.framing().nominal_length;
        if body.len() > usize::from(nominal_length) {
            return Err(HeaderViolation::BodyTooLong {
                len: body.len(),
                nominal_length,
            }
            .into());
        }
        if body.len() < usize::from(header.tags_length()) {
            return Err(HeaderViolation::BodyShorterThanTags {
                len: body.len(),
                tags_length: header.tags_length(),
            }
            .into());
        }
        Ok(Self { header, body })
    }
}

/// Decode a datagram received from `sender`, logging and counting drops.
///
/// # Errors
///
/// Propagates the [`DecodeError`] from [`Fragment::decode`].
pub fn decode_datagram<S: fmt::Debug>(datagram: Bytes, sender: &S) -> Result<Fragment, DecodeError> {
    match Fragment::decode(datagram) {
        Ok(fragment) => {
            crate::metrics::inc_datagrams_decoded();
            Ok(fragment)
        }
        Err(err) => {
            tracing::debug!(?sender, reason = err.reason(), error = %err, "dropping malformed datagram");
            crate::metrics::inc_decode_errors(err.reason());
            Err(err)
        }
    }
}
