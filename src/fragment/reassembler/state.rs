//! Per-key reassembly state.

use std::time::{Duration, Instant};

use bytes::Bytes;

use crate::{
    fragment::{
        Fragment,
        FragmentBody,
        FragmentLayout,
        MessageFraming,
        ReassemblyError,
        payload_hash,
        tags,
    },
    message::Message,
};

/// Effect of accepting one fragment into a [`ReassemblyState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Progress {
    /// More fragments are required.
    Pending,
    /// The index was already received; the body was discarded.
    Duplicate,
    /// Every index has been received.
    Complete,
}

/// Fragments collected so far for one `(sender, message id)` key.
#[derive(Debug)]
pub(super) struct ReassemblyState {
    framing: MessageFraming,
    layout: FragmentLayout,
    received: Vec<bool>,
    remaining: usize,
    payload: Vec<u8>,
    tags: Bytes,
    first_seen_at: Instant,
}

impl ReassemblyState {
    /// Start collecting the message described by `framing`.
    ///
    /// The caller has already checked that the declared length is within the
    /// configured cap, so the payload buffer is allocated up front.
    pub(super) fn new(framing: MessageFraming, first_seen_at: Instant) -> Result<Self, ReassemblyError> {
        let layout = FragmentLayout::from_framing(&framing);
        if !layout.is_plausible() {
            return Err(ReassemblyError::InvalidFragment {
                message_id: framing.message_id,
                index: framing.last_index(),
            });
        }
        let count = layout.fragment_count();
        Ok(Self {
            framing,
            layout,
            received: vec![false; count],
            remaining: count,
            payload: vec![0; framing.message_length as usize],
            tags: Bytes::new(),
            first_seen_at,
        })
    }

    pub(super) fn is_expired(&self, now: Instant, timeout: Duration) -> bool {
        now.saturating_duration_since(self.first_seen_at) >= timeout
    }

    /// Record `fragment`, copying its chunk into place.
    pub(super) fn accept(&mut self, fragment: &Fragment) -> Result<Progress, ReassemblyError> {
        let header = fragment.header();
        let message_id = self.framing.message_id;
        if *header.framing() != self.framing {
            return Err(ReassemblyError::InconsistentHeader { message_id });
        }

        let index = header.fragment_index();
        let invalid = ReassemblyError::InvalidFragment { message_id, index };
        let Some(seen) = self.received.get_mut(index.as_usize()) else {
            return Err(invalid);
        };
        if *seen {
            return Ok(Progress::Duplicate);
        }

        let range = self.layout.chunk_range(index);
        let body = fragment.body();
        if body.chunk().len() != range.len() {
            return Err(invalid);
        }
        if let FragmentBody::Final { tags, .. } = body {
            if tags.len() != usize::from(header.tags_length()) {
                return Err(invalid);
            }
            self.tags = Bytes::copy_from_slice(tags);
        }
        self.payload[range].copy_from_slice(body.chunk());

        *seen = true;
        self.remaining -= 1;
        if self.remaining == 0 {
            Ok(Progress::Complete)
        } else {
            Ok(Progress::Pending)
        }
    }

    /// Verify the assembled payload and produce the message.
    pub(super) fn finish(self) -> Result<Message, ReassemblyError> {
        let message_id = self.framing.message_id;
        let computed = payload_hash(&self.payload);
        if computed != self.framing.payload_hash {
            return Err(ReassemblyError::HashMismatch {
                message_id,
                declared: self.framing.payload_hash,
                computed,
            });
        }
        let tags =
            tags::decode(&self.tags).map_err(|_| ReassemblyError::MalformedTags { message_id })?;
        Ok(Message::new(message_id, self.payload).with_tags(tags))
    }
}
