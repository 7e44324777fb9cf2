//! Inbound engine that stitches fragments back into complete messages.
//!
//! [`Reassembler`] collects fragments keyed by sender endpoint and
//! [`MessageId`], tolerating reordering and duplication. State lives in a
//! sharded [`DashMap`], so fragments for unrelated keys rarely contend and
//! fragments for the same key are serialised by that key's entry guard for the
//! duration of one [`Reassembler::ingest`] call. Incomplete messages are
//! evicted after a fixed timeout, either by a periodic sweep (see
//! [`sweeper`]) or lazily when a later fragment touches the stale key.

pub mod sweeper;
mod state;

use std::{
    fmt,
    hash::Hash,
    net::SocketAddr,
    num::NonZeroUsize,
    sync::atomic::{AtomicUsize, Ordering},
    time::{Duration, Instant},
};

use dashmap::{DashMap, mapref::entry::Entry};
use state::{Progress, ReassemblyState};

use super::{Fragment, FragmentationConfig, MessageId, ReassemblyError};
use crate::message::Message;

/// Stateful fragment re-assembler with timeout-based eviction.
///
/// `S` identifies the sender endpoint. It is opaque to the reassembler and
/// only scopes message identifiers, so two senders may reuse the same id
/// concurrently.
///
/// # Examples
///
/// ```
/// use wirefrag::{Message, fragment::{FragmentationConfig, MessageId, Reassembler}};
///
/// let config = FragmentationConfig::new(64).expect("valid size");
/// let reassembler: Reassembler<u16> = Reassembler::new(&config);
/// let message = Message::new(MessageId::new(9), vec![7_u8; 100]).with_tags(["job=a"]);
///
/// let mut completed = None;
/// for fragment in config.fragmenter().fragment(&message).expect("fragment") {
///     completed = reassembler.ingest(fragment, 4000).expect("accepted");
/// }
/// assert_eq!(completed, Some(message));
/// assert_eq!(reassembler.in_flight(), 0);
/// ```
pub struct Reassembler<S = SocketAddr> {
    timeout: Duration,
    max_in_flight: NonZeroUsize,
    max_message_size: NonZeroUsize,
    entries: DashMap<(S, MessageId), ReassemblyState>,
    in_flight: AtomicUsize,
}

impl<S> fmt::Debug for Reassembler<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reassembler")
            .field("timeout", &self.timeout)
            .field("max_in_flight", &self.max_in_flight)
            .field("max_message_size", &self.max_message_size)
            .field("in_flight", &self.in_flight.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl<S> Reassembler<S>
where
    S: Eq + Hash + Clone + fmt::Debug,
{
    /// Create a re-assembler enforcing the limits in `config`.
    #[must_use]
    pub fn new(config: &FragmentationConfig) -> Self {
        Self {
            timeout: config.reassembly_timeout,
            max_in_flight: config.max_in_flight,
            max_message_size: config.max_message_size,
            entries: DashMap::new(),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Configured reassembly timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration { self.timeout }

    /// Process a fragment using the current time.
    ///
    /// Returns `Ok(Some(_))` when the fragment completes its message,
    /// `Ok(None)` while more fragments are required (duplicates included), or
    /// an error when the fragment is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError`] when the fragment contradicts earlier
    /// fragments, the completed payload fails its hash check, or admission of
    /// a new message would exceed the configured limits.
    pub fn ingest(&self, fragment: Fragment, sender: S) -> Result<Option<Message>, ReassemblyError> {
        self.ingest_at(fragment, sender, Instant::now())
    }

    /// Process a fragment using an explicit clock reading.
    ///
    /// Accepting an explicit `now` simplifies deterministic testing and allows
    /// callers to co-ordinate eviction with their own timers.
    ///
    /// # Errors
    ///
    /// See [`Reassembler::ingest`].
    pub fn ingest_at(
        &self,
        fragment: Fragment,
        sender: S,
        now: Instant,
    ) -> Result<Option<Message>, ReassemblyError> {
        let key = (sender, fragment.header().message_id());

        match self.entries.entry(key) {
            Entry::Occupied(occupied) if occupied.get().is_expired(now, self.timeout) => {
                let ((sender, message_id), _) = occupied.remove_entry();
                self.release_slot();
                self.record_expiry(&sender, message_id);
                self.ingest_at(fragment, sender, now)
            }
            Entry::Occupied(mut occupied) => match occupied.get_mut().accept(&fragment) {
                Ok(Progress::Pending) => Ok(None),
                Ok(Progress::Duplicate) => {
                    tracing::debug!(
                        sender = ?occupied.key().0,
                        message_id = %occupied.key().1,
                        index = %fragment.header().fragment_index(),
                        "discarding duplicate fragment"
                    );
                    Ok(None)
                }
                Ok(Progress::Complete) => {
                    let ((sender, _), state) = occupied.remove_entry();
                    self.release_slot();
                    self.complete(&sender, state)
                }
                Err(err) => {
                    let ((sender, _), _) = occupied.remove_entry();
                    self.release_slot();
                    Err(self.reject(&sender, err))
                }
            },
            Entry::Vacant(vacant) if fragment.header().framing().fragment_count == 1 => {
                let sender = vacant.into_key().0;
                let mut state = self
                    .admit(&fragment, now)
                    .map_err(|err| self.reject(&sender, err))?;
                match state.accept(&fragment) {
                    Ok(_) => self.complete(&sender, state),
                    Err(err) => Err(self.reject(&sender, err)),
                }
            }
            Entry::Vacant(vacant) => {
                if !self.reserve_slot() {
                    let (sender, _) = vacant.into_key();
                    return self.ingest_after_purge(fragment, sender, now);
                }
                let sender = vacant.key().0.clone();
                let mut state = match self.admit(&fragment, now) {
                    Ok(state) => state,
                    Err(err) => {
                        self.release_slot();
                        return Err(self.reject(&sender, err));
                    }
                };
                match state.accept(&fragment) {
                    Ok(Progress::Complete) => {
                        self.release_slot();
                        self.complete(&sender, state)
                    }
                    Ok(_) => {
                        vacant.insert(state);
                        Ok(None)
                    }
                    Err(err) => {
                        self.release_slot();
                        Err(self.reject(&sender, err))
                    }
                }
            }
        }
    }

    /// Retry admission after evicting expired entries, which may free slots
    /// the sweep has not reclaimed yet.
    ///
    /// Must be called without holding an entry guard, as the purge visits
    /// every shard.
    fn ingest_after_purge(
        &self,
        fragment: Fragment,
        sender: S,
        now: Instant,
    ) -> Result<Option<Message>, ReassemblyError> {
        if self.purge_expired_at(now).is_empty() {
            let err = ReassemblyError::CapacityExceeded {
                limit: self.max_in_flight,
            };
            return Err(self.reject(&sender, err));
        }
        self.ingest_at(fragment, sender, now)
    }

    /// Remove every partial message older than the configured timeout.
    ///
    /// Returns the keys that were evicted.
    pub fn purge_expired(&self) -> Vec<(S, MessageId)> { self.purge_expired_at(Instant::now()) }

    /// Remove every partial message older than the configured timeout using
    /// an explicit clock reading.
    ///
    /// Keys are collected first and then evicted one at a time, so no lock is
    /// held for longer than a single check-and-remove.
    pub fn purge_expired_at(&self, now: Instant) -> Vec<(S, MessageId)> {
        let timeout = self.timeout;
        let candidates: Vec<(S, MessageId)> = self
            .entries
            .iter()
            .filter(|entry| entry.value().is_expired(now, timeout))
            .map(|entry| entry.key().clone())
            .collect();

        candidates
            .into_iter()
            .filter_map(|key| {
                self.entries
                    .remove_if(&key, |_, state| state.is_expired(now, timeout))
            })
            .map(|(key, _)| {
                self.release_slot();
                self.record_expiry(&key.0, key.1);
                key
            })
            .collect()
    }

    /// Number of messages currently collecting fragments.
    #[must_use]
    pub fn in_flight(&self) -> usize { self.in_flight.load(Ordering::Acquire) }

    /// Report whether a partial message is buffered for `sender` and `message_id`.
    #[must_use]
    pub fn contains(&self, sender: &S, message_id: MessageId) -> bool {
        self.entries.contains_key(&(sender.clone(), message_id))
    }

    fn admit(&self, fragment: &Fragment, now: Instant) -> Result<ReassemblyState, ReassemblyError> {
        let framing = *fragment.header().framing();
        if framing.message_length as usize > self.max_message_size.get() {
            return Err(ReassemblyError::MessageTooLarge {
                message_id: framing.message_id,
                declared: framing.message_length,
                limit: self.max_message_size,
            });
        }
        ReassemblyState::new(framing, now)
    }

    fn complete(&self, sender: &S, state: ReassemblyState) -> Result<Option<Message>, ReassemblyError> {
        match state.finish() {
            Ok(message) => {
                tracing::debug!(
                    ?sender,
                    message_id = %message.message_id(),
                    len = message.payload().len(),
                    tags = message.tags().len(),
                    "message reassembled"
                );
                crate::metrics::inc_messages_reassembled();
                Ok(Some(message))
            }
            Err(err) => Err(self.reject(sender, err)),
        }
    }

    fn reject(&self, sender: &S, err: ReassemblyError) -> ReassemblyError {
        if err.is_corruption() {
            tracing::warn!(?sender, reason = err.reason(), error = %err, "discarding corrupted message");
        } else {
            tracing::debug!(?sender, reason = err.reason(), error = %err, "rejecting fragment");
        }
        crate::metrics::inc_reassembly_rejections(err.reason());
        err
    }

    fn record_expiry(&self, sender: &S, message_id: MessageId) {
        tracing::debug!(?sender, %message_id, timeout = ?self.timeout, "evicting incomplete message");
        crate::metrics::inc_messages_expired();
    }

    fn reserve_slot(&self) -> bool {
        let limit = self.max_in_flight.get();
        let reserved = self
            .in_flight
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current < limit).then_some(current + 1)
            });
        if let Ok(previous) = reserved {
            crate::metrics::set_in_flight(previous + 1);
        }
        reserved.is_ok()
    }

    fn release_slot(&self) {
        let previous = self.in_flight.fetch_sub(1, Ordering::AcqRel);
        crate::metrics::set_in_flight(previous.saturating_sub(1));
    }
}
