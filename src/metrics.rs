//! Metric helpers for `wirefrag`.
//!
//! This module defines metric names and simple helper functions wrapping the
//! [`metrics`](https://docs.rs/metrics) crate. Without the `metrics` feature
//! the helpers compile to no-ops.

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

/// Counter of fragments produced by the fragmenter.
pub const FRAGMENTS_ENCODED: &str = "wirefrag_fragments_encoded_total";
/// Counter of inbound datagrams parsed into fragments.
pub const DATAGRAMS_DECODED: &str = "wirefrag_datagrams_decoded_total";
/// Counter of inbound datagrams dropped as malformed, labelled by `reason`.
pub const DECODE_ERRORS: &str = "wirefrag_decode_errors_total";
/// Counter of messages delivered by the reassembler.
pub const MESSAGES_REASSEMBLED: &str = "wirefrag_messages_reassembled_total";
/// Counter of rejected fragments and messages, labelled by `reason`.
pub const REASSEMBLY_REJECTIONS: &str = "wirefrag_reassembly_rejections_total";
/// Counter of incomplete messages evicted after the timeout.
pub const MESSAGES_EXPIRED: &str = "wirefrag_messages_expired_total";
/// Gauge of messages currently collecting fragments.
pub const MESSAGES_IN_FLIGHT: &str = "wirefrag_messages_in_flight";

/// Record `count` freshly encoded fragments.
pub fn inc_fragments_encoded(count: usize) {
    #[cfg(feature = "metrics")]
    counter!(FRAGMENTS_ENCODED).increment(count as u64);
    #[cfg(not(feature = "metrics"))]
    let _ = count;
}

/// Record a successfully decoded datagram.
pub fn inc_datagrams_decoded() {
    #[cfg(feature = "metrics")]
    counter!(DATAGRAMS_DECODED).increment(1);
}

/// Record a dropped datagram.
pub fn inc_decode_errors(reason: &'static str) {
    #[cfg(feature = "metrics")]
    counter!(DECODE_ERRORS, "reason" => reason).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = reason;
}

/// Record a completed message.
pub fn inc_messages_reassembled() {
    #[cfg(feature = "metrics")]
    counter!(MESSAGES_REASSEMBLED).increment(1);
}

/// Record a reassembly rejection.
pub fn inc_reassembly_rejections(reason: &'static str) {
    #[cfg(feature = "metrics")]
    counter!(REASSEMBLY_REJECTIONS, "reason" => reason).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = reason;
}

/// Record an evicted incomplete message.
pub fn inc_messages_expired() {
    #[cfg(feature = "metrics")]
    counter!(MESSAGES_EXPIRED).increment(1);
}

/// Publish the current number of in-flight messages.
#[cfg_attr(
    feature = "metrics",
    expect(
        clippy::cast_precision_loss,
        reason = "in-flight counts are far below f64 precision limits"
    )
)]
pub fn set_in_flight(count: usize) {
    #[cfg(feature = "metrics")]
    gauge!(MESSAGES_IN_FLIGHT).set(count as f64);
    #[cfg(not(feature = "metrics"))]
    let _ = count;
}
