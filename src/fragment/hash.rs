//! Payload integrity hash.

use std::io::Cursor;

/// Seed shared by every sender and receiver of the protocol.
pub const PAYLOAD_HASH_SEED: u32 = 0;

/// MurmurHash3 (x86, 32-bit) over a complete payload.
///
/// The hash is order-sensitive and deterministic, so a transposed or flipped
/// byte anywhere in the reassembled payload changes the result.
///
/// # Examples
///
/// ```
/// use wirefrag::fragment::payload_hash;
/// assert_eq!(payload_hash(b"hello"), 0x248b_fa47);
/// assert_ne!(payload_hash(b"abc"), payload_hash(b"acb"));
/// ```
#[must_use]
pub fn payload_hash(payload: &[u8]) -> u32 {
    match murmur3::murmur3_32(&mut Cursor::new(payload), PAYLOAD_HASH_SEED) {
        Ok(hash) => hash,
        Err(err) => unreachable!("reading an in-memory cursor cannot fail: {err}"),
    }
}
