//! Errors raised by the UDP transport.

use std::io;

use thiserror::Error;

use crate::fragment::FragmentationError;

/// Failure while sending or receiving fragmented messages.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The socket reported an I/O failure.
    #[error("transport I/O error: {0}")]
    Io(#[from] io::Error),
    /// The message could not be split into fragments.
    #[error(transparent)]
    Fragmentation(#[from] FragmentationError),
    /// The socket accepted fewer bytes than the datagram holds.
    #[error("datagram truncated on send: wrote {written} of {expected} bytes")]
    ShortWrite {
        /// Bytes the socket reported as sent.
        written: usize,
        /// Size of the encoded fragment.
        expected: usize,
    },
}
