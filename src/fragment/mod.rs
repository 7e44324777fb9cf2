//! Fragmentation wire protocol: header codec, fragmenter, decoder, and
//! reassembler.
//!
//! Each sub-module focuses on a single concept to keep the code small and easy
//! to audit while still providing a cohesive API at the crate root.

pub mod config;
pub mod datagram;
pub mod error;
pub mod fragmenter;
pub mod hash;
pub mod header;
pub mod id;
pub mod index;
pub mod layout;
pub mod reassembler;
pub mod tags;

pub use config::FragmentationConfig;
pub use datagram::{Fragment, FragmentBody, decode_datagram};
pub use error::{DecodeError, FragmentationError, HeaderViolation, ReassemblyError};
pub use fragmenter::{FragmentBatch, Fragmenter, MAX_FRAGMENT_SIZE, MIN_FRAGMENT_SIZE};
pub use hash::payload_hash;
pub use header::{FragmentHeader, HEADER_LEN, MessageFraming, PROTOCOL_MARKER};
pub use id::MessageId;
pub use index::FragmentIndex;
pub use layout::FragmentLayout;
pub use reassembler::{
    Reassembler,
    sweeper::{run_eviction_sweeper, spawn_eviction_sweeper},
};

#[cfg(test)]
mod tests;
