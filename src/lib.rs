#![doc(html_root_url = "https://docs.rs/wirefrag/latest")]
//! Public API for the `wirefrag` library.
//!
//! This crate splits arbitrarily large messages into datagram-sized
//! fragments, carries short tag metadata alongside the payload, and stitches
//! fragments back together on the receiving side even when they arrive out of
//! order or more than once.

pub mod byte_order;
pub mod fragment;
pub mod message;
pub mod metrics;
pub mod transport;

pub use fragment::{
    DecodeError,
    Fragment,
    FragmentBatch,
    FragmentHeader,
    FragmentIndex,
    FragmentationConfig,
    FragmentationError,
    Fragmenter,
    MessageId,
    Reassembler,
    ReassemblyError,
};
pub use message::Message;
pub use transport::{DatagramListener, DatagramSender, InboundMessage, TransportError};
