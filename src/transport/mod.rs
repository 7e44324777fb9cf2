//! UDP transport carrying fragmented messages.
//!
//! [`DatagramSender`] splits outbound messages into fragments and writes one
//! datagram per fragment. [`DatagramListener`] feeds inbound datagrams through
//! the decoder and a [`Reassembler`](crate::fragment::Reassembler), then hands
//! completed messages to a channel.

mod error;
mod listener;
mod sender;

pub use error::TransportError;
pub use listener::{DatagramListener, InboundMessage, MAX_DATAGRAM_SIZE};
pub use sender::DatagramSender;
