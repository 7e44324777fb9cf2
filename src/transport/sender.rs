//! Outbound half of the UDP transport.

use std::{
    fmt,
    io,
    net::SocketAddr,
    num::NonZeroUsize,
    sync::atomic::{AtomicU32, Ordering},
    time::Duration,
};

use bytes::Bytes;
use leaky_bucket::RateLimiter;
use tokio::net::{ToSocketAddrs, UdpSocket};

use super::TransportError;
use crate::{
    fragment::{Fragmenter, MessageId},
    message::Message,
};

/// Splits messages into fragments and sends one datagram per fragment.
///
/// Message identifiers come from a wrapping 32-bit counter, so a receiver
/// sees distinct ids for the last 2^32 messages from this sender.
pub struct DatagramSender {
    socket: UdpSocket,
    fragmenter: Fragmenter,
    next_id: AtomicU32,
    limiter: Option<RateLimiter>,
}

impl fmt::Debug for DatagramSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatagramSender")
            .field("socket", &self.socket)
            .field("fragmenter", &self.fragmenter)
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .field("rate_limited", &self.limiter.is_some())
            .finish()
    }
}

impl DatagramSender {
    /// Bind a fresh socket to `addr` and wrap it.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] if the socket cannot be bound.
    pub async fn bind(addr: impl ToSocketAddrs, fragmenter: Fragmenter) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(Self::new(socket, fragmenter))
    }

    /// Wrap an already bound socket.
    #[must_use]
    pub fn new(socket: UdpSocket, fragmenter: Fragmenter) -> Self {
        Self {
            socket,
            fragmenter,
            next_id: AtomicU32::new(0),
            limiter: None,
        }
    }

    /// Cap outbound traffic at `datagrams_per_second`.
    ///
    /// The bucket starts full, so a short burst of that many datagrams goes
    /// out immediately.
    #[must_use]
    pub fn with_rate_limit(mut self, datagrams_per_second: NonZeroUsize) -> Self {
        let rate = datagrams_per_second.get();
        self.limiter = Some(
            RateLimiter::builder()
                .initial(rate)
                .refill(rate)
                .interval(Duration::from_secs(1))
                .max(rate)
                .build(),
        );
        self
    }

    /// Start numbering messages from `first` instead of zero.
    #[must_use]
    pub fn with_first_message_id(self, first: MessageId) -> Self {
        self.next_id.store(first.get(), Ordering::Relaxed);
        self
    }

    /// Address the underlying socket is bound to.
    ///
    /// # Errors
    ///
    /// Propagates the error reported by the socket.
    pub fn local_addr(&self) -> io::Result<SocketAddr> { self.socket.local_addr() }

    /// Fragmenter used for outbound messages.
    #[must_use]
    pub fn fragmenter(&self) -> &Fragmenter { &self.fragmenter }

    /// Reserve the next message identifier.
    pub fn next_message_id(&self) -> MessageId {
        MessageId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Build a message from `payload` and `tags` under a fresh id and send it.
    ///
    /// Returns the id the message was sent under.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Fragmentation`] when the message cannot be
    /// fragmented, or an I/O error from the socket.
    pub async fn send<I, T>(
        &self,
        payload: impl Into<Bytes>,
        tags: I,
        dest: SocketAddr,
    ) -> Result<MessageId, TransportError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let message = Message::new(self.next_message_id(), payload).with_tags(tags);
        self.send_message(&message, dest).await?;
        Ok(message.message_id())
    }

    /// Send `message` under its own id, returning the number of datagrams.
    ///
    /// Fragmentation happens before the first datagram leaves, so an
    /// unencodable message sends nothing.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Fragmentation`] when the message cannot be
    /// fragmented, [`TransportError::ShortWrite`] when the socket truncates a
    /// datagram, or an I/O error from the socket.
    pub async fn send_message(&self, message: &Message, dest: SocketAddr) -> Result<usize, TransportError> {
        let batch = self.fragmenter.fragment(message)?;
        let count = batch.len();
        for datagram in batch.datagrams() {
            if let Some(limiter) = &self.limiter {
                limiter.acquire(1).await;
            }
            let written = self.socket.send_to(&datagram, dest).await?;
            if written != datagram.len() {
                return Err(TransportError::ShortWrite {
                    written,
                    expected: datagram.len(),
                });
            }
        }
        tracing::debug!(
            message_id = %message.message_id(),
            %dest,
            fragments = count,
            "message sent"
        );
        Ok(count)
    }
}
