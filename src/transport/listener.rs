//! Inbound half of the UDP transport.

use std::{io, net::SocketAddr, sync::Arc, time::Duration};

use bytes::Bytes;
use tokio::{
    net::{ToSocketAddrs, UdpSocket},
    sync::mpsc,
};
use tokio_util::sync::CancellationToken;

use super::TransportError;
use crate::{
    fragment::{FragmentationConfig, Reassembler, decode_datagram, spawn_eviction_sweeper},
    message::Message,
};

/// Largest UDP payload the listener will read in one call.
pub const MAX_DATAGRAM_SIZE: usize = u16::MAX as usize;

/// A reassembled message together with the endpoint that sent it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundMessage {
    /// Source address of the fragments.
    pub sender: SocketAddr,
    /// The completed message.
    pub message: Message,
}

/// Receives fragments on a UDP socket and emits completed messages.
#[derive(Debug)]
pub struct DatagramListener {
    socket: UdpSocket,
    reassembler: Arc<Reassembler<SocketAddr>>,
    sweep_interval: Duration,
}

impl DatagramListener {
    /// Bind a socket to `addr` and configure reassembly from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] if the socket cannot be bound.
    pub async fn bind(
        addr: impl ToSocketAddrs,
        config: &FragmentationConfig,
    ) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(Self::new(socket, config))
    }

    /// Wrap an already bound socket.
    #[must_use]
    pub fn new(socket: UdpSocket, config: &FragmentationConfig) -> Self {
        Self {
            socket,
            reassembler: Arc::new(Reassembler::new(config)),
            sweep_interval: config.sweep_interval,
        }
    }

    /// Address the underlying socket is bound to.
    ///
    /// # Errors
    ///
    /// Propagates the error reported by the socket.
    pub fn local_addr(&self) -> io::Result<SocketAddr> { self.socket.local_addr() }

    /// Shared handle to the reassembly state.
    #[must_use]
    pub fn reassembler(&self) -> Arc<Reassembler<SocketAddr>> { Arc::clone(&self.reassembler) }

    /// Receive datagrams until `shutdown` is cancelled or `sink` is closed.
    ///
    /// Malformed datagrams and rejected fragments are logged and dropped. The
    /// eviction sweep runs for as long as this future does.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] if receiving from the socket fails.
    pub async fn run(
        self,
        sink: mpsc::Sender<InboundMessage>,
        shutdown: CancellationToken,
    ) -> Result<(), TransportError> {
        let sweep_token = shutdown.child_token();
        let sweeper = spawn_eviction_sweeper(
            Arc::clone(&self.reassembler),
            self.sweep_interval,
            sweep_token.clone(),
        );
        let result = self.receive_loop(&sink, &shutdown).await;
        sweep_token.cancel();
        if let Err(e) = sweeper.await {
            tracing::warn!(error = %e, "eviction sweeper terminated abnormally");
        }
        result
    }

    async fn receive_loop(
        &self,
        sink: &mpsc::Sender<InboundMessage>,
        shutdown: &CancellationToken,
    ) -> Result<(), TransportError> {
        let mut buf = vec![0_u8; MAX_DATAGRAM_SIZE];
        loop {
            let (len, sender) = tokio::select! {
                biased;

                () = shutdown.cancelled() => return Ok(()),

                received = self.socket.recv_from(&mut buf) => received?,
            };
            let datagram = Bytes::copy_from_slice(&buf[..len]);
            let Ok(fragment) = decode_datagram(datagram, &sender) else {
                continue;
            };
            let Ok(Some(message)) = self.reassembler.ingest(fragment, sender) else {
                continue;
            };
            tracing::debug!(
                message_id = %message.message_id(),
                %sender,
                "delivering reassembled message"
            );
            if sink.send(InboundMessage { sender, message }).await.is_err() {
                tracing::info!("message sink closed; stopping listener");
                return Ok(());
            }
        }
    }
}
