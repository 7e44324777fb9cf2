//! `wirefrag` binary: send or receive fragmented messages over UDP.

mod cli;

use std::{error::Error, time::Duration};

use clap::Parser;
use cli::{Cli, Command, ListenArgs, SendArgs};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use wirefrag::{DatagramListener, DatagramSender, FragmentationConfig, Fragmenter};

/// Completed messages buffered between the listener and the printer.
const SINK_CAPACITY: usize = 64;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match Cli::parse().command {
        Command::Listen(args) => listen(args).await,
        Command::Send(args) => send(args).await,
    }
}

async fn listen(args: ListenArgs) -> Result<(), Box<dyn Error>> {
    if let Some(addr) = args.metrics_addr {
        install_metrics_exporter(addr)?;
    }
    let config = FragmentationConfig::new(args.max_fragment_size)?
        .with_reassembly_timeout(Duration::from_millis(args.timeout_ms))
        .with_max_in_flight(args.max_in_flight);
    let listener = DatagramListener::bind(args.bind, &config).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    let shutdown = CancellationToken::new();
    let (tx, mut rx) = mpsc::channel(SINK_CAPACITY);
    let worker = tokio::spawn(listener.run(tx, shutdown.clone()));

    loop {
        tokio::select! {
            biased;

            res = tokio::signal::ctrl_c() => {
                res?;
                tracing::info!("shutting down");
                shutdown.cancel();
                break;
            }

            inbound = rx.recv() => {
                let Some(inbound) = inbound else { break };
                let message = &inbound.message;
                println!(
                    "{} #{} [{}] {}",
                    inbound.sender,
                    message.message_id(),
                    message.tags().join(","),
                    String::from_utf8_lossy(message.payload()),
                );
            }
        }
    }
    worker.await??;
    Ok(())
}

async fn send(args: SendArgs) -> Result<(), Box<dyn Error>> {
    let fragmenter = Fragmenter::new(args.max_fragment_size)?;
    let mut sender = DatagramSender::bind(args.bind, fragmenter).await?;
    if let Some(rate) = args.rate {
        sender = sender.with_rate_limit(rate);
    }

    if let Some(text) = args.message {
        sender.send(text.into_bytes(), args.tags.iter().cloned(), args.to).await?;
        return Ok(());
    }
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        sender.send(line.into_bytes(), args.tags.iter().cloned(), args.to).await?;
    }
    Ok(())
}

#[cfg(feature = "metrics")]
fn install_metrics_exporter(addr: std::net::SocketAddr) -> Result<(), Box<dyn Error>> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!(%addr, "serving metrics");
    Ok(())
}

#[cfg(not(feature = "metrics"))]
fn install_metrics_exporter(addr: std::net::SocketAddr) -> Result<(), Box<dyn Error>> {
    tracing::warn!(%addr, "built without the metrics feature; ignoring --metrics-addr");
    Ok(())
}
