//! Command line interface for the `wirefrag` binary.
//!
//! Kept free of library imports so the build script can include it to render
//! the man page.

use std::{net::SocketAddr, num::NonZeroUsize};

use clap::{Args, Parser, Subcommand};

/// Command line arguments for the `wirefrag` binary.
#[derive(Debug, Parser)]
#[command(
    name = "wirefrag",
    version,
    about = "Send and receive fragmented, tagged messages over UDP"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Receive fragments and print each reassembled message.
    Listen(ListenArgs),
    /// Fragment a message and send it.
    Send(SendArgs),
}

#[derive(Debug, Args)]
pub struct ListenArgs {
    /// Local address to bind.
    #[arg(short, long)]
    pub bind: SocketAddr,
    /// Largest datagram, header included, the peer will send.
    #[arg(long, default_value_t = 1400)]
    pub max_fragment_size: usize,
    /// Milliseconds an incomplete message may wait for missing fragments.
    #[arg(long, default_value_t = 5000)]
    pub timeout_ms: u64,
    /// Upper bound on messages collecting fragments at once.
    #[arg(long, default_value = "1024")]
    pub max_in_flight: NonZeroUsize,
    /// Serve Prometheus metrics on this address.
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,
}

#[derive(Debug, Args)]
pub struct SendArgs {
    /// Destination address.
    #[arg(long)]
    pub to: SocketAddr,
    /// Local address to send from.
    #[arg(long, default_value = "0.0.0.0:0")]
    pub bind: SocketAddr,
    /// Tag to attach; repeat for several tags.
    #[arg(short = 't', long = "tag")]
    pub tags: Vec<String>,
    /// Largest datagram to emit, header included.
    #[arg(long, default_value_t = 1400)]
    pub max_fragment_size: usize,
    /// Cap on datagrams per second.
    #[arg(long)]
    pub rate: Option<NonZeroUsize>,
    /// Message text; each line of standard input is sent when omitted.
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::{Cli, Command};

    #[test]
    fn command_definition_is_consistent() { Cli::command().debug_assert(); }

    #[test]
    fn parses_listen_defaults() {
        let cli = Cli::parse_from(["wirefrag", "listen", "--bind", "127.0.0.1:9000"]);
        let Command::Listen(args) = cli.command else {
            panic!("expected listen subcommand");
        };
        assert_eq!(args.bind.port(), 9000);
        assert_eq!(args.max_fragment_size, 1400);
        assert_eq!(args.timeout_ms, 5000);
        assert_eq!(args.max_in_flight.get(), 1024);
        assert!(args.metrics_addr.is_none());
    }

    #[test]
    fn parses_repeated_tags() {
        let cli = Cli::parse_from([
            "wirefrag",
            "send",
            "--to",
            "127.0.0.1:9000",
            "-t",
            "host=a",
            "--tag",
            "sev=warn",
            "--rate",
            "200",
            "disk full",
        ]);
        let Command::Send(args) = cli.command else {
            panic!("expected send subcommand");
        };
        assert_eq!(args.tags, ["host=a", "sev=warn"]);
        assert_eq!(args.rate.map(std::num::NonZeroUsize::get), Some(200));
        assert_eq!(args.message.as_deref(), Some("disk full"));
    }

    #[test]
    fn rejects_zero_rate() {
        let parsed = Cli::try_parse_from(["wirefrag", "send", "--to", "127.0.0.1:9000", "--rate", "0"]);
        assert!(parsed.is_err());
    }
}
