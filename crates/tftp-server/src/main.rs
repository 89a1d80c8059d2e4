//! Lockstep file-transfer server binary.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    process::ExitCode,
    time::Duration,
};

use clap::Parser;
use tftp_core::{DirStore, SessionConfig};
use tftp_server::{Server, ServerConfig, ServerError, TcpTransport};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Serve files over TCP using lockstep block transfers.
#[derive(Debug, Parser)]
#[command(name = "tftp-server", version)]
struct Args {
    /// TCP port to listen on
    port: u16,

    /// Address to bind
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    bind: IpAddr,

    /// Directory to serve files from and store uploads in
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Seconds to wait for each peer frame during a transfer (0 waits forever)
    #[arg(long, default_value_t = 30)]
    recv_timeout_secs: u64,

    /// Seconds an idle connection may wait for its next request (0 waits forever)
    #[arg(long, default_value_t = 0)]
    idle_timeout_secs: u64,

    /// Keep a connection open after one of its transfers fails
    #[arg(long)]
    keep_open_on_failure: bool,
}

impl Args {
    fn config(&self) -> ServerConfig {
        ServerConfig {
            session: SessionConfig { recv_timeout: seconds(self.recv_timeout_secs) },
            close_on_failure: !self.keep_open_on_failure,
            idle_timeout: seconds(self.idle_timeout_secs),
        }
    }
}

fn seconds(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "server stopped");
            ExitCode::FAILURE
        },
    }
}

async fn run(args: Args) -> Result<(), ServerError> {
    if !args.root.is_dir() {
        return Err(ServerError::InvalidRoot(args.root));
    }

    let transport = TcpTransport::bind(SocketAddr::new(args.bind, args.port)).await?;
    let server = Server::new(transport, DirStore::new(&args.root), args.config());
    server.run().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["tftp-server", "6969"]).unwrap();
        assert_eq!(args.port, 6969);
        assert_eq!(args.bind, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(args.config(), ServerConfig::default());
    }

    #[test]
    fn zero_disables_deadlines() {
        let args = Args::try_parse_from([
            "tftp-server",
            "6969",
            "--recv-timeout-secs",
            "0",
            "--keep-open-on-failure",
        ])
        .unwrap();
        let config = args.config();
        assert_eq!(config.session.recv_timeout, None);
        assert!(!config.close_on_failure);
    }

    #[test]
    fn port_is_required() {
        assert!(Args::try_parse_from(["tftp-server"]).is_err());
        assert!(Args::try_parse_from(["tftp-server", "70000"]).is_err());
    }
}
