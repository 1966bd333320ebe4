use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use hibp_range::{DEFAULT_RANGE_URL, HttpRangeClient};
use hibp_relay::{DEFAULT_LISTEN_ADDR, Error, LISTEN_ADDR_ENV, Relay, UPSTREAM_URL_ENV, serve};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hibp-relay")]
#[command(about = "Relay Have I Been Pwned range queries by 5-character prefix")]
struct Args {
    /// Address to listen on
    #[arg(short, long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    listen: SocketAddr,

    /// Base URL of the upstream range API
    #[arg(short, long, env = UPSTREAM_URL_ENV, default_value = DEFAULT_RANGE_URL)]
    upstream: String,

    /// Upstream request timeout in seconds
    #[arg(long, default_value = "10")]
    timeout_secs: u64,

    /// Do not ask the upstream to pad responses
    #[arg(long)]
    no_padding: bool,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let upstream = HttpRangeClient::new(&args.upstream, Duration::from_secs(args.timeout_secs))?
        .padding(!args.no_padding);

    let listener = TcpListener::bind(args.listen)
        .await
        .map_err(|source| Error::Bind { addr: args.listen, source })?;

    info!(addr = %args.listen, upstream = %args.upstream, "relay listening");

    tokio::select! {
        () = serve(listener, Arc::new(Relay::new(upstream))) => {}
        _ = tokio::signal::ctrl_c() => info!("shutting down"),
    }

    Ok(())
}
