use clap::Parser;
use framed_http::{
    handlers,
    limits::{ReqLimits, ServerLimits},
    Server,
};
use std::{net::SocketAddr, path::PathBuf, process::ExitCode};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory served under `/files/`
    #[arg(short, long, default_value = ".")]
    directory: PathBuf,

    /// Address to listen on
    #[arg(short, long, default_value = "0.0.0.0:4221")]
    addr: SocketAddr,

    /// Connections served concurrently
    #[arg(long, default_value_t = ServerLimits::default().max_connections)]
    max_connections: usize,

    /// Largest accepted request body, in bytes
    #[arg(long, default_value_t = ReqLimits::default().body_size)]
    body_size: usize,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let listener = match TcpListener::bind(args.addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(addr = %args.addr, error = %err, "failed to bind");
            return ExitCode::FAILURE;
        }
    };

    info!(
        addr = %args.addr,
        directory = %args.directory.display(),
        max_connections = args.max_connections,
        "listening"
    );

    let server = Server::builder()
        .listener(listener)
        .handler(handlers::router(args.directory))
        .server_limits(ServerLimits {
            max_connections: args.max_connections,
            ..ServerLimits::default()
        })
        .request_limits(ReqLimits {
            body_size: args.body_size,
            ..ReqLimits::default()
        })
        .build();

    match server {
        Ok(server) => {
            server.launch().await;
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "failed to start");
            ExitCode::FAILURE
        }
    }
}
