//! i3fd - I3F image server test harness daemon

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use i3fd::{AuthConfig, Config, Server};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// I3F image server test harness
#[derive(Parser, Debug)]
#[command(name = "i3fd", version, about = "Serve I3F image requests from local test images")]
struct Args {
    /// TOML config file (default: i3fd.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Directory of test images
    #[arg(short, long)]
    image_dir: Option<PathBuf>,

    /// Google client secret JSON, enables login
    #[arg(long)]
    client_secret: Option<PathBuf>,

    /// Leave request parameters out of error responses
    #[arg(long)]
    no_debug: bool,

    /// Log as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "i3fd=info,tower_http=debug".into());
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(dir) = args.image_dir {
        config.image_dir = dir;
    }
    if let Some(secret) = args.client_secret {
        config
            .auth
            .get_or_insert_with(AuthConfig::default)
            .client_secret_file = secret;
    }
    if args.no_debug {
        config.debug = false;
    }

    // Create and run server
    let server = Server::new(config).await?;
    server.run().await?;

    Ok(())
}
