use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fileshare::{AppState, Config, routes};

#[derive(Parser, Debug)]
#[command(name = "fileshare")]
#[command(about = "Lightweight file server with browsable listings and multipart uploads")]
#[command(version)]
struct Cli {
    /// Port to listen on
    #[arg(short, long, env = "FILESHARE_PORT")]
    port: Option<u16>,

    /// Address to bind to
    #[arg(short, long, env = "FILESHARE_BIND")]
    bind: Option<String>,

    /// Root directory to serve files from
    #[arg(short, long, env = "FILESHARE_ROOT")]
    root: Option<PathBuf>,

    /// Log request bodies and pipeline diagnostics
    #[arg(short, long, env = "FILESHARE_DEBUG")]
    debug: bool,

    /// Config file path (optional)
    #[arg(short, long, env = "FILESHARE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load config from file if provided, otherwise use defaults
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        Config::default()
    };

    // Command line wins over the config file
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }
    if let Some(root) = cli.root {
        config.root = root;
    }
    config.debug |= cli.debug;

    // Initialize tracing
    let filter = if config.debug {
        "fileshare=debug,tower_http=debug"
    } else {
        "fileshare=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Resolve root directory to absolute path
    let root_dir = config
        .root
        .canonicalize()
        .unwrap_or_else(|_| config.root.clone());

    if !root_dir.exists() {
        return Err(format!("Root directory does not exist: {}", root_dir.display()).into());
    }

    if !root_dir.is_dir() {
        return Err(format!("Root path is not a directory: {}", root_dir.display()).into());
    }

    info!("Serving files from: {}", root_dir.display());

    let addr: SocketAddr = config.listen_addr().parse()?;
    let state = AppState::with_config(root_dir, config);
    let app = routes::app(state);

    info!("Starting fileshare on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
