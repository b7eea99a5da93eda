mod guess_cmd;
mod status_cmd;
mod terminal_output;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use scribble_config::ScribbleConfig;
use scribble_core::Guesser;
use scribble_gateway::{build_router, GatewayState};
use scribble_inference::{MockGuesser, OllamaGuesser};
use scribble_logging::init_logger;

#[derive(Parser)]
#[command(name = "scribble")]
#[command(about = "Scribble: guess hand-drawn sketches with a local vision model")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.scribble/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
        /// Answer with canned guesses instead of calling the backend
        #[arg(long)]
        mock: bool,
    },
    /// Guess what a single image file shows
    Guess {
        /// PNG or JPEG file
        path: PathBuf,
        /// Override the configured model
        #[arg(short, long)]
        model: Option<String>,
    },
    /// Check that the configured model is installed on the backend
    Status,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => scribble_config::load_and_prepare(path).await?,
        None => scribble_config::load_default().await?,
    };

    let logging = config.logging();
    init_logger(logging.dir.as_deref().map(Path::new), logging.level());

    match cli.command {
        Commands::Serve { port, mock } => {
            run_server(config, port, mock).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Guess { path, model } => guess_cmd::run(&config.ollama(), &path, model).await,
        Commands::Status => status_cmd::run(&config.ollama()).await,
    }
}

async fn run_server(config: ScribbleConfig, port: Option<u16>, mock: bool) -> Result<()> {
    let mut server = config.server();
    if let Some(port) = port {
        server.port = Some(port);
    }

    let guesser: Arc<dyn Guesser> = if mock {
        Arc::new(MockGuesser::new("mock"))
    } else {
        Arc::new(OllamaGuesser::from_config(&config.ollama()))
    };

    info!(
        guesser = guesser.name(),
        backend = %config.ollama().base_url(),
        model = %config.ollama().model(),
        "Starting Scribble"
    );

    // The server still starts without the model; requests report MODEL_NOT_FOUND.
    match guesser.check_model().await {
        Ok(status) if status.available => info!(model = %status.model, "Model is installed"),
        Ok(status) => warn!(model = %status.model, "Model is not installed on the backend"),
        Err(err) => warn!(kind = %err.kind, error = %err.message, "Could not check backend model"),
    }

    let app = build_router(GatewayState::new(guesser), server.max_body_bytes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = server.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = %addr, "HTTP API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
