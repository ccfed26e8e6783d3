use anyhow::Result;
use clap::{Parser, Subcommand};
use inference_gateway::{bootstrap_model, serve, SERVICE};
use orchard_core::{init_tracing, load_config, start_health_server, Lifecycle};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "inference-gateway", version, about = "Fruit and vegetable image classification service")]
struct Cli {
    /// Install directory holding the artifact, `view/` and `static/`
    #[arg(long, global = true)]
    app_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch and load the model, then serve HTTP
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Fetch and load the model, then exit (bakes the artifact into an image)
    Fetch,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut cfg = load_config(SERVICE)?;
    if let Some(dir) = cli.app_dir { cfg.app_dir = dir; }
    if let Command::Serve { host, port } = &cli.command {
        if let Some(h) = host { cfg.host = h.clone(); }
        if let Some(p) = port { cfg.port = *p; }
    }
    init_tracing(SERVICE, &cfg.log_level)?;
    info!(?cfg, "config loaded");

    let lifecycle = Arc::new(Lifecycle::new());
    match cli.command {
        Command::Serve { .. } => {
            start_health_server(cfg.health_port, lifecycle.clone()).await?;
            let started = match bootstrap_model(&cfg, lifecycle.clone()).await {
                Ok(model) => serve(&cfg, model, lifecycle.clone()).await,
                Err(e) => Err(e),
            };
            if let Err(e) = &started {
                lifecycle.mark_not_live();
                error!(error = ?e, "service stopped");
            }
            started
        }
        Command::Fetch => {
            bootstrap_model(&cfg, lifecycle).await?;
            info!(app_dir = %cfg.app_dir.display(), "artifact fetched and verified");
            Ok(())
        }
    }
}
