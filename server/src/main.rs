use anyhow::{Context, Result};
use axum::Router;
use clap::Parser;
use jobrank_core::{default_seed, JobPosting};
use server::build_app;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Posting store connection string (sled:<path>, json:<path>, memory:)
    #[arg(long, env = "JOBS_STORE_URI", default_value = "sled:./data/jobs")]
    store: String,
    /// JSON array of postings to seed an empty store with (defaults to two placeholders)
    #[arg(long)]
    seed: Option<String>,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let seed: Vec<JobPosting> = match &args.seed {
        Some(path) => {
            let text = std::fs::read_to_string(path).with_context(|| format!("reading seed file {path}"))?;
            serde_json::from_str(&text).with_context(|| format!("parsing seed file {path}"))?
        }
        None => default_seed(),
    };
    let app: Router = build_app(&args.store, &seed)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, store = %args.store, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
