use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use jobrank_core::{open_store, RecommendationIndex, DEFAULT_TOP_N};
use tracing_subscriber::{fmt, EnvFilter};

use loader::read_postings;

#[derive(Parser)]
#[command(name = "loader")]
#[command(about = "Import, list and query job postings in a posting store", long_about = None)]
struct Cli {
    /// Posting store connection string (sled:<path>, json:<path>, memory:)
    #[arg(long, global = true, default_value = "sled:./data/jobs")]
    store: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import postings from JSON/JSONL files or a directory of them
    Import {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
    },
    /// Print every posting in the store as JSONL
    List,
    /// Rank the stored postings against a query
    Query {
        #[arg(long)]
        q: String,
        #[arg(long, default_value_t = DEFAULT_TOP_N)]
        top_n: usize,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let store = open_store(&cli.store).with_context(|| format!("opening store {}", cli.store))?;

    match cli.command {
        Commands::Import { input } => {
            let postings = read_postings(&input)?;
            store.insert_many(&postings).with_context(|| format!("importing {input}"))?;
            tracing::info!(imported = postings.len(), total = store.count()?, store = %cli.store, "import complete");
        }
        Commands::List => {
            for p in store.fetch_all()? {
                println!("{}", serde_json::to_string(&p)?);
            }
        }
        Commands::Query { q, top_n } => {
            let index = RecommendationIndex::from_postings(store.fetch_all()?);
            for hit in index.recommend(&q, top_n)? {
                println!("{:.4}\t{}\t{}", hit.score, hit.posting.id, hit.posting.title);
            }
        }
    }
    Ok(())
}
