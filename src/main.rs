use std::path::PathBuf;

use aleagent::catalog::Catalog;
use aleagent::dialogue::parse_batch;
use aleagent::services::llm::LLMService;
use aleagent::{AgentConfig, Session};
use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Reads observation batches (one JSON array per line) from stdin and prints
/// the dialogue actions for each turn.
#[derive(Parser, Debug)]
#[command(name = "aleagent", version)]
struct Args {
    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Model identifier passed to the chat endpoint.
    #[arg(long)]
    model: Option<String>,
    /// Beer catalog CSV.
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// YAML prompt book.
    #[arg(long)]
    prompts: Option<PathBuf>,
    /// Retry invalid proposals without limit.
    #[arg(long)]
    interactive: bool,
    /// Accept the first parseable proposal without validation.
    #[arg(long)]
    evaluation: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")?;

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => AgentConfig::load(path)?,
        None => AgentConfig::default(),
    };
    if let Some(model) = args.model {
        config.model = model;
    }
    if let Some(catalog) = args.catalog {
        config.catalog_path = catalog;
    }
    if args.prompts.is_some() {
        config.prompts_path = args.prompts;
    }
    config.interactive |= args.interactive;
    config.evaluation |= args.evaluation;

    let catalog = Catalog::load(&config.catalog_path)
        .with_context(|| format!("Failed to load catalog {}", config.catalog_path.display()))?;
    let collaborator = Box::new(LLMService::new(&config));
    let mut session = Session::from_config(&config, catalog.into_shared(), collaborator)?;
    tracing::info!("Session {} ready (model {})", session.id().0, config.model);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let observations = match parse_batch(&line) {
            Ok(batch) => batch,
            Err(e) => {
                tracing::warn!("Skipping input: {}", e);
                continue;
            }
        };

        match session.exchange(&line, &observations).await {
            Ok(actions) => println!("{}", serde_json::to_string_pretty(&actions)?),
            Err(e) => tracing::error!("Turn failed: {}", e),
        }

        if session.is_terminated() {
            break;
        }
    }

    Ok(())
}
