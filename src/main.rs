use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use clap::Subcommand;
use guardrag::config::AppConfig;
use guardrag::ingest::sample_records;
use guardrag::ingest::CorpusLoader;
use guardrag::retrieval::UploadRecord;
use guardrag::retrieval::VectorServiceClient;
use guardrag::Result;
use tracing::info;

#[derive(Parser)]
#[command(name = "guardrag")]
#[command(about = "Security-hardened RAG chat service over an external vector store")]
#[command(version)]
struct Cli {
    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        /// Port to bind
        #[arg(long, default_value = "5000")]
        port: u16,
        /// Enable permissive CORS for browser frontends
        #[arg(long)]
        cors: bool,
    },
    /// Create the backing database and load a corpus into it
    Seed {
        /// JSON file with an array of {file, metadata} records; built-in
        /// sample documents are used when omitted
        #[arg(long)]
        corpus: Option<PathBuf>,
        /// Skip database creation (load into an existing database)
        #[arg(long)]
        skip_create: bool,
    },
    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        guardrag::logging::init_logging_with_level("debug")?;
    } else {
        guardrag::logging::init_logging()?;
    }

    // Load configuration
    let config = AppConfig::load()?;
    info!("Configuration loaded successfully");

    match cli.command {
        Commands::Serve { host, port, cors } => {
            guardrag::api::serve_api(&config, host, port, cors).await?;
        }
        Commands::Seed {
            corpus,
            skip_create,
        } => {
            handle_seed_command(&config, corpus, skip_create).await?;
        }
        Commands::Config => {
            handle_config_command(&config);
        }
    }

    Ok(())
}

async fn handle_seed_command(
    config: &AppConfig,
    corpus: Option<PathBuf>,
    skip_create: bool,
) -> Result<()> {
    let client = Arc::new(VectorServiceClient::new(&config.vector)?);

    if !skip_create {
        println!("Creating database {}...", config.vector_database());
        client.create_database().await?;
    }

    let records: Vec<UploadRecord> = match corpus {
        Some(path) => {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        }
        None => {
            println!("No corpus file given; loading built-in sample documents");
            sample_records()
        }
    };

    let loader = CorpusLoader::new(client, &config.ingest);
    let summary = loader.load(records).await?;

    println!(
        "Ingestion finished: {} records uploaded, {} of {} batches failed",
        summary.records_uploaded, summary.batches_failed, summary.batches_total
    );
    Ok(())
}

fn handle_config_command(config: &AppConfig) {
    println!("guardrag configuration:");
    println!();

    println!("Vector service:");
    println!("  Base URL: {}", config.vector_base_url());
    println!("  Database: {}", config.vector_database());
    println!("  Metric: {}", config.metric_type());
    println!("  Request timeout: {}s", config.request_timeout_secs());
    println!();

    println!("Retrieval:");
    println!("  Max context length: {}", config.max_context_length());
    println!("  Initial top_k: {}", config.default_top_k());
    println!("  Refine top_k: {}", config.refine_top_k());
    println!("  Rerank top_n: {}", config.rerank_top_n());
    println!("  Reranker enabled: {}", config.retrieval.enable_reranker);
    println!();

    println!("Guard:");
    println!("  Max input length: {}", config.guard.max_input_length);
    println!(
        "  Sensitive words configured: {}",
        config.guard.sensitive_words.len()
    );
    println!("  Output validation: {}", config.guard.validate_output);
    println!();

    println!("Ingestion:");
    println!("  Batch size: {}", config.ingest.batch_size);
    println!("  Workers: {}", config.ingest.workers);
    println!("  Settle delay: {}s", config.ingest.settle_delay_secs);
    println!();

    println!("Logging:");
    println!("  Level: {}", config.logging.level);
    println!("  Backtrace: {}", config.logging.backtrace);
}
