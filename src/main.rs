//! A3S SERP CLI - paginated search result scraper.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use a3s_serp::{Search, SearchConfig};

/// A3S SERP - fetch, extract and deduplicate search results
#[derive(Parser)]
#[command(name = "a3s-serp")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Search and print results
    Search(SearchArgs),

    /// Print the default configuration as JSON
    Config,
}

#[derive(Parser)]
struct SearchArgs {
    /// Search query
    query: String,

    /// Number of results wanted
    #[arg(short = 'n', long, default_value = "10")]
    count: usize,

    /// Trace fetch and parse decisions
    #[arg(short, long)]
    debug: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// JSON configuration file (partial documents are fine)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Do not follow tracking links (results carry no URL)
    #[arg(long)]
    no_resolve: bool,

    /// Maximum abstract length in characters
    #[arg(long)]
    abstract_max: Option<usize>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output
    Json,
    /// Compact single-line output
    Compact,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let debug = matches!(&cli.command, Commands::Search(args) if args.debug);
    if cli.verbose || debug {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    match cli.command {
        Commands::Search(args) => run_search(args).await,
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&SearchConfig::default())?);
            Ok(())
        }
    }
}

fn load_config(args: &SearchArgs) -> Result<SearchConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => SearchConfig::default(),
    };

    if args.no_resolve {
        config.resolve_redirects = false;
    }
    if let Some(max) = args.abstract_max {
        config.abstract_max = max;
    }
    Ok(config)
}

async fn run_search(args: SearchArgs) -> Result<()> {
    let config = load_config(&args)?;
    let search = Search::new(config)?;
    let results = search.search(&args.query, args.count, args.debug).await?;

    match args.format {
        OutputFormat::Text => {
            println!(
                "\nSearch results for \"{}\" ({} results):\n",
                args.query,
                results.len()
            );

            for (i, result) in results.iter().enumerate() {
                println!("{}. {}", i + 1, result.title);
                if let Some(url) = &result.url {
                    println!("   URL: {}", url);
                }
                if !result.abstract_text.is_empty() {
                    println!("   {}", result.abstract_text);
                }
                println!();
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        OutputFormat::Compact => {
            for result in &results {
                println!("{}\t{}", result.title, result.url.as_deref().unwrap_or("-"));
            }
        }
    }

    Ok(())
}
