use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use glean::api::create_router;
use glean::config::CONFIG;
use glean::research::ResearchClient;

#[derive(Parser, Debug)]
#[command(name = "glean", version, about = "Page, search and image lookups")]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// HTTP timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the JSON API and the single-page UI
    Serve {
        #[arg(long)]
        bind: Option<String>,
    },
    /// Fetch a page and print its visible text
    Page { url: String },
    /// Search the web and print snippet results
    Search {
        query: Vec<String>,
        #[arg(short = 'n', long)]
        max_results: Option<usize>,
    },
    /// Print dimensions or recognized text of a PNG/JPEG
    Image { path: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mut config = (*CONFIG).clone();
    if let Some(secs) = cli.timeout {
        config.request_timeout = Duration::from_secs(secs);
    }

    match cli.command {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind_addr = bind;
            }
            let bind_addr = config.bind_addr.clone();
            let research = Arc::new(ResearchClient::new(config)?);
            let app = create_router(research);

            let listener = tokio::net::TcpListener::bind(&bind_addr)
                .await
                .with_context(|| format!("binding {bind_addr}"))?;
            tracing::info!("listening on http://{bind_addr}");
            axum::serve(listener, app).await?;
        }
        Command::Page { url } => {
            let research = ResearchClient::new(config)?;
            let preview_chars = research.config().preview_chars;
            let content = research.get_page_content(&url).await;
            if content.is_empty() {
                anyhow::bail!("Could not retrieve page content");
            }
            println!("{}", glean::analyzer::preview(&content, preview_chars));
        }
        Command::Search { query, max_results } => {
            let research = ResearchClient::new(config)?;
            let max_results = max_results.unwrap_or(research.config().max_results);
            let results = research.search_or_empty(&query.join(" "), max_results).await;
            if results.is_empty() {
                println!("No results");
            }
            for (i, result) in results.iter().enumerate() {
                println!("{}. {}\n   {}\n   {}\n", i + 1, result.title, result.url, result.description);
            }
        }
        Command::Image { path } => {
            let research = ResearchClient::new(config)?;
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            println!("{}", research.extract_text_from_image(&bytes).await);
        }
    }
    Ok(())
}
