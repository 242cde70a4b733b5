//! # interlink CLI
//!
//! Command-line front end for the interlink crate.
//!
//! ## Subcommands
//!
//! - `sitemap`: List the URLs of a sitemap
//! - `audit`: Scrape SEO metadata for every sitemap URL
//! - `related`: Embed every page and suggest internal links for a target
//! - `suggest`: Suggest internal links from a saved embeddings file
//!
//! Without `--target`, `related` and `suggest` prompt for target URLs until
//! an empty line is entered.

mod telemetry;

use anyhow::{Context, bail};
use clap::{ArgAction, Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use interlink::crawler::{
    CrawledPage, CrawlerConfig, DEFAULT_TTL, Fetcher, PageMetadata, ResponseCache, TextSource,
    crawl_pages,
};
use interlink::embedder::{EmbedConfig, embed_pages, load_embeddings, save_embeddings};
use interlink::model::{Client, Provider};
use interlink::report::{
    MetadataRow, OutputFormat, SitemapRow, SuggestionRow, display_metadata, display_related,
    display_sitemap, export_csv, write_json,
};
use interlink::search::{SearchError, SearchOptions};
use interlink::session::Session;
use interlink::sitemap::{SitemapConfig, SitemapEntry, extract_sitemap_urls};
use rig::embeddings::EmbeddingModel;
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use termcolor::{ColorChoice, StandardStream};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};

#[derive(Parser)]
#[command(author, version, about = "Sitemap crawler, SEO metadata auditor and internal link suggester", long_about = None)]
struct Cli {
    #[command(flatten)]
    logging: LogArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct LogArgs {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Export traces and metrics over OTLP
    #[arg(long, global = true)]
    otel: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the URLs of a sitemap
    Sitemap(SitemapArgs),

    /// Scrape title, description, H1, canonical and robots for every sitemap URL
    Audit(AuditArgs),

    /// Embed every sitemap page and suggest internal links
    Related(RelatedArgs),

    /// Suggest internal links from a saved embeddings file
    Suggest(SuggestArgs),
}

#[derive(Args, Debug, Clone)]
struct FetchArgs {
    /// Number of pages fetched at once
    #[arg(short, long, default_value = "8")]
    concurrency: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "5")]
    timeout_secs: u64,

    /// User agent sent with every request
    #[arg(long)]
    user_agent: Option<String>,

    /// Delay before each request in milliseconds
    #[arg(long, default_value = "0")]
    rate: u64,

    /// Which page text is used for embeddings (visible or paragraphs)
    #[arg(long, default_value = "visible")]
    text_source: TextSource,

    /// Disable the HTTP response cache
    #[arg(long)]
    no_cache: bool,

    /// Response cache location
    #[arg(long, default_value = ".interlink/cache.db")]
    cache_path: PathBuf,

    /// Seconds a cached response stays valid
    #[arg(long, default_value_t = DEFAULT_TTL.as_secs())]
    cache_ttl: u64,
}

#[derive(Args, Debug, Clone)]
struct SitemapOpts {
    /// How many levels of sitemap indexes to follow
    #[arg(long, default_value = "2")]
    sitemap_depth: u32,

    /// Stop after this many URLs
    #[arg(long)]
    max_urls: Option<usize>,

    /// Comma-separated extensions to skip
    #[arg(long, value_delimiter = ',', default_value = ".pdf")]
    skip_ext: Vec<String>,
}

#[derive(Args, Debug)]
struct SitemapArgs {
    /// Sitemap or sitemap index URL
    url: String,

    #[command(flatten)]
    fetch: FetchArgs,

    #[command(flatten)]
    sitemap: SitemapOpts,

    /// Write the URL list to this CSV file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Args, Debug)]
struct AuditArgs {
    /// Sitemap or sitemap index URL
    url: String,

    #[command(flatten)]
    fetch: FetchArgs,

    #[command(flatten)]
    sitemap: SitemapOpts,

    /// Write the metadata table to this CSV file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Args, Debug, Clone)]
struct SuggestOpts {
    /// Target URL; prompts interactively when omitted
    #[arg(short, long)]
    target: Option<String>,

    /// Number of suggestions per target
    #[arg(short = 'n', long, default_value = "3")]
    top_n: usize,

    /// Drop suggestions scoring below this value
    #[arg(long)]
    min_score: Option<f32>,

    /// Write suggestions to this CSV file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Args, Debug)]
struct RelatedArgs {
    /// Sitemap or sitemap index URL
    url: String,

    #[command(flatten)]
    fetch: FetchArgs,

    #[command(flatten)]
    sitemap: SitemapOpts,

    #[command(flatten)]
    suggest: SuggestOpts,

    /// Embedding provider (gemini or openai)
    #[arg(long, default_value = "gemini")]
    provider: Provider,

    /// Texts sent per embedding request
    #[arg(long, default_value = "32")]
    batch_size: usize,

    /// Save the embeddings to this file (.csv or .json)
    #[arg(long)]
    embeddings_out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SuggestArgs {
    /// Embeddings file (.csv or .json)
    embeddings_file: PathBuf,

    #[command(flatten)]
    suggest: SuggestOpts,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _otel = telemetry::init_tracing_subscriber(
        cli.logging.verbose,
        cli.logging.log_file.as_deref(),
        cli.logging.otel,
    )?;

    match cli.command {
        Commands::Sitemap(args) => sitemap_command(args).await?,
        Commands::Audit(args) => audit_command(args).await?,
        Commands::Related(args) => match args.provider {
            Provider::Gemini => related_command(Client::new_gemini_from_env()?, args).await?,
            Provider::OpenAi => related_command(Client::new_openai_from_env()?, args).await?,
        },
        Commands::Suggest(args) => suggest_command(args).await?,
    }

    Ok(())
}

#[instrument]
async fn sitemap_command(args: SitemapArgs) -> anyhow::Result<()> {
    let fetcher = build_fetcher(&args.fetch).await?;
    let entries = load_sitemap(&fetcher, &args.url, &args.sitemap).await?;

    let stdout = StandardStream::stdout(ColorChoice::Auto);
    let mut out = stdout.lock();
    match args.format {
        OutputFormat::Text => {
            display_sitemap(&mut out, &entries)?;
        }
        OutputFormat::Json => write_json(&mut out, &entries)?,
    }

    if let Some(output) = args.output {
        let rows: Vec<SitemapRow> = entries.iter().map(SitemapRow::from).collect();
        let written = export_csv(&output, &rows)?;
        eprintln!("Saved {} URLs to {}", written, output.display());
    }

    Ok(())
}

#[instrument]
async fn audit_command(args: AuditArgs) -> anyhow::Result<()> {
    let fetcher = build_fetcher(&args.fetch).await?;
    let entries = load_sitemap(&fetcher, &args.url, &args.sitemap).await?;

    let start_time = Instant::now();
    let pages = crawl_with_progress(&fetcher, &entries).await?;
    eprintln!(
        "Scraped {} pages in {:.2?}",
        pages.len(),
        start_time.elapsed()
    );

    let metadata: Vec<PageMetadata> = pages.into_iter().map(|p| p.metadata).collect();

    let stdout = StandardStream::stdout(ColorChoice::Auto);
    let mut out = stdout.lock();
    match args.format {
        OutputFormat::Text => {
            display_metadata(&mut out, &metadata)?;
        }
        OutputFormat::Json => write_json(&mut out, &metadata)?,
    }

    if let Some(output) = args.output {
        let rows: Vec<MetadataRow> = metadata.iter().map(MetadataRow::from).collect();
        let written = export_csv(&output, &rows)?;
        eprintln!("Saved {} rows to {}", written, output.display());
    }

    Ok(())
}

#[instrument(skip(client))]
async fn related_command<E>(client: Client<E>, args: RelatedArgs) -> anyhow::Result<()>
where
    E: EmbeddingModel,
{
    let fetcher = build_fetcher(&args.fetch).await?;
    let entries = load_sitemap(&fetcher, &args.url, &args.sitemap).await?;
    let pages = crawl_with_progress(&fetcher, &entries).await?;

    eprintln!("Generating embeddings...");
    let start_time = Instant::now();
    let config = EmbedConfig::builder().batch_size(args.batch_size).build();
    let embeddings = embed_pages(&client, &pages, &config).await?;
    eprintln!(
        "Embedded {} of {} pages in {:.2?}",
        embeddings.len(),
        pages.len(),
        start_time.elapsed()
    );

    if let Some(path) = &args.embeddings_out {
        save_embeddings(path, &embeddings)?;
        eprintln!("Saved embeddings to {}", path.display());
    }

    let session = Session::new(pages, embeddings);
    suggest_links(&session, args.suggest).await
}

#[instrument]
async fn suggest_command(args: SuggestArgs) -> anyhow::Result<()> {
    let embeddings = load_embeddings(&args.embeddings_file).with_context(|| {
        format!(
            "Failed to load embeddings from {}",
            args.embeddings_file.display()
        )
    })?;
    eprintln!(
        "Loaded {} embeddings from {}",
        embeddings.len(),
        args.embeddings_file.display()
    );

    let session = Session::from_embeddings(embeddings);
    suggest_links(&session, args.suggest).await
}

async fn build_fetcher(args: &FetchArgs) -> anyhow::Result<Fetcher> {
    let mut builder = CrawlerConfig::builder()
        .concurrency(args.concurrency)
        .timeout_secs(args.timeout_secs)
        .rate_limit_ms(args.rate)
        .text_source(args.text_source);
    if let Some(user_agent) = &args.user_agent {
        builder = builder.user_agent(user_agent.clone());
    }

    let fetcher = Fetcher::new(builder.build())?;
    if args.no_cache {
        return Ok(fetcher);
    }

    if let Some(parent) = args.cache_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    match ResponseCache::open(&args.cache_path, Duration::from_secs(args.cache_ttl)).await {
        Ok(cache) => {
            match cache.purge_expired().await {
                Ok(purged) if purged > 0 => info!("Purged {} expired cache entries", purged),
                Ok(_) => {}
                Err(e) => warn!("Failed to purge response cache: {}", e),
            }
            Ok(fetcher.with_cache(cache))
        }
        Err(e) => {
            warn!("Response cache unavailable, continuing without it: {}", e);
            Ok(fetcher)
        }
    }
}

async fn load_sitemap(
    fetcher: &Fetcher,
    url: &str,
    opts: &SitemapOpts,
) -> anyhow::Result<Vec<SitemapEntry>> {
    eprintln!("Extracting URLs from sitemap...");
    let config = SitemapConfig::builder()
        .max_depth(opts.sitemap_depth)
        .skip_extensions(opts.skip_ext.clone())
        .max_urls(opts.max_urls)
        .build();

    let entries = extract_sitemap_urls(fetcher, url, &config)
        .await
        .with_context(|| format!("Failed to read sitemap {}", url))?;
    eprintln!("Found {} URLs.", entries.len());
    Ok(entries)
}

async fn crawl_with_progress(
    fetcher: &Fetcher,
    entries: &[SitemapEntry],
) -> anyhow::Result<Vec<CrawledPage>> {
    let urls: Vec<String> = entries.iter().map(|e| e.loc.clone()).collect();

    // Create a channel for progress updates
    let (progress_sender, mut progress_receiver) = mpsc::channel::<String>(100);

    let progress_bar = ProgressBar::new(urls.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({eta}) {msg}")?
            .progress_chars("##-"),
    );
    progress_bar.set_message("Fetching pages...");

    let progress_handle = tokio::spawn({
        let progress_bar = progress_bar.clone();
        async move {
            while let Some(url) = progress_receiver.recv().await {
                progress_bar.inc(1);
                progress_bar.set_message(url);
            }
            progress_bar.finish_with_message("Fetching completed");
        }
    });

    let pages = crawl_pages(fetcher, &urls, Some(progress_sender)).await;

    // Ends once every sender has been dropped
    let _ = progress_handle.await;

    Ok(pages)
}

/// Answer one target, or prompt for targets until an empty line
async fn suggest_links(session: &Session, opts: SuggestOpts) -> anyhow::Result<()> {
    let options = SearchOptions {
        limit: opts.top_n,
        min_score: opts.min_score,
    };
    let mut rows = Vec::new();

    match &opts.target {
        Some(target) => match session.related(target, &options) {
            Ok(related) => {
                rows.extend(show_related(session, target, &related, opts.format)?);
            }
            Err(SearchError::UrlNotFound(url)) => {
                bail!("URL `{}` is not in the processed pages", url)
            }
            Err(e) => return Err(e.into()),
        },
        None => {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                eprint!("Enter target URL (empty line to quit): ");
                std::io::stderr().flush()?;

                let Some(line) = lines.next_line().await? else {
                    break;
                };
                let target = line.trim();
                if target.is_empty() {
                    break;
                }

                match session.related(target, &options) {
                    Ok(related) => {
                        rows.extend(show_related(session, target, &related, opts.format)?);
                    }
                    Err(SearchError::UrlNotFound(url)) => {
                        eprintln!(
                            "URL `{}` is not in the processed pages. Please check and try again.",
                            url
                        );
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
    }

    if let Some(output) = &opts.output {
        let written = export_csv(output, &rows)?;
        eprintln!("Saved {} suggestions to {}", written, output.display());
    }

    Ok(())
}

/// Print suggestions and return them as CSV rows
fn show_related(
    session: &Session,
    target: &str,
    related: &[interlink::search::RelatedPage],
    format: OutputFormat,
) -> anyhow::Result<Vec<SuggestionRow>> {
    let target = session
        .resolve_target(target)
        .unwrap_or_else(|| target.to_string());

    let stdout = StandardStream::stdout(ColorChoice::Auto);
    let mut out = stdout.lock();
    match format {
        OutputFormat::Text => {
            display_related(&mut out, &target, related)?;
        }
        OutputFormat::Json => write_json(
            &mut out,
            &serde_json::json!({ "target": target, "related": related }),
        )?,
    }

    Ok(SuggestionRow::for_target(&target, related))
}
