//! # interlink - Internal Linking Assistant
//!
//! This crate reads a website's sitemap, audits the SEO metadata of every
//! page and suggests internal links between pages whose content is
//! semantically close.
//!
//! ## Features
//!
//! - Sitemap and sitemap index parsing with URL de-duplication
//! - Concurrent page fetching with per-request timeouts and an optional
//!   LibSQL response cache
//! - Metadata scraping: title, description, H1, canonical URL and robots
//!   directives
//! - Rate-limited embedding generation through `rig` (Gemini or OpenAI)
//! - Cosine-similarity ranking of related pages
//! - Terminal, JSON and CSV output
//!
//! ## Example
//!
//! ```rust,no_run
//! use interlink::crawler::{CrawlerConfig, Fetcher, crawl_pages};
//! use interlink::embedder::{EmbedConfig, embed_pages};
//! use interlink::model::Client;
//! use interlink::search::SearchOptions;
//! use interlink::session::Session;
//! use interlink::sitemap::{SitemapConfig, extract_sitemap_urls};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = Fetcher::new(CrawlerConfig::default())?;
//!     let entries = extract_sitemap_urls(
//!         &fetcher,
//!         "https://example.com/sitemap.xml",
//!         &SitemapConfig::default(),
//!     )
//!     .await?;
//!
//!     let urls: Vec<String> = entries.into_iter().map(|e| e.loc).collect();
//!     let pages = crawl_pages(&fetcher, &urls, None).await;
//!
//!     let client = Client::new_gemini_from_env()?;
//!     let embeddings = embed_pages(&client, &pages, &EmbedConfig::default()).await?;
//!
//!     let session = Session::new(pages, embeddings);
//!     for page in session.related("https://example.com/blog/", &SearchOptions::default())? {
//!         println!("🔗 {} ({:.2})", page.url, page.score);
//!     }
//!     Ok(())
//! }
//! ```

mod error;
pub mod model;

pub mod crawler;
pub mod embedder;
pub mod report;
pub mod search;
pub mod session;
pub mod sitemap;

pub use error::{Error, Result};
