//! Bounded concurrent page fetching

use crate::crawler::cache::ResponseCache;
use crate::crawler::config::CrawlerConfig;
use crate::crawler::error::CrawlError;
use futures::future;
use reqwest::Client as ReqwestClient;
use reqwest::header::{ACCEPT, HeaderValue};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, instrument, warn};

/// Raw result of fetching one URL
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage {
    /// Requested URL
    pub url: String,

    /// HTTP status, `None` when the request failed or timed out
    pub status: Option<u16>,

    /// Response body, empty on failure
    pub html: String,

    /// `X-Robots-Tag` response header
    pub robots_header: Option<String>,
}

impl FetchedPage {
    /// A failed fetch
    pub fn empty(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: None,
            html: String::new(),
            robots_header: None,
        }
    }
}

/// HTTP fetcher shared by the sitemap and page stages
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: ReqwestClient,
    config: CrawlerConfig,
    cache: Option<ResponseCache>,
}

#[cfg(test)]
impl Fetcher {
    /// Fetcher with a short timeout for tests against a local mock server
    pub(crate) fn for_tests() -> Self {
        let config = CrawlerConfig::builder().timeout_secs(2).concurrency(4).build();
        Self::new(config).expect("client builds")
    }
}

impl Fetcher {
    /// Create a fetcher without a response cache
    pub fn new(config: CrawlerConfig) -> Result<Self, CrawlError> {
        let client = ReqwestClient::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            config,
            cache: None,
        })
    }

    /// Attach a response cache
    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// The crawler configuration
    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    async fn cached(&self, url: &str) -> Option<FetchedPage> {
        let cache = self.cache.as_ref()?;
        match cache.get(url).await {
            Ok(page) => page,
            Err(e) => {
                warn!("Cache lookup failed for {}: {}", url, e);
                None
            }
        }
    }

    async fn remember(&self, page: &FetchedPage) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(page).await {
                warn!("Failed to cache {}: {}", page.url, e);
            }
        }
    }

    async fn request(&self, url: &str) -> Result<FetchedPage, CrawlError> {
        let response = self
            .client
            .get(url)
            .header(
                ACCEPT,
                HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
            )
            .send()
            .await?;

        let status = response.status();
        let robots_header = response
            .headers()
            .get_all("x-robots-tag")
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect::<Vec<_>>()
            .join(", ");
        let body = response.text().await?;

        if !status.is_success() {
            return Err(CrawlError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(FetchedPage {
            url: url.to_string(),
            status: Some(status.as_u16()),
            html: body,
            robots_header: if robots_header.is_empty() {
                None
            } else {
                Some(robots_header)
            },
        })
    }

    /// Fetch a document, failing on network errors and non-success statuses
    #[instrument(skip(self), level = "debug")]
    pub async fn get_text(&self, url: &str) -> Result<String, CrawlError> {
        if let Some(page) = self.cached(url).await {
            return Ok(page.html);
        }

        let page = self.request(url).await?;
        self.remember(&page).await;
        Ok(page.html)
    }

    /// Fetch a page, falling back to an empty result on any failure
    ///
    /// Timeouts, network errors and non-success statuses are logged and
    /// produce a `FetchedPage` with an empty body. Nothing is retried.
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch_page(&self, url: &str) -> FetchedPage {
        if let Some(page) = self.cached(url).await {
            return page;
        }

        match self.request(url).await {
            Ok(page) => {
                self.remember(&page).await;
                page
            }
            Err(CrawlError::Status { status, .. }) => {
                warn!("Error fetching {}: HTTP {}", url, status);
                FetchedPage {
                    status: Some(status),
                    ..FetchedPage::empty(url)
                }
            }
            Err(e) => {
                warn!("Error fetching {}: {}", url, e);
                FetchedPage::empty(url)
            }
        }
    }

    /// Fetch many pages with bounded concurrency
    ///
    /// # Arguments
    ///
    /// * `urls` - The URLs to fetch
    /// * `progress` - Receives each URL once it has been fetched
    ///
    /// # Returns
    ///
    /// Pages keyed by URL. Completion order is not preserved.
    #[instrument(skip(self, urls, progress), fields(count = urls.len()))]
    pub async fn fetch_all(
        &self,
        urls: &[String],
        progress: Option<mpsc::Sender<String>>,
    ) -> HashMap<String, FetchedPage> {
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));

        let tasks = urls
            .iter()
            .cloned()
            .map(|url| {
                let fetcher = self.clone();
                let semaphore = semaphore.clone();
                let progress = progress.clone();

                tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await.ok();
                    if !fetcher.config.rate_limit().is_zero() {
                        tokio::time::sleep(fetcher.config.rate_limit()).await;
                    }

                    let page = fetcher.fetch_page(&url).await;
                    if let Some(progress) = progress {
                        let _ = progress.send(url).await;
                    }
                    page
                })
            })
            .collect::<Vec<_>>();

        let mut pages = HashMap::with_capacity(urls.len());
        for (url, result) in urls.iter().zip(future::join_all(tasks).await) {
            match result {
                Ok(page) => {
                    pages.insert(page.url.clone(), page);
                }
                Err(e) => {
                    warn!("Fetch task for {} failed: {}", url, e);
                    pages.insert(url.clone(), FetchedPage::empty(url));
                }
            }
        }

        debug!("Fetched {} pages", pages.len());
        pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fetch_page_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/page")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_header("x-robots-tag", "noindex")
            .with_body("<html><title>Hi</title></html>")
            .expect(1)
            .create_async()
            .await;

        let fetcher = Fetcher::for_tests();
        let page = fetcher.fetch_page(&format!("{}/page", server.url())).await;

        assert_eq!(page.status, Some(200));
        assert_eq!(page.html, "<html><title>Hi</title></html>");
        assert_eq!(page.robots_header.as_deref(), Some("noindex"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_page_error_falls_back_to_empty() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .with_body("not here")
            .create_async()
            .await;

        let fetcher = Fetcher::for_tests();
        let page = fetcher.fetch_page(&format!("{}/missing", server.url())).await;

        assert_eq!(page.status, Some(404));
        assert!(page.html.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_page_unreachable() {
        let fetcher = Fetcher::for_tests();
        let page = fetcher.fetch_page("http://127.0.0.1:1/nothing").await;

        assert!(page.status.is_none());
        assert!(page.html.is_empty());
    }

    #[tokio::test]
    async fn test_get_text_propagates_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/sitemap.xml")
            .with_status(500)
            .create_async()
            .await;

        let fetcher = Fetcher::for_tests();
        let result = fetcher.get_text(&format!("{}/sitemap.xml", server.url())).await;

        assert!(matches!(result, Err(CrawlError::Status { status: 500, .. })));
    }

    #[tokio::test]
    async fn test_fetch_all_keys_by_url() {
        let mut server = Server::new_async().await;
        let mut urls = Vec::new();
        let mut mocks = Vec::new();
        for i in 0..6 {
            let mock = server
                .mock("GET", format!("/p{}", i).as_str())
                .with_status(200)
                .with_body(format!("<p>page {}</p>", i))
                .create_async()
                .await;
            mocks.push(mock);
            urls.push(format!("{}/p{}", server.url(), i));
        }

        let (tx, mut rx) = mpsc::channel(16);
        let fetcher = Fetcher::for_tests();
        let pages = fetcher.fetch_all(&urls, Some(tx)).await;

        assert_eq!(pages.len(), 6);
        for (i, url) in urls.iter().enumerate() {
            assert_eq!(pages[url].html, format!("<p>page {}</p>", i));
        }

        let mut reported = 0;
        while rx.recv().await.is_some() {
            reported += 1;
        }
        assert_eq!(reported, 6);
    }

    #[tokio::test]
    async fn test_cache_avoids_second_request() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/cached")
            .with_status(200)
            .with_body("<p>cached</p>")
            .expect(1)
            .create_async()
            .await;

        let cache = ResponseCache::in_memory(Duration::from_secs(60)).await.unwrap();
        let fetcher = Fetcher::for_tests().with_cache(cache);
        let url = format!("{}/cached", server.url());

        let first = fetcher.fetch_page(&url).await;
        let second = fetcher.fetch_page(&url).await;

        assert_eq!(first, second);
        mock.assert_async().await;
    }
}
