//! # Response Cache
//!
//! A small LibSQL-backed cache of successful GET responses, keyed by URL.
//! Re-running the tool against the same sitemap within the expiry window
//! skips the network entirely.

use crate::crawler::fetch::FetchedPage;
use crate::error::Error as CrateError;
use libsql::{Connection, params};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

/// Default expiry for cached responses
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Error type for cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    /// LibSQL error
    #[error("LibSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Filesystem error while preparing the cache location
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored row could not be decoded
    #[error("Data error: {0}")]
    Data(String),
}

impl From<CacheError> for CrateError {
    fn from(err: CacheError) -> Self {
        CrateError::Cache(err.to_string())
    }
}

/// Cache of fetched page bodies
#[derive(Clone)]
pub struct ResponseCache {
    conn: Connection,
    ttl: Duration,
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache").field("ttl", &self.ttl).finish()
    }
}

impl ResponseCache {
    /// Open (or create) a cache database at `path`
    pub async fn open(path: impl AsRef<Path>, ttl: Duration) -> Result<Self, CacheError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let db = libsql::Builder::new_local(path).build().await?;
        Self::with_connection(db.connect()?, ttl).await
    }

    /// Create a cache that only lives for the current process
    pub async fn in_memory(ttl: Duration) -> Result<Self, CacheError> {
        let db = libsql::Builder::new_local(":memory:").build().await?;
        Self::with_connection(db.connect()?, ttl).await
    }

    async fn with_connection(conn: Connection, ttl: Duration) -> Result<Self, CacheError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS responses (
                url TEXT PRIMARY KEY,
                status INTEGER NOT NULL,
                body TEXT NOT NULL,
                robots_header TEXT NOT NULL,
                fetched_at INTEGER NOT NULL
            )",
            params![],
        )
        .await?;

        Ok(Self { conn, ttl })
    }

    /// Expiry applied to cached responses
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a fresh cached response
    #[instrument(skip(self), level = "debug")]
    pub async fn get(&self, url: &str) -> Result<Option<FetchedPage>, CacheError> {
        let oldest = chrono::Utc::now().timestamp() - self.ttl.as_secs() as i64;
        let mut rows = self
            .conn
            .query(
                "SELECT status, body, robots_header FROM responses
                 WHERE url = ? AND fetched_at >= ?",
                params![url.to_string(), oldest],
            )
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };

        let status: i64 = row.get(0)?;
        let body: String = row.get(1)?;
        let robots_header: String = row.get(2)?;
        let status = u16::try_from(status)
            .map_err(|_| CacheError::Data(format!("invalid status {} for {}", status, url)))?;

        debug!("Cache hit for {}", url);
        Ok(Some(FetchedPage {
            url: url.to_string(),
            status: Some(status),
            html: body,
            robots_header: if robots_header.is_empty() {
                None
            } else {
                Some(robots_header)
            },
        }))
    }

    /// Store a response, replacing any previous entry for the URL
    pub async fn put(&self, page: &FetchedPage) -> Result<(), CacheError> {
        let Some(status) = page.status else {
            return Ok(());
        };

        self.conn
            .execute(
                "INSERT INTO responses (url, status, body, robots_header, fetched_at)
                 VALUES (?, ?, ?, ?, ?)
                 ON CONFLICT(url) DO UPDATE SET
                 status = excluded.status,
                 body = excluded.body,
                 robots_header = excluded.robots_header,
                 fetched_at = excluded.fetched_at",
                params![
                    page.url.clone(),
                    status as i64,
                    page.html.clone(),
                    page.robots_header.clone().unwrap_or_default(),
                    chrono::Utc::now().timestamp(),
                ],
            )
            .await?;
        Ok(())
    }

    /// Delete expired entries, returning how many were removed
    pub async fn purge_expired(&self) -> Result<u64, CacheError> {
        let oldest = chrono::Utc::now().timestamp() - self.ttl.as_secs() as i64;
        let removed = self
            .conn
            .execute(
                "DELETE FROM responses WHERE fetched_at < ?",
                params![oldest],
            )
            .await?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(url: &str, body: &str) -> FetchedPage {
        FetchedPage {
            url: url.to_string(),
            status: Some(200),
            html: body.to_string(),
            robots_header: None,
        }
    }

    #[tokio::test]
    async fn test_cache_roundtrip() {
        let cache = ResponseCache::in_memory(DEFAULT_TTL).await.unwrap();

        assert!(cache.get("https://example.com/a").await.unwrap().is_none());

        cache.put(&page("https://example.com/a", "<p>first</p>")).await.unwrap();
        cache.put(&page("https://example.com/a", "<p>second</p>")).await.unwrap();

        let cached = cache.get("https://example.com/a").await.unwrap().unwrap();
        assert_eq!(cached.html, "<p>second</p>");
        assert_eq!(cached.status, Some(200));
        assert!(cached.robots_header.is_none());
    }

    #[tokio::test]
    async fn test_failed_fetches_are_not_cached() {
        let cache = ResponseCache::in_memory(DEFAULT_TTL).await.unwrap();

        cache.put(&FetchedPage::empty("https://example.com/down")).await.unwrap();
        assert!(cache.get("https://example.com/down").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_entries() {
        let cache = ResponseCache::in_memory(Duration::ZERO).await.unwrap();
        let mut stale = page("https://example.com/old", "<p>old</p>");
        stale.robots_header = Some("noindex".to_string());
        cache.put(&stale).await.unwrap();

        // Rewind the entry so it is older than the zero TTL
        cache
            .conn
            .execute(
                "UPDATE responses SET fetched_at = fetched_at - 10",
                params![],
            )
            .await
            .unwrap();

        assert!(cache.get("https://example.com/old").await.unwrap().is_none());
        assert_eq!(cache.purge_expired().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_open_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.db");

        let cache = ResponseCache::open(&path, DEFAULT_TTL).await.unwrap();
        cache.put(&page("https://example.com/", "<p>hi</p>")).await.unwrap();

        assert!(path.exists());
        assert_eq!(cache.ttl(), DEFAULT_TTL);
    }
}
