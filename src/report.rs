//! # Report Module
//!
//! Presents run results on the terminal and exports them to CSV or JSON.
//!
//! ## Key Components
//!
//! - `display_*`: Colored terminal output through `termcolor`
//! - `MetadataRow`, `SuggestionRow`, `SitemapRow`: CSV row shapes
//! - `export_csv` / `write_csv`: CSV writers returning the number of rows
//!
//! Display functions and CSV writers take the same slices, so an export
//! always holds as many data rows as the table shown for it.

mod csv_export;
mod display;
mod error;

pub use csv_export::{CsvRow, export_csv, write_csv};
pub use display::{display_metadata, display_related, display_sitemap, write_json};
pub use error::ExportError;

use crate::crawler::PageMetadata;
use crate::search::RelatedPage;
use crate::sitemap::SitemapEntry;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Output format for results printed to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Colored, human-readable text
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output format: {}", other)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// One page of the metadata audit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataRow {
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "H1")]
    pub h1: String,
    #[serde(rename = "Canonical URL")]
    pub canonical_url: String,
    #[serde(rename = "Canonical Status")]
    pub canonical_status: String,
    #[serde(rename = "Noindex/Nofollow")]
    pub robots: String,
}

impl CsvRow for MetadataRow {
    const HEADERS: &'static [&'static str] = &[
        "URL",
        "Title",
        "Description",
        "H1",
        "Canonical URL",
        "Canonical Status",
        "Noindex/Nofollow",
    ];
}

impl From<&PageMetadata> for MetadataRow {
    fn from(page: &PageMetadata) -> Self {
        Self {
            url: page.url.clone(),
            title: page.title_or_placeholder().to_string(),
            description: page.description_or_placeholder().to_string(),
            h1: page.h1_or_placeholder().to_string(),
            canonical_url: page.canonical_or_placeholder().to_string(),
            canonical_status: page.canonical_status.to_string(),
            robots: page.robots_label(),
        }
    }
}

/// One link suggestion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionRow {
    #[serde(rename = "Target URL")]
    pub target_url: String,
    #[serde(rename = "Related URL")]
    pub related_url: String,
    #[serde(rename = "Similarity Score")]
    pub score: f32,
}

impl CsvRow for SuggestionRow {
    const HEADERS: &'static [&'static str] = &["Target URL", "Related URL", "Similarity Score"];
}

impl SuggestionRow {
    pub fn new(target: &str, related: &RelatedPage) -> Self {
        Self {
            target_url: target.to_string(),
            related_url: related.url.clone(),
            score: related.score,
        }
    }

    /// Rows for every suggestion of one target
    pub fn for_target(target: &str, related: &[RelatedPage]) -> Vec<Self> {
        related.iter().map(|r| Self::new(target, r)).collect()
    }
}

/// One sitemap URL
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SitemapRow {
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "Last Modified")]
    pub lastmod: String,
}

impl CsvRow for SitemapRow {
    const HEADERS: &'static [&'static str] = &["URL", "Last Modified"];
}

impl From<&SitemapEntry> for SitemapRow {
    fn from(entry: &SitemapEntry) -> Self {
        Self {
            url: entry.loc.clone(),
            lastmod: entry.lastmod.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::CanonicalStatus;
    use termcolor::Buffer;

    fn metadata() -> Vec<PageMetadata> {
        vec![
            PageMetadata {
                url: "https://example.com/".to_string(),
                title: Some("Home, sweet home".to_string()),
                description: Some("Welcome".to_string()),
                h1: Some("Hello".to_string()),
                canonical_url: Some("https://example.com/".to_string()),
                canonical_status: CanonicalStatus::SelfReferencing,
                robots_directives: None,
            },
            PageMetadata {
                robots_directives: Some("noindex, follow".to_string()),
                ..PageMetadata::empty("https://example.com/hidden")
            },
        ]
    }

    fn related() -> Vec<RelatedPage> {
        vec![
            RelatedPage {
                url: "https://example.com/b".to_string(),
                score: 0.91234,
                already_linked: false,
            },
            RelatedPage {
                url: "https://example.com/c".to_string(),
                score: 0.5,
                already_linked: true,
            },
        ]
    }

    fn csv_data_rows(bytes: &[u8]) -> usize {
        csv::Reader::from_reader(bytes).records().count()
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("text".parse::<OutputFormat>(), Ok(OutputFormat::Text));
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_metadata_row_uses_placeholders() {
        let pages = metadata();
        let row = MetadataRow::from(&pages[1]);
        assert_eq!(row.title, "Title not found");
        assert_eq!(row.description, "Description not found");
        assert_eq!(row.h1, "H1 not found");
        assert_eq!(row.canonical_url, "Canonical not found");
        assert_eq!(row.canonical_status, "Missing");
        assert_eq!(row.robots, "Noindex, Follow");
    }

    #[test]
    fn test_metadata_csv_matches_display() {
        let pages = metadata();
        let mut buffer = Buffer::no_color();
        let displayed = display_metadata(&mut buffer, &pages).unwrap();

        let rows: Vec<MetadataRow> = pages.iter().map(MetadataRow::from).collect();
        let mut csv_bytes = Vec::new();
        let written = write_csv(&mut csv_bytes, &rows).unwrap();

        assert_eq!(displayed, written);
        assert_eq!(csv_data_rows(&csv_bytes), displayed);

        let text = String::from_utf8(csv_bytes).unwrap();
        assert!(text.starts_with(
            "URL,Title,Description,H1,Canonical URL,Canonical Status,Noindex/Nofollow\n"
        ));
        assert!(text.contains("\"Home, sweet home\""));

        let shown = String::from_utf8(buffer.into_inner()).unwrap();
        assert!(shown.contains("Title: Title not found"));
        assert!(shown.contains("(Self-referencing)"));
        assert!(shown.contains("[Noindex, Follow]"));
    }

    #[test]
    fn test_suggestions_csv_matches_display() {
        let related = related();
        let mut buffer = Buffer::no_color();
        let displayed = display_related(&mut buffer, "https://example.com/a", &related).unwrap();

        let rows = SuggestionRow::for_target("https://example.com/a", &related);
        let mut csv_bytes = Vec::new();
        let written = write_csv(&mut csv_bytes, &rows).unwrap();

        assert_eq!(displayed, 2);
        assert_eq!(written, displayed);
        assert_eq!(csv_data_rows(&csv_bytes), displayed);

        let shown = String::from_utf8(buffer.into_inner()).unwrap();
        assert!(shown.contains("🔗 https://example.com/b (0.91)"));
        assert!(shown.contains("[already linked]"));
    }

    #[test]
    fn test_empty_results() {
        let mut buffer = Buffer::no_color();
        let displayed = display_related(&mut buffer, "https://example.com/a", &[]).unwrap();
        assert_eq!(displayed, 0);
        let shown = String::from_utf8(buffer.into_inner()).unwrap();
        assert!(shown.contains("No related pages found"));

        let mut csv_bytes = Vec::new();
        let written = write_csv::<SuggestionRow, _>(&mut csv_bytes, &[]).unwrap();
        assert_eq!(written, 0);
        assert_eq!(
            String::from_utf8(csv_bytes).unwrap(),
            "Target URL,Related URL,Similarity Score\n"
        );
    }

    #[test]
    fn test_sitemap_export_to_file() {
        let entries = vec![
            SitemapEntry {
                loc: "https://example.com/a".to_string(),
                lastmod: Some("2024-01-01".to_string()),
            },
            SitemapEntry::new("https://example.com/b"),
        ];
        let mut buffer = Buffer::no_color();
        let displayed = display_sitemap(&mut buffer, &entries).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("sitemap.csv");
        let rows: Vec<SitemapRow> = entries.iter().map(SitemapRow::from).collect();
        let written = export_csv(&path, &rows).unwrap();

        assert_eq!(written, displayed);
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "URL,Last Modified\nhttps://example.com/a,2024-01-01\nhttps://example.com/b,\n"
        );
    }

    #[test]
    fn test_write_json() {
        let mut out = Vec::new();
        write_json(&mut out, &related()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value[0]["url"], "https://example.com/b");
        assert_eq!(value[1]["already_linked"], true);
    }
}
