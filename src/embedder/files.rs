//! Embedding files
//!
//! Two layouts are supported:
//!
//! - JSON: an array of `{"url": ..., "embedding": [...]}` records
//! - CSV: a header row, then the URL in the first column followed by one
//!   column per dimension. A two-column CSV whose second column holds a
//!   JSON array (`"[0.1, 0.2]"`) is accepted too.
//!
//! The format is picked from the file extension: `.csv` is CSV, anything
//! else is JSON.

use super::error::EmbedError;
use super::{EmbeddingSet, PageEmbedding};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, instrument};

/// On-disk layout of an embeddings file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingFileFormat {
    Csv,
    Json,
}

impl EmbeddingFileFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::Csv,
            _ => Self::Json,
        }
    }
}

/// Write an embedding set to `path`
#[instrument(skip(set), fields(path = %path.as_ref().display(), count = set.len()))]
pub fn save_embeddings(path: impl AsRef<Path>, set: &EmbeddingSet) -> Result<(), EmbedError> {
    let path = path.as_ref();
    match EmbeddingFileFormat::from_path(path) {
        EmbeddingFileFormat::Json => {
            let mut writer = BufWriter::new(File::create(path)?);
            let entries: Vec<&PageEmbedding> = set.iter().collect();
            serde_json::to_writer_pretty(&mut writer, &entries)?;
            writer.flush()?;
        }
        EmbeddingFileFormat::Csv => {
            let mut writer = csv::Writer::from_path(path)?;
            let dims = set.dimensions().unwrap_or(0);
            let mut header = Vec::with_capacity(dims + 1);
            header.push("url".to_string());
            header.extend((0..dims).map(|i| format!("e{}", i)));
            writer.write_record(&header)?;

            for entry in set.iter() {
                let mut record = Vec::with_capacity(dims + 1);
                record.push(entry.url.clone());
                record.extend(entry.vector.iter().map(|v| v.to_string()));
                writer.write_record(&record)?;
            }
            writer.flush()?;
        }
    }

    debug!("Saved {} embeddings", set.len());
    Ok(())
}

fn parse_csv_vector(record: &csv::StringRecord, line: u64) -> Result<Vec<f32>, EmbedError> {
    if record.len() == 2 {
        let field = record[1].trim();
        if field.starts_with('[') {
            return serde_json::from_str(field).map_err(|e| {
                EmbedError::InvalidFile(format!("line {}: invalid embedding array: {}", line, e))
            });
        }
    }

    record
        .iter()
        .skip(1)
        .map(|field| {
            field.trim().parse::<f32>().map_err(|_| {
                EmbedError::InvalidFile(format!("line {}: invalid number '{}'", line, field))
            })
        })
        .collect()
}

/// Read an embedding set from `path`
#[instrument(fields(path = %path.as_ref().display()))]
pub fn load_embeddings(path: impl AsRef<Path>) -> Result<EmbeddingSet, EmbedError> {
    let path = path.as_ref();
    let entries = match EmbeddingFileFormat::from_path(path) {
        EmbeddingFileFormat::Json => {
            let reader = BufReader::new(File::open(path)?);
            serde_json::from_reader::<_, Vec<PageEmbedding>>(reader)?
        }
        EmbeddingFileFormat::Csv => {
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(true)
                .from_path(path)?;

            let mut entries = Vec::new();
            for result in reader.records() {
                let record = result?;
                let line = record.position().map(|p| p.line()).unwrap_or(0);
                let url = record.get(0).map(str::trim).unwrap_or_default();
                if url.is_empty() {
                    return Err(EmbedError::InvalidFile(format!("line {}: missing URL", line)));
                }
                entries.push(PageEmbedding {
                    url: url.to_string(),
                    vector: parse_csv_vector(&record, line)?,
                });
            }
            entries
        }
    };

    let set = EmbeddingSet::from_entries(entries)?;
    debug!("Loaded {} embeddings", set.len());
    Ok(set)
}
