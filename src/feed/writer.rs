use super::json::to_json_feed;
use super::rss::to_rss;
use super::EncodeError;
use crate::config::OutputConfig;
use crate::model::AssembledFeed;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// An artifact could not be placed at its destination.
///
/// Unlike crawl failures this is fatal for the whole run: a missing or
/// unwritable output directory affects every source equally.
#[derive(Debug, Error)]
#[error("Failed to place '{}': {source}", path.display())]
pub struct PersistError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Failed to encode feed '{name}': {source}")]
    Encode {
        name: String,
        #[source]
        source: EncodeError,
    },
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Files produced for one assembled feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFeed {
    pub name: String,
    pub records: PathBuf,
    pub rss: PathBuf,
    pub json: PathBuf,
}

/// Encodes assembled feeds and places them in the configured directories.
#[derive(Debug, Clone)]
pub struct FeedWriter {
    records_dir: PathBuf,
    feeds_dir: PathBuf,
}

impl FeedWriter {
    pub fn new(output: &OutputConfig) -> Self {
        Self {
            records_dir: output.records_dir.clone(),
            feeds_dir: output.feeds_dir.clone(),
        }
    }

    /// Writes the record dump, RSS, and JSON Feed files for `assembled`.
    ///
    /// Everything is encoded before anything is placed, so an encoding
    /// failure leaves no partial output behind.
    pub fn write(&self, assembled: &AssembledFeed) -> Result<WrittenFeed, WriteError> {
        let name = assembled.name.to_lowercase();
        let encode_err = |source: EncodeError| WriteError::Encode {
            name: name.clone(),
            source,
        };

        let records = serde_json::to_string_pretty(&assembled.entries)
            .map_err(|e| encode_err(e.into()))?;
        let rss = to_rss(&assembled.feed).map_err(encode_err)?;
        let json = to_json_feed(&assembled.feed).map_err(encode_err)?;

        let written = WrittenFeed {
            records: self.records_dir.join(format!("{}_feed_items.json", name)),
            rss: self.feeds_dir.join(format!("{}.rss", name)),
            json: self.feeds_dir.join(format!("{}.json", name)),
            name,
        };

        atomic_write(&written.records, records.as_bytes())?;
        atomic_write(&written.rss, rss.as_bytes())?;
        atomic_write(&written.json, json.as_bytes())?;

        tracing::info!(
            feed = %written.name,
            entries = assembled.entries.len(),
            rss = %written.rss.display(),
            "Wrote feed"
        );
        Ok(written)
    }
}

/// Writes `content` to a temporary file next to `path`, syncs it, then
/// renames it into place, so readers never observe a partial file.
///
/// The destination directory must already exist.
fn atomic_write(path: &Path, content: &[u8]) -> Result<(), PersistError> {
    use std::time::{SystemTime, UNIX_EPOCH};

    let persist_err = |source: std::io::Error| PersistError {
        path: path.to_path_buf(),
        source,
    };

    let random_suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let temp_path = path.with_extension(format!("tmp.{:016x}", random_suffix));

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)
        .map_err(persist_err)?;

    let result = file.write_all(content).and_then(|()| file.sync_all());
    drop(file);
    let result = result.and_then(|()| std::fs::rename(&temp_path, path));

    if let Err(e) = result {
        let _ = std::fs::remove_file(&temp_path);
        return Err(persist_err(e));
    }
    Ok(())
}
