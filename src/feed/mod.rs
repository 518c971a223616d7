//! Feed assembly and output.
//!
//! - [`assembler`] - Orders entries and derives tag-filtered sub-feeds
//! - [`rss`] / [`json`] - RSS 2.0 and JSON Feed 1.1 encoders
//! - [`writer`] - Encodes assembled feeds and places the files atomically

pub mod assembler;
pub mod json;
pub mod rss;
pub mod writer;

use thiserror::Error;

pub use assembler::assemble;
pub use writer::{FeedWriter, PersistError, WriteError, WrittenFeed};

/// A feed could not be serialized to one of the output formats.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("XML encoding failed: {0}")]
    Xml(String),
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}
