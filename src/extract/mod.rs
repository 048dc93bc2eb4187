//! Content extraction and language detection.
//!
//! Both are seams: the indexer only sees the traits. The default extractor
//! sniffs PDF and HTML content and falls back to plain text.

mod language;
mod plain;
mod sniff;

pub use language::{LanguageScore, StopwordDetector};
pub use plain::PlainTextExtractor;
pub use sniff::SniffingExtractor;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("binary content")]
    Binary,

    #[error("content is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("file is {size} bytes, over the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },

    #[error("cannot read PDF: {0}")]
    Pdf(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ExtractResult<T> = Result<T, ExtractError>;

/// Turns raw file bytes into indexable text.
pub trait ContentExtractor: Send + Sync {
    fn extract_plain_text(&self, bytes: &[u8]) -> ExtractResult<String>;
}

/// Scores candidate languages for a text.
pub trait LanguageDetector: Send + Sync {
    /// Candidate tags with scores, best first. Empty when nothing is known.
    fn detect(&self, text: &str) -> Vec<LanguageScore>;

    /// Tag of the best-scoring candidate.
    fn best_tag(&self, text: &str) -> Option<String> {
        self.detect(text).into_iter().next().map(|s| s.tag)
    }
}
