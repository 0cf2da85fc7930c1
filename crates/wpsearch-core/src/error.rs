//! Domain errors that callers need to match on.
//!
//! Everything else is propagated as `anyhow::Error`.

use thiserror::Error;

/// Errors raised by a collection while reading or writing articles.
#[derive(Debug, Error)]
pub enum CollectionError {
    /// A structured field (`auxiliary_text`, `categories`, `headings`) could
    /// not be decoded. The importer always writes valid JSON, so this means
    /// the store is corrupt.
    #[error("corrupt {field} for article '{title}': {source}")]
    CorruptField {
        title: String,
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("title is {len} bytes, must be shorter than {max}: '{title}'")]
    TitleTooLong {
        title: String,
        len: usize,
        max: usize,
    },

    #[error("article title must not be empty")]
    EmptyTitle,

    #[error("popularity_score must be a non-negative number for '{title}', got {score}")]
    InvalidPopularity { title: String, score: f64 },

    #[error("article already exists: '{0}'")]
    DuplicateTitle(String),

    #[error("redirect already exists: '{0}'")]
    DuplicateRedirect(String),
}
