//! Core data models stored in a collection.
//!
//! An [`Article`] is one encyclopedia entry; a [`Redirect`] is an alias
//! title pointing at a canonical article title.

use serde::{Deserialize, Serialize};

use crate::error::CollectionError;

/// Titles are primary keys and always stay below this many bytes.
pub const MAX_TITLE_BYTES: usize = 256;

/// A single encyclopedia article.
///
/// Articles are created by the importer and never modified afterwards.
/// `title` doubles as the document id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    /// Plain-text body.
    pub text: String,
    /// Lead paragraph, empty when the source had none.
    pub opening_text: String,
    /// Supplementary text, usually from the infobox.
    pub auxiliary_text: Vec<String>,
    pub categories: Vec<String>,
    /// Table of contents.
    pub headings: Vec<String>,
    /// MediaWiki markup source.
    pub wiki_text: String,
    /// Popularity as reported by the dump. Bigger is more popular.
    pub popularity_score: f64,
    /// Number of links within the encyclopedia pointing at this article.
    pub num_incoming_links: u32,
}

impl Article {
    /// The document id, which for an article is its title.
    pub fn id(&self) -> &str {
        &self.title
    }

    /// Check the invariants a collection relies on before persisting.
    pub fn validate(&self) -> Result<(), CollectionError> {
        if self.title.is_empty() {
            return Err(CollectionError::EmptyTitle);
        }
        if self.title.len() >= MAX_TITLE_BYTES {
            return Err(CollectionError::TitleTooLong {
                title: self.title.clone(),
                len: self.title.len(),
                max: MAX_TITLE_BYTES,
            });
        }
        if !self.popularity_score.is_finite() || self.popularity_score < 0.0 {
            return Err(CollectionError::InvalidPopularity {
                title: self.title.clone(),
                score: self.popularity_score,
            });
        }
        Ok(())
    }
}

/// An alias title resolving to a canonical article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redirect {
    pub src: String,
    pub dst: String,
}

impl Redirect {
    pub fn new(src: impl Into<String>, dst: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            dst: dst.into(),
        }
    }
}

/// Serialize a structured field for storage.
///
/// Non-ASCII characters are written verbatim.
pub fn encode_list(items: &[String]) -> serde_json::Result<String> {
    serde_json::to_string(items)
}

/// Decode a structured field read back from storage.
pub fn decode_list(
    title: &str,
    field: &'static str,
    raw: &str,
) -> Result<Vec<String>, CollectionError> {
    serde_json::from_str(raw).map_err(|source| CollectionError::CorruptField {
        title: title.to_string(),
        field,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str) -> Article {
        Article {
            title: title.to_string(),
            text: String::new(),
            opening_text: String::new(),
            auxiliary_text: vec![],
            categories: vec![],
            headings: vec![],
            wiki_text: String::new(),
            popularity_score: 0.0,
            num_incoming_links: 0,
        }
    }

    #[test]
    fn test_encode_keeps_non_ascii() {
        let encoded = encode_list(&["東京都".to_string(), "首都".to_string()]).unwrap();
        assert_eq!(encoded, r#"["東京都","首都"]"#);
    }

    #[test]
    fn test_decode_preserves_order() {
        let decoded = decode_list("t", "headings", r#"["b","a","c"]"#).unwrap();
        assert_eq!(decoded, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_decode_corrupt_is_error() {
        let err = decode_list("Tokyo", "categories", "[\"unterminated").unwrap_err();
        match err {
            CollectionError::CorruptField { title, field, .. } => {
                assert_eq!(title, "Tokyo");
                assert_eq!(field, "categories");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_title_length() {
        assert!(article(&"a".repeat(255)).validate().is_ok());
        assert!(matches!(
            article(&"a".repeat(256)).validate(),
            Err(CollectionError::TitleTooLong { len: 256, .. })
        ));
        // 86 three-byte characters = 258 bytes
        assert!(article(&"東".repeat(86)).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_and_negative() {
        assert!(matches!(article("").validate(), Err(CollectionError::EmptyTitle)));
        let mut a = article("Osaka");
        a.popularity_score = -1.0;
        assert!(a.validate().is_err());
        a.popularity_score = f64::NAN;
        assert!(a.validate().is_err());
    }
}
