//! Encyclopedia dump records.
//!
//! A dump is newline-delimited JSON where every content record is preceded
//! by an index-metadata record:
//!
//! ```text
//! {"index":{"_type":"page","_id":"123"}}
//! {"title":"Tokyo","namespace":0,"text":"...","source_text":"...","incoming_links":42,...}
//! ```
//!
//! [`read_pairs`] turns a byte stream into [`DumpPair`]s, and
//! [`ImportPolicy::evaluate`] validates, filters, and transforms each pair
//! into an [`Article`] plus its redirect edges. Structural problems are
//! fatal [`DumpError`]s; policy filtering is a [`Verdict`].

use std::io::BufRead;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::models::{Article, Redirect};

/// Template marking restricted (adult) content.
pub const RESTRICTED_TEMPLATE: &str = "Template:性的";

/// Articles below this popularity are not imported.
pub const MIN_POPULARITY: f64 = 2e-6;

/// The main/article namespace.
pub const MAIN_NAMESPACE: i64 = 0;

/// The only index-metadata type accepted.
pub const PAGE_TYPE: &str = "page";

/// Fatal problems with the dump itself.
#[derive(Debug, Error)]
pub enum DumpError {
    #[error("failed to read dump: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: invalid JSON: {source}")]
    Json {
        line: u64,
        #[source]
        source: serde_json::Error,
    },

    #[error("dump ends with an unpaired record at line {line}")]
    UnpairedRecord { line: u64 },

    #[error("pair {pair}: expected index type 'page', found {found:?}")]
    UnexpectedType { pair: u64, found: Option<String> },

    #[error("pair {pair}: '{title}' is in namespace {namespace}, expected 0")]
    UnexpectedNamespace {
        pair: u64,
        title: String,
        namespace: i64,
    },

    #[error("pair {pair}: missing required field '{field}'")]
    MissingField { pair: u64, field: &'static str },
}

/// Index-metadata record.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexMeta {
    pub index: IndexAction,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndexAction {
    #[serde(rename = "_type")]
    pub doc_type: Option<String>,
}

/// Content record. Every field is optional at this level; which ones are
/// required is decided by [`ImportPolicy::evaluate`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageRecord {
    pub title: Option<String>,
    pub namespace: Option<i64>,
    pub template: Option<Vec<String>>,
    pub popularity_score: Option<f64>,
    pub text: Option<String>,
    pub opening_text: Option<String>,
    pub auxiliary_text: Option<Vec<String>>,
    pub category: Option<Vec<String>>,
    pub heading: Option<Vec<String>>,
    pub source_text: Option<String>,
    pub incoming_links: Option<u32>,
    pub redirect: Option<Vec<RedirectEntry>>,
}

/// An alias listed in a content record's `redirect` field.
#[derive(Debug, Clone, Deserialize)]
pub struct RedirectEntry {
    pub title: String,
    pub namespace: i64,
}

/// One logical dump entity: metadata followed by content.
#[derive(Debug, Clone)]
pub struct DumpPair {
    /// 1-based pair number within the dump.
    pub number: u64,
    pub meta: IndexMeta,
    pub page: PageRecord,
}

/// Non-blank lines of a dump, numbered from 1.
pub struct DumpLines<R> {
    reader: R,
    line: u64,
}

impl<R: BufRead> DumpLines<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, line: 0 }
    }
}

impl<R: BufRead> Iterator for DumpLines<R> {
    type Item = Result<(u64, String), DumpError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let mut buf = String::new();
            match self.reader.read_line(&mut buf) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line += 1;
                    if buf.trim().is_empty() {
                        continue;
                    }
                    return Some(Ok((self.line, buf)));
                }
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}

/// Groups a record stream two at a time.
///
/// Ends cleanly when the stream ends on a pair boundary and yields
/// [`DumpError::UnpairedRecord`] when a record is left over.
pub struct RecordPairs<I> {
    inner: I,
    done: bool,
}

impl<I> RecordPairs<I> {
    pub fn new(inner: I) -> Self {
        Self { inner, done: false }
    }
}

impl<I> Iterator for RecordPairs<I>
where
    I: Iterator<Item = Result<(u64, String), DumpError>>,
{
    type Item = Result<((u64, String), (u64, String)), DumpError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let first = match self.inner.next() {
            None => {
                self.done = true;
                return None;
            }
            Some(Err(e)) => {
                self.done = true;
                return Some(Err(e));
            }
            Some(Ok(record)) => record,
        };
        match self.inner.next() {
            Some(Ok(second)) => Some(Ok((first, second))),
            Some(Err(e)) => {
                self.done = true;
                Some(Err(e))
            }
            None => {
                self.done = true;
                Some(Err(DumpError::UnpairedRecord { line: first.0 }))
            }
        }
    }
}

fn parse_record<T: DeserializeOwned>((line, raw): (u64, String)) -> Result<T, DumpError> {
    serde_json::from_str(&raw).map_err(|source| DumpError::Json { line, source })
}

/// Read a decompressed dump as a stream of [`DumpPair`]s.
pub fn read_pairs<R: BufRead>(reader: R) -> impl Iterator<Item = Result<DumpPair, DumpError>> {
    RecordPairs::new(DumpLines::new(reader))
        .zip(1u64..)
        .map(|(pair, number)| -> Result<DumpPair, DumpError> {
            let (meta, page) = pair?;
            Ok(DumpPair {
                number,
                meta: parse_record(meta)?,
                page: parse_record(page)?,
            })
        })
}

/// Outcome of evaluating one pair.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Accept {
        article: Article,
        redirects: Vec<Redirect>,
    },
    /// Carries the restricted-content marker template.
    Restricted,
    /// Popularity below the threshold.
    Unpopular,
}

/// Filtering and transformation rules applied to every pair.
#[derive(Debug, Clone)]
pub struct ImportPolicy {
    pub restricted_template: String,
    pub min_popularity: f64,
}

impl Default for ImportPolicy {
    fn default() -> Self {
        Self {
            restricted_template: RESTRICTED_TEMPLATE.to_string(),
            min_popularity: MIN_POPULARITY,
        }
    }
}

impl ImportPolicy {
    /// Validate a pair, then either filter it out or build its article.
    pub fn evaluate(&self, pair: DumpPair) -> Result<Verdict, DumpError> {
        let DumpPair {
            number,
            meta,
            page,
        } = pair;

        if meta.index.doc_type.as_deref() != Some(PAGE_TYPE) {
            return Err(DumpError::UnexpectedType {
                pair: number,
                found: meta.index.doc_type,
            });
        }
        let namespace = page.namespace.ok_or(DumpError::MissingField {
            pair: number,
            field: "namespace",
        })?;
        if namespace != MAIN_NAMESPACE {
            return Err(DumpError::UnexpectedNamespace {
                pair: number,
                title: page.title.unwrap_or_default(),
                namespace,
            });
        }

        if page
            .template
            .as_ref()
            .is_some_and(|t| t.iter().any(|name| *name == self.restricted_template))
        {
            return Ok(Verdict::Restricted);
        }
        let popularity_score = page.popularity_score.unwrap_or(0.0);
        if popularity_score < self.min_popularity {
            return Ok(Verdict::Unpopular);
        }

        let required = |value: Option<String>, field: &'static str| {
            value.ok_or(DumpError::MissingField {
                pair: number,
                field,
            })
        };
        let title = required(page.title, "title")?;
        let text = required(page.text, "text")?;
        let wiki_text = required(page.source_text, "source_text")?;
        let num_incoming_links = page.incoming_links.ok_or(DumpError::MissingField {
            pair: number,
            field: "incoming_links",
        })?;

        let redirects = page
            .redirect
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.namespace == MAIN_NAMESPACE)
            .map(|r| Redirect::new(r.title, title.clone()))
            .collect();

        Ok(Verdict::Accept {
            article: Article {
                title,
                text,
                opening_text: page.opening_text.unwrap_or_default(),
                auxiliary_text: page.auxiliary_text.unwrap_or_default(),
                categories: page.category.unwrap_or_default(),
                headings: page.heading.unwrap_or_default(),
                wiki_text,
                popularity_score,
                num_incoming_links,
            },
            redirects,
        })
    }
}

/// Running tallies of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportStats {
    /// Pairs read from the dump.
    pub pairs: u64,
    pub inserted: u64,
    pub restricted: u64,
    pub unpopular: u64,
    pub redirects_inserted: u64,
    pub redirects_pruned: u64,
}

impl ImportStats {
    /// Count one evaluated pair.
    pub fn record(&mut self, verdict: &Verdict) {
        self.pairs += 1;
        match verdict {
            Verdict::Accept { redirects, .. } => {
                self.inserted += 1;
                self.redirects_inserted += redirects.len() as u64;
            }
            Verdict::Restricted => self.restricted += 1,
            Verdict::Unpopular => self.unpopular += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const META: &str = r#"{"index":{"_type":"page","_id":"1"}}"#;

    fn page_line(title: &str, popularity: f64) -> String {
        serde_json::json!({
            "title": title,
            "namespace": 0,
            "template": ["Template:Infobox"],
            "popularity_score": popularity,
            "text": format!("{title} is a city."),
            "opening_text": null,
            "auxiliary_text": ["人口 1400万"],
            "category": ["Cities", "Capitals"],
            "heading": ["History", "Geography"],
            "source_text": format!("'''{title}''' is a city."),
            "incoming_links": 12,
            "redirect": [
                {"title": "Edo", "namespace": 0},
                {"title": "Talk:Edo", "namespace": 1}
            ]
        })
        .to_string()
    }

    fn pairs(input: &str) -> Vec<Result<DumpPair, DumpError>> {
        read_pairs(input.as_bytes()).collect()
    }

    fn single_pair(input: &str) -> DumpPair {
        let mut all = pairs(input);
        assert_eq!(all.len(), 1);
        all.remove(0).unwrap()
    }

    #[test]
    fn test_reads_pairs_and_skips_blank_lines() {
        let input = format!(
            "{META}\n{}\n\n{META}\n{}\n",
            page_line("Tokyo", 0.01),
            page_line("Osaka", 0.02)
        );
        let all: Vec<DumpPair> = pairs(&input).into_iter().map(Result::unwrap).collect();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].number, 1);
        assert_eq!(all[1].number, 2);
        assert_eq!(all[1].page.title.as_deref(), Some("Osaka"));
    }

    #[test]
    fn test_empty_stream_has_no_pairs() {
        assert!(pairs("").is_empty());
    }

    #[test]
    fn test_unpaired_trailing_record_is_fatal() {
        let input = format!("{META}\n{}\n{META}\n", page_line("Tokyo", 0.01));
        let all = pairs(&input);
        assert_eq!(all.len(), 2);
        assert!(all[0].is_ok());
        assert!(matches!(all[1], Err(DumpError::UnpairedRecord { line: 3 })));
    }

    #[test]
    fn test_invalid_json_is_fatal() {
        let all = pairs(&format!("{META}\n{{not json\n"));
        assert!(matches!(all[0], Err(DumpError::Json { line: 2, .. })));
    }

    #[test]
    fn test_accepts_and_transforms() {
        let pair = single_pair(&format!("{META}\n{}\n", page_line("Tokyo", 0.01)));
        let verdict = ImportPolicy::default().evaluate(pair).unwrap();
        let Verdict::Accept { article, redirects } = verdict else {
            panic!("expected accept");
        };
        assert_eq!(article.title, "Tokyo");
        assert_eq!(article.text, "Tokyo is a city.");
        assert_eq!(article.wiki_text, "'''Tokyo''' is a city.");
        assert_eq!(article.opening_text, "");
        assert_eq!(article.auxiliary_text, vec!["人口 1400万"]);
        assert_eq!(article.categories, vec!["Cities", "Capitals"]);
        assert_eq!(article.headings, vec!["History", "Geography"]);
        assert_eq!(article.num_incoming_links, 12);
        assert_eq!(redirects, vec![Redirect::new("Edo", "Tokyo")]);
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let page = r#"{"title":"A","namespace":0,"text":"t","source_text":"s","incoming_links":0,"popularity_score":1.0}"#;
        let pair = single_pair(&format!("{META}\n{page}\n"));
        let Verdict::Accept { article, redirects } = ImportPolicy::default().evaluate(pair).unwrap()
        else {
            panic!("expected accept");
        };
        assert!(article.auxiliary_text.is_empty());
        assert!(article.categories.is_empty());
        assert!(article.headings.is_empty());
        assert!(redirects.is_empty());
    }

    #[test]
    fn test_unpopular_is_filtered() {
        let pair = single_pair(&format!("{META}\n{}\n", page_line("Obscure", 0.0000001)));
        assert_eq!(
            ImportPolicy::default().evaluate(pair).unwrap(),
            Verdict::Unpopular
        );

        let page = r#"{"title":"NoScore","namespace":0,"text":"t","source_text":"s","incoming_links":0}"#;
        let pair = single_pair(&format!("{META}\n{page}\n"));
        assert_eq!(
            ImportPolicy::default().evaluate(pair).unwrap(),
            Verdict::Unpopular
        );
    }

    #[test]
    fn test_restricted_wins_over_popularity() {
        let page = serde_json::json!({
            "title": "B",
            "namespace": 0,
            "template": ["Template:性的"],
            "popularity_score": 0.5,
        });
        let pair = single_pair(&format!("{META}\n{page}\n"));
        assert_eq!(
            ImportPolicy::default().evaluate(pair).unwrap(),
            Verdict::Restricted
        );
    }

    #[test]
    fn test_wrong_type_is_fatal() {
        let meta = r#"{"index":{"_type":"file"}}"#;
        let pair = single_pair(&format!("{meta}\n{}\n", page_line("Tokyo", 0.01)));
        assert!(matches!(
            ImportPolicy::default().evaluate(pair),
            Err(DumpError::UnexpectedType { pair: 1, .. })
        ));
    }

    #[test]
    fn test_wrong_namespace_is_fatal() {
        let page = r#"{"title":"Talk:Tokyo","namespace":1,"popularity_score":1.0}"#;
        let pair = single_pair(&format!("{META}\n{page}\n"));
        assert!(matches!(
            ImportPolicy::default().evaluate(pair),
            Err(DumpError::UnexpectedNamespace { namespace: 1, .. })
        ));
    }

    #[test]
    fn test_missing_incoming_links_is_fatal() {
        let page = r#"{"title":"A","namespace":0,"text":"t","source_text":"s","popularity_score":1.0}"#;
        let pair = single_pair(&format!("{META}\n{page}\n"));
        assert!(matches!(
            ImportPolicy::default().evaluate(pair),
            Err(DumpError::MissingField {
                field: "incoming_links",
                ..
            })
        ));
    }

    #[test]
    fn test_stats_record() {
        let mut stats = ImportStats::default();
        stats.record(&Verdict::Restricted);
        stats.record(&Verdict::Unpopular);
        stats.record(&Verdict::Accept {
            article: Article {
                title: "A".to_string(),
                text: String::new(),
                opening_text: String::new(),
                auxiliary_text: vec![],
                categories: vec![],
                headings: vec![],
                wiki_text: String::new(),
                popularity_score: 1.0,
                num_incoming_links: 0,
            },
            redirects: vec![Redirect::new("B", "A"), Redirect::new("C", "A")],
        });
        assert_eq!(
            stats,
            ImportStats {
                pairs: 3,
                inserted: 1,
                restricted: 1,
                unpopular: 1,
                redirects_inserted: 2,
                redirects_pruned: 0,
            }
        );
    }
}
