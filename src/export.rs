//! Export every article as JSON Lines.
//!
//! Walks the collection with a paged scan, so memory stays bounded by one
//! page no matter how large the database is.

use anyhow::Result;
use std::io::{BufWriter, Write};
use std::path::Path;
use wpsearch_core::collection::Collection;

use crate::collection::WikipediaCollection;
use crate::config::Config;
use crate::db;

/// Write every article of `collection` to `out`, one JSON object per line.
///
/// Returns the number of articles written.
pub async fn export_articles<C, W>(collection: &C, out: &mut W) -> Result<u64>
where
    C: Collection,
    W: Write,
{
    let mut scan = collection.scan_all();
    let mut written = 0u64;
    while let Some(article) = scan.next_article().await? {
        serde_json::to_writer(&mut *out, &article)?;
        out.write_all(b"\n")?;
        written += 1;
    }
    out.flush()?;
    Ok(written)
}

/// CLI entry point for `wps export`.
///
/// If `output` is `Some`, writes to that file path. Otherwise writes
/// to stdout for piping.
pub async fn run_export(config: &Config, output: Option<&Path>) -> Result<()> {
    let pool = db::connect(config).await?;
    let collection = WikipediaCollection::new(pool).with_page_size(config.import.scan_page_size);

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut out = BufWriter::new(std::fs::File::create(path)?);
            let count = export_articles(&collection, &mut out).await?;
            eprintln!("Exported {} articles to {}", count, path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            export_articles(&collection, &mut out).await?;
        }
    }

    collection.pool().close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wpsearch_core::collection::memory::InMemoryCollection;
    use wpsearch_core::collection::MutableCollection;
    use wpsearch_core::models::Article;

    #[tokio::test]
    async fn test_export_writes_one_line_per_article() {
        let coll = InMemoryCollection::new().with_page_size(2);
        let batch: Vec<Article> = ["札幌", "仙台", "福岡"]
            .iter()
            .map(|t| Article {
                title: t.to_string(),
                text: String::new(),
                opening_text: String::new(),
                auxiliary_text: vec![],
                categories: vec![],
                headings: vec![],
                wiki_text: String::new(),
                popularity_score: 0.1,
                num_incoming_links: 0,
            })
            .collect();
        coll.insert_documents(&batch).await.unwrap();

        let mut out = Vec::new();
        let count = export_articles(&coll, &mut out).await.unwrap();
        assert_eq!(count, 3);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("\"title\":\"札幌\""));
        let parsed: Article = serde_json::from_str(lines[2]).unwrap();
        assert_eq!(parsed, batch[2]);
    }
}
