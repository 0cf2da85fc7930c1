//! Dump import pipeline.
//!
//! Streams a gzip-compressed paired-record dump, evaluates every pair
//! against the [`ImportPolicy`], and writes accepted articles and their
//! redirect edges into a [`MutableCollection`] in batches. After the last
//! batch, dangling redirects are pruned and the database is compacted.
//!
//! Any structural problem in the dump aborts the import; batches committed
//! before the failure stay in the database.

use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

use wpsearch_core::collection::MutableCollection;
use wpsearch_core::dump::{read_pairs, DumpError, DumpPair, ImportPolicy, ImportStats, Verdict};
use wpsearch_core::models::{Article, Redirect};

use crate::collection::MutableWikipediaCollection;
use crate::config::Config;
use crate::db;
use crate::progress::{ImportProgressEvent, ImportProgressReporter, ProgressMode};

/// Knobs for one import run.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub policy: ImportPolicy,
    /// Accepted articles per committed batch.
    pub batch_size: usize,
    /// Progress total.
    pub expected_pairs: u64,
    /// Run `VACUUM` after pruning.
    pub compact: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            policy: ImportPolicy::default(),
            batch_size: 1000,
            expected_pairs: 0,
            compact: true,
        }
    }
}

/// Open a gzip dump for line-by-line reading.
pub fn open_dump(path: &Path) -> Result<BufReader<MultiGzDecoder<File>>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open dump file: {}", path.display()))?;
    Ok(BufReader::with_capacity(
        1024 * 1024,
        MultiGzDecoder::new(file),
    ))
}

/// Import every pair of a decompressed dump into `collection`.
pub async fn import_dump<C, R>(
    collection: &C,
    reader: R,
    options: &ImportOptions,
    reporter: &dyn ImportProgressReporter,
) -> Result<ImportStats>
where
    C: MutableCollection,
    R: BufRead,
{
    import_pairs(collection, read_pairs(reader), options, reporter).await
}

/// Import an already-paired record stream into `collection`.
pub async fn import_pairs<C, I>(
    collection: &C,
    pairs: I,
    options: &ImportOptions,
    reporter: &dyn ImportProgressReporter,
) -> Result<ImportStats>
where
    C: MutableCollection,
    I: Iterator<Item = Result<DumpPair, DumpError>>,
{
    let batch_size = options.batch_size.max(1);
    let mut stats = ImportStats::default();
    let mut articles: Vec<Article> = Vec::with_capacity(batch_size);
    let mut redirects: Vec<Redirect> = Vec::new();

    for pair in pairs {
        let verdict = options.policy.evaluate(pair?)?;
        stats.record(&verdict);

        if let Verdict::Accept {
            article,
            redirects: aliases,
        } = verdict
        {
            articles.push(article);
            redirects.extend(aliases);
        }

        if articles.len() == batch_size {
            flush(collection, &mut articles, &mut redirects).await?;
            reporter.report(ImportProgressEvent::Reading {
                n: stats.pairs,
                total: options.expected_pairs,
            });
        }
    }

    flush(collection, &mut articles, &mut redirects).await?;
    reporter.report(ImportProgressEvent::Reading {
        n: stats.pairs,
        total: options.expected_pairs,
    });

    reporter.report(ImportProgressEvent::Pruning);
    stats.redirects_pruned = collection.prune_dangling_redirects().await?;
    info!(pruned = stats.redirects_pruned, "pruned dangling redirects");

    if options.compact {
        reporter.report(ImportProgressEvent::Compacting);
        collection.compact().await?;
        info!("compacted database");
    }

    Ok(stats)
}

/// Commit buffered articles, then their redirects, each as one batch.
async fn flush<C: MutableCollection>(
    collection: &C,
    articles: &mut Vec<Article>,
    redirects: &mut Vec<Redirect>,
) -> Result<()> {
    if !articles.is_empty() {
        collection.insert_documents(articles).await?;
    }
    if !redirects.is_empty() {
        collection.insert_redirects(redirects).await?;
    }
    debug!(
        articles = articles.len(),
        redirects = redirects.len(),
        "flushed batch"
    );
    articles.clear();
    redirects.clear();
    Ok(())
}

/// CLI entry point for `wps import`.
pub async fn run_import(
    config: &Config,
    dump_path: &Path,
    expected: Option<u64>,
    progress: ProgressMode,
    no_compact: bool,
) -> Result<()> {
    let pool = db::connect(config).await?;
    let collection = MutableWikipediaCollection::create(pool)
        .await?
        .with_page_size(config.import.scan_page_size);

    let options = ImportOptions {
        policy: config.import.policy(),
        batch_size: config.import.batch_size,
        expected_pairs: expected.unwrap_or(config.import.expected_pairs),
        compact: !no_compact,
    };

    info!(dump = %dump_path.display(), db = %config.db.path.display(), "starting import");
    let reader = open_dump(dump_path)?;
    let reporter = progress.reporter();
    let stats = import_dump(&collection, reader, &options, reporter.as_ref()).await?;

    println!("import {}", dump_path.display());
    println!("  total pairs: {}", stats.pairs);
    println!("  inserted articles: {}", stats.inserted);
    println!("  restricted articles: {}", stats.restricted);
    println!("  unpopular articles: {}", stats.unpopular);
    println!("  redirects inserted: {}", stats.redirects_inserted);
    println!("  dangling redirects pruned: {}", stats.redirects_pruned);
    println!("ok");

    collection.pool().close().await;
    Ok(())
}
