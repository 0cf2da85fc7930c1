//! Collection abstraction for wpsearch.
//!
//! The [`Collection`] trait is the read API the query surface consumes;
//! [`MutableCollection`] adds the load-time operations the importer uses.
//! Backends: SQLite (in the `wpsearch` package) and [`memory::InMemoryCollection`]
//! for tests.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.
//!
//! # Operations
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`get_by_id`](Collection::get_by_id) | Exact title lookup |
//! | [`find_by_prefix`](Collection::find_by_prefix) | Smallest title starting with a prefix |
//! | [`count`](Collection::count) | Number of articles |
//! | [`scan_all`](Collection::scan_all) | Lazy, paged scan over every article |
//! | [`resolve_redirect`](Collection::resolve_redirect) | Redirect destination for an alias |
//! | [`insert_documents`](MutableCollection::insert_documents) | Atomic batch of articles |
//! | [`insert_redirects`](MutableCollection::insert_redirects) | Atomic batch of redirect edges |
//! | [`prune_dangling_redirects`](MutableCollection::prune_dangling_redirects) | Drop redirects without a destination |
//! | [`compact`](MutableCollection::compact) | Reclaim storage space |

pub mod memory;

use std::collections::VecDeque;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Article, Redirect};

/// Rows fetched per page by [`ArticleScan`].
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Storage position of the last article of a page.
///
/// Positions are backend-defined, strictly increasing in storage order and
/// start above zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScanCursor(pub i64);

/// One page of a full scan.
#[derive(Debug, Clone)]
pub struct ScanPage {
    pub articles: Vec<Article>,
    /// `None` once the scan has reached the end of the collection.
    pub next: Option<ScanCursor>,
}

/// Read API over a set of articles and their redirects.
#[async_trait]
pub trait Collection: Send + Sync {
    /// Article with exactly this title.
    async fn get_by_id(&self, id: &str) -> Result<Option<Article>>;

    /// Article whose title starts with `query`.
    ///
    /// When several titles match, the lexicographically smallest one wins.
    async fn find_by_prefix(&self, query: &str) -> Result<Option<Article>>;

    /// Total number of articles.
    async fn count(&self) -> Result<u64>;

    /// Up to `limit` articles stored after `after`, in storage order.
    ///
    /// `next` is set only when the page came back full.
    async fn scan_page(&self, after: Option<ScanCursor>, limit: usize) -> Result<ScanPage>;

    /// Destination title of the redirect whose source is `src`.
    async fn resolve_redirect(&self, src: &str) -> Result<Option<String>>;

    /// Page size used by [`scan_all`](Collection::scan_all).
    fn page_size(&self) -> usize {
        DEFAULT_PAGE_SIZE
    }

    /// Lazily iterate every article, one page at a time.
    ///
    /// Each call starts a fresh scan from the beginning.
    fn scan_all(&self) -> ArticleScan<'_, Self>
    where
        Self: Sized,
    {
        ArticleScan::new(self, self.page_size())
    }
}

/// Load-time API used by the importer.
///
/// Each insert call is one atomic unit: either the whole batch is durable
/// or none of it is.
#[async_trait]
pub trait MutableCollection: Collection {
    /// Append a batch of articles. A title already present fails the batch.
    async fn insert_documents(&self, batch: &[Article]) -> Result<()>;

    /// Append a batch of redirect edges. Destinations are not checked here.
    async fn insert_redirects(&self, batch: &[Redirect]) -> Result<()>;

    /// Delete every redirect whose destination has no article.
    ///
    /// Returns the number of redirects removed.
    async fn prune_dangling_redirects(&self) -> Result<u64>;

    /// Reclaim space left by bulk writes and pruning.
    async fn compact(&self) -> Result<()>;
}

/// Paged, restartable scan over a collection.
///
/// Holds at most one page of articles in memory.
pub struct ArticleScan<'a, C: ?Sized> {
    collection: &'a C,
    page_size: usize,
    cursor: Option<ScanCursor>,
    buffer: VecDeque<Article>,
    exhausted: bool,
}

impl<'a, C: Collection + ?Sized> ArticleScan<'a, C> {
    pub fn new(collection: &'a C, page_size: usize) -> Self {
        Self {
            collection,
            page_size: page_size.max(1),
            cursor: None,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    /// Next article in storage order, or `None` at the end of the scan.
    pub async fn next_article(&mut self) -> Result<Option<Article>> {
        loop {
            if let Some(article) = self.buffer.pop_front() {
                return Ok(Some(article));
            }
            if self.exhausted {
                return Ok(None);
            }
            let page = self
                .collection
                .scan_page(self.cursor, self.page_size)
                .await?;
            self.exhausted = page.next.is_none();
            self.cursor = page.next;
            self.buffer.extend(page.articles);
        }
    }

    /// Drain the scan, keeping only titles.
    pub async fn titles(mut self) -> Result<Vec<String>> {
        let mut titles = Vec::new();
        while let Some(article) = self.next_article().await? {
            titles.push(article.title);
        }
        Ok(titles)
    }
}
