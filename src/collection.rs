//! SQLite-backed [`Collection`] implementations.
//!
//! [`WikipediaCollection`] is the read-only handle used at serve time and
//! caches the article count after the first query.
//! [`MutableWikipediaCollection`] is the load-time handle: it creates the
//! schema, commits each insert batch in its own transaction, and always
//! counts from the table since the count changes mid-load.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tokio::sync::OnceCell;
use tracing::debug;

use wpsearch_core::collection::{
    Collection, MutableCollection, ScanCursor, ScanPage, DEFAULT_PAGE_SIZE,
};
use wpsearch_core::models::{decode_list, encode_list, Article, Redirect};

use crate::migrate;

const ARTICLE_COLUMNS: &str = "title, text, opening_text, auxiliary_text, categories, headings, \
     wiki_text, popularity_score, num_incoming_links";

fn article_from_row(row: &SqliteRow) -> Result<Article> {
    let title: String = row.try_get("title")?;
    let auxiliary_text: String = row.try_get("auxiliary_text")?;
    let categories: String = row.try_get("categories")?;
    let headings: String = row.try_get("headings")?;

    Ok(Article {
        auxiliary_text: decode_list(&title, "auxiliary_text", &auxiliary_text)?,
        categories: decode_list(&title, "categories", &categories)?,
        headings: decode_list(&title, "headings", &headings)?,
        text: row.try_get("text")?,
        opening_text: row.try_get("opening_text")?,
        wiki_text: row.try_get("wiki_text")?,
        popularity_score: row.try_get("popularity_score")?,
        num_incoming_links: row.try_get("num_incoming_links")?,
        title,
    })
}

async fn fetch_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Article>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM articles WHERE title = ?",
        ARTICLE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(article_from_row).transpose()
}

/// The smallest title `>= query` is the smallest title starting with
/// `query`, if any title does. This walks the primary key index and treats
/// `%` and `_` literally, unlike `LIKE`.
async fn fetch_by_prefix(pool: &SqlitePool, query: &str) -> Result<Option<Article>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM articles WHERE title >= ? ORDER BY title LIMIT 1",
        ARTICLE_COLUMNS
    ))
    .bind(query)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let article = article_from_row(&row)?;
            Ok(article.title.starts_with(query).then_some(article))
        }
        None => Ok(None),
    }
}

async fn count_articles(pool: &SqlitePool) -> Result<u64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles")
        .fetch_one(pool)
        .await?;
    Ok(count as u64)
}

/// Keyset pagination over rowid, so each page is an index range scan.
async fn fetch_page(pool: &SqlitePool, after: Option<ScanCursor>, limit: usize) -> Result<ScanPage> {
    let rows = sqlx::query(&format!(
        "SELECT rowid AS pos, {} FROM articles WHERE rowid > ? ORDER BY rowid LIMIT ?",
        ARTICLE_COLUMNS
    ))
    .bind(after.map(|c| c.0).unwrap_or(0))
    .bind(limit as i64)
    .fetch_all(pool)
    .await?;

    let mut last = None;
    let mut articles = Vec::with_capacity(rows.len());
    for row in &rows {
        last = Some(ScanCursor(row.try_get("pos")?));
        articles.push(article_from_row(row)?);
    }

    let next = if limit > 0 && articles.len() == limit {
        last
    } else {
        None
    };
    Ok(ScanPage { articles, next })
}

async fn fetch_redirect(pool: &SqlitePool, src: &str) -> Result<Option<String>> {
    let dst: Option<String> = sqlx::query_scalar("SELECT dst FROM redirects WHERE src = ?")
        .bind(src)
        .fetch_optional(pool)
        .await?;
    Ok(dst)
}

/// Number of redirect edges stored.
pub async fn count_redirects(pool: &SqlitePool) -> Result<u64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM redirects")
        .fetch_one(pool)
        .await?;
    Ok(count as u64)
}

/// Read-only collection handle.
pub struct WikipediaCollection {
    pool: SqlitePool,
    page_size: usize,
    cached_count: OnceCell<u64>,
}

impl WikipediaCollection {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            page_size: DEFAULT_PAGE_SIZE,
            cached_count: OnceCell::new(),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl Collection for WikipediaCollection {
    async fn get_by_id(&self, id: &str) -> Result<Option<Article>> {
        fetch_by_id(&self.pool, id).await
    }

    async fn find_by_prefix(&self, query: &str) -> Result<Option<Article>> {
        fetch_by_prefix(&self.pool, query).await
    }

    async fn count(&self) -> Result<u64> {
        let count = self
            .cached_count
            .get_or_try_init(|| count_articles(&self.pool))
            .await?;
        Ok(*count)
    }

    async fn scan_page(&self, after: Option<ScanCursor>, limit: usize) -> Result<ScanPage> {
        fetch_page(&self.pool, after, limit).await
    }

    async fn resolve_redirect(&self, src: &str) -> Result<Option<String>> {
        fetch_redirect(&self.pool, src).await
    }

    fn page_size(&self) -> usize {
        self.page_size
    }
}

/// Load-time collection handle.
///
/// Assumes exclusive write access to the database for its lifetime.
pub struct MutableWikipediaCollection {
    pool: SqlitePool,
    page_size: usize,
}

impl MutableWikipediaCollection {
    /// Wrap a pool, creating the schema if needed.
    pub async fn create(pool: SqlitePool) -> Result<Self> {
        migrate::create_schema(&pool).await?;
        Ok(Self {
            pool,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl Collection for MutableWikipediaCollection {
    async fn get_by_id(&self, id: &str) -> Result<Option<Article>> {
        fetch_by_id(&self.pool, id).await
    }

    async fn find_by_prefix(&self, query: &str) -> Result<Option<Article>> {
        fetch_by_prefix(&self.pool, query).await
    }

    async fn count(&self) -> Result<u64> {
        count_articles(&self.pool).await
    }

    async fn scan_page(&self, after: Option<ScanCursor>, limit: usize) -> Result<ScanPage> {
        fetch_page(&self.pool, after, limit).await
    }

    async fn resolve_redirect(&self, src: &str) -> Result<Option<String>> {
        fetch_redirect(&self.pool, src).await
    }

    fn page_size(&self) -> usize {
        self.page_size
    }
}

#[async_trait]
impl MutableCollection for MutableWikipediaCollection {
    async fn insert_documents(&self, batch: &[Article]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for article in batch {
            article.validate()?;
            sqlx::query(
                r#"
                INSERT INTO articles (title, text, opening_text, auxiliary_text, categories,
                                      headings, wiki_text, popularity_score, num_incoming_links)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&article.title)
            .bind(&article.text)
            .bind(&article.opening_text)
            .bind(encode_list(&article.auxiliary_text)?)
            .bind(encode_list(&article.categories)?)
            .bind(encode_list(&article.headings)?)
            .bind(&article.wiki_text)
            .bind(article.popularity_score)
            .bind(article.num_incoming_links)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to insert article '{}'", article.title))?;
        }

        tx.commit().await?;
        debug!(articles = batch.len(), "committed article batch");
        Ok(())
    }

    async fn insert_redirects(&self, batch: &[Redirect]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for redirect in batch {
            sqlx::query("INSERT INTO redirects (src, dst) VALUES (?, ?)")
                .bind(&redirect.src)
                .bind(&redirect.dst)
                .execute(&mut *tx)
                .await
                .with_context(|| {
                    format!(
                        "failed to insert redirect '{}' -> '{}'",
                        redirect.src, redirect.dst
                    )
                })?;
        }

        tx.commit().await?;
        debug!(redirects = batch.len(), "committed redirect batch");
        Ok(())
    }

    async fn prune_dangling_redirects(&self) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM redirects
            WHERE NOT EXISTS (SELECT 1 FROM articles WHERE articles.title = redirects.dst)
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn compact(&self) -> Result<()> {
        // VACUUM cannot run inside a transaction; a bare pool execute is
        // in autocommit mode.
        sqlx::query("VACUUM").execute(&self.pool).await?;
        Ok(())
    }
}
