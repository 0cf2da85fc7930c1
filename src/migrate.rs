//! Schema creation.
//!
//! Two tables: `articles` keyed by title, and `redirects` mapping an alias
//! title to a canonical one. Redirect destinations are not a foreign key;
//! dangling edges are removed after a load by
//! `prune_dangling_redirects`.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    create_schema(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create both tables if they don't exist yet. Idempotent.
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS articles (
            title TEXT PRIMARY KEY,
            text TEXT NOT NULL,
            opening_text TEXT NOT NULL,
            auxiliary_text TEXT NOT NULL,
            categories TEXT NOT NULL,
            headings TEXT NOT NULL,
            wiki_text TEXT NOT NULL,
            popularity_score REAL NOT NULL,
            num_incoming_links INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS redirects (
            src TEXT PRIMARY KEY,
            dst TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
