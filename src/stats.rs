//! Database statistics.
//!
//! Provides a quick summary of what's loaded: article count, redirect
//! count, and database size. Used by `wps stats` after an import.

use anyhow::Result;
use wpsearch_core::collection::Collection;

use crate::collection::{count_redirects, WikipediaCollection};
use crate::config::Config;
use crate::db;

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let collection = WikipediaCollection::new(pool);

    let articles = collection.count().await?;
    let redirects = count_redirects(collection.pool()).await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("wpsearch — Database Stats");
    println!("=========================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Articles:    {}", articles);
    println!("  Redirects:   {}", redirects);
    println!();

    collection.pool().close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
