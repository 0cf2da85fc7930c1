//! Article retrieval for the CLI.
//!
//! `wps get`, `wps find`, and `wps redirect` open a read-only
//! [`WikipediaCollection`], look a title up, and print it. A missing
//! title exits with status 1.

use anyhow::Result;
use wpsearch_core::collection::Collection;
use wpsearch_core::models::Article;

use crate::collection::WikipediaCollection;
use crate::config::Config;
use crate::db;

/// Which part of an article `wps get` prints.
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ArticleField {
    /// Metadata, opening text, and structured fields.
    All,
    /// Plain-text body only.
    Text,
    /// Wiki markup only.
    #[value(name = "wiki_text")]
    WikiText,
}

async fn open(config: &Config) -> Result<WikipediaCollection> {
    let pool = db::connect(config).await?;
    Ok(WikipediaCollection::new(pool))
}

/// CLI entry point for `wps get`.
pub async fn run_get(config: &Config, title: &str, field: ArticleField) -> Result<()> {
    let collection = open(config).await?;
    let article = collection.get_by_id(title).await?;
    collection.pool().close().await;

    match article {
        Some(article) => {
            print_article(&article, field);
            Ok(())
        }
        None => {
            eprintln!("Error: article not found: {}", title);
            std::process::exit(1);
        }
    }
}

/// CLI entry point for `wps find`.
pub async fn run_find(config: &Config, prefix: &str) -> Result<()> {
    let collection = open(config).await?;
    let article = collection.find_by_prefix(prefix).await?;
    collection.pool().close().await;

    match article {
        Some(article) => {
            print_article(&article, ArticleField::All);
            Ok(())
        }
        None => {
            eprintln!("Error: no article title starts with: {}", prefix);
            std::process::exit(1);
        }
    }
}

/// CLI entry point for `wps redirect`.
pub async fn run_redirect(config: &Config, title: &str) -> Result<()> {
    let collection = open(config).await?;
    let dst = collection.resolve_redirect(title).await?;
    collection.pool().close().await;

    match dst {
        Some(dst) => {
            println!("{} -> {}", title, dst);
            Ok(())
        }
        None => {
            eprintln!("Error: redirect not found: {}", title);
            std::process::exit(1);
        }
    }
}

fn print_article(article: &Article, field: ArticleField) {
    match field {
        ArticleField::Text => println!("{}", article.text),
        ArticleField::WikiText => println!("{}", article.wiki_text),
        ArticleField::All => {
            println!("--- Article ---");
            println!("title:              {}", article.title);
            println!("popularity_score:   {}", article.popularity_score);
            println!("num_incoming_links: {}", article.num_incoming_links);
            println!("categories:         {}", article.categories.join(", "));
            println!();

            println!("--- Opening text ---");
            println!("{}", article.opening_text);
            println!();

            println!("--- Headings ({}) ---", article.headings.len());
            for heading in &article.headings {
                println!("  {}", heading);
            }
            println!();

            println!("--- Auxiliary text ({}) ---", article.auxiliary_text.len());
            for aux in &article.auxiliary_text {
                println!("  {}", aux);
            }
        }
    }
}
