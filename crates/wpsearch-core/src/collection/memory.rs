//! In-memory [`Collection`] implementation for tests.
//!
//! Articles live in insertion order behind a single `RwLock`, so a batch
//! is validated in full before any of it becomes visible.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use crate::error::CollectionError;
use crate::models::{Article, Redirect};

use super::{Collection, MutableCollection, ScanCursor, ScanPage, DEFAULT_PAGE_SIZE};

#[derive(Default)]
struct State {
    articles: Vec<Article>,
    by_title: HashMap<String, usize>,
    redirects: BTreeMap<String, String>,
}

/// In-memory collection, mutable and readable through the same handle.
pub struct InMemoryCollection {
    state: RwLock<State>,
    page_size: usize,
}

impl InMemoryCollection {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Number of redirect edges currently stored.
    pub fn redirect_count(&self) -> usize {
        self.state.read().unwrap().redirects.len()
    }
}

impl Default for InMemoryCollection {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Collection for InMemoryCollection {
    async fn get_by_id(&self, id: &str) -> Result<Option<Article>> {
        let state = self.state.read().unwrap();
        Ok(state
            .by_title
            .get(id)
            .map(|&idx| state.articles[idx].clone()))
    }

    async fn find_by_prefix(&self, query: &str) -> Result<Option<Article>> {
        let state = self.state.read().unwrap();
        Ok(state
            .articles
            .iter()
            .filter(|a| a.title.starts_with(query))
            .min_by(|a, b| a.title.cmp(&b.title))
            .cloned())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.state.read().unwrap().articles.len() as u64)
    }

    async fn scan_page(&self, after: Option<ScanCursor>, limit: usize) -> Result<ScanPage> {
        let state = self.state.read().unwrap();
        // Positions are 1-based: the article at index i has position i + 1.
        let start = after.map(|c| c.0.max(0) as usize).unwrap_or(0);
        let articles: Vec<Article> = state
            .articles
            .iter()
            .skip(start)
            .take(limit)
            .cloned()
            .collect();
        let next = if limit > 0 && articles.len() == limit {
            Some(ScanCursor((start + articles.len()) as i64))
        } else {
            None
        };
        Ok(ScanPage { articles, next })
    }

    async fn resolve_redirect(&self, src: &str) -> Result<Option<String>> {
        Ok(self.state.read().unwrap().redirects.get(src).cloned())
    }

    fn page_size(&self) -> usize {
        self.page_size
    }
}

#[async_trait]
impl MutableCollection for InMemoryCollection {
    async fn insert_documents(&self, batch: &[Article]) -> Result<()> {
        let mut state = self.state.write().unwrap();
        let mut seen = HashSet::new();
        for article in batch {
            article.validate()?;
            if state.by_title.contains_key(&article.title) || !seen.insert(&article.title) {
                return Err(CollectionError::DuplicateTitle(article.title.clone()).into());
            }
        }
        for article in batch {
            let idx = state.articles.len();
            state.by_title.insert(article.title.clone(), idx);
            state.articles.push(article.clone());
        }
        Ok(())
    }

    async fn insert_redirects(&self, batch: &[Redirect]) -> Result<()> {
        let mut state = self.state.write().unwrap();
        let mut seen = HashSet::new();
        for redirect in batch {
            if state.redirects.contains_key(&redirect.src) || !seen.insert(&redirect.src) {
                return Err(CollectionError::DuplicateRedirect(redirect.src.clone()).into());
            }
        }
        for redirect in batch {
            state
                .redirects
                .insert(redirect.src.clone(), redirect.dst.clone());
        }
        Ok(())
    }

    async fn prune_dangling_redirects(&self) -> Result<u64> {
        let mut state = self.state.write().unwrap();
        let State {
            by_title,
            redirects,
            ..
        } = &mut *state;
        let before = redirects.len();
        redirects.retain(|_, dst| by_title.contains_key(dst));
        Ok((before - redirects.len()) as u64)
    }

    async fn compact(&self) -> Result<()> {
        let mut state = self.state.write().unwrap();
        state.articles.shrink_to_fit();
        state.by_title.shrink_to_fit();
        Ok(())
    }
}
