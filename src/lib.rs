//! # wpsearch
//!
//! Imports an encyclopedia dump into SQLite and serves individual articles
//! over a small HTTP API.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌──────────────────┐
//! │ gzip dump   │──▶│  Importer   │──▶│      SQLite      │
//! │ meta+page   │   │ filter+batch│   │ articles/redirects│
//! └─────────────┘   └─────────────┘   └────────┬─────────┘
//!                                              │
//!                      ┌───────────────────────┤
//!                      ▼                       ▼
//!                 ┌──────────┐           ┌──────────┐
//!                 │   CLI    │           │   HTTP   │
//!                 │  (wps)   │           │ (axum)   │
//!                 └──────────┘           └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! wps init
//! wps import jawiki-cirrussearch-content.json.gz
//! wps get 東京都
//! wps serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |
//! | [`collection`] | SQLite-backed collections |
//! | [`import`] | Dump import pipeline |
//! | [`progress`] | Import progress reporting |
//! | [`get`] | CLI lookups |
//! | [`stats`] | Database statistics |
//! | [`export`] | JSON Lines export |
//! | [`server`] | HTTP server |

pub mod collection;
pub mod config;
pub mod db;
pub mod export;
pub mod get;
pub mod import;
pub mod migrate;
pub mod progress;
pub mod server;
pub mod stats;
