//! TOML configuration.
//!
//! ```toml
//! [db]
//! path = "./data/wp.db"
//!
//! [import]
//! batch_size = 1000
//! min_popularity = 2e-6
//! restricted_template = "Template:性的"
//! expected_pairs = 1097153
//!
//! [server]
//! bind = "0.0.0.0:8081"
//! ```
//!
//! Only `[db]` is required. `WPSEARCH_PORT` overrides the port in
//! `server.bind`.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use wpsearch_core::collection::DEFAULT_PAGE_SIZE;
use wpsearch_core::dump::{ImportPolicy, MIN_POPULARITY, RESTRICTED_TEMPLATE};

/// Environment variable overriding the server port.
pub const PORT_ENV: &str = "WPSEARCH_PORT";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImportConfig {
    /// Accepted articles per committed batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_min_popularity")]
    pub min_popularity: f64,
    #[serde(default = "default_restricted_template")]
    pub restricted_template: String,
    /// Pair count used as the progress total.
    #[serde(default = "default_expected_pairs")]
    pub expected_pairs: u64,
    /// Rows per page when scanning the collection.
    #[serde(default = "default_scan_page_size")]
    pub scan_page_size: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            min_popularity: default_min_popularity(),
            restricted_template: default_restricted_template(),
            expected_pairs: default_expected_pairs(),
            scan_page_size: default_scan_page_size(),
        }
    }
}

fn default_batch_size() -> usize {
    1000
}
fn default_min_popularity() -> f64 {
    MIN_POPULARITY
}
fn default_restricted_template() -> String {
    RESTRICTED_TEMPLATE.to_string()
}
fn default_expected_pairs() -> u64 {
    1_097_153
}
fn default_scan_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl ImportConfig {
    pub fn policy(&self) -> ImportPolicy {
        ImportPolicy {
            restricted_template: self.restricted_template.clone(),
            min_popularity: self.min_popularity,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8081".to_string()
}

impl ServerConfig {
    /// Bind address with the `WPSEARCH_PORT` override applied.
    pub fn bind_addr(&self) -> Result<String> {
        apply_port_override(&self.bind, std::env::var(PORT_ENV).ok().as_deref())
    }
}

fn apply_port_override(bind: &str, port: Option<&str>) -> Result<String> {
    let Some(port) = port else {
        return Ok(bind.to_string());
    };
    let port: u16 = port
        .trim()
        .parse()
        .with_context(|| format!("{} must be a port number, got '{}'", PORT_ENV, port))?;
    let host = match bind.rsplit_once(':') {
        Some((host, _)) => host,
        None => bind,
    };
    Ok(format!("{}:{}", host, port))
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.db.max_connections == 0 {
        bail!("db.max_connections must be > 0");
    }

    if config.import.batch_size == 0 {
        bail!("import.batch_size must be > 0");
    }

    if config.import.scan_page_size == 0 {
        bail!("import.scan_page_size must be > 0");
    }

    if !config.import.min_popularity.is_finite() || config.import.min_popularity < 0.0 {
        bail!("import.min_popularity must be a non-negative number");
    }

    Ok(config)
}
