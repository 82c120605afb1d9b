//! Configuration parsing and validation.
//!
//! Site Search is configured via a TOML file (default: `config/sitesearch.toml`).
//!
//! ```toml
//! [db]
//! path = "./data/site.sqlite"
//!
//! [search]
//! page_size = 10
//! wildcard_terms = true
//! highlight = true
//! snippet_tokens = 24
//!
//! [server]
//! bind = "127.0.0.1:7340"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use sitesearch_core::search::SearchOptions;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_true")]
    pub wildcard_terms: bool,
    #[serde(default = "default_true")]
    pub highlight: bool,
    /// Tokens per highlighted excerpt.
    #[serde(default = "default_snippet_tokens")]
    pub snippet_tokens: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            wildcard_terms: true,
            highlight: true,
            snippet_tokens: default_snippet_tokens(),
        }
    }
}

impl SearchConfig {
    pub fn options(&self) -> SearchOptions {
        SearchOptions {
            page_size: self.page_size,
            wildcard_terms: self.wildcard_terms,
            highlight: self.highlight,
        }
    }
}

fn default_page_size() -> usize {
    10
}
fn default_true() -> bool {
    true
}
fn default_snippet_tokens() -> u32 {
    24
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
    "127.0.0.1:7340".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    if config.search.page_size == 0 {
        anyhow::bail!("search.page_size must be >= 1");
    }

    if !(1..=64).contains(&config.search.snippet_tokens) {
        anyhow::bail!("search.snippet_tokens must be in [1, 64]");
    }

    Ok(config)
}
