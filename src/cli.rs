//! Command-line interface parsing for valuecache
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! a validated [`StartupConfig`].

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use reqwest::Url;
use thiserror::Error;

use crate::refresh::RefreshConfig;
use crate::store::{is_valid_key, FileStore};

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// The URL is not an absolute http(s) URL
    #[error("Invalid URL: '{0}'. Expected an absolute http:// or https:// URL")]
    InvalidUrl(String),

    /// The key cannot be used as a store key
    #[error("Invalid key: '{0}'. Keys may contain letters, digits, '-', '_' and '.'")]
    InvalidKey(String),

    /// No --cache-dir was given and no default cache directory exists
    #[error("No cache directory available; pass --cache-dir")]
    NoCacheDir,
}

/// valuecache - Cache a JSON document fetched over HTTP
#[derive(Parser, Debug)]
#[command(name = "valuecache")]
#[command(about = "Serve a JSON document from a local cache, fetching it on a miss")]
#[command(version)]
pub struct Cli {
    /// URL of the JSON document
    #[arg(long, value_name = "URL")]
    pub url: String,

    /// Key the document is stored under
    #[arg(long, value_name = "KEY", default_value = "default")]
    pub key: String,

    /// Directory for stored entries (defaults to the user cache directory)
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Treat stored entries older than this many hours as missing
    #[arg(long, value_name = "HOURS")]
    pub ttl_hours: Option<u64>,

    /// Fetch a fresh copy even if one is stored
    #[arg(long)]
    pub refresh: bool,

    /// Keep running and refresh every SECS seconds, printing each new value
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub watch: Option<u64>,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// Document location
    pub url: Url,
    /// Store key
    pub key: String,
    /// Directory for the file store
    pub cache_dir: PathBuf,
    /// Entry lifetime, if limited
    pub ttl_hours: Option<u64>,
    /// Whether to refresh right after initialization
    pub force_refresh: bool,
    /// Background refresh settings when watching
    pub watch: Option<RefreshConfig>,
}

/// Parses and checks the document URL
pub fn parse_url_arg(s: &str) -> Result<Url, CliError> {
    match Url::parse(s) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(url),
        _ => Err(CliError::InvalidUrl(s.to_string())),
    }
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with appropriate settings
    /// * `Err(CliError)` if the URL or key is invalid or no cache directory is available
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let url = parse_url_arg(&cli.url)?;

        if !is_valid_key(&cli.key) {
            return Err(CliError::InvalidKey(cli.key.clone()));
        }

        let cache_dir = match &cli.cache_dir {
            Some(dir) => dir.clone(),
            None => FileStore::default_dir().ok_or(CliError::NoCacheDir)?,
        };

        let watch = cli.watch.map(|secs| RefreshConfig {
            interval: Duration::from_secs(secs),
            enabled: true,
        });

        Ok(StartupConfig {
            url,
            key: cli.key.clone(),
            cache_dir,
            ttl_hours: cli.ttl_hours,
            force_refresh: cli.refresh,
            watch,
        })
    }

    /// Builds the file store described by this configuration
    pub fn file_store(&self) -> FileStore {
        let store = FileStore::with_dir(self.cache_dir.clone());
        match self.ttl_hours {
            Some(hours) => store.with_ttl_hours(hours),
            None => store,
        }
    }
}
