//! Jobtrawl: a focused job-listing crawler
//!
//! This crate walks the paginated search results of a job-listing site, follows every
//! job-detail link it finds, and extracts a normalized [`JobRecord`] from each detail page.
//! Per-item failures are reported alongside the records and never abort the crawl.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Jobtrawl operations
#[derive(Debug, Error)]
pub enum TrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Start page {url} could not be fetched: {message}")]
    StartPage { url: String, message: String },

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Crawl task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid extraction rule for '{field}': {message}")]
    InvalidRule { field: String, message: String },

    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },
}

/// Link resolution errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("Link has no href")]
    MissingHref,

    #[error("Link href is empty")]
    Empty,

    #[error("Failed to resolve '{href}': {message}")]
    Malformed { href: String, message: String },

    #[error("Unsupported URL scheme in '{0}'")]
    InvalidScheme(String),
}

/// Result type alias for Jobtrawl operations
pub type Result<T> = std::result::Result<T, TrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for link operations
pub type LinkResult<T> = std::result::Result<T, LinkError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlEvent, PageContext, TraversalController};
pub use extract::{extract, normalized_join, ExtractionError, JobRecord};
pub use url::resolve_link;
