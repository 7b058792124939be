//! Configuration module for Jobtrawl
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use jobtrawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("jobtrawl.toml")).unwrap();
//! println!("Crawl starts at: {:?}", config.site.start_urls);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, ListingSelectors, OutputConfig, SiteConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
