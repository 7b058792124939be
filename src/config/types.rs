use crate::extract::{ExtractionRule, RuleSet};
use serde::Deserialize;

/// Main configuration structure for Jobtrawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub listing: ListingSelectors,
    /// Replaces the built-in extraction rules when non-empty
    #[serde(default)]
    pub rules: Vec<ExtractionRule>,
}

impl Config {
    /// The extraction rules in effect for this configuration
    pub fn rule_set(&self) -> RuleSet {
        if self.rules.is_empty() {
            RuleSet::default()
        } else {
            RuleSet::new(self.rules.clone())
        }
    }
}

/// The site being crawled
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Address relative links are resolved against
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Search-results pages the crawl starts from
    #[serde(rename = "start-urls")]
    pub start_urls: Vec<String>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of fetches in flight at once
    #[serde(rename = "max-concurrent-requests", default = "default_max_concurrent")]
    pub max_concurrent_requests: u32,

    /// Minimum time between two dispatched requests (milliseconds)
    #[serde(rename = "politeness-delay", default = "default_politeness_delay")]
    pub politeness_delay: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Stop following next-page links past this many listing pages per start URL
    #[serde(rename = "max-listing-pages", default)]
    pub max_listing_pages: Option<u32>,
}

fn default_max_concurrent() -> u32 {
    8
}

fn default_politeness_delay() -> u64 {
    250
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: default_max_concurrent(),
            politeness_delay: default_politeness_delay(),
            request_timeout: default_request_timeout(),
            max_listing_pages: None,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Selectors locating result entries and pagination on a listing page
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ListingSelectors {
    /// One node per job summary in the results container
    pub item: String,

    /// Candidate detail anchors inside a result entry
    pub detail_link: String,

    /// Text the detail anchor must contain
    pub detail_link_marker: String,

    /// Candidate pagination anchors
    pub next_page: String,

    /// Text marking the forward pagination anchor
    pub next_page_marker: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            item: "ul.search_rez div.info_box".to_string(),
            detail_link: "div.buttons a".to_string(),
            detail_link_marker: "View job".to_string(),
            next_page: "div#pagination a".to_string(),
            next_page_marker: ">>".to_string(),
        }
    }
}
