//! Crawler module for listing traversal and page fetching
//!
//! This module contains the core crawling logic, including:
//! - The traversal controller that turns pages into follow-ups and records
//! - HTTP fetching with a shared, cookie-carrying client
//! - Request scheduling and concurrency limiting
//! - Overall crawl coordination and the event stream

mod controller;
mod coordinator;
mod events;
mod fetcher;
mod request;
mod scheduler;

pub use controller::{ListingOutcome, PageOutcome, TraversalController};
pub use coordinator::{crawl, start_crawl, CancelHandle, Coordinator, CrawlReport};
pub use events::{CrawlEvent, FailureKind, ItemFailure};
pub use fetcher::{build_http_client, fetch_url, user_agent_string, FetchResult};
pub use request::{FetchRequest, PageContext, RequestKind};
pub use scheduler::{Rejection, ScheduledFetch, Scheduler};
