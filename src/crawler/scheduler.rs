//! Scheduler for the crawl work queue
//!
//! This module handles:
//! - FIFO queue of pending fetch requests
//! - Dropping requests for pages already queued in this run
//! - Global concurrency limiting via semaphores
//! - Respecting a minimum delay between dispatched requests
//! - The optional listing-page guard against endless pagination chains

use crate::config::CrawlerConfig;
use crate::crawler::request::{FetchRequest, RequestKind};
use crate::url::request_key;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// A scheduled fetch with a semaphore permit
///
/// The permit is released when the fetch task drops it.
pub struct ScheduledFetch {
    /// The request to fetch
    pub request: FetchRequest,

    /// The semaphore permit for this fetch
    pub _permit: OwnedSemaphorePermit,
}

/// Why a request was not queued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The same page was already queued in this run
    Duplicate,

    /// The listing page lies past `max-listing-pages`
    PageLimit,
}

/// Scheduler manages the frontier queue and dispatch pacing
pub struct Scheduler {
    /// Global semaphore for limiting concurrent fetches
    global_semaphore: Arc<Semaphore>,

    /// Pending requests in discovery order
    frontier: VecDeque<FetchRequest>,

    /// Keys of every request accepted so far
    seen: HashSet<String>,

    /// Minimum time between dispatches
    politeness_delay: Duration,

    /// When the previous request was handed out
    last_dispatch: Option<Instant>,

    /// Highest listing page number that may be fetched
    max_listing_pages: Option<u32>,
}

impl Scheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    pub fn new(config: &CrawlerConfig) -> Self {
        Self {
            global_semaphore: Arc::new(Semaphore::new(config.max_concurrent_requests as usize)),
            frontier: VecDeque::new(),
            seen: HashSet::new(),
            politeness_delay: Duration::from_millis(config.politeness_delay),
            last_dispatch: None,
            max_listing_pages: config.max_listing_pages,
        }
    }

    /// Adds a request to the back of the frontier
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The request was queued
    /// * `Err(Rejection)` - The request was dropped
    pub fn enqueue(&mut self, request: FetchRequest) -> Result<(), Rejection> {
        if let (RequestKind::Listing { page }, Some(max)) = (&request.kind, self.max_listing_pages)
        {
            if *page > max {
                tracing::warn!(
                    "Not following {}: listing page {} exceeds limit of {}",
                    request.url,
                    page,
                    max
                );
                return Err(Rejection::PageLimit);
            }
        }

        if !self.seen.insert(request_key(&request.url)) {
            tracing::trace!("Dropping duplicate request {}", request.url);
            return Err(Rejection::Duplicate);
        }

        self.frontier.push_back(request);
        Ok(())
    }

    /// Gets the next request to fetch
    ///
    /// This method:
    /// 1. Returns None if the frontier is empty
    /// 2. Acquires a global semaphore permit
    /// 3. Waits out the remainder of the politeness delay
    /// 4. Returns the request with its permit
    pub async fn next_request(&mut self) -> Option<ScheduledFetch> {
        if self.frontier.is_empty() {
            return None;
        }

        // Acquire global semaphore permit
        let permit = self.global_semaphore.clone().acquire_owned().await.ok()?;

        if let Some(last) = self.last_dispatch {
            let elapsed = last.elapsed();
            if elapsed < self.politeness_delay {
                tokio::time::sleep(self.politeness_delay - elapsed).await;
            }
        }

        let request = self.frontier.pop_front()?;
        self.last_dispatch = Some(Instant::now());
        tracing::debug!("Dispatching {}", request.url);

        Some(ScheduledFetch {
            request,
            _permit: permit,
        })
    }

    /// Returns the number of requests in the frontier
    pub fn frontier_size(&self) -> usize {
        self.frontier.len()
    }

    /// Returns whether the frontier is empty
    pub fn is_empty(&self) -> bool {
        self.frontier.is_empty()
    }

    /// Returns the number of distinct requests accepted so far
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}
