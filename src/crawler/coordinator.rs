//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the run loop that ties the crawl together:
//! - Seeding the scheduler with the configured start pages
//! - Dispatching fetches onto tokio tasks under the scheduler's limits
//! - Routing each response through the traversal controller
//! - Queueing follow-up requests and forwarding records and failures
//! - Stopping early on cancellation

use crate::config::Config;
use crate::crawler::controller::{PageOutcome, TraversalController};
use crate::crawler::events::{CrawlEvent, FailureKind, ItemFailure};
use crate::crawler::request::FetchRequest;
use crate::crawler::scheduler::{Scheduler, ScheduledFetch};
use crate::crawler::{build_http_client, fetch_url, FetchResult};
use crate::TrawlError;
use reqwest::Client;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use url::Url;

/// Stops a running crawl from another task
///
/// After [`CancelHandle::cancel`] no new request is dispatched; requests already
/// in flight finish and their results are still delivered.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Counters describing a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Listing pages fetched successfully
    pub listing_pages: usize,

    /// Detail pages fetched successfully
    pub detail_pages: usize,

    /// Records emitted
    pub records: usize,

    /// Item failures emitted
    pub failures: usize,

    /// Whether the run stopped early
    pub cancelled: bool,
}

impl CrawlReport {
    fn count(&mut self, event: &CrawlEvent) {
        match event {
            CrawlEvent::Record(_) => self.records += 1,
            CrawlEvent::Failure(_) => self.failures += 1,
        }
    }
}

/// What a fetch task hands back to the run loop
struct TaskOutput {
    request: FetchRequest,
    result: Result<PageOutcome, String>,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    controller: Arc<TraversalController>,
    scheduler: Scheduler,
    client: Client,
    events: mpsc::Sender<CrawlEvent>,
    cancel: CancelHandle,
    pages_handled: usize,
    started: Instant,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `events` - Where records and failures are sent as they are produced
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(TrawlError)` - Invalid selectors/rules or HTTP client failure
    pub fn new(config: Config, events: mpsc::Sender<CrawlEvent>) -> Result<Self, TrawlError> {
        let controller = TraversalController::from_config(&config)?;
        let client = build_http_client(&config.user_agent, &config.crawler)?;
        let scheduler = Scheduler::new(&config.crawler);

        Ok(Self {
            config: Arc::new(config),
            controller: Arc::new(controller),
            scheduler,
            client,
            events,
            cancel: CancelHandle::default(),
            pages_handled: 0,
            started: Instant::now(),
        })
    }

    /// Returns a handle that stops this run when cancelled
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Runs the crawl until the frontier is exhausted or the run is cancelled
    ///
    /// This is the core crawling logic that:
    /// 1. Seeds the scheduler with every start page
    /// 2. Spawns one task per dispatched request
    /// 3. Enqueues the follow-up requests each task returns
    /// 4. Forwards records and failures on the event channel
    ///
    /// A start page that cannot be fetched aborts the run with
    /// [`TrawlError::StartPage`]; every other failure is reported as an event.
    pub async fn run(mut self) -> Result<CrawlReport, TrawlError> {
        for start in &self.config.site.start_urls {
            let url = Url::parse(start)?;
            let _ = self.scheduler.enqueue(FetchRequest::start(url));
        }

        tracing::info!(
            "Starting crawl of {} with {} start page(s)",
            self.controller.base_url(),
            self.scheduler.frontier_size()
        );

        self.started = Instant::now();
        let mut report = CrawlReport::default();
        let mut tasks: JoinSet<TaskOutput> = JoinSet::new();

        loop {
            while let Some(joined) = tasks.try_join_next() {
                self.absorb(joined, &mut report).await?;
            }

            if self.cancel.is_cancelled() {
                tracing::info!("Crawl cancelled, waiting for {} in-flight request(s)", tasks.len());
                report.cancelled = true;
                break;
            }

            if self.scheduler.is_empty() {
                match tasks.join_next().await {
                    Some(joined) => {
                        self.absorb(joined, &mut report).await?;
                        continue;
                    }
                    None => {
                        tracing::info!("Frontier is empty, crawl complete");
                        break;
                    }
                }
            }

            let Some(scheduled) = self.scheduler.next_request().await else {
                continue;
            };
            self.spawn_fetch(&mut tasks, scheduled);
        }

        while let Some(joined) = tasks.join_next().await {
            self.absorb(joined, &mut report).await?;
        }

        tracing::info!(
            "Crawl finished in {:?}: {} listing page(s), {} detail page(s), {} record(s), {} failure(s)",
            self.started.elapsed(),
            report.listing_pages,
            report.detail_pages,
            report.records,
            report.failures
        );

        Ok(report)
    }

    fn spawn_fetch(&self, tasks: &mut JoinSet<TaskOutput>, scheduled: ScheduledFetch) {
        let client = self.client.clone();
        let controller = Arc::clone(&self.controller);

        tasks.spawn(async move {
            let ScheduledFetch { request, _permit } = scheduled;
            let result = match fetch_url(&client, &request.url).await {
                FetchResult::Success {
                    final_url,
                    status_code,
                    body,
                } => {
                    tracing::debug!("Fetched {} ({})", final_url, status_code);
                    Ok(controller.handle(&request, &final_url, &body))
                }
                failed => Err(failed
                    .failure_message()
                    .unwrap_or_else(|| "unknown fetch failure".to_string())),
            };
            TaskOutput { request, result }
        });
    }

    /// Folds one finished task into the run
    async fn absorb(
        &mut self,
        joined: Result<TaskOutput, JoinError>,
        report: &mut CrawlReport,
    ) -> Result<(), TrawlError> {
        let TaskOutput { request, result } = match joined {
            Ok(output) => output,
            Err(e) => {
                tracing::error!("Fetch task failed: {}", e);
                return Ok(());
            }
        };
        self.pages_handled += 1;
        if self.pages_handled % 10 == 0 {
            self.log_progress();
        }

        let outcome = match result {
            Ok(outcome) => {
                if request.is_listing() {
                    report.listing_pages += 1;
                } else {
                    report.detail_pages += 1;
                }
                outcome
            }
            Err(message) if request.is_start() => {
                tracing::error!("Start page {} failed: {}", request.url, message);
                return Err(TrawlError::StartPage {
                    url: request.url.to_string(),
                    message,
                });
            }
            Err(message) => {
                tracing::warn!("Fetch of {} failed: {}", request.url, message);
                let failure = ItemFailure::new(
                    request.url.as_str(),
                    request.context().map(|context| context.listing_url.clone()),
                    FailureKind::FetchFailure(message),
                );
                PageOutcome {
                    follow_ups: Vec::new(),
                    events: vec![CrawlEvent::Failure(failure)],
                }
            }
        };

        if !self.cancel.is_cancelled() {
            for follow_up in outcome.follow_ups {
                let _ = self.scheduler.enqueue(follow_up);
            }
        }

        for event in outcome.events {
            report.count(&event);
            if self.events.send(event).await.is_err() {
                tracing::warn!("Event receiver dropped, stopping crawl");
                self.cancel.cancel();
                break;
            }
        }

        Ok(())
    }

    fn log_progress(&self) {
        let rate = self.pages_handled as f64 / self.started.elapsed().as_secs_f64();
        tracing::info!(
            "Progress: {} pages handled, {} in frontier, {:.2} pages/sec",
            self.pages_handled,
            self.scheduler.frontier_size(),
            rate
        );
    }
}

/// Starts a crawl on a background task
///
/// Records and failures arrive on the returned receiver in completion order.
/// The join handle resolves to the run's [`CrawlReport`] once the channel has
/// carried every event.
///
/// # Example
///
/// ```no_run
/// use jobtrawl::config::load_config;
/// use jobtrawl::crawler::{start_crawl, CrawlEvent};
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("jobtrawl.toml"))?;
/// let (_cancel, handle, mut events) = start_crawl(config, 64)?;
/// while let Some(event) = events.recv().await {
///     if let CrawlEvent::Record(record) = event {
///         println!("{} at {}", record.title, record.company);
///     }
/// }
/// let report = handle.await??;
/// println!("{} records", report.records);
/// # Ok(())
/// # }
/// ```
pub fn start_crawl(
    config: Config,
    buffer: usize,
) -> Result<
    (
        CancelHandle,
        JoinHandle<Result<CrawlReport, TrawlError>>,
        mpsc::Receiver<CrawlEvent>,
    ),
    TrawlError,
> {
    let (sender, receiver) = mpsc::channel(buffer.max(1));
    let coordinator = Coordinator::new(config, sender)?;
    let cancel = coordinator.cancel_handle();
    let handle = tokio::spawn(coordinator.run());
    Ok((cancel, handle, receiver))
}

/// Runs a crawl to completion and collects every event
pub async fn crawl(config: Config) -> Result<(Vec<CrawlEvent>, CrawlReport), TrawlError> {
    let (sender, mut receiver) = mpsc::channel(64);
    let coordinator = Coordinator::new(config, sender)?;

    let collector = tokio::spawn(async move {
        let mut events = Vec::new();
        while let Some(event) = receiver.recv().await {
            events.push(event);
        }
        events
    });

    let report = coordinator.run().await?;
    let events = collector.await?;
    Ok((events, report))
}
