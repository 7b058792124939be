//! Recording a running crawl into a sink

use crate::crawler::{CancelHandle, CrawlEvent, CrawlReport};
use crate::output::traits::RecordSink;
use crate::storage::RunStatus;
use crate::TrawlError;
use std::future::Future;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Writes every event of a started crawl to `sink` and finalizes the run
///
/// Once `interrupt` resolves the crawl is cancelled; requests already in flight
/// still drain and their events are recorded. If the sink rejects an event the
/// crawl is cancelled, the run is finalized as failed and the write error is
/// returned.
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The crawl ended and every event was recorded
/// * `Err(TrawlError)` - The crawl failed or an event could not be recorded
pub async fn persist_crawl<S, F>(
    sink: &S,
    cancel: CancelHandle,
    handle: JoinHandle<Result<CrawlReport, TrawlError>>,
    mut events: mpsc::Receiver<CrawlEvent>,
    interrupt: F,
) -> Result<CrawlReport, TrawlError>
where
    S: RecordSink + ?Sized,
    F: Future,
{
    tokio::pin!(interrupt);
    let mut interrupted = false;
    let mut write_error = None;

    loop {
        tokio::select! {
            _ = &mut interrupt, if !interrupted => {
                tracing::warn!("Interrupt received, finishing in-flight requests");
                interrupted = true;
                cancel.cancel();
            }
            event = events.recv() => {
                let Some(event) = event else { break };
                if let CrawlEvent::Failure(failure) = &event {
                    tracing::debug!("Item failure ({}): {}", failure.kind.code(), failure.url);
                }
                if let Err(e) = sink.record_event(&event) {
                    tracing::error!("Failed to record event, stopping crawl: {}", e);
                    cancel.cancel();
                    write_error = Some(e);
                    break;
                }
            }
        }
    }

    // Unblocks a coordinator waiting to send
    drop(events);

    let result = handle.await.unwrap_or_else(|e| Err(TrawlError::Task(e)));
    let status = match (&write_error, &result) {
        (None, Ok(report)) if report.cancelled => RunStatus::Interrupted,
        (None, Ok(_)) => RunStatus::Completed,
        _ => RunStatus::Failed,
    };
    sink.finalize(status)?;

    match write_error {
        Some(e) => Err(e.into()),
        None => result,
    }
}
