//! Items emitted by a crawl run

use crate::extract::{ExtractionError, JobRecord};
use crate::LinkError;
use thiserror::Error;

/// One element of the unordered output stream of a crawl
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlEvent {
    /// A fully extracted job
    Record(JobRecord),

    /// An item that was skipped
    Failure(ItemFailure),
}

/// Why a single item was skipped
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureKind {
    #[error("{0}")]
    Extraction(#[from] ExtractionError),

    #[error("Unresolvable link: {0}")]
    UnresolvableLink(#[from] LinkError),

    #[error("Fetch failed: {0}")]
    FetchFailure(String),
}

impl FailureKind {
    /// Stable identifier used in storage and statistics
    pub fn code(&self) -> &'static str {
        match self {
            Self::Extraction(ExtractionError::MissingRequiredField(_)) => "missing_required_field",
            Self::UnresolvableLink(_) => "unresolvable_link",
            Self::FetchFailure(_) => "fetch_failure",
        }
    }
}

/// A per-item failure; never aborts the listing page or the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    /// The detail URL, or the raw href for link failures
    pub url: String,

    /// The listing page the item was found on
    pub listing_url: Option<String>,

    pub kind: FailureKind,
}

impl ItemFailure {
    pub fn new(url: impl Into<String>, listing_url: Option<String>, kind: FailureKind) -> Self {
        Self {
            url: url.into(),
            listing_url,
            kind,
        }
    }
}
