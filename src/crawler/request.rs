//! Fetch requests and the correlation context they carry

use url::Url;

/// Correlation data threaded from a listing page to its detail-page fetches
///
/// The fetch layer treats it as opaque payload and hands it back unchanged
/// together with the detail response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageContext {
    /// The listing page's own URL; becomes `JobRecord::url`
    pub listing_url: String,

    /// Position of the listing page in its pagination chain
    pub page: u32,

    /// Index of the result entry on the listing page
    pub entry: usize,
}

impl PageContext {
    /// Creates the context for one result entry of a listing page
    pub fn new(listing_url: impl Into<String>, page: u32, entry: usize) -> Self {
        Self {
            listing_url: listing_url.into(),
            page,
            entry,
        }
    }

    /// Identifies the result entry within its crawl chain, e.g. `p2e7`
    pub fn correlation_id(&self) -> String {
        format!("p{}e{}", self.page, self.entry)
    }
}

/// Which handler a response is routed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    /// A results page; `page` is 1 for start pages and grows by one per next-page hop
    Listing { page: u32 },

    /// A job-detail page discovered on a listing page
    Detail(PageContext),
}

/// A discrete unit of work for the fetch layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// The absolute URL to fetch
    pub url: Url,

    /// The handler that will receive the response
    pub kind: RequestKind,
}

impl FetchRequest {
    /// A configured start page
    pub fn start(url: Url) -> Self {
        Self::listing(url, 1)
    }

    /// A listing page at the given position in the pagination chain
    pub fn listing(url: Url, page: u32) -> Self {
        Self {
            url,
            kind: RequestKind::Listing { page },
        }
    }

    /// A detail page correlated with the listing page it was found on
    pub fn detail(url: Url, context: PageContext) -> Self {
        Self {
            url,
            kind: RequestKind::Detail(context),
        }
    }

    /// Returns true for configured start pages
    pub fn is_start(&self) -> bool {
        matches!(self.kind, RequestKind::Listing { page: 1 })
    }

    /// Returns true for listing pages
    pub fn is_listing(&self) -> bool {
        matches!(self.kind, RequestKind::Listing { .. })
    }

    /// The listing page this request was discovered on, if any
    pub fn context(&self) -> Option<&PageContext> {
        match &self.kind {
            RequestKind::Detail(context) => Some(context),
            RequestKind::Listing { .. } => None,
        }
    }
}
