//! Traversal controller: listing-page and detail-page handlers
//!
//! The controller never fetches anything itself. Given a fetched page it returns
//! the follow-up requests and the records/failures that page produced:
//! - Listing pages yield one detail request per result entry and at most one
//!   next-page request
//! - Detail pages yield exactly one record or one failure
//!
//! It holds only immutable data (site base, compiled selectors and rules), so a
//! single instance is shared by every in-flight request.

use crate::config::{Config, ListingSelectors};
use crate::crawler::events::{CrawlEvent, FailureKind, ItemFailure};
use crate::crawler::request::{FetchRequest, PageContext, RequestKind};
use crate::extract::{extract, CompiledRules, ExtractionError, JobRecord, RuleSet};
use crate::url::{resolve_href, resolve_link};
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Result of handling one listing page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingOutcome {
    /// One request per resolvable result entry, each carrying the listing URL
    pub detail_requests: Vec<FetchRequest>,

    /// The next results page, if the page links forward
    pub next_page: Option<FetchRequest>,

    /// Result entries that had to be skipped
    pub failures: Vec<ItemFailure>,
}

/// Follow-up work and output produced by any fetched page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageOutcome {
    pub follow_ups: Vec<FetchRequest>,
    pub events: Vec<CrawlEvent>,
}

impl From<ListingOutcome> for PageOutcome {
    fn from(outcome: ListingOutcome) -> Self {
        let mut follow_ups = outcome.detail_requests;
        follow_ups.extend(outcome.next_page);
        Self {
            follow_ups,
            events: outcome
                .failures
                .into_iter()
                .map(CrawlEvent::Failure)
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledListing {
    item: Selector,
    detail_link: Selector,
    detail_link_marker: String,
    next_page: Selector,
    next_page_marker: String,
}

impl CompiledListing {
    fn compile(selectors: &ListingSelectors) -> Result<Self, ConfigError> {
        Ok(Self {
            item: parse_selector(&selectors.item)?,
            detail_link: parse_selector(&selectors.detail_link)?,
            detail_link_marker: selectors.detail_link_marker.clone(),
            next_page: parse_selector(&selectors.next_page)?,
            next_page_marker: selectors.next_page_marker.clone(),
        })
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// First anchor under `scope` matching `selector` whose visible text contains `marker`
fn find_marked_link<'a>(
    mut scope: impl Iterator<Item = ElementRef<'a>>,
    marker: &str,
) -> Option<ElementRef<'a>> {
    scope.find(|link| link.text().collect::<String>().contains(marker))
}

/// Response handler for a single crawl configuration
#[derive(Debug, Clone)]
pub struct TraversalController {
    base_url: Url,
    listing: CompiledListing,
    rules: CompiledRules,
}

impl TraversalController {
    /// Creates a controller from a site base address, listing selectors and rules
    ///
    /// # Returns
    ///
    /// * `Ok(TraversalController)` - All selectors and rules compiled
    /// * `Err(ConfigError)` - A selector or rule is invalid
    pub fn new(
        base_url: Url,
        listing: &ListingSelectors,
        rules: &RuleSet,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url,
            listing: CompiledListing::compile(listing)?,
            rules: rules.compile()?,
        })
    }

    /// Creates a controller from a loaded configuration
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let base_url = Url::parse(&config.site.base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;
        Self::new(base_url, &config.listing, &config.rule_set())
    }

    /// The fixed address relative links are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Routes a fetched page to the handler that requested it
    ///
    /// # Arguments
    ///
    /// * `request` - The request that produced the response
    /// * `response_url` - Final URL of the response (after redirects)
    /// * `body` - The response body
    pub fn handle(&self, request: &FetchRequest, response_url: &Url, body: &str) -> PageOutcome {
        match &request.kind {
            RequestKind::Listing { page } => {
                self.handle_listing(response_url, *page, body).into()
            }
            RequestKind::Detail(context) => {
                tracing::trace!(
                    "Detail {} for entry {} of {}",
                    response_url,
                    context.correlation_id(),
                    context.listing_url
                );
                let event = match self.handle_detail(response_url, body, context) {
                    Ok(record) => CrawlEvent::Record(record),
                    Err(e) => CrawlEvent::Failure(ItemFailure::new(
                        response_url.as_str(),
                        Some(context.listing_url.clone()),
                        e.into(),
                    )),
                };
                PageOutcome {
                    follow_ups: Vec::new(),
                    events: vec![event],
                }
            }
        }
    }

    /// Handles a results page
    ///
    /// Every result entry becomes a detail request whose [`PageContext`] carries this
    /// page's URL and the entry's position. An entry without a usable link is reported and skipped; the
    /// rest of the page is unaffected. The next-page link, when present, becomes a
    /// listing request for page `page + 1`. A page without one ends the chain.
    pub fn handle_listing(&self, listing_url: &Url, page: u32, body: &str) -> ListingOutcome {
        let document = Html::parse_document(body);
        let mut outcome = ListingOutcome::default();

        for (entry, item) in document.select(&self.listing.item).enumerate() {
            let context = PageContext::new(listing_url.as_str(), page, entry);
            let link = find_marked_link(
                item.select(&self.listing.detail_link),
                &self.listing.detail_link_marker,
            );
            let href = link.and_then(|link| link.value().attr("href"));

            match resolve_href(&self.base_url, href) {
                Ok(url) => {
                    tracing::trace!("Detail link {} on {}", url, listing_url);
                    outcome
                        .detail_requests
                        .push(FetchRequest::detail(url, context));
                }
                Err(e) => {
                    tracing::warn!("Skipping result entry on {}: {}", listing_url, e);
                    outcome.failures.push(ItemFailure::new(
                        href.unwrap_or_default(),
                        Some(context.listing_url),
                        FailureKind::UnresolvableLink(e),
                    ));
                }
            }
        }

        let next = find_marked_link(
            document.select(&self.listing.next_page),
            &self.listing.next_page_marker,
        )
        .and_then(|link| link.value().attr("href"))
        .filter(|href| !href.trim().is_empty());

        match next.map(|href| (href, resolve_link(&self.base_url, href))) {
            Some((_, Ok(url))) => {
                tracing::debug!("Next page after {}: {}", listing_url, url);
                outcome.next_page = Some(FetchRequest::listing(url, page.saturating_add(1)));
            }
            Some((href, Err(e))) => {
                tracing::warn!("Unresolvable next-page link on {}: {}", listing_url, e);
                outcome.failures.push(ItemFailure::new(
                    href,
                    Some(listing_url.to_string()),
                    FailureKind::UnresolvableLink(e),
                ));
            }
            None => {
                tracing::debug!("No next-page link on {}", listing_url);
            }
        }

        outcome
    }

    /// Handles a job-detail page
    ///
    /// Extraction runs exactly once per page. `applyUrl` is the detail page's own
    /// address while `url` stays the listing page from `context`.
    pub fn handle_detail(
        &self,
        response_url: &Url,
        body: &str,
        context: &PageContext,
    ) -> Result<JobRecord, ExtractionError> {
        let document = Html::parse_document(body);
        extract(&document, response_url, &self.rules, context)
    }
}
