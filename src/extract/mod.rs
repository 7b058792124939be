//! Field extraction for job-detail pages
//!
//! This module turns one fetched detail document into a [`JobRecord`]:
//! - Declarative per-field rules (selector, input transform, output chain)
//! - Text normalization for multi-fragment fields
//! - Job id derivation from the detail URL
//!
//! Extraction is all-or-nothing: either every required field is present and a record
//! is built, or an [`ExtractionError`] names the first missing field.

mod normalize;
mod record;
mod rules;

pub use normalize::{normalized_join, DEFAULT_SEPARATOR};
pub use record::JobRecord;
pub use rules::{
    CompiledRule, CompiledRules, ExtractionRule, Field, InputTransform, OutputTransform, RuleSet,
    Source,
};

use crate::crawler::PageContext;
use scraper::Html;
use std::collections::HashMap;
use thiserror::Error;
use url::Url;

/// Errors raised while building a record from a detail page
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("Missing required field: {0}")]
    MissingRequiredField(&'static str),
}

/// Derives the job id from a detail-page URL
///
/// The id is the trailing run of digits after the last `/` of the path; the
/// query string and fragment are ignored.
///
/// # Examples
///
/// ```
/// use jobtrawl::extract::job_id_from_url;
/// use url::Url;
///
/// let url = Url::parse("http://example.com/jobs/senior-associate/12345?src=x").unwrap();
/// assert_eq!(job_id_from_url(&url), Some("12345".to_string()));
/// ```
pub fn job_id_from_url(url: &Url) -> Option<String> {
    let (_, tail) = url.path().rsplit_once('/')?;

    if !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()) {
        Some(tail.to_string())
    } else {
        None
    }
}

/// Extracts a job record from a parsed detail document
///
/// # Arguments
///
/// * `document` - The parsed detail page
/// * `response_url` - The detail page's own fetched URL (source of `jobId` and `applyUrl`)
/// * `rules` - The compiled, static rule set
/// * `context` - Correlation data carried from the listing page (source of `url`)
///
/// # Returns
///
/// * `Ok(JobRecord)` - Every required field was found
/// * `Err(ExtractionError)` - A required field was missing; no record is built
pub fn extract(
    document: &Html,
    response_url: &Url,
    rules: &CompiledRules,
    context: &PageContext,
) -> Result<JobRecord, ExtractionError> {
    let mut values: HashMap<Field, String> = rules
        .iter()
        .filter_map(|rule| rule.evaluate(document).map(|value| (rule.field(), value)))
        .collect();

    let mut required = |field: Field| {
        values
            .remove(&field)
            .ok_or(ExtractionError::MissingRequiredField(field.name()))
    };

    let title = required(Field::Title)?;
    let job_id =
        job_id_from_url(response_url).ok_or(ExtractionError::MissingRequiredField("jobId"))?;
    let url = Some(context.listing_url.as_str())
        .filter(|url| !url.trim().is_empty())
        .map(str::to_string)
        .ok_or(ExtractionError::MissingRequiredField("url"))?;
    let company = required(Field::Company)?;
    let location = required(Field::Location)?;
    let description = required(Field::Description)?;

    Ok(JobRecord {
        title,
        job_id,
        url,
        company,
        location,
        description,
        apply_url: Some(response_url.to_string()),
        industry: values.remove(&Field::Industry),
        base_salary: values.remove(&Field::BaseSalary),
        benefits: values.remove(&Field::Benefits),
        requirements: values.remove(&Field::Requirements),
        skills: values.remove(&Field::Skills),
        work_hours: values.remove(&Field::WorkHours),
        job_type: values.remove(&Field::JobType),
        job_sector: values.remove(&Field::JobSector),
        contact: values.remove(&Field::Contact),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETAIL_HTML: &str = r#"
        <html><body>
        <h1 class="job_title"> Senior Associate </h1>
        <div class="columns small-12 medium-4 large-4 details">
            <a href="http://acme.example" target="_blank">Acme LLP</a>
        </div>
        <p>
            <strong>Location: </strong><a href="/loc/leeds">Leeds</a><br>
            <strong>Salary:</strong> £55,000 <br>
            <strong>Job type:</strong> Permanent<br>
            <strong>Job sector:</strong> Private Practice<br>
            <strong>Experience:</strong> 5+ years PQE<br>
        </p>
        <div class="description allow-bulletpoints hide-for-small">
            <p>Join our   corporate team.</p>
            <ul><li>M&amp;A work</li><li>   </li></ul>
        </div>
        </body></html>
    "#;

    fn rules() -> CompiledRules {
        RuleSet::simply_law_jobs().compile().unwrap()
    }

    fn context() -> PageContext {
        PageContext::new("http://www.simplylawjobs.com/jobs", 1, 0)
    }

    fn detail_url() -> Url {
        Url::parse("http://www.simplylawjobs.com/job/senior-associate/12345?src=x").unwrap()
    }

    #[test]
    fn test_job_id_from_url() {
        let url = Url::parse("http://e.com/jobs/senior-associate/12345?src=x").unwrap();
        assert_eq!(job_id_from_url(&url), Some("12345".to_string()));
    }

    #[test]
    fn test_job_id_requires_trailing_digits() {
        for raw in [
            "http://e.com/jobs/senior-associate",
            "http://e.com/jobs/12345/",
            "http://e.com/jobs/abc12345",
            "http://e.com/",
        ] {
            let url = Url::parse(raw).unwrap();
            assert_eq!(job_id_from_url(&url), None, "{}", raw);
        }
    }

    #[test]
    fn test_extract_full_record() {
        let document = Html::parse_document(DETAIL_HTML);
        let record = extract(&document, &detail_url(), &rules(), &context()).unwrap();

        assert_eq!(record.title, "Senior Associate");
        assert_eq!(record.job_id, "12345");
        assert_eq!(record.url, "http://www.simplylawjobs.com/jobs");
        assert_eq!(
            record.apply_url.as_deref(),
            Some("http://www.simplylawjobs.com/job/senior-associate/12345?src=x")
        );
        assert_eq!(record.company, "Acme LLP");
        assert_eq!(record.location, "Leeds");
        assert_eq!(record.description, "Join our   corporate team. M&A work");
        assert_eq!(record.base_salary.as_deref(), Some("£55,000"));
        assert_eq!(record.job_type.as_deref(), Some("Permanent"));
        assert_eq!(record.job_sector.as_deref(), Some("Private Practice"));
        assert_eq!(record.requirements.as_deref(), Some("5+ years PQE"));
        assert_eq!(record.contact, None);
        assert_eq!(record.industry, None);
    }

    #[test]
    fn test_extract_is_deterministic() {
        let document = Html::parse_document(DETAIL_HTML);
        let rules = rules();
        let first = extract(&document, &detail_url(), &rules, &context());
        let second = extract(&document, &detail_url(), &rules, &context());
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_title() {
        let html = DETAIL_HTML.replace("job_title", "headline");
        let document = Html::parse_document(&html);
        let result = extract(&document, &detail_url(), &rules(), &context());
        assert_eq!(result, Err(ExtractionError::MissingRequiredField("title")));
    }

    #[test]
    fn test_missing_job_id() {
        let document = Html::parse_document(DETAIL_HTML);
        let url = Url::parse("http://www.simplylawjobs.com/job/senior-associate").unwrap();
        let result = extract(&document, &url, &rules(), &context());
        assert_eq!(result, Err(ExtractionError::MissingRequiredField("jobId")));
    }

    #[test]
    fn test_missing_listing_url() {
        let document = Html::parse_document(DETAIL_HTML);
        let context = PageContext::new("", 1, 0);
        let result = extract(&document, &detail_url(), &rules(), &context);
        assert_eq!(result, Err(ExtractionError::MissingRequiredField("url")));
    }

    #[test]
    fn test_whitespace_only_description_is_missing() {
        let html = DETAIL_HTML
            .replace("Join our   corporate team.", "   ")
            .replace("M&amp;A work", "");
        let document = Html::parse_document(&html);
        let result = extract(&document, &detail_url(), &rules(), &context());
        assert_eq!(
            result,
            Err(ExtractionError::MissingRequiredField("description"))
        );
    }

    #[test]
    fn test_apply_url_differs_from_listing_url() {
        let document = Html::parse_document(DETAIL_HTML);
        let record = extract(&document, &detail_url(), &rules(), &context()).unwrap();
        assert_ne!(record.apply_url.as_deref(), Some(record.url.as_str()));
    }
}
