use crate::{LinkError, LinkResult};
use url::Url;

/// Resolves a link href against the site base address
///
/// Absolute hrefs are accepted as-is; relative hrefs (`/jobs/x/1`, `x/1`, `?page=2`)
/// are joined onto `base`. Only `http` and `https` results are accepted.
///
/// # Arguments
///
/// * `base` - The fixed site base address
/// * `href` - The raw href attribute value
///
/// # Returns
///
/// * `Ok(Url)` - The absolute URL
/// * `Err(LinkError)` - The href was empty, malformed, or not a web URL
///
/// # Examples
///
/// ```
/// use jobtrawl::url::resolve_link;
/// use url::Url;
///
/// let base = Url::parse("http://www.simplylawjobs.com").unwrap();
/// let url = resolve_link(&base, "/job/paralegal/42").unwrap();
/// assert_eq!(url.as_str(), "http://www.simplylawjobs.com/job/paralegal/42");
/// ```
pub fn resolve_link(base: &Url, href: &str) -> LinkResult<Url> {
    let href = href.trim();

    if href.is_empty() {
        return Err(LinkError::Empty);
    }

    // Skip special schemes
    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return Err(LinkError::InvalidScheme(href.to_string()));
    }

    let absolute = base.join(href).map_err(|e| LinkError::Malformed {
        href: href.to_string(),
        message: e.to_string(),
    })?;

    match absolute.scheme() {
        "http" | "https" => Ok(absolute),
        _ => Err(LinkError::InvalidScheme(href.to_string())),
    }
}

/// Resolves an optional href, treating a missing attribute as [`LinkError::MissingHref`]
pub fn resolve_href(base: &Url, href: Option<&str>) -> LinkResult<Url> {
    match href {
        Some(href) => resolve_link(base, href),
        None => Err(LinkError::MissingHref),
    }
}
