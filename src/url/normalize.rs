use url::Url;

/// Computes the deduplication key for a fetch request
///
/// Two requests with the same key are considered the same page:
/// the fragment is dropped and the host is lowercased (the `url` crate already
/// lowercases scheme and host when parsing). Query strings are kept because
/// listing pages paginate through them.
///
/// # Examples
///
/// ```
/// use jobtrawl::url::request_key;
/// use url::Url;
///
/// let a = Url::parse("http://Example.com/jobs?page=2#top").unwrap();
/// let b = Url::parse("http://example.com/jobs?page=2").unwrap();
/// assert_eq!(request_key(&a), request_key(&b));
/// ```
pub fn request_key(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.to_string()
}
