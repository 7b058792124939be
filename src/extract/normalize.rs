//! Text normalization for multi-fragment fields

/// Separator used when a join rule does not name one
pub const DEFAULT_SEPARATOR: &str = " ";

/// Joins text fragments into a single normalized string
///
/// Empty and whitespace-only fragments are discarded, the remaining fragments are
/// trimmed and joined with `separator`. Applying it again to its own output
/// returns the output unchanged.
///
/// # Examples
///
/// ```
/// use jobtrawl::extract::normalized_join;
///
/// assert_eq!(normalized_join(["", "  ", "a", "\n"], " "), "a");
/// assert_eq!(normalized_join(["Senior", " Associate "], " "), "Senior Associate");
/// ```
pub fn normalized_join<I, S>(fragments: I, separator: &str) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut joined = String::new();
    for fragment in fragments {
        let fragment = fragment.as_ref().trim();
        if fragment.is_empty() {
            continue;
        }
        if !joined.is_empty() {
            joined.push_str(separator);
        }
        joined.push_str(fragment);
    }
    joined
}
