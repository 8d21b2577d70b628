//! Pure glob matching used by `LIKE` predicates.
//!
//! Patterns support `*` as a wildcard that matches any sequence of
//! characters. [`like_matches`] accepts SQL-style `%` wildcards instead.

/// Checks if a text value matches a glob pattern.
///
/// # Examples
///
/// ```
/// use repocache_core::query::pattern_matches;
///
/// assert!(pattern_matches("order:*", "order:42"));
/// assert!(pattern_matches("*:open:*", "order:open:2024"));
/// assert!(!pattern_matches("order:*", "invoice:42"));
/// ```
pub fn pattern_matches(pattern: &str, text: &str) -> bool {
    if pattern.is_empty() {
        return text.is_empty();
    }

    if pattern == "*" {
        return true;
    }

    let segments: Vec<&str> = pattern.split('*').collect();

    if segments.len() == 1 {
        return pattern == text;
    }

    let mut remaining = text;
    let starts_with_wildcard = pattern.starts_with('*');
    let ends_with_wildcard = pattern.ends_with('*');

    for (i, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            continue;
        }

        let is_first = i == 0;
        let is_last = i == segments.len() - 1;

        if is_first && !starts_with_wildcard {
            if !remaining.starts_with(segment) {
                return false;
            }
            remaining = &remaining[segment.len()..];
        } else if is_last && !ends_with_wildcard {
            if !remaining.ends_with(segment) {
                return false;
            }
        } else {
            match remaining.find(segment) {
                Some(pos) => {
                    remaining = &remaining[pos + segment.len()..];
                }
                None => return false,
            }
        }
    }

    true
}

/// Checks if a text value matches a SQL `LIKE` pattern (`%` wildcards).
///
/// ```
/// use repocache_core::query::like_matches;
///
/// assert!(like_matches("acme%", "acme corp"));
/// assert!(!like_matches("%corp", "acme inc"));
/// ```
pub fn like_matches(pattern: &str, text: &str) -> bool {
    pattern_matches(&pattern.replace('%', "*"), text)
}
