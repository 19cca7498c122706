//! Page-URL rules for no-code actions.

use regex::Regex;

use crate::core::error::MatchError;
use crate::state::{UrlFilter, UrlRule};

/// Evaluate a single rule against the current page URL.
///
/// String rules are case-sensitive. `MatchesRegex` looks for the pattern
/// anywhere in the URL.
pub fn check_url_match(url: &str, value: &str, rule: UrlRule) -> Result<bool, MatchError> {
    let matched = match rule {
        UrlRule::ExactMatch => url == value,
        UrlRule::Contains => url.contains(value),
        UrlRule::StartsWith => url.starts_with(value),
        UrlRule::EndsWith => url.ends_with(value),
        UrlRule::NotMatch => url != value,
        UrlRule::NotContains => !url.contains(value),
        UrlRule::MatchesRegex => {
            let pattern = Regex::new(value).map_err(|err| MatchError::InvalidRegex {
                pattern: value.to_string(),
                reason: err.to_string(),
            })?;
            pattern.is_match(url)
        }
    };
    Ok(matched)
}

/// True if `url` satisfies any filter. An empty list places no restriction.
///
/// A filter that cannot be evaluated (bad regex) counts as a non-match.
pub fn handle_url_filters(filters: &[UrlFilter], url: &str) -> bool {
    if filters.is_empty() {
        return true;
    }
    filters
        .iter()
        .any(|filter| match check_url_match(url, &filter.value, filter.rule) {
            Ok(matched) => matched,
            Err(err) => {
                tracing::warn!(error = %err, "skipping url filter");
                false
            }
        })
}

/// Query portion of `url` (between `?` and any `#`), empty when absent.
pub fn query_string(url: &str) -> &str {
    let Some((_, rest)) = url.split_once('?') else {
        return "";
    };
    rest.split_once('#').map_or(rest, |(query, _)| query)
}

/// True when the page query string carries `<param>=true`.
///
/// Accepts the raw `location.search` form, with or without the leading `?`.
pub fn is_debug(query: &str, param: &str) -> bool {
    query
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .any(|(key, value)| key == param && value == "true")
}
