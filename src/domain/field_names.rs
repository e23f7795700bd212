//! Column name cleanup for header rows.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

static NON_ALPHANUMERIC_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9A-Za-z]+").expect("static pattern is valid"));

/// Returns the header name for a raw column name.
///
/// With `clean` unset the name is returned untouched. Otherwise the name is
/// trimmed, every run of characters outside `[0-9A-Za-z]` becomes a single
/// `_`, the result is uppercased and trailing underscores are dropped.
/// A name made only of symbols collapses to an empty string.
pub fn sanitize(raw: &str, clean: bool) -> Cow<'_, str> {
    if !clean {
        return Cow::Borrowed(raw);
    }
    let replaced = NON_ALPHANUMERIC_RUN.replace_all(raw.trim(), "_");
    let upper = replaced.to_ascii_uppercase();
    Cow::Owned(upper.trim_end_matches('_').to_string())
}
