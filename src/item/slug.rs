//! Stable anchor slugs for section titles.

use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{P}\d\-]+").expect("valid regex"));
static DASHES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-{2,}").expect("valid regex"));

/// Convert a section title into the slug used as its cross-reference key.
///
/// Whitespace runs become `-`, `&` becomes `-and-`, anything that is not a
/// letter, punctuation, digit or `-` is dropped, repeated dashes collapse, and
/// leading/trailing dashes are trimmed. The result depends only on the input,
/// so slugs generated by different tools agree.
///
/// ```
/// use doc_inventory::slugify;
///
/// assert_eq!(slugify("Search & Replace"), "Search-and-Replace");
/// ```
pub fn slugify(title: &str) -> String {
    let slug = WHITESPACE.replace_all(title, "-");
    let slug = slug.replace('&', "-and-");
    let slug = DISALLOWED.replace_all(&slug, "");
    let slug = DASHES.replace_all(&slug, "-");
    slug.trim_matches('-').to_string()
}
