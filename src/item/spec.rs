//! Grammar for spec strings like ``:py:function:`foo.bar` ``.
//!
//! The same grammar backs item construction from a `spec => uri` pair and the
//! lookup keys accepted by [`Query::parse`](crate::search::Query::parse).

use crate::error::{InventoryError, Result};
use regex::Regex;
use std::sync::LazyLock;

/// ``:domain:role:name``. Tried first, so a full prefix is never reread as a
/// role followed by a name containing `:`.
static DOMAIN_ROLE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^:(?P<domain>[^\s:`]+):(?P<role>[^\s:`]+):(?P<name>.*)$")
        .expect("valid regex")
});

/// ``:role:name``.
static ROLE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^:(?P<role>[^\s:`]+):(?P<name>.*)$").expect("valid regex")
});

/// A spec string split into its optional domain/role prefix and name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SpecParts<'a> {
    pub domain: Option<&'a str>,
    pub role: Option<&'a str>,
    pub name: &'a str,
    /// Whether the name was wrapped in backticks.
    pub quoted: bool,
}

/// Split `[:[domain:]role:]name` where `name` may be wrapped in backticks.
///
/// A single token between colons is taken as the role; whether it was meant
/// as a domain cannot be known from the string alone.
pub(crate) fn split_spec(spec: &str) -> Result<SpecParts<'_>> {
    let (domain, role, name) = if spec.starts_with(':') {
        let captures = DOMAIN_ROLE_PREFIX
            .captures(spec)
            .or_else(|| ROLE_PREFIX.captures(spec))
            .ok_or_else(|| {
                InventoryError::argument(format!(
                    "Invalid spec {:?}: expected `[:[domain:]role:]name`",
                    spec
                ))
            })?;
        let name = captures.name("name").map_or("", |m| m.as_str());
        (
            captures.name("domain").map(|m| m.as_str()),
            captures.name("role").map(|m| m.as_str()),
            name,
        )
    } else {
        (None, None, spec)
    };

    let (name, quoted) = unquote(name).ok_or_else(|| {
        InventoryError::argument(format!("Invalid spec {:?}: unbalanced backticks", spec))
    })?;

    if name.trim().is_empty() {
        return Err(InventoryError::argument(format!(
            "Invalid spec {:?}: empty name",
            spec
        )));
    }

    Ok(SpecParts {
        domain,
        role,
        name,
        quoted,
    })
}

/// Strip one pair of enclosing backticks. Returns `None` if the backticks do
/// not pair up.
fn unquote(name: &str) -> Option<(&str, bool)> {
    match name.strip_prefix('`') {
        Some(rest) => {
            let inner = rest.strip_suffix('`')?;
            if inner.contains('`') {
                None
            } else {
                Some((inner, true))
            }
        }
        None if name.ends_with('`') => None,
        None => Some((name, false)),
    }
}
