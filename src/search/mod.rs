//! Exact lookup and pattern search over an [`Inventory`].
//!
//! Lookups pick the best ranked item among those with the requested name;
//! misses and ties are reported as [`Diagnostic`]s rather than errors.

mod diagnostics;
mod query;
mod scoring;

pub use diagnostics::{Diagnostic, DiagnosticSink, Quiet, TracingSink};
pub use query::Query;

use crate::error::Result;
use crate::inventory::Inventory;
use crate::item::InventoryItem;
use regex::Regex;

/// What [`Inventory::search`] matches against each item.
#[derive(Debug, Clone)]
pub enum Pattern {
    Substring(String),
    Regex(Regex),
}

impl Pattern {
    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Self::Substring(needle) => text.contains(needle.as_str()),
            Self::Regex(regex) => regex.is_match(text),
        }
    }
}

impl From<&str> for Pattern {
    fn from(needle: &str) -> Self {
        Self::Substring(needle.to_string())
    }
}

impl From<String> for Pattern {
    fn from(needle: String) -> Self {
        Self::Substring(needle)
    }
}

impl From<Regex> for Pattern {
    fn from(regex: Regex) -> Self {
        Self::Regex(regex)
    }
}

impl Inventory {
    /// Items named exactly `name`, in container order.
    fn named<'a>(&'a self, name: &str) -> Vec<&'a InventoryItem> {
        let items = self.items();
        if self.is_sorted() {
            let start = items.partition_point(|item| item.name() < name);
            let len = items[start..].partition_point(|item| item.name() == name);
            items[start..start + len].iter().collect()
        } else {
            items.iter().filter(|item| item.name() == name).collect()
        }
    }

    /// Find the best item for `query`, logging misses and ties.
    pub fn find(&self, query: &Query) -> Option<&InventoryItem> {
        self.find_with(query, &mut TracingSink)
    }

    /// Find the best item for `query`.
    ///
    /// Among the items with the query's name that pass its domain, role and
    /// visibility filters, the one with the lowest [`rank`](InventoryItem::rank)
    /// wins; ties go to the first in container order and are reported as
    /// [`Diagnostic::Ambiguous`].
    pub fn find_with(
        &self,
        query: &Query,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<&InventoryItem> {
        let candidates: Vec<_> = self
            .named(&query.name)
            .into_iter()
            .filter(|item| query.accepts(item))
            .collect();

        let Some(best) = candidates.iter().map(|item| item.rank()).min() else {
            if sink.is_enabled() {
                sink.report(Diagnostic::NotFound {
                    query: query.to_string(),
                    suggestions: scoring::suggest(&query.name, self.items()),
                });
            }
            return None;
        };

        let mut ranked = candidates.into_iter().filter(|item| item.rank() == best);
        let chosen = ranked.next()?;
        if !sink.is_enabled() {
            return Some(chosen);
        }
        let others: Vec<String> = ranked.map(InventoryItem::spec).collect();
        if !others.is_empty() {
            sink.report(Diagnostic::Ambiguous {
                query: query.to_string(),
                chosen: chosen.spec(),
                others,
            });
        }
        Some(chosen)
    }

    /// Parse `key` (see [`Query::parse`]) and look it up.
    ///
    /// A malformed key is an error; a key that matches nothing is `Ok(None)`.
    pub fn lookup(&self, key: &str) -> Result<Option<&InventoryItem>> {
        self.lookup_with(key, &mut TracingSink)
    }

    pub fn lookup_with(
        &self,
        key: &str,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Option<&InventoryItem>> {
        let query = Query::parse(key)?;
        Ok(self.find_with(&query, sink))
    }

    /// Items whose spec string or field dump matches `pattern`, lowest rank
    /// first.
    pub fn search(&self, pattern: &Pattern, include_hidden: bool) -> Vec<&InventoryItem> {
        let mut matches: Vec<_> = self
            .iter()
            .filter(|item| include_hidden || !item.is_hidden())
            .filter(|item| pattern.is_match(&item.spec()) || pattern.is_match(&item.to_string()))
            .collect();
        scoring::sort_by_rank(&mut matches);
        matches
    }
}
