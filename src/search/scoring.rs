//! Ranking of candidates and near-miss suggestions.

use crate::item::InventoryItem;
use rapidfuzz::distance::jaro_winkler;

/// Minimum Jaro-Winkler similarity for a name to be suggested.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// Maximum number of suggestions reported for a failed lookup.
const MAX_SUGGESTIONS: usize = 3;

/// Sort by ascending rank. Stable, so equally ranked items keep their order.
pub(crate) fn sort_by_rank(items: &mut [&InventoryItem]) {
    items.sort_by_key(|item| item.rank());
}

/// Item names similar to `name`, most similar first.
pub(crate) fn suggest<'a>(
    name: &str,
    items: impl IntoIterator<Item = &'a InventoryItem>,
) -> Vec<String> {
    let mut scored: Vec<(f64, &str)> = items
        .into_iter()
        .map(|item| {
            (
                jaro_winkler::similarity(name.chars(), item.name().chars()),
                item.name(),
            )
        })
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored.dedup_by(|a, b| a.1 == b.1);
    scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, name)| name.to_string())
        .collect()
}
