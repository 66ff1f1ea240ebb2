//! Table projection of the asset collection: sort, then filter by name.

use crate::models::asset::AssetRecord;
use crate::models::dashboard::{SortDirection, SortKey};

/// Derive the rows to display from `records`.
///
/// Records are sorted by the lower-cased value of `sort_key` (missing values
/// sort as the empty string), then filtered to those whose name contains
/// `search_term` case-insensitively. A record without a name never matches.
/// The sort is stable so ties keep arrival order. `records` is not touched.
pub fn derive_view(
    records: &[AssetRecord],
    search_term: &str,
    sort_key: SortKey,
    sort_direction: SortDirection,
) -> Vec<AssetRecord> {
    let mut keyed: Vec<(String, &AssetRecord)> = records
        .iter()
        .map(|r| (r.field(sort_key).unwrap_or_default().to_lowercase(), r))
        .collect();

    // Flip the comparator rather than reversing so ties keep arrival order
    keyed.sort_by(|(a, _), (b, _)| match sort_direction {
        SortDirection::Ascending => a.cmp(b),
        SortDirection::Descending => b.cmp(a),
    });

    let needle = search_term.to_lowercase();
    keyed
        .into_iter()
        .map(|(_, r)| r)
        .filter(|r| matches_search(r, &needle))
        .cloned()
        .collect()
}

fn matches_search(record: &AssetRecord, needle: &str) -> bool {
    match record.name.as_deref() {
        Some(name) => name.to_lowercase().contains(needle),
        None => false,
    }
}
