//! Local result filter / 本地结果过滤
//!
//! Pure substring match over the in-memory directory. No I/O, no errors:
//! a missing optional field simply does not match.

use crate::models::DirectoryEntry;

/// Filter entries whose name, category or location contains `query`.
/// 按名称、分类或地点过滤（不区分大小写）
///
/// Relative order is preserved. An empty or whitespace-only query returns
/// the whole dataset.
pub fn filter_entries(entries: &[DirectoryEntry], query: &str) -> Vec<DirectoryEntry> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return entries.to_vec();
    }

    entries
        .iter()
        .filter(|entry| matches(entry, &needle))
        .cloned()
        .collect()
}

/// `needle` must already be lowercased / needle 需已转为小写
pub fn matches(entry: &DirectoryEntry, needle: &str) -> bool {
    let contains = |field: Option<&str>| {
        field
            .map(|value| value.to_lowercase().contains(needle))
            .unwrap_or(false)
    };

    contains(Some(&entry.company_name))
        || contains(entry.primary_category.as_deref())
        || contains(entry.location.as_deref())
}
