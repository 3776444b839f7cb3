//! Dense ID assignment for retained items.
//!
//! IDs follow input order exactly. The assigner never sorts or deduplicates:
//! callers that need a global ordering (train answers before test answers)
//! build the input sequence in that order, and callers guarantee uniqueness.

use std::collections::HashMap;

use crate::error::DataError;

/// A bijection between retained strings and contiguous integer IDs.
#[derive(Debug, Clone, Default)]
pub struct IdMap {
    items: Vec<String>,
    ids: HashMap<String, usize>,
    base: usize,
}

impl IdMap {
    /// Assign IDs `0..n` by position.
    pub fn assign<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::assign_from(items, 0)
    }

    /// Assign IDs `base..base + n` by position.
    ///
    /// Detection-style indices use `base = 1`, reserving 0 for "none".
    pub fn assign_from<I, S>(items: I, base: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items: Vec<String> = items.into_iter().map(Into::into).collect();
        let ids = items
            .iter()
            .enumerate()
            .map(|(i, item)| (item.clone(), base + i))
            .collect();
        Self { items, ids, base }
    }

    /// ID of `item`, if assigned.
    pub fn id(&self, item: &str) -> Option<usize> {
        self.ids.get(item).copied()
    }

    /// Item with `id`, if in range.
    pub fn item(&self, id: usize) -> Option<&str> {
        id.checked_sub(self.base)
            .and_then(|i| self.items.get(i))
            .map(String::as_str)
    }

    /// Items in ID order.
    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// First assigned ID.
    pub fn base(&self) -> usize {
        self.base
    }

    /// Number of assigned items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing was assigned.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// `item -> id` mapping as a JSON object in ID order.
    pub fn to_json_dict(&self) -> serde_json::Map<String, serde_json::Value> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| (item.clone(), serde_json::Value::from(self.base + i)))
            .collect()
    }
}

/// Narrow an assigned index to the `i32` used by stored datasets.
pub fn dataset_id(item: &str, id: usize) -> Result<i32, DataError> {
    i32::try_from(id).map_err(|_| DataError::IdOutOfRange {
        item: item.to_string(),
        id,
    })
}
