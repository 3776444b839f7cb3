//! Split partitioning.
//!
//! Three ways of assigning work to disjoint partitions:
//! - [`group_by_split`]: by a split name already present on each record
//! - [`PositionalSplit`]: by position in the image stream (train, test, val blocks)
//! - [`held_out_split`]: answers partitioned by membership in a held-out object set

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::error::DataError;

/// Record indices grouped by split name, preserving order within each group.
///
/// Groups are keyed by name in sorted order so output documents are stable.
pub fn group_by_split<'a, I>(splits: I) -> BTreeMap<String, Vec<usize>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (index, split) in splits.into_iter().enumerate() {
        groups.entry(split.to_string()).or_default().push(index);
    }
    groups
}

/// Partition used by positional splits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    Test,
    Val,
}

impl Split {
    /// Lowercase split name as used in stats keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Test => "test",
            Split::Val => "val",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Train/test/val assignment by image position.
///
/// The first `train` images go to train, the next `test` to test, the rest
/// (exactly `val`) to val. Depends only on encounter order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionalSplit {
    pub train: usize,
    pub test: usize,
    pub val: usize,
}

impl PositionalSplit {
    /// Create a split and check it covers exactly `total_images`.
    pub fn new(train: usize, test: usize, val: usize, total_images: usize) -> Result<Self, DataError> {
        let split = Self { train, test, val };
        split.validate(total_images)?;
        Ok(split)
    }

    /// Reject counts that do not sum to the corpus size.
    pub fn validate(&self, total_images: usize) -> Result<(), DataError> {
        if self.train + self.test + self.val != total_images {
            return Err(DataError::SplitCountMismatch {
                train: self.train,
                test: self.test,
                val: self.val,
                total: total_images,
            });
        }
        Ok(())
    }

    /// Partition of the image at `image_index` (0-based).
    pub fn assign(&self, image_index: usize) -> Split {
        if image_index < self.train {
            Split::Train
        } else if image_index < self.train + self.test {
            Split::Test
        } else {
            Split::Val
        }
    }
}

/// Entries written per partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SplitCounts {
    pub train: usize,
    pub test: usize,
    pub val: usize,
}

impl SplitCounts {
    /// Count one entry in `split`.
    pub fn record(&mut self, split: Split) {
        match split {
            Split::Train => self.train += 1,
            Split::Test => self.test += 1,
            Split::Val => self.val += 1,
        }
    }

    /// Entries across all partitions.
    pub fn total(&self) -> usize {
        self.train + self.test + self.val
    }
}

/// Answers partitioned by a held-out object set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeldOutSplit {
    /// Retained answers not held out, in retained order
    pub train: Vec<String>,
    /// Retained answers that are held out, in retained order
    pub test: Vec<String>,
}

/// `train = retained - held_out`, `test = retained ∩ held_out`.
///
/// Every retained answer lands in exactly one side.
pub fn held_out_split(retained: &[String], held_out: &HashSet<String>) -> HeldOutSplit {
    let (test, train): (Vec<String>, Vec<String>) = retained
        .iter()
        .cloned()
        .partition(|answer| held_out.contains(answer));
    HeldOutSplit { train, test }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_by_split_preserves_order() {
        let groups = group_by_split(["train", "val", "train", "test", "val"]);
        assert_eq!(groups["train"], vec![0, 2]);
        assert_eq!(groups["val"], vec![1, 4]);
        assert_eq!(groups["test"], vec![3]);
        assert_eq!(groups.values().map(Vec::len).sum::<usize>(), 5);
    }

    #[test]
    fn test_positional_assignment_by_image() {
        // images with 3, 2, 2, 1 entries
        let split = PositionalSplit::new(2, 1, 1, 4).unwrap();
        let entries_per_image = [3, 2, 2, 1];

        let mut counts = SplitCounts::default();
        for (image, &entries) in entries_per_image.iter().enumerate() {
            for _ in 0..entries {
                counts.record(split.assign(image));
            }
        }

        assert_eq!(counts.train, 5);
        assert_eq!(counts.test, 2);
        assert_eq!(counts.val, 1);
        assert_eq!(counts.total(), 8);
    }

    #[test]
    fn test_positional_boundaries() {
        let split = PositionalSplit { train: 2, test: 1, val: 1 };
        assert_eq!(split.assign(0), Split::Train);
        assert_eq!(split.assign(1), Split::Train);
        assert_eq!(split.assign(2), Split::Test);
        assert_eq!(split.assign(3), Split::Val);
    }

    #[test]
    fn test_positional_rejects_count_mismatch() {
        let err = PositionalSplit::new(2, 1, 1, 5).unwrap_err();
        assert!(matches!(err, DataError::SplitCountMismatch { total: 5, .. }));
    }

    #[test]
    fn test_held_out_split_is_disjoint_and_complete() {
        let retained: Vec<String> = ["yes", "zebra", "red", "bus"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let held_out: HashSet<String> = ["zebra", "bus", "pizza"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let split = held_out_split(&retained, &held_out);
        assert_eq!(split.train, vec!["yes", "red"]);
        assert_eq!(split.test, vec!["zebra", "bus"]);

        let train: HashSet<&String> = split.train.iter().collect();
        let test: HashSet<&String> = split.test.iter().collect();
        assert!(train.is_disjoint(&test));
        assert_eq!(train.len() + test.len(), retained.len());
    }

    #[test]
    fn test_held_out_split_empty_held_out() {
        let retained = vec!["a".to_string()];
        let split = held_out_split(&retained, &HashSet::new());
        assert_eq!(split.train, retained);
        assert!(split.test.is_empty());
    }

    #[test]
    fn test_split_names() {
        assert_eq!(Split::Train.to_string(), "train");
        assert_eq!(Split::Val.as_str(), "val");
    }
}
