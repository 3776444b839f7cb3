//! Fixed-width packing of variable-length ID sequences.
//!
//! A group of sequences becomes a row-major `rows x width` matrix, zero-padded
//! past each row's length, plus a parallel vector of true lengths. Each group
//! keeps its own width; [`PackStats`] only tracks the maxima seen across groups
//! for reporting.

use crate::store::Dataset;

/// A zero-padded matrix of sequences with their true lengths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedSequences {
    data: Vec<i32>,
    lengths: Vec<i32>,
    width: usize,
}

impl PackedSequences {
    /// Pack sequences at the group's own maximum length.
    pub fn pack<S: AsRef<[i32]>>(sequences: &[S]) -> Self {
        Self::pack_min_width(sequences, 0)
    }

    /// Pack sequences at `max(min_width, longest sequence)` columns.
    pub fn pack_min_width<S: AsRef<[i32]>>(sequences: &[S], min_width: usize) -> Self {
        let width = sequences
            .iter()
            .map(|s| s.as_ref().len())
            .max()
            .unwrap_or(0)
            .max(min_width);

        let mut data = vec![0i32; sequences.len() * width];
        for (i, seq) in sequences.iter().enumerate() {
            let seq = seq.as_ref();
            let start = i * width;
            data[start..start + seq.len()].copy_from_slice(seq);
        }
        let lengths = sequences
            .iter()
            .map(|s| s.as_ref().len() as i32)
            .collect();

        Self {
            data,
            lengths,
            width,
        }
    }

    /// Number of packed sequences.
    pub fn rows(&self) -> usize {
        self.lengths.len()
    }

    /// Column count (longest sequence, or the requested minimum).
    pub fn width(&self) -> usize {
        self.width
    }

    /// True lengths, one per row.
    pub fn lengths(&self) -> &[i32] {
        &self.lengths
    }

    /// Full padded row `i`.
    pub fn row(&self, i: usize) -> &[i32] {
        &self.data[i * self.width..(i + 1) * self.width]
    }

    /// Row `i` truncated to its true length.
    pub fn sequence(&self, i: usize) -> &[i32] {
        &self.row(i)[..self.lengths[i] as usize]
    }

    /// Whether the group holds no sequences.
    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    /// The padded matrix as a store dataset.
    pub fn matrix_dataset(&self) -> Dataset {
        Dataset::Matrix {
            rows: self.rows(),
            cols: self.width,
            data: self.data.clone(),
        }
    }

    /// The lengths as a store dataset.
    pub fn lengths_dataset(&self) -> Dataset {
        Dataset::Vector(self.lengths.clone())
    }
}

/// Running maxima over every group written to one store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackStats {
    /// Most rows in any group
    pub max_rows: usize,
    /// Widest group
    pub max_width: usize,
}

impl PackStats {
    /// Fold one group into the maxima.
    pub fn observe(&mut self, packed: &PackedSequences) {
        self.max_rows = self.max_rows.max(packed.rows());
        self.max_width = self.max_width.max(packed.width());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_pads_with_zero() {
        let packed = PackedSequences::pack(&[vec![4, 5, 6], vec![7], vec![8, 9]]);
        assert_eq!(packed.rows(), 3);
        assert_eq!(packed.width(), 3);
        assert_eq!(packed.row(0), &[4, 5, 6]);
        assert_eq!(packed.row(1), &[7, 0, 0]);
        assert_eq!(packed.row(2), &[8, 9, 0]);
        assert_eq!(packed.lengths(), &[3, 1, 2]);
    }

    #[test]
    fn test_sequence_round_trip_and_zero_tail() {
        let input = vec![vec![3, 1], vec![2, 2, 2, 2], vec![9]];
        let packed = PackedSequences::pack(&input);
        for (i, original) in input.iter().enumerate() {
            assert_eq!(packed.sequence(i), original.as_slice());
            let len = packed.lengths()[i] as usize;
            assert!(packed.row(i)[len..].iter().all(|&v| v == 0));
        }
    }

    #[test]
    fn test_min_width_widens_but_never_truncates() {
        let packed = PackedSequences::pack_min_width(&[vec![1, 2]], 4);
        assert_eq!(packed.width(), 4);
        assert_eq!(packed.row(0), &[1, 2, 0, 0]);

        let packed = PackedSequences::pack_min_width(&[vec![1, 2, 3]], 1);
        assert_eq!(packed.width(), 3);
    }

    #[test]
    fn test_empty_group() {
        let packed = PackedSequences::pack::<Vec<i32>>(&[]);
        assert!(packed.is_empty());
        assert_eq!(packed.width(), 0);
    }

    #[test]
    fn test_zero_length_sequences() {
        let packed = PackedSequences::pack(&[Vec::<i32>::new(), Vec::new()]);
        assert_eq!(packed.rows(), 2);
        assert_eq!(packed.width(), 0);
        assert_eq!(packed.lengths(), &[0, 0]);
        assert!(packed.sequence(1).is_empty());
    }

    #[test]
    fn test_stats_do_not_widen_earlier_groups() {
        let mut stats = PackStats::default();
        let first = PackedSequences::pack(&[vec![1]]);
        stats.observe(&first);
        let second = PackedSequences::pack(&[vec![1, 2, 3], vec![4]]);
        stats.observe(&second);

        assert_eq!(first.width(), 1);
        assert_eq!(stats.max_width, 3);
        assert_eq!(stats.max_rows, 2);
    }

    #[test]
    fn test_matrix_dataset_shape() {
        let packed = PackedSequences::pack(&[vec![1, 2], vec![3]]);
        match packed.matrix_dataset() {
            Dataset::Matrix { rows, cols, data } => {
                assert_eq!((rows, cols), (2, 2));
                assert_eq!(data, vec![1, 2, 3, 0]);
            }
            other => panic!("unexpected dataset: {other:?}"),
        }
    }
}
