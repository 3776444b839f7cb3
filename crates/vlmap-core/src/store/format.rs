//! On-disk layout of the structured store.
//!
//! ```text
//! header:    "VLMSTORE" | version: u32 LE
//! payload:   bincode(Dataset) ...
//! directory: bincode(Directory)
//! footer:    directory offset: u64 LE | directory length: u64 LE | "VLMSTORE"
//! ```
//!
//! The footer is written last, so a truncated file never carries a valid one.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{StoreError, StoreResult};

pub(crate) const MAGIC: [u8; 8] = *b"VLMSTORE";
pub(crate) const VERSION: u32 = 1;
pub(crate) const HEADER_LEN: u64 = 12;
pub(crate) const FOOTER_LEN: u64 = 24;

/// A value stored under a dataset path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dataset {
    /// Integer scalar
    Scalar(i64),
    /// UTF-8 string
    Text(String),
    /// 1-D integer array
    Vector(Vec<i32>),
    /// 2-D integer array, row-major
    Matrix {
        rows: usize,
        cols: usize,
        data: Vec<i32>,
    },
}

impl Dataset {
    /// Short name of the value kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Dataset::Scalar(_) => "scalar",
            Dataset::Text(_) => "text",
            Dataset::Vector(_) => "vector",
            Dataset::Matrix { .. } => "matrix",
        }
    }
}

impl fmt::Display for Dataset {
    /// Scalars and text verbatim, arrays as nested lists.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dataset::Scalar(v) => write!(f, "{}", v),
            Dataset::Text(v) => f.write_str(v),
            Dataset::Vector(v) => write!(f, "{:?}", v),
            Dataset::Matrix { cols, data, .. } => {
                f.write_str("[")?;
                for (i, row) in data.chunks((*cols).max(1)).enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{:?}", row)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<i64> for Dataset {
    fn from(value: i64) -> Self {
        Dataset::Scalar(value)
    }
}

impl From<usize> for Dataset {
    fn from(value: usize) -> Self {
        Dataset::Scalar(value as i64)
    }
}

impl From<String> for Dataset {
    fn from(value: String) -> Self {
        Dataset::Text(value)
    }
}

impl From<Vec<i32>> for Dataset {
    fn from(value: Vec<i32>) -> Self {
        Dataset::Vector(value)
    }
}

/// Location of one encoded dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct DirectoryEntry {
    pub path: String,
    pub offset: u64,
    pub len: u64,
}

/// Every group and dataset in the container, sorted by path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Directory {
    pub groups: Vec<String>,
    pub datasets: Vec<DirectoryEntry>,
}

/// Join a group path and a child name.
pub fn join(group: &str, name: &str) -> String {
    if group.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", group, name)
    }
}

/// Parent group of a path (`""` for top-level entries).
pub(crate) fn parent(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(parent, _)| parent)
}

/// Reject empty paths and empty path segments.
pub(crate) fn check_path(path: &str) -> StoreResult<()> {
    if path.is_empty() || path.split('/').any(str::is_empty) {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(())
}

pub(crate) fn header() -> [u8; HEADER_LEN as usize] {
    let mut buf = [0u8; HEADER_LEN as usize];
    buf[..8].copy_from_slice(&MAGIC);
    buf[8..].copy_from_slice(&VERSION.to_le_bytes());
    buf
}

pub(crate) fn footer(directory_offset: u64, directory_len: u64) -> [u8; FOOTER_LEN as usize] {
    let mut buf = [0u8; FOOTER_LEN as usize];
    buf[..8].copy_from_slice(&directory_offset.to_le_bytes());
    buf[8..16].copy_from_slice(&directory_len.to_le_bytes());
    buf[16..].copy_from_slice(&MAGIC);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_and_parent() {
        assert_eq!(join("", "data_info"), "data_info");
        assert_eq!(join("12", "rel"), "12/rel");
        assert_eq!(parent("12/rel/names"), "12/rel");
        assert_eq!(parent("data_info"), "");
    }

    #[test]
    fn test_display() {
        let matrix = Dataset::Matrix {
            rows: 2,
            cols: 3,
            data: vec![4, 5, 0, 6, 0, 0],
        };
        assert_eq!(matrix.to_string(), "[[4, 5, 0], [6, 0, 0]]");
        assert_eq!(Dataset::Vector(vec![2, 1]).to_string(), "[2, 1]");
        assert_eq!(Dataset::Scalar(-3).to_string(), "-3");
    }

    #[test]
    fn test_check_path() {
        assert!(check_path("a/b").is_ok());
        assert!(check_path("").is_err());
        assert!(check_path("a//b").is_err());
        assert!(check_path("/a").is_err());
    }

    #[test]
    fn test_header_and_footer_layout() {
        let h = header();
        assert_eq!(&h[..8], b"VLMSTORE");
        assert_eq!(u32::from_le_bytes([h[8], h[9], h[10], h[11]]), VERSION);

        let f = footer(100, 42);
        assert_eq!(&f[16..], b"VLMSTORE");
        assert_eq!(u64::from_le_bytes(f[..8].try_into().unwrap()), 100);
        assert_eq!(u64::from_le_bytes(f[8..16].try_into().unwrap()), 42);
    }

    #[test]
    fn test_dataset_kinds() {
        assert_eq!(Dataset::from(3usize).kind(), "scalar");
        assert_eq!(Dataset::from(vec![1, 2]).kind(), "vector");
        assert_eq!(Dataset::from("x".to_string()).kind(), "text");
    }
}
