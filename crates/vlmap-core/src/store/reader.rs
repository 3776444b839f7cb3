//! Random-access store reading.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::{StoreError, StoreResult};

use super::format::{self, Dataset, Directory};

/// Read-only view of a finished store.
pub struct StoreReader {
    file: BufReader<File>,
    path: PathBuf,
    groups: BTreeSet<String>,
    datasets: BTreeMap<String, (u64, u64)>,
}

impl StoreReader {
    /// Open a store and load its directory.
    ///
    /// Truncated or foreign files are rejected as corrupt.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let mut file = BufReader::new(File::open(path)?);
        let file_len = file.get_ref().metadata()?.len();
        let corrupt = |message: String| StoreError::Corrupt {
            path: path.to_path_buf(),
            message,
        };

        if file_len < format::HEADER_LEN + format::FOOTER_LEN {
            return Err(corrupt(format!("file too short ({} bytes)", file_len)));
        }

        let mut header = [0u8; format::HEADER_LEN as usize];
        file.read_exact(&mut header)?;
        if header[..8] != format::MAGIC {
            return Err(corrupt("bad header magic".to_string()));
        }
        let version = u32::from_le_bytes([header[8], header[9], header[10], header[11]]);
        if version != format::VERSION {
            return Err(corrupt(format!("unsupported version {}", version)));
        }

        let mut footer = [0u8; format::FOOTER_LEN as usize];
        file.seek(SeekFrom::Start(file_len - format::FOOTER_LEN))?;
        file.read_exact(&mut footer)?;
        if footer[16..] != format::MAGIC {
            return Err(corrupt("missing footer (incomplete write?)".to_string()));
        }
        let mut word = [0u8; 8];
        word.copy_from_slice(&footer[..8]);
        let dir_offset = u64::from_le_bytes(word);
        word.copy_from_slice(&footer[8..16]);
        let dir_len = u64::from_le_bytes(word);
        if dir_offset < format::HEADER_LEN
            || dir_offset.saturating_add(dir_len) != file_len - format::FOOTER_LEN
        {
            return Err(corrupt("directory bounds out of range".to_string()));
        }

        let mut bytes = vec![0u8; dir_len as usize];
        file.seek(SeekFrom::Start(dir_offset))?;
        file.read_exact(&mut bytes)?;
        let directory: Directory = bincode::deserialize(&bytes)
            .map_err(|e| corrupt(format!("unreadable directory: {}", e)))?;

        let mut datasets = BTreeMap::new();
        for entry in directory.datasets {
            if entry.offset < format::HEADER_LEN || entry.offset.saturating_add(entry.len) > dir_offset {
                return Err(corrupt(format!("dataset {} out of range", entry.path)));
            }
            datasets.insert(entry.path, (entry.offset, entry.len));
        }

        tracing::debug!(
            "Opened store {:?}: {} groups, {} datasets",
            path,
            directory.groups.len(),
            datasets.len()
        );

        Ok(Self {
            file,
            path: path.to_path_buf(),
            groups: directory.groups.into_iter().collect(),
            datasets,
        })
    }

    /// Path the store was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether `path` names a group.
    pub fn has_group(&self, path: &str) -> bool {
        self.groups.contains(path)
    }

    /// Whether `path` names a dataset.
    pub fn has_dataset(&self, path: &str) -> bool {
        self.datasets.contains_key(path)
    }

    /// Names of the direct children (groups and datasets) of `group`.
    ///
    /// Use `""` for the top level.
    pub fn children(&self, group: &str) -> Vec<String> {
        let mut names: BTreeSet<String> = BTreeSet::new();
        let child_names = self
            .groups
            .iter()
            .map(String::as_str)
            .chain(self.datasets.keys().map(String::as_str))
            .filter(|p| format::parent(p) == group)
            .map(|p| p.rsplit('/').next().unwrap_or(p).to_string());
        names.extend(child_names);
        names.into_iter().collect()
    }

    /// Top-level group names.
    pub fn top_level_groups(&self) -> Vec<String> {
        self.groups
            .iter()
            .filter(|g| !g.contains('/'))
            .cloned()
            .collect()
    }

    /// Read any dataset.
    pub fn read(&mut self, path: &str) -> StoreResult<Dataset> {
        let &(offset, len) = self
            .datasets
            .get(path)
            .ok_or_else(|| StoreError::MissingDataset(path.to_string()))?;
        let mut bytes = vec![0u8; len as usize];
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(&mut bytes)?;
        bincode::deserialize(&bytes).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            message: format!("unreadable dataset {}: {}", path, e),
        })
    }

    /// Read an integer scalar.
    pub fn read_scalar(&mut self, path: &str) -> StoreResult<i64> {
        match self.read(path)? {
            Dataset::Scalar(v) => Ok(v),
            _ => Err(mismatch(path, "scalar")),
        }
    }

    /// Read a string.
    pub fn read_text(&mut self, path: &str) -> StoreResult<String> {
        match self.read(path)? {
            Dataset::Text(v) => Ok(v),
            _ => Err(mismatch(path, "text")),
        }
    }

    /// Read a 1-D integer array.
    pub fn read_vector(&mut self, path: &str) -> StoreResult<Vec<i32>> {
        match self.read(path)? {
            Dataset::Vector(v) => Ok(v),
            _ => Err(mismatch(path, "vector")),
        }
    }

    /// Read a 2-D integer array as `(rows, cols, row-major data)`.
    pub fn read_matrix(&mut self, path: &str) -> StoreResult<(usize, usize, Vec<i32>)> {
        match self.read(path)? {
            Dataset::Matrix { rows, cols, data } => Ok((rows, cols, data)),
            _ => Err(mismatch(path, "matrix")),
        }
    }
}

fn mismatch(path: &str, expected: &'static str) -> StoreError {
    StoreError::TypeMismatch {
        name: path.to_string(),
        expected,
    }
}
