//! Exclusive, append-only store construction.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{StoreError, StoreResult};

use super::format::{self, Dataset, Directory, DirectoryEntry};

/// Builds a store in a staging file and publishes it on [`finish`](Self::finish).
///
/// Dropping the writer without finishing discards everything written.
/// [`finalize`](Self::finalize) completes the file without publishing it.
pub struct StoreWriter {
    file: BufWriter<NamedTempFile>,
    dest: PathBuf,
    offset: u64,
    groups: BTreeSet<String>,
    datasets: BTreeMap<String, (u64, u64)>,
}

impl StoreWriter {
    /// Start a new store at `dest`.
    ///
    /// Fails with [`StoreError::AlreadyExists`] if anything is already at
    /// `dest`; the existing path is left untouched. Jobs report this as
    /// [`ConfigError::DestinationExists`](crate::error::ConfigError::DestinationExists).
    pub fn create(dest: &Path) -> StoreResult<Self> {
        if dest.exists() {
            return Err(StoreError::AlreadyExists(dest.to_path_buf()));
        }
        let parent = match dest.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut file = BufWriter::new(NamedTempFile::new_in(parent)?);
        file.write_all(&format::header())?;

        tracing::debug!("Staging store for {:?}", dest);
        Ok(Self {
            file,
            dest: dest.to_path_buf(),
            offset: format::HEADER_LEN,
            groups: BTreeSet::new(),
            datasets: BTreeMap::new(),
        })
    }

    /// Create a group; missing ancestors are created along with it.
    pub fn create_group(&mut self, path: &str) -> StoreResult<()> {
        format::check_path(path)?;
        if self.groups.contains(path) || self.datasets.contains_key(path) {
            return Err(StoreError::Duplicate(path.to_string()));
        }
        self.ensure_ancestors(path)?;
        self.groups.insert(path.to_string());
        Ok(())
    }

    /// Whether a group exists.
    pub fn has_group(&self, path: &str) -> bool {
        self.groups.contains(path)
    }

    /// Write a dataset; its parent groups are created if missing.
    pub fn write(&mut self, path: &str, dataset: impl Into<Dataset>) -> StoreResult<()> {
        format::check_path(path)?;
        if self.groups.contains(path) || self.datasets.contains_key(path) {
            return Err(StoreError::Duplicate(path.to_string()));
        }
        self.ensure_ancestors(path)?;

        let bytes = bincode::serialize(&dataset.into())?;
        self.file.write_all(&bytes)?;
        self.datasets
            .insert(path.to_string(), (self.offset, bytes.len() as u64));
        self.offset += bytes.len() as u64;
        Ok(())
    }

    /// Number of datasets written so far.
    pub fn dataset_count(&self) -> usize {
        self.datasets.len()
    }

    /// Write the directory and footer, then publish the store.
    pub fn finish(self) -> StoreResult<PathBuf> {
        self.finalize()?.persist()
    }

    /// Write the directory and footer and sync the staging file.
    ///
    /// Nothing appears at the destination until [`FinishedStore::persist`],
    /// so callers can stage other outputs before publishing any of them.
    pub fn finalize(mut self) -> StoreResult<FinishedStore> {
        let directory = Directory {
            groups: self.groups.iter().cloned().collect(),
            datasets: self
                .datasets
                .iter()
                .map(|(path, &(offset, len))| DirectoryEntry {
                    path: path.clone(),
                    offset,
                    len,
                })
                .collect(),
        };
        let bytes = bincode::serialize(&directory)?;
        self.file.write_all(&bytes)?;
        self.file
            .write_all(&format::footer(self.offset, bytes.len() as u64))?;

        let temp = self.file.into_inner().map_err(|e| e.into_error())?;
        temp.as_file().sync_all()?;
        Ok(FinishedStore {
            temp,
            dest: self.dest,
            groups: directory.groups.len(),
            datasets: directory.datasets.len(),
            size: self.offset + bytes.len() as u64 + format::FOOTER_LEN,
        })
    }

    fn ensure_ancestors(&mut self, path: &str) -> StoreResult<()> {
        let mut group = format::parent(path);
        while !group.is_empty() {
            if self.datasets.contains_key(group) {
                return Err(StoreError::TypeMismatch {
                    name: group.to_string(),
                    expected: "group",
                });
            }
            if !self.groups.insert(group.to_string()) {
                break;
            }
            group = format::parent(group);
        }
        Ok(())
    }
}

/// A complete store, synced to its staging file and not yet published.
///
/// Dropping it discards the store.
pub struct FinishedStore {
    temp: NamedTempFile,
    dest: PathBuf,
    groups: usize,
    datasets: usize,
    size: u64,
}

impl FinishedStore {
    /// Destination the store will be published to.
    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Rename the store into place, refusing to replace an existing path.
    pub fn persist(self) -> StoreResult<PathBuf> {
        match self.temp.persist_noclobber(&self.dest) {
            Ok(_) => {}
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                return Err(StoreError::AlreadyExists(self.dest));
            }
            Err(e) => return Err(StoreError::Io(e.error)),
        }

        tracing::info!(
            "Store written to {:?} ({} groups, {} datasets, {:.1} MB)",
            self.dest,
            self.groups,
            self.datasets,
            self.size as f64 / 1_000_000.0
        );
        Ok(self.dest)
    }
}
