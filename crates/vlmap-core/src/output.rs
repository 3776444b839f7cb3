//! Plain-text and JSON side outputs.
//!
//! Every output file is staged in a temporary file next to its destination and
//! published with a no-clobber rename once complete. A job that fails midway
//! leaves nothing at the destination, and an existing destination is never
//! replaced.

use serde::Serialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::{ConfigError, DataError, Result, VlmapError};

/// A file being written that only appears at its destination on `commit()`.
pub struct StagedFile {
    writer: BufWriter<NamedTempFile>,
    dest: PathBuf,
}

impl StagedFile {
    /// Stage a new file for `dest`.
    ///
    /// Fails with [`ConfigError::DestinationExists`] if `dest` already exists.
    pub fn create(dest: &Path) -> Result<Self> {
        if dest.exists() {
            return Err(ConfigError::DestinationExists(dest.to_path_buf()).into());
        }
        let parent = match dest.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let temp = NamedTempFile::new_in(parent)?;
        Ok(Self {
            writer: BufWriter::new(temp),
            dest: dest.to_path_buf(),
        })
    }

    /// Destination the file will be published to.
    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Flush and publish the file, refusing to replace an existing destination.
    pub fn commit(self) -> Result<PathBuf> {
        let temp = self.writer.into_inner().map_err(|e| e.into_error())?;
        temp.as_file().sync_all()?;
        match temp.persist_noclobber(&self.dest) {
            Ok(_) => Ok(self.dest),
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                Err(ConfigError::DestinationExists(self.dest).into())
            }
            Err(e) => Err(VlmapError::Io(e.error)),
        }
    }
}

impl Write for StagedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Fail if any of the destinations already exists.
///
/// Jobs call this before producing anything so that a collision aborts the
/// run with no partial output.
pub fn ensure_absent<'a>(paths: impl IntoIterator<Item = &'a Path>) -> Result<()> {
    for path in paths {
        if path.exists() {
            return Err(ConfigError::DestinationExists(path.to_path_buf()).into());
        }
    }
    Ok(())
}

/// Serialize `item` as JSON into a staged file, ready to commit.
pub fn stage_json<T: Serialize>(dest: &Path, item: &T, pretty: bool) -> Result<StagedFile> {
    let mut file = StagedFile::create(dest)?;
    if pretty {
        serde_json::to_writer_pretty(&mut file, item)?;
    } else {
        serde_json::to_writer(&mut file, item)?;
    }
    writeln!(file)?;
    Ok(file)
}

/// Serialize `item` as JSON to a new file.
pub fn write_json<T: Serialize>(dest: &Path, item: &T, pretty: bool) -> Result<PathBuf> {
    stage_json(dest, item, pretty)?.commit()
}

/// Write one line per item into a staged file, ready to commit.
pub fn stage_lines<I, S>(dest: &Path, lines: I) -> Result<StagedFile>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut file = StagedFile::create(dest)?;
    for line in lines {
        writeln!(file, "{}", line.as_ref())?;
    }
    Ok(file)
}

/// Write one line per item to a new file.
pub fn write_lines<I, S>(dest: &Path, lines: I) -> Result<PathBuf>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    stage_lines(dest, lines)?.commit()
}

/// Commit every staged file in order, or none of them.
///
/// If a commit fails, files already published by this call are removed again
/// before the error is returned.
pub fn commit_all(
    files: impl IntoIterator<Item = StagedFile>,
    mut on_commit: impl FnMut(&Path),
) -> Result<Vec<PathBuf>> {
    let mut published = Vec::new();
    for file in files {
        match file.commit() {
            Ok(path) => {
                on_commit(&path);
                published.push(path);
            }
            Err(e) => {
                remove_published(&published);
                return Err(e);
            }
        }
    }
    Ok(published)
}

/// Best-effort removal of outputs published by a run that then failed.
pub fn remove_published(paths: &[PathBuf]) {
    for path in paths {
        match std::fs::remove_file(path) {
            Ok(()) => tracing::debug!("Removed {:?} after failure", path),
            Err(e) => tracing::warn!("Could not remove {:?} after failure: {e}", path),
        }
    }
}

/// One `(parent_id, record_name)` line of the record index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub parent_id: i64,
    pub record_name: String,
}

/// Newline-delimited record index, written as records are stored.
pub struct IndexWriter {
    file: StagedFile,
    entries: usize,
}

impl IndexWriter {
    /// Stage a new index file.
    pub fn create(dest: &Path) -> Result<Self> {
        Ok(Self {
            file: StagedFile::create(dest)?,
            entries: 0,
        })
    }

    /// Append one record.
    pub fn append(&mut self, parent_id: i64, record_name: &str) -> Result<()> {
        writeln!(self.file, "{} {}", parent_id, record_name)?;
        self.entries += 1;
        Ok(())
    }

    /// Number of records appended so far.
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Publish the index.
    pub fn commit(self) -> Result<PathBuf> {
        self.file.commit()
    }

    /// The complete index as a staged file, for publishing alongside others.
    pub fn into_staged(self) -> StagedFile {
        self.file
    }
}

/// Read a record index written by [`IndexWriter`].
pub fn read_index(path: &Path) -> Result<Vec<IndexEntry>> {
    let reader = BufReader::new(File::open(path)?);
    let mut entries = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let parsed = line
            .split_once(' ')
            .and_then(|(id, name)| Some((id.parse::<i64>().ok()?, name)));
        let Some((parent_id, record_name)) = parsed else {
            return Err(invalid(path, format!("malformed index line {}", line_no + 1)));
        };
        entries.push(IndexEntry {
            parent_id,
            record_name: record_name.to_string(),
        });
    }
    Ok(entries)
}

/// Stage `key: value` lines for a new stats file.
pub fn stage_stats(dest: &Path, stats: &[(&str, String)]) -> Result<StagedFile> {
    stage_lines(dest, stats.iter().map(|(k, v)| format!("{}: {}", k, v)))
}

/// Write `key: value` lines to a new stats file.
pub fn write_stats(dest: &Path, stats: &[(&str, String)]) -> Result<PathBuf> {
    stage_stats(dest, stats)?.commit()
}

/// Read a `key: value` stats file, preserving line order.
pub fn read_stats(path: &Path) -> Result<Vec<(String, String)>> {
    let content = std::fs::read_to_string(path)?;
    content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .enumerate()
        .map(|(i, line)| {
            line.split_once(": ")
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .ok_or_else(|| invalid(path, format!("malformed stats line {}", i + 1)))
        })
        .collect()
}

fn invalid(path: &Path, message: String) -> VlmapError {
    DataError::InvalidInput {
        path: path.to_path_buf(),
        message,
    }
    .into()
}
