//! End-to-end preprocessing jobs.
//!
//! - **relationships**: predicate filtering, packing, and the structured store
//! - **vocab**: caption splits, question/answer vocabulary, answer dictionary
//!
//! Each job validates its inputs and destinations before writing anything,
//! runs in a single pass over an in-memory corpus, and either publishes every
//! output or none.

pub mod relationships;
pub mod vocab;

pub use relationships::{RelationshipJob, RelationshipOptions, RelationshipStats, RelationshipSummary};
pub use vocab::{AnswerDictionary, VocabJob, VocabOptions, VocabSummary};

use std::path::Path;

use crate::error::{ConfigError, Result, StoreError, VlmapError};

/// Fail with [`ConfigError::MissingInput`] for the first input that does not exist.
pub(crate) fn require_inputs<'a>(paths: impl IntoIterator<Item = &'a Path>) -> Result<()> {
    for path in paths {
        if !path.exists() {
            return Err(ConfigError::MissingInput(path.to_path_buf()).into());
        }
    }
    Ok(())
}

/// Create `dir` exclusively; an existing directory is a configuration error.
pub(crate) fn create_output_dir(dir: &Path) -> Result<()> {
    if let Some(parent) = dir.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    match std::fs::create_dir(dir) {
        Ok(()) => {
            tracing::info!("Created output directory {:?}", dir);
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            Err(ConfigError::DestinationExists(dir.to_path_buf()).into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Store errors as jobs report them: an existing container is a
/// configuration problem like any other existing destination.
pub(crate) fn store_error(err: StoreError) -> VlmapError {
    match err {
        StoreError::AlreadyExists(path) => ConfigError::DestinationExists(path).into(),
        other => other.into(),
    }
}
