//! Error types for the vlmap preprocessing pipeline.
//!
//! Errors are grouped by concern so the CLI can tell a bad invocation
//! (configuration) apart from corrupt inputs (data) and container problems
//! (store). Every error is fatal: the jobs are one-shot and never retry.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for vlmap operations.
#[derive(Error, Debug)]
pub enum VlmapError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Input data inconsistencies and violated invariants
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// Structured store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// An output destination already exists and will not be overwritten
    #[error("Destination already exists: {0} (refusing to overwrite)")]
    DestinationExists(PathBuf),

    /// A required input file is missing
    #[error("Required input not found: {0}")]
    MissingInput(PathBuf),
}

/// Data consistency errors raised while transforming a corpus.
#[derive(Error, Debug)]
pub enum DataError {
    /// A retained item still contains a token outside the vocabulary.
    ///
    /// The frequency filter rejects such items, so this signals a logic bug.
    #[error("Internal invariant violated: retained item {item:?} contains out-of-vocabulary token {token:?}")]
    OutOfVocabulary { item: String, token: String },

    /// Positional split counts do not cover the corpus exactly
    #[error("Split counts train={train} + test={test} + val={val} do not match {total} images")]
    SplitCountMismatch {
        train: usize,
        test: usize,
        val: usize,
        total: usize,
    },

    /// An assigned index does not fit the 32-bit integers stored in datasets
    #[error("Index {id} of {item:?} exceeds the 32-bit dataset range")]
    IdOutOfRange { item: String, id: usize },

    /// An input document is structurally unusable
    #[error("Invalid input {path}: {message}")]
    InvalidInput { path: PathBuf, message: String },
}

/// Structured store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The container path already exists
    #[error("Store already exists: {0}")]
    AlreadyExists(PathBuf),

    /// The container is truncated or was not written by this library
    #[error("Corrupt store {path}: {message}")]
    Corrupt { path: PathBuf, message: String },

    /// A dataset or group path was not found
    #[error("No such dataset: {0}")]
    MissingDataset(String),

    /// A dataset or group path is empty or has an empty segment
    #[error("Invalid store path: {0:?}")]
    InvalidPath(String),

    /// A dataset or group path was written twice
    #[error("Duplicate dataset or group: {0}")]
    Duplicate(String),

    /// A dataset exists but holds a different kind of value
    #[error("Dataset {name} is not a {expected}")]
    TypeMismatch { name: String, expected: &'static str },

    /// Dataset encoding failed
    #[error("Encoding error: {0}")]
    Encode(#[from] bincode::Error),

    /// I/O failure while reading or writing the container
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for vlmap results.
pub type Result<T> = std::result::Result<T, VlmapError>;

/// Convenience type alias for store-specific results.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
