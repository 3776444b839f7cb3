//! Sub-configuration structs with defaults for the standard dataset layout.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Root directory that dataset output directories are created under
    pub output_root: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("preprocessed"),
        }
    }
}

/// Vocabulary store locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabularyConfig {
    /// Pre-built word-embedding vocabulary (`{"vocab": [...], "dict": {...}}`)
    pub glove_vocab_path: PathBuf,

    /// Vocabulary used to encode relationship names
    pub vocab_path: PathBuf,
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            glove_vocab_path: PathBuf::from("data/preprocessed/glove_vocab.json"),
            vocab_path: PathBuf::from("preprocessed/vocab.json"),
        }
    }
}

/// Caption corpus locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionsConfig {
    /// Directory holding per-split annotation inputs and receiving vocab outputs
    pub split_dir: PathBuf,

    /// Caption dictionary with image split metadata
    pub dic_path: PathBuf,
}

impl Default for CaptionsConfig {
    fn default() -> Self {
        Self {
            split_dir: PathBuf::from("data/preprocessed/coco/standard"),
            dic_path: PathBuf::from("data/COCO/dic_coco.json"),
        }
    }
}

/// Answer-set construction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswersConfig {
    /// Maximum number of answers kept after frequency sorting
    pub answer_set_limit: usize,

    /// Maximum number of tokens in a kept answer
    pub max_answer_len: usize,
}

impl Default for AnswersConfig {
    fn default() -> Self {
        Self {
            answer_set_limit: 3000,
            max_answer_len: 3,
        }
    }
}

/// Relationship dataset settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipsConfig {
    /// Directory containing `relationships.json`
    pub annotations_dir: PathBuf,

    /// Output directory name (suffixed with `_min_occ<N>`)
    pub dir_name: String,

    /// Minimum corpus occurrences for a predicate to be kept
    pub min_occurrence: usize,

    /// Leading images assigned to the train split
    pub num_train_image: usize,

    /// Images after the train block assigned to the test split
    pub num_test_image: usize,

    /// Trailing images assigned to the val split
    pub num_val_image: usize,
}

impl Default for RelationshipsConfig {
    fn default() -> Self {
        Self {
            annotations_dir: PathBuf::from("VisualGenome/annotations"),
            dir_name: "relationships".to_string(),
            min_occurrence: 20,
            num_train_image: 80000,
            num_test_image: 18077,
            num_val_image: 10000,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
