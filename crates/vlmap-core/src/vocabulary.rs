//! Vocabulary store: token string to dense index, and back.
//!
//! Vocabularies are JSON documents of the form
//! `{"vocab": ["yes", "no", ...], "dict": {"yes": 0, "no": 1, ...}}`.
//! A token is "in vocabulary" exactly when it is a key of the mapping.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::error::{ConfigError, DataError, Result};
use crate::ids;
use crate::output;
use crate::text;

#[derive(Deserialize)]
struct VocabularyFile {
    vocab: Vec<String>,
    #[serde(default)]
    dict: Option<HashMap<String, usize>>,
}

/// A read-only token vocabulary.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    tokens: Vec<String>,
    by_token: HashMap<String, usize>,
}

impl Vocabulary {
    /// Load a vocabulary document.
    ///
    /// When the document carries a `dict`, it must agree with the positions in
    /// `vocab`; a mismatch is rejected rather than guessed around.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::MissingInput(path.to_path_buf()).into());
        }
        let content = std::fs::read_to_string(path)?;
        let file: VocabularyFile = serde_json::from_str(&content)?;

        let vocabulary = Self::from_tokens(file.vocab);
        if vocabulary.by_token.len() != vocabulary.tokens.len() {
            return Err(invalid(path, "duplicate tokens in \"vocab\"".to_string()));
        }
        if let Some(dict) = file.dict {
            if dict.len() != vocabulary.len() {
                return Err(invalid(
                    path,
                    format!(
                        "\"dict\" has {} entries but \"vocab\" has {}",
                        dict.len(),
                        vocabulary.len()
                    ),
                ));
            }
            for (token, &index) in &dict {
                if vocabulary.index_of(token) != Some(index) {
                    return Err(invalid(
                        path,
                        format!("\"dict\" maps {:?} to {} which disagrees with \"vocab\"", token, index),
                    ));
                }
            }
        }

        tracing::info!("Loaded vocabulary: {} tokens from {:?}", vocabulary.len(), path);
        Ok(vocabulary)
    }

    /// Build a vocabulary whose indices are the token positions.
    ///
    /// If a token repeats, its last position wins; callers pass distinct tokens.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        let by_token = tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();
        Self { tokens, by_token }
    }

    /// Whether `token` is in the vocabulary.
    pub fn contains(&self, token: &str) -> bool {
        self.by_token.contains_key(token)
    }

    /// Index of `token`, if present.
    pub fn index_of(&self, token: &str) -> Option<usize> {
        self.by_token.get(token).copied()
    }

    /// Token at `index`, if in range.
    pub fn token(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    /// All tokens in index order.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the vocabulary is empty.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// First token of a normalized name that is not in the vocabulary.
    pub fn first_missing<'a>(&self, name: &'a str) -> Option<&'a str> {
        text::tokens(name).find(|t| !self.contains(t))
    }

    /// Whether every token of a normalized name is in the vocabulary.
    pub fn covers(&self, name: &str) -> bool {
        self.first_missing(name).is_none()
    }

    /// Map a normalized name to its token indices.
    ///
    /// Encoding a name with an out-of-vocabulary token is an invariant
    /// violation: callers only encode names that passed the filter.
    pub fn encode(&self, name: &str) -> std::result::Result<Vec<i32>, DataError> {
        text::tokens(name)
            .map(|t| {
                let index = self
                    .index_of(t)
                    .ok_or_else(|| DataError::OutOfVocabulary {
                        item: name.to_string(),
                        token: t.to_string(),
                    })?;
                ids::dataset_id(t, index)
            })
            .collect()
    }

    /// Map token indices back to a space-joined name.
    pub fn decode(&self, ids: &[i32]) -> Option<String> {
        let tokens: Option<Vec<&str>> = ids
            .iter()
            .map(|&i| usize::try_from(i).ok().and_then(|i| self.token(i)))
            .collect();
        tokens.map(|t| t.join(" "))
    }

    /// BLAKE3 hash of all tokens in index order.
    ///
    /// Recorded next to encoded datasets so they can be matched to the
    /// vocabulary they were encoded with.
    pub fn content_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for token in &self.tokens {
            hasher.update(token.as_bytes());
            hasher.update(b"\n");
        }
        hasher.finalize().to_hex().to_string()
    }

    /// The vocabulary as a `{"vocab": [...], "dict": {...}}` document.
    pub fn to_document(&self) -> serde_json::Value {
        let dict: serde_json::Map<String, serde_json::Value> = self
            .tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), serde_json::Value::from(i)))
            .collect();
        serde_json::json!({
            "vocab": self.tokens,
            "dict": dict,
        })
    }

    /// Persist the vocabulary as a new JSON document.
    pub fn save(&self, path: &Path) -> Result<()> {
        output::write_json(path, &self.to_document(), false)?;
        tracing::info!("Saved vocabulary: {} tokens to {:?}", self.len(), path);
        Ok(())
    }
}

fn invalid(path: &Path, message: String) -> crate::error::VlmapError {
    DataError::InvalidInput {
        path: path.to_path_buf(),
        message,
    }
    .into()
}
