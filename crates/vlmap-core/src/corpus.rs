//! Input corpus documents.
//!
//! All inputs are JSON. Documents are consumed in file order; positional
//! splits and first-occurrence tie-breaks depend on it.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::{ConfigError, DataError, Result, VlmapError};

/// Read and parse a JSON input document.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(ConfigError::MissingInput(path.to_path_buf()).into());
    }
    let reader = BufReader::new(File::open(path)?);
    serde_json::from_reader(reader).map_err(|e| {
        VlmapError::from(DataError::InvalidInput {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    })
}

// ── Relationships ──────────────────────────────────────────────────────────

/// Axis-aligned box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,
}

impl BoundingBox {
    /// Smallest box containing both boxes.
    ///
    /// Coordinates saturate at the `i64` bounds instead of wrapping.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let x1 = self.x.min(other.x);
        let y1 = self.y.min(other.y);
        let x2 = self.x.saturating_add(self.w).max(other.x.saturating_add(other.w));
        let y2 = self.y.saturating_add(self.h).max(other.y.saturating_add(other.h));
        BoundingBox {
            x: x1,
            y: y1,
            w: x2.saturating_sub(x1),
            h: y2.saturating_sub(y1),
        }
    }
}

/// One subject-predicate-object annotation.
#[derive(Debug, Clone, Deserialize)]
pub struct Relationship {
    pub relationship_id: i64,
    #[serde(default)]
    pub predicate: Option<String>,
    pub subject: BoundingBox,
    pub object: BoundingBox,
}

impl Relationship {
    /// Box covering both subject and object.
    pub fn union_box(&self) -> BoundingBox {
        self.object.union(&self.subject)
    }
}

/// All relationships annotated on one image.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageRelationships {
    pub image_id: i64,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

/// Load `relationships.json` (an array of per-image entries).
pub fn load_relationships(path: &Path) -> Result<Vec<ImageRelationships>> {
    let entries: Vec<ImageRelationships> = load_json(path)?;
    tracing::info!(
        "Loaded {} images with {} relationships from {:?}",
        entries.len(),
        entries.iter().map(|e| e.relationships.len()).sum::<usize>(),
        path
    );
    Ok(entries)
}

// ── Captions and question answering ────────────────────────────────────────

/// An image record of the caption dictionary.
#[derive(Debug, Clone, Deserialize)]
pub struct CaptionImage {
    pub id: i64,
    pub split: String,
}

/// Caption dictionary; only the image split metadata is consumed.
#[derive(Debug, Clone, Deserialize)]
pub struct CaptionDictionary {
    pub images: Vec<CaptionImage>,
}

/// A tokenized question/answer annotation.
#[derive(Debug, Clone, Deserialize)]
pub struct QaAnnotation {
    #[serde(default)]
    pub q_tokens: Vec<String>,
    #[serde(default)]
    pub a_tokens: Vec<String>,
}

impl QaAnnotation {
    /// The answer as a space-joined candidate string.
    pub fn answer(&self) -> String {
        self.a_tokens.join(" ")
    }
}

/// Load merged annotations (`{qid: {q_tokens, a_tokens}}`) in file order.
pub fn load_annotations(path: &Path) -> Result<Vec<(String, QaAnnotation)>> {
    let raw: serde_json::Map<String, serde_json::Value> = load_json(path)?;
    let mut annotations = Vec::with_capacity(raw.len());
    for (qid, value) in raw {
        let annotation: QaAnnotation =
            serde_json::from_value(value).map_err(|e| DataError::InvalidInput {
                path: path.to_path_buf(),
                message: format!("annotation {}: {}", qid, e),
            })?;
        annotations.push((qid, annotation));
    }
    tracing::info!("Loaded {} annotations from {:?}", annotations.len(), path);
    Ok(annotations)
}

/// Object categories assigned to the train and held-out test partitions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObjectSplit {
    #[serde(default)]
    pub train: Vec<String>,
    #[serde(default)]
    pub test: Vec<String>,
}

impl ObjectSplit {
    /// The held-out test objects as a set.
    pub fn held_out(&self) -> HashSet<String> {
        self.test.iter().cloned().collect()
    }
}

/// Load a JSON array of strings as a set.
pub fn load_string_set(path: &Path) -> Result<HashSet<String>> {
    let list: Vec<String> = load_json(path)?;
    Ok(list.into_iter().collect())
}
