//! Relationship dataset construction.
//!
//! Reads per-image relationship annotations, keeps predicates that occur at
//! least `min_occurrence` times (after normalization and vocabulary checks),
//! and writes one record per surviving relationship:
//!
//! ```text
//! <dir>/data.bin            structured store
//!     <image_id>/relationships<NNNNNNNN>_imageid<ID>_numname<R>_maxnamelen<W>/
//!         image_id, relationship_id, names, name_len, name_ids, x, y, w, h
//!     data_info/            aggregate scalars + retained predicates packed
//! <dir>/id.txt              "<image_id> <record_name>" per record
//! <dir>/stats.txt           "key: value" per aggregate
//! <dir>/relationships.txt   retained predicates in ID order
//! ```

use std::path::{Path, PathBuf};

use crate::config::{expand_path, Config};
use crate::corpus::{self, ImageRelationships, Relationship};
use crate::error::Result;
use crate::filter::{FrequencyFilter, RetentionPolicy};
use crate::ids::{self, IdMap};
use crate::output::{self, IndexWriter};
use crate::pack::{PackStats, PackedSequences};
use crate::progress::Progress;
use crate::split::{PositionalSplit, SplitCounts};
use crate::store::{join, Dataset, StoreWriter};
use crate::text;
use crate::vocabulary::Vocabulary;

/// Name of the aggregate metadata group.
pub const DATA_INFO: &str = "data_info";

/// Inputs and knobs for one relationship dataset build.
#[derive(Debug, Clone)]
pub struct RelationshipOptions {
    /// `relationships.json`
    pub relationships_path: PathBuf,
    /// Vocabulary used for membership checks and encoding
    pub vocab_path: PathBuf,
    /// Output directory; must not exist yet
    pub output_dir: PathBuf,
    /// Minimum occurrences for a predicate to be kept
    pub min_occurrence: usize,
    pub num_train_image: usize,
    pub num_test_image: usize,
    pub num_val_image: usize,
}

impl RelationshipOptions {
    /// Options taken from configuration.
    pub fn from_config(config: &Config) -> Self {
        let rel = &config.relationships;
        Self {
            relationships_path: expand_path(&rel.annotations_dir).join("relationships.json"),
            vocab_path: expand_path(&config.vocabulary.vocab_path),
            output_dir: Self::output_dir_for(
                &expand_path(&config.general.output_root),
                &rel.dir_name,
                rel.min_occurrence,
            ),
            min_occurrence: rel.min_occurrence,
            num_train_image: rel.num_train_image,
            num_test_image: rel.num_test_image,
            num_val_image: rel.num_val_image,
        }
    }

    /// `<root>/<dir_name>_min_occ<N>`
    pub fn output_dir_for(root: &Path, dir_name: &str, min_occurrence: usize) -> PathBuf {
        root.join(format!("{}_min_occ{}", dir_name, min_occurrence))
    }

    /// Structured store path.
    pub fn store_path(&self) -> PathBuf {
        self.output_dir.join("data.bin")
    }

    /// Record index path.
    pub fn index_path(&self) -> PathBuf {
        self.output_dir.join("id.txt")
    }

    /// Stats summary path.
    pub fn stats_path(&self) -> PathBuf {
        self.output_dir.join("stats.txt")
    }

    /// Retained predicate list path.
    pub fn relationships_list_path(&self) -> PathBuf {
        self.output_dir.join("relationships.txt")
    }
}

/// Aggregate metrics shared by the store, the stats file, and the CLI summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationshipStats {
    pub num_data: usize,
    pub num_train: usize,
    pub num_test: usize,
    pub num_val: usize,
    pub num_images: usize,
    pub num_train_image: usize,
    pub num_test_image: usize,
    pub num_val_image: usize,
    pub num_unique_relationships: usize,
    pub max_num_names: usize,
    pub max_name_length: usize,
    pub min_occurrence: usize,
    pub vocab_hash: String,
}

impl RelationshipStats {
    /// Integer metrics in stats-file order.
    pub fn scalars(&self) -> [(&'static str, usize); 12] {
        [
            ("num_data", self.num_data),
            ("num_train", self.num_train),
            ("num_test", self.num_test),
            ("num_val", self.num_val),
            ("num_images", self.num_images),
            ("num_train_image", self.num_train_image),
            ("num_test_image", self.num_test_image),
            ("num_val_image", self.num_val_image),
            ("num_unique_relationships", self.num_unique_relationships),
            ("max_num_names", self.max_num_names),
            ("max_name_length", self.max_name_length),
            ("min_occurrence", self.min_occurrence),
        ]
    }

    /// Every metric as `(key, value)` text, in stats-file order.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let mut entries: Vec<(&'static str, String)> = self
            .scalars()
            .iter()
            .map(|&(k, v)| (k, v.to_string()))
            .collect();
        entries.push(("vocab_hash", self.vocab_hash.clone()));
        entries
    }
}

/// What a finished build produced.
#[derive(Debug, Clone)]
pub struct RelationshipSummary {
    pub stats: RelationshipStats,
    pub output_dir: PathBuf,
    /// Retained predicates in ID order
    pub relationships: Vec<String>,
}

/// Builds a relationship dataset from one configuration.
pub struct RelationshipJob {
    options: RelationshipOptions,
}

impl RelationshipJob {
    pub fn new(options: RelationshipOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RelationshipOptions {
        &self.options
    }

    /// Run the build.
    ///
    /// Fails before writing anything if an input is missing, the output
    /// directory exists, or the split counts do not match the corpus. Every
    /// output is staged before any is published. A failure after the output
    /// directory was created removes the directory and whatever it holds.
    pub fn run(&self, progress: &dyn Progress) -> Result<RelationshipSummary> {
        let opts = &self.options;
        super::require_inputs([opts.relationships_path.as_path(), opts.vocab_path.as_path()])?;
        output::ensure_absent([opts.output_dir.as_path()])?;

        progress.start("loading", None);
        let vocabulary = Vocabulary::load(&opts.vocab_path)?;
        let entries = corpus::load_relationships(&opts.relationships_path)?;
        progress.finish(&format!("{} images", entries.len()));

        let split = PositionalSplit::new(
            opts.num_train_image,
            opts.num_test_image,
            opts.num_val_image,
            entries.len(),
        )?;

        let predicates = self.retain_predicates(&entries, &vocabulary, progress)?;

        super::create_output_dir(&opts.output_dir)?;
        let result = self.write_dataset(&entries, &vocabulary, &predicates, split, progress);
        if result.is_err() {
            // The directory is this run's own, so everything in it goes
            if let Err(e) = std::fs::remove_dir_all(&opts.output_dir) {
                tracing::warn!("Could not remove {:?} after failure: {e}", opts.output_dir);
            }
        }
        let stats = result?;

        tracing::info!(
            "Relationship dataset: {} records ({} train / {} test / {} val), {} predicates",
            stats.num_data,
            stats.num_train,
            stats.num_test,
            stats.num_val,
            stats.num_unique_relationships
        );

        Ok(RelationshipSummary {
            stats,
            output_dir: opts.output_dir.clone(),
            relationships: predicates.items().to_vec(),
        })
    }

    /// Count normalized predicates and keep the frequent, in-vocabulary ones.
    fn retain_predicates(
        &self,
        entries: &[ImageRelationships],
        vocabulary: &Vocabulary,
        progress: &dyn Progress,
    ) -> Result<IdMap> {
        progress.start("counting", Some(entries.len() as u64));
        let mut candidates = Vec::new();
        let mut empty = 0usize;
        let mut uncovered = 0usize;
        for entry in entries {
            for rel in &entry.relationships {
                for raw in record_names(rel) {
                    match usable_name(raw, vocabulary) {
                        Some(name) => candidates.push(name),
                        None if text::normalize(raw).is_empty() => empty += 1,
                        None => uncovered += 1,
                    }
                }
            }
            progress.advance(1);
        }
        progress.finish(&format!("{} candidate predicates", candidates.len()));
        if empty > 0 {
            tracing::warn!("Discarded {} predicates with no usable text", empty);
        }
        tracing::debug!("Discarded {} out-of-vocabulary predicates", uncovered);

        progress.start("filtering", None);
        let outcome = FrequencyFilter::new(
            vocabulary,
            RetentionPolicy::MinOccurrence(self.options.min_occurrence),
        )
        .apply(&candidates)?;
        progress.finish(&format!("{} predicates retained", outcome.retained.len()));

        Ok(IdMap::assign(outcome.retained))
    }

    fn write_dataset(
        &self,
        entries: &[ImageRelationships],
        vocabulary: &Vocabulary,
        predicates: &IdMap,
        split: PositionalSplit,
        progress: &dyn Progress,
    ) -> Result<RelationshipStats> {
        let opts = &self.options;
        let mut store = StoreWriter::create(&opts.store_path()).map_err(super::store_error)?;
        let mut index = IndexWriter::create(&opts.index_path())?;

        let mut pack_stats = PackStats::default();
        let mut counts = SplitCounts::default();
        let mut cnt = 0usize;

        progress.start("writing", Some(entries.len() as u64));
        for (image_index, entry) in entries.iter().enumerate() {
            let image_group = entry.image_id.to_string();
            if !store.has_group(&image_group) {
                store.create_group(&image_group)?;
            }

            for rel in &entry.relationships {
                let mut sequences = Vec::new();
                let mut name_ids = Vec::new();
                for raw in record_names(rel) {
                    let Some(name) = usable_name(raw, vocabulary) else {
                        continue;
                    };
                    let Some(id) = predicates.id(&name) else {
                        continue;
                    };
                    sequences.push(vocabulary.encode(&name)?);
                    name_ids.push(ids::dataset_id(&name, id)?);
                }
                if sequences.is_empty() {
                    continue;
                }

                let packed = PackedSequences::pack(&sequences);
                pack_stats.observe(&packed);

                let record_name = record_name(cnt, entry.image_id, &packed);
                let record = join(&image_group, &record_name);
                let bbox = rel.union_box();

                store.create_group(&record)?;
                store.write(&join(&record, "image_id"), entry.image_id)?;
                store.write(&join(&record, "names"), packed.matrix_dataset())?;
                store.write(&join(&record, "name_len"), packed.lengths_dataset())?;
                store.write(&join(&record, "name_ids"), name_ids)?;
                store.write(&join(&record, "relationship_id"), rel.relationship_id)?;
                store.write(&join(&record, "x"), bbox.x)?;
                store.write(&join(&record, "y"), bbox.y)?;
                store.write(&join(&record, "w"), bbox.w)?;
                store.write(&join(&record, "h"), bbox.h)?;

                index.append(entry.image_id, &record_name)?;
                counts.record(split.assign(image_index));
                cnt += 1;
            }
            progress.advance(1);
        }
        progress.finish(&format!("{} records", cnt));

        let stats = RelationshipStats {
            num_data: cnt,
            num_train: counts.train,
            num_test: counts.test,
            num_val: counts.val,
            num_images: entries.len(),
            num_train_image: split.train,
            num_test_image: split.test,
            num_val_image: split.val,
            num_unique_relationships: predicates.len(),
            max_num_names: pack_stats.max_rows,
            max_name_length: pack_stats.max_width,
            min_occurrence: opts.min_occurrence,
            vocab_hash: vocabulary.content_hash(),
        };

        // Retained predicates packed at the dataset-wide width
        let retained_sequences = predicates
            .items()
            .iter()
            .map(|name| vocabulary.encode(name))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let retained = PackedSequences::pack_min_width(&retained_sequences, stats.max_name_length);

        for (key, value) in stats.scalars() {
            store.write(&join(DATA_INFO, key), value)?;
        }
        store.write(&join(DATA_INFO, "vocab_hash"), Dataset::Text(stats.vocab_hash.clone()))?;
        store.write(&join(DATA_INFO, "relationships_intseq"), retained.matrix_dataset())?;
        store.write(&join(DATA_INFO, "relationships_intseq_len"), retained.lengths_dataset())?;

        // Everything is staged before the first rename
        let store = store.finalize().map_err(super::store_error)?;
        let index = index.into_staged();
        let stats_file = output::stage_stats(&opts.stats_path(), &stats.entries())?;
        let list_file = output::stage_lines(&opts.relationships_list_path(), predicates.items())?;

        progress.start("publishing", Some(4));
        store.persist().map_err(super::store_error)?;
        progress.advance(1);
        output::commit_all([index, stats_file, list_file], |_| progress.advance(1))?;
        progress.finish("done");

        Ok(stats)
    }
}

/// Free-text names a relationship contributes.
fn record_names(rel: &Relationship) -> impl Iterator<Item = &str> {
    rel.predicate.as_deref().into_iter()
}

/// Normalized name if it has content and every token is in the vocabulary.
fn usable_name(raw: &str, vocabulary: &Vocabulary) -> Option<String> {
    let name = text::normalize(raw);
    (!name.is_empty() && vocabulary.covers(&name)).then_some(name)
}

/// Record name encoding counter, parent image, and packed shape.
pub fn record_name(counter: usize, image_id: i64, packed: &PackedSequences) -> String {
    format!(
        "relationships{:08}_imageid{}_numname{}_maxnamelen{}",
        counter,
        image_id,
        packed.rows(),
        packed.width()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_name_encodes_shape() {
        let packed = PackedSequences::pack(&[vec![1, 2], vec![3]]);
        assert_eq!(
            record_name(7, 2345, &packed),
            "relationships00000007_imageid2345_numname2_maxnamelen2"
        );
    }

    #[test]
    fn test_output_dir_naming() {
        let dir = RelationshipOptions::output_dir_for(Path::new("preprocessed"), "relationships", 20);
        assert_eq!(dir, PathBuf::from("preprocessed/relationships_min_occ20"));
    }

    #[test]
    fn test_options_from_default_config() {
        let options = RelationshipOptions::from_config(&Config::default());
        assert_eq!(
            options.relationships_path,
            PathBuf::from("VisualGenome/annotations/relationships.json")
        );
        assert_eq!(options.min_occurrence, 20);
        assert_eq!(options.store_path(), options.output_dir.join("data.bin"));
    }

    #[test]
    fn test_usable_name() {
        let vocab = Vocabulary::from_tokens(["on", "top", "of"]);
        assert_eq!(usable_name("On Top of.", &vocab).as_deref(), Some("on top of"));
        assert!(usable_name("beneath", &vocab).is_none());
        assert!(usable_name("...", &vocab).is_none());
    }

    #[test]
    fn test_stats_entries_order() {
        let stats = RelationshipStats {
            num_data: 3,
            vocab_hash: "h".to_string(),
            ..Default::default()
        };
        let entries = stats.entries();
        assert_eq!(entries[0], ("num_data", "3".to_string()));
        assert_eq!(entries.last().unwrap().0, "vocab_hash");
        assert_eq!(entries.len(), 13);
    }
}
