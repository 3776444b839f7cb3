//! The `vlmap relationships` command.

use clap::Args;
use std::path::PathBuf;
use vlmap_core::{Config, RelationshipJob, RelationshipOptions};

use super::progress::BarProgress;

/// Arguments for the `relationships` command. Unset options fall back to the
/// config file.
#[derive(Args, Debug, Default)]
pub struct RelationshipsArgs {
    /// Directory containing relationships.json
    #[arg(long)]
    pub annotations_dir: Option<PathBuf>,

    /// Vocabulary used to check and encode predicates
    #[arg(long)]
    pub vocab_path: Option<PathBuf>,

    /// Parent directory of the dataset directory
    #[arg(long)]
    pub output_root: Option<PathBuf>,

    /// Dataset directory name (suffixed with _min_occ<N>)
    #[arg(long)]
    pub dir_name: Option<String>,

    /// Minimum occurrences for a predicate to be kept
    #[arg(long)]
    pub min_occurrence: Option<usize>,

    /// Number of leading images assigned to train
    #[arg(long)]
    pub num_train_image: Option<usize>,

    /// Number of following images assigned to test
    #[arg(long)]
    pub num_test_image: Option<usize>,

    /// Number of trailing images assigned to val
    #[arg(long)]
    pub num_val_image: Option<usize>,
}

impl RelationshipsArgs {
    /// Overlay the given options onto `config`.
    pub fn apply(&self, config: &mut Config) {
        let rel = &mut config.relationships;
        if let Some(dir) = &self.annotations_dir {
            rel.annotations_dir = dir.clone();
        }
        if let Some(name) = &self.dir_name {
            rel.dir_name = name.clone();
        }
        if let Some(n) = self.min_occurrence {
            rel.min_occurrence = n;
        }
        if let Some(n) = self.num_train_image {
            rel.num_train_image = n;
        }
        if let Some(n) = self.num_test_image {
            rel.num_test_image = n;
        }
        if let Some(n) = self.num_val_image {
            rel.num_val_image = n;
        }
        if let Some(path) = &self.vocab_path {
            config.vocabulary.vocab_path = path.clone();
        }
        if let Some(root) = &self.output_root {
            config.general.output_root = root.clone();
        }
    }
}

/// Execute the relationships command.
pub fn execute(args: RelationshipsArgs, mut config: Config) -> anyhow::Result<()> {
    args.apply(&mut config);
    config.check()?;

    let job = RelationshipJob::new(RelationshipOptions::from_config(&config));
    tracing::info!(
        "Building relationship dataset {:?} (min_occurrence = {})",
        job.options().output_dir,
        job.options().min_occurrence
    );

    let summary = job.run(&BarProgress::new())?;
    let stats = &summary.stats;

    println!(
        "Wrote {} records ({} train / {} test / {} val) from {} images to {}",
        stats.num_data,
        stats.num_train,
        stats.num_test,
        stats.num_val,
        stats.num_images,
        summary.output_dir.display()
    );
    println!(
        "Predicates retained: {}; max names per record: {}; max name length: {}",
        stats.num_unique_relationships, stats.max_num_names, stats.max_name_length
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_override_config() {
        let mut config = Config::default();
        let args = RelationshipsArgs {
            min_occurrence: Some(5),
            dir_name: Some("rels".to_string()),
            output_root: Some(PathBuf::from("/data/out")),
            ..Default::default()
        };
        args.apply(&mut config);

        let options = RelationshipOptions::from_config(&config);
        assert_eq!(options.min_occurrence, 5);
        assert_eq!(options.output_dir, PathBuf::from("/data/out/rels_min_occ5"));
        assert_eq!(options.num_train_image, 80000);
    }

    #[test]
    fn empty_dir_name_is_rejected() {
        let mut config = Config::default();
        let args = RelationshipsArgs {
            dir_name: Some(String::new()),
            ..Default::default()
        };
        args.apply(&mut config);
        assert!(config.check().is_err());
    }
}
