//! The `vlmap vocab` command.

use clap::Args;
use std::path::PathBuf;
use vlmap_core::{Config, VocabJob, VocabOptions};

use super::progress::BarProgress;

/// Arguments for the `vocab` command. Unset options fall back to the config file.
#[derive(Args, Debug, Default)]
pub struct VocabArgs {
    /// Directory with merged_annotations.json, obj_attrs_split.json,
    /// object_list.json and attribute_list.json; outputs are written here
    #[arg(long)]
    pub caption_split_dir: Option<PathBuf>,

    /// Caption dictionary with per-image split names
    #[arg(long)]
    pub caption_dic_path: Option<PathBuf>,

    /// Embedding vocabulary ({"vocab": [...]}) bounding every retained token
    #[arg(long)]
    pub glove_vocab_path: Option<PathBuf>,

    /// Maximum number of retained answers
    #[arg(long)]
    pub answer_set_limit: Option<usize>,

    /// Maximum number of tokens per retained answer
    #[arg(long)]
    pub max_answer_len: Option<usize>,
}

impl VocabArgs {
    /// Overlay the given options onto `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.caption_split_dir {
            config.captions.split_dir = dir.clone();
        }
        if let Some(path) = &self.caption_dic_path {
            config.captions.dic_path = path.clone();
        }
        if let Some(path) = &self.glove_vocab_path {
            config.vocabulary.glove_vocab_path = path.clone();
        }
        if let Some(limit) = self.answer_set_limit {
            config.answers.answer_set_limit = limit;
        }
        if let Some(len) = self.max_answer_len {
            config.answers.max_answer_len = len;
        }
    }
}

/// Execute the vocab command.
pub fn execute(args: VocabArgs, mut config: Config) -> anyhow::Result<()> {
    args.apply(&mut config);
    config.check()?;

    let job = VocabJob::new(VocabOptions::from_config(&config));
    tracing::info!("Building vocabulary in {:?}", job.options().split_dir);

    let summary = job.run(&BarProgress::new())?;

    for (split, count) in &summary.split_sizes {
        println!("  {:<8} {:>8} images", split, count);
    }
    println!(
        "Vocabulary: {} tokens; answers: {} ({} train, {} test)",
        summary.vocab_size, summary.num_answers, summary.num_train_answer, summary.num_test_answer
    );
    for path in &summary.outputs {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_args_keep_config_values() {
        let mut config = Config::default();
        VocabArgs::default().apply(&mut config);
        assert_eq!(config.answers.answer_set_limit, 3000);
        assert_eq!(config.answers.max_answer_len, 3);
    }

    #[test]
    fn args_override_config() {
        let mut config = Config::default();
        let args = VocabArgs {
            caption_split_dir: Some(PathBuf::from("/tmp/split")),
            answer_set_limit: Some(10),
            ..Default::default()
        };
        args.apply(&mut config);
        assert_eq!(config.captions.split_dir, PathBuf::from("/tmp/split"));
        assert_eq!(config.answers.answer_set_limit, 10);
        assert_eq!(config.answers.max_answer_len, 3);
    }

    #[test]
    fn zero_limit_is_rejected() {
        let mut config = Config::default();
        let args = VocabArgs {
            answer_set_limit: Some(0),
            ..Default::default()
        };
        args.apply(&mut config);
        assert!(config.check().is_err());
    }
}
