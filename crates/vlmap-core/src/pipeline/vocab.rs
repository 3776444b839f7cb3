//! Caption splits, question/answer vocabulary, and the answer dictionary.
//!
//! Reads from the caption split directory:
//!
//! - `merged_annotations.json`: `{qid: {q_tokens, a_tokens}}`, file order is corpus order
//! - `obj_attrs_split.json`: `{"train": [...], "test": [...]}` object categories
//! - `object_list.json`, `attribute_list.json`: JSON string arrays
//!
//! and writes `caption_split.json`, `vocab.json`, and `answer_dict.json` next
//! to them. None of the three is published unless all three were produced.

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use crate::config::{expand_path, Config};
use crate::corpus::{self, CaptionDictionary, ObjectSplit};
use crate::error::{DataError, Result};
use crate::filter::{FrequencyFilter, RetentionPolicy};
use crate::ids::IdMap;
use crate::output;
use crate::progress::Progress;
use crate::split::{group_by_split, held_out_split};
use crate::text;
use crate::vocabulary::Vocabulary;

/// Appended to the question vocabulary, in this order.
pub const SPECIAL_TOKENS: [&str; 3] = ["<s>", "<e>", "<unk>"];

/// Inputs and knobs for the vocabulary job.
#[derive(Debug, Clone)]
pub struct VocabOptions {
    /// Directory holding the split inputs; outputs are written here too
    pub split_dir: PathBuf,
    /// Caption dictionary with per-image split names
    pub dic_path: PathBuf,
    /// Embedding vocabulary that bounds every retained token
    pub glove_vocab_path: PathBuf,
    /// Maximum number of retained answers
    pub answer_set_limit: usize,
    /// Maximum tokens per retained answer
    pub max_answer_len: usize,
}

impl VocabOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            split_dir: expand_path(&config.captions.split_dir),
            dic_path: expand_path(&config.captions.dic_path),
            glove_vocab_path: expand_path(&config.vocabulary.glove_vocab_path),
            answer_set_limit: config.answers.answer_set_limit,
            max_answer_len: config.answers.max_answer_len,
        }
    }

    pub fn annotations_path(&self) -> PathBuf {
        self.split_dir.join("merged_annotations.json")
    }

    pub fn obj_attrs_split_path(&self) -> PathBuf {
        self.split_dir.join("obj_attrs_split.json")
    }

    pub fn object_list_path(&self) -> PathBuf {
        self.split_dir.join("object_list.json")
    }

    pub fn attribute_list_path(&self) -> PathBuf {
        self.split_dir.join("attribute_list.json")
    }

    pub fn caption_split_path(&self) -> PathBuf {
        self.split_dir.join("caption_split.json")
    }

    pub fn vocab_path(&self) -> PathBuf {
        self.split_dir.join("vocab.json")
    }

    pub fn answer_dict_path(&self) -> PathBuf {
        self.split_dir.join("answer_dict.json")
    }
}

/// Persisted answer set: train answers first, then held-out test answers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerDictionary {
    pub vocab: Vec<String>,
    pub dict: serde_json::Map<String, serde_json::Value>,
    pub num_train_answer: usize,
    pub is_object: Vec<u8>,
    pub is_attribute: Vec<u8>,
}

impl AnswerDictionary {
    /// Build the dictionary from ordered train and test answers.
    pub fn build(
        train: Vec<String>,
        test: Vec<String>,
        objects: &HashSet<String>,
        attributes: &HashSet<String>,
    ) -> Self {
        let num_train_answer = train.len();
        let ids = IdMap::assign(train.into_iter().chain(test));
        let flag = |set: &HashSet<String>| -> Vec<u8> {
            ids.items().iter().map(|a| u8::from(set.contains(a))).collect()
        };
        Self {
            is_object: flag(objects),
            is_attribute: flag(attributes),
            dict: ids.to_json_dict(),
            vocab: ids.items().to_vec(),
            num_train_answer,
        }
    }

    /// Number of answers.
    pub fn len(&self) -> usize {
        self.vocab.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vocab.is_empty()
    }
}

/// What a finished vocabulary job produced.
#[derive(Debug, Clone)]
pub struct VocabSummary {
    /// Image count per caption split name
    pub split_sizes: BTreeMap<String, usize>,
    pub vocab_size: usize,
    pub num_answers: usize,
    pub num_train_answer: usize,
    pub num_test_answer: usize,
    pub outputs: Vec<PathBuf>,
}

/// Builds the caption split, question vocabulary, and answer dictionary.
pub struct VocabJob {
    options: VocabOptions,
}

impl VocabJob {
    pub fn new(options: VocabOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &VocabOptions {
        &self.options
    }

    /// Run the job.
    pub fn run(&self, progress: &dyn Progress) -> Result<VocabSummary> {
        let opts = &self.options;
        let annotations_path = opts.annotations_path();
        let obj_attrs_path = opts.obj_attrs_split_path();
        let object_list_path = opts.object_list_path();
        let attribute_list_path = opts.attribute_list_path();
        super::require_inputs([
            opts.dic_path.as_path(),
            opts.glove_vocab_path.as_path(),
            annotations_path.as_path(),
            obj_attrs_path.as_path(),
            object_list_path.as_path(),
            attribute_list_path.as_path(),
        ])?;

        let caption_split_path = opts.caption_split_path();
        let vocab_path = opts.vocab_path();
        let answer_dict_path = opts.answer_dict_path();
        output::ensure_absent([
            caption_split_path.as_path(),
            vocab_path.as_path(),
            answer_dict_path.as_path(),
        ])?;

        progress.start("loading", None);
        let captions: CaptionDictionary = corpus::load_json(&opts.dic_path)?;
        let glove = Vocabulary::load(&opts.glove_vocab_path)?;
        let annotations = corpus::load_annotations(&annotations_path)?;
        let object_split: ObjectSplit = corpus::load_json(&obj_attrs_path)?;
        let objects = corpus::load_string_set(&object_list_path)?;
        let attributes = corpus::load_string_set(&attribute_list_path)?;
        progress.finish(&format!("{} annotations", annotations.len()));

        let caption_split = caption_split(&captions);
        for (split, ids) in &caption_split {
            tracing::info!("Caption split {}: {} images", split, ids.len());
        }

        progress.start("counting", Some(annotations.len() as u64));
        let mut answers = Vec::with_capacity(annotations.len());
        for (_, annotation) in &annotations {
            answers.push(annotation.answer());
            progress.advance(1);
        }
        progress.finish(&format!("{} answers", answers.len()));

        progress.start("filtering", None);
        let outcome = FrequencyFilter::new(&glove, RetentionPolicy::TopN(opts.answer_set_limit))
            .with_max_tokens(opts.max_answer_len)
            .apply(&answers)?;
        let question_tokens = annotations
            .iter()
            .flat_map(|(_, a)| a.q_tokens.iter().map(String::as_str));
        let vocabulary = question_vocabulary(question_tokens, &outcome.retained, &glove)?;
        let answer_split = held_out_split(&outcome.retained, &object_split.held_out());
        let num_test_answer = answer_split.test.len();
        let answer_dict =
            AnswerDictionary::build(answer_split.train, answer_split.test, &objects, &attributes);
        progress.finish(&format!(
            "{} answers retained, {} vocabulary tokens",
            answer_dict.len(),
            vocabulary.len()
        ));

        progress.start("writing", Some(3));
        let staged = [
            output::stage_json(&caption_split_path, &caption_split, false)?,
            output::stage_json(&vocab_path, &vocabulary.to_document(), false)?,
            output::stage_json(&answer_dict_path, &answer_dict, false)?,
        ];
        let outputs = output::commit_all(staged, |_| progress.advance(1))?;
        progress.finish("done");

        tracing::info!(
            "Saved vocabulary ({} tokens) and answer dictionary ({} train / {} test answers)",
            vocabulary.len(),
            answer_dict.num_train_answer,
            num_test_answer
        );

        Ok(VocabSummary {
            split_sizes: caption_split
                .iter()
                .map(|(split, ids)| (split.clone(), ids.len()))
                .collect(),
            vocab_size: vocabulary.len(),
            num_answers: answer_dict.len(),
            num_train_answer: answer_dict.num_train_answer,
            num_test_answer,
            outputs,
        })
    }
}

/// Image IDs grouped by split name, in caption dictionary order.
pub fn caption_split(captions: &CaptionDictionary) -> BTreeMap<String, Vec<i64>> {
    group_by_split(captions.images.iter().map(|image| image.split.as_str()))
        .into_iter()
        .map(|(split, indices)| {
            let ids = indices.into_iter().map(|i| captions.images[i].id).collect();
            (split, ids)
        })
        .collect()
}

/// Question tokens covered by `glove`, then tokens of retained answers, then
/// [`SPECIAL_TOKENS`]. Each token appears once, at its first occurrence.
///
/// A retained-answer token outside `glove` means the answer filter let an
/// uncovered answer through and is reported as an invariant violation.
pub fn question_vocabulary<'a>(
    question_tokens: impl IntoIterator<Item = &'a str>,
    retained_answers: &[String],
    glove: &Vocabulary,
) -> Result<Vocabulary> {
    let mut seen = HashSet::new();
    let mut tokens: Vec<String> = Vec::new();
    let mut push = |token: &str, tokens: &mut Vec<String>| {
        if seen.insert(token.to_string()) {
            tokens.push(token.to_string());
        }
    };

    for token in question_tokens {
        if glove.contains(token) {
            push(token, &mut tokens);
        }
    }
    for answer in retained_answers {
        for token in text::tokens(answer) {
            if !glove.contains(token) {
                return Err(DataError::OutOfVocabulary {
                    item: answer.clone(),
                    token: token.to_string(),
                }
                .into());
            }
            push(token, &mut tokens);
        }
    }
    for token in SPECIAL_TOKENS {
        push(token, &mut tokens);
    }

    Ok(Vocabulary::from_tokens(tokens))
}
