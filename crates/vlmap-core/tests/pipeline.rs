//! End-to-end runs of the relationship and vocabulary jobs on small corpora.

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};

use serde_json::json;
use vlmap_core::output::{read_index, read_stats};
use vlmap_core::{
    ConfigError, DataError, NoProgress, Progress, RelationshipJob, RelationshipOptions,
    StoreReader, VlmapError, VocabJob, VocabOptions,
};

fn write_json(path: &Path, value: serde_json::Value) {
    std::fs::write(path, serde_json::to_string(&value).unwrap()).unwrap();
}

fn bbox(x: i64, y: i64, w: i64, h: i64) -> serde_json::Value {
    json!({"x": x, "y": y, "w": w, "h": h})
}

fn relationship(id: i64, predicate: Option<&str>) -> serde_json::Value {
    let mut rel = json!({
        "relationship_id": id,
        "subject": bbox(10, 20, 30, 40),
        "object": bbox(5, 50, 10, 30),
    });
    if let Some(p) = predicate {
        rel["predicate"] = json!(p);
    }
    rel
}

/// Four images; with `min_occurrence = 2` only "on" and "on top of" survive.
fn relationship_fixture(root: &Path) -> RelationshipOptions {
    let annotations = root.join("annotations");
    std::fs::create_dir_all(&annotations).unwrap();
    write_json(
        &annotations.join("relationships.json"),
        json!([
            {"image_id": 1, "relationships": [
                relationship(100, Some("on")),
                relationship(101, Some("ON top of.")),
                relationship(102, Some("near")),
                relationship(103, None),
            ]},
            {"image_id": 2, "relationships": [
                relationship(200, Some("On")),
                relationship(201, Some("has")),
            ]},
            {"image_id": 3, "relationships": [
                relationship(300, Some("on top  of")),
                relationship(301, Some("beneath")),
            ]},
            {"image_id": 4, "relationships": []},
        ]),
    );

    let vocab_path = root.join("vocab.json");
    write_json(
        &vocab_path,
        json!({"vocab": ["on", "top", "of", "near", "has", "wearing"]}),
    );

    RelationshipOptions {
        relationships_path: annotations.join("relationships.json"),
        vocab_path,
        output_dir: RelationshipOptions::output_dir_for(&root.join("preprocessed"), "relationships", 2),
        min_occurrence: 2,
        num_train_image: 2,
        num_test_image: 1,
        num_val_image: 1,
    }
}

/// Another writer that claims `path` once the first output of `phase` is out.
struct LateClaim {
    phase: &'static str,
    path: PathBuf,
    current: RefCell<String>,
    claimed: Cell<bool>,
}

impl LateClaim {
    fn new(phase: &'static str, path: PathBuf) -> Self {
        Self {
            phase,
            path,
            current: RefCell::new(String::new()),
            claimed: Cell::new(false),
        }
    }
}

impl Progress for LateClaim {
    fn start(&self, phase: &str, _total: Option<u64>) {
        *self.current.borrow_mut() = phase.to_string();
    }

    fn advance(&self, _n: u64) {
        if *self.current.borrow() == self.phase && !self.claimed.get() {
            std::fs::write(&self.path, "claimed").unwrap();
            self.claimed.set(true);
        }
    }

    fn finish(&self, _summary: &str) {}
}

fn stat(stats: &[(String, String)], key: &str) -> i64 {
    stats
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.parse().unwrap())
        .unwrap_or_else(|| panic!("missing stat {key}"))
}

#[test]
fn relationship_outputs_are_mutually_consistent() {
    let root = tempfile::tempdir().unwrap();
    let options = relationship_fixture(root.path());
    let summary = RelationshipJob::new(options.clone()).run(&NoProgress).unwrap();

    assert_eq!(summary.relationships, vec!["on", "on top of"]);
    assert!(summary.output_dir.ends_with("relationships_min_occ2"));

    let index = read_index(&options.index_path()).unwrap();
    let stats = read_stats(&options.stats_path()).unwrap();
    let mut store = StoreReader::open(&options.store_path()).unwrap();

    // Same totals everywhere
    assert_eq!(index.len(), 4);
    assert_eq!(stat(&stats, "num_data"), 4);
    assert_eq!(store.read_scalar("data_info/num_data").unwrap(), 4);
    assert_eq!(summary.stats.num_data, 4);

    // Same per-split breakdown: images 1-2 train, 3 test, 4 val
    for (key, expected) in [("num_train", 3), ("num_test", 1), ("num_val", 0)] {
        assert_eq!(stat(&stats, key), expected, "{key}");
        assert_eq!(store.read_scalar(&format!("data_info/{key}")).unwrap(), expected, "{key}");
    }
    assert_eq!(
        stat(&stats, "num_train") + stat(&stats, "num_test") + stat(&stats, "num_val"),
        stat(&stats, "num_data")
    );

    // Stats file key order
    let keys: Vec<&str> = stats.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(
        keys,
        vec![
            "num_data",
            "num_train",
            "num_test",
            "num_val",
            "num_images",
            "num_train_image",
            "num_test_image",
            "num_val_image",
            "num_unique_relationships",
            "max_num_names",
            "max_name_length",
            "min_occurrence",
            "vocab_hash",
        ]
    );
    for (key, value) in &stats {
        if key == "vocab_hash" {
            assert_eq!(&store.read_text("data_info/vocab_hash").unwrap(), value);
        } else {
            assert_eq!(
                store.read_scalar(&format!("data_info/{key}")).unwrap().to_string(),
                *value,
                "{key}"
            );
        }
    }
    assert_eq!(stat(&stats, "max_name_length"), 3);
    assert_eq!(stat(&stats, "max_num_names"), 1);
    assert_eq!(stat(&stats, "num_images"), 4);

    // Every index line points at a record in the container
    for entry in &index {
        let record = format!("{}/{}", entry.parent_id, entry.record_name);
        assert!(store.has_group(&record), "{record}");
        assert_eq!(store.read_scalar(&format!("{record}/image_id")).unwrap(), entry.parent_id);
    }
    assert_eq!(
        index[1].record_name,
        "relationships00000001_imageid1_numname1_maxnamelen3"
    );

    // Image groups exist even without surviving records
    assert!(store.has_group("4"));
    assert!(store.children("4").is_empty());
    assert_eq!(store.children("1").len(), 2);
}

#[test]
fn relationship_record_payload() {
    let root = tempfile::tempdir().unwrap();
    let options = relationship_fixture(root.path());
    RelationshipJob::new(options.clone()).run(&NoProgress).unwrap();

    let mut store = StoreReader::open(&options.store_path()).unwrap();
    let record = "3/relationships00000003_imageid3_numname1_maxnamelen3";

    let (rows, cols, names) = store.read_matrix(&format!("{record}/names")).unwrap();
    assert_eq!((rows, cols), (1, 3));
    assert_eq!(names, vec![0, 1, 2]);
    assert_eq!(store.read_vector(&format!("{record}/name_len")).unwrap(), vec![3]);
    assert_eq!(store.read_vector(&format!("{record}/name_ids")).unwrap(), vec![1]);
    assert_eq!(store.read_scalar(&format!("{record}/relationship_id")).unwrap(), 300);

    // Union of subject (10,20,30,40) and object (5,50,10,30)
    assert_eq!(store.read_scalar(&format!("{record}/x")).unwrap(), 5);
    assert_eq!(store.read_scalar(&format!("{record}/y")).unwrap(), 20);
    assert_eq!(store.read_scalar(&format!("{record}/w")).unwrap(), 35);
    assert_eq!(store.read_scalar(&format!("{record}/h")).unwrap(), 60);

    // Retained predicates packed at the dataset-wide width
    let (rows, cols, intseq) = store.read_matrix("data_info/relationships_intseq").unwrap();
    assert_eq!((rows, cols), (2, 3));
    assert_eq!(intseq, vec![0, 0, 0, 0, 1, 2]);
    assert_eq!(
        store.read_vector("data_info/relationships_intseq_len").unwrap(),
        vec![1, 3]
    );

    let listed = std::fs::read_to_string(options.relationships_list_path()).unwrap();
    assert_eq!(listed, "on\non top of\n");
}

#[test]
fn relationship_job_refuses_existing_output_dir() {
    let root = tempfile::tempdir().unwrap();
    let options = relationship_fixture(root.path());
    std::fs::create_dir_all(&options.output_dir).unwrap();

    let err = RelationshipJob::new(options.clone()).run(&NoProgress).unwrap_err();
    assert!(matches!(
        err,
        VlmapError::Config(ConfigError::DestinationExists(_))
    ));
    assert_eq!(std::fs::read_dir(&options.output_dir).unwrap().count(), 0);
}

#[test]
fn relationship_job_rejects_split_count_mismatch() {
    let root = tempfile::tempdir().unwrap();
    let mut options = relationship_fixture(root.path());
    options.num_val_image = 2;

    let err = RelationshipJob::new(options.clone()).run(&NoProgress).unwrap_err();
    assert!(matches!(
        err,
        VlmapError::Data(DataError::SplitCountMismatch { total: 4, .. })
    ));
    assert!(!options.output_dir.exists());
}

#[test]
fn relationship_job_requires_inputs() {
    let root = tempfile::tempdir().unwrap();
    let mut options = relationship_fixture(root.path());
    options.vocab_path = root.path().join("missing_vocab.json");

    let err = RelationshipJob::new(options.clone()).run(&NoProgress).unwrap_err();
    assert!(matches!(err, VlmapError::Config(ConfigError::MissingInput(_))));
    assert!(!options.output_dir.exists());
}

#[test]
fn relationship_job_removes_published_outputs_when_publishing_fails() {
    let root = tempfile::tempdir().unwrap();
    let options = relationship_fixture(root.path());
    let claim = LateClaim::new("publishing", options.stats_path());

    let err = RelationshipJob::new(options.clone()).run(&claim).unwrap_err();
    assert!(claim.claimed.get());
    assert!(matches!(
        err,
        VlmapError::Config(ConfigError::DestinationExists(ref p)) if p == &options.stats_path()
    ));
    assert!(!options.output_dir.exists());
}

fn vocab_fixture(root: &Path) -> VocabOptions {
    let split_dir = root.join("standard");
    std::fs::create_dir_all(&split_dir).unwrap();

    let dic_path = root.join("dic_coco.json");
    write_json(
        &dic_path,
        json!({"images": [
            {"id": 1, "split": "train"},
            {"id": 2, "split": "val"},
            {"id": 3, "split": "train"},
        ]}),
    );

    let glove_vocab_path = root.join("glove_vocab.json");
    write_json(
        &glove_vocab_path,
        json!({"vocab": ["what", "color", "is", "red", "yes", "no", "zebra", "dog", "big"]}),
    );

    write_json(
        &split_dir.join("merged_annotations.json"),
        json!({
            "q1": {"q_tokens": ["what", "color", "is"], "a_tokens": ["red"]},
            "q2": {"q_tokens": ["is", "it"], "a_tokens": ["yes"]},
            "q3": {"q_tokens": [], "a_tokens": ["red"]},
            "q4": {"q_tokens": [], "a_tokens": ["zebra"]},
            "q5": {"q_tokens": [], "a_tokens": ["yes"]},
            "q6": {"q_tokens": [], "a_tokens": ["big", "dog"]},
            "q7": {"q_tokens": [], "a_tokens": ["dog"]},
            "q8": {"q_tokens": [], "a_tokens": ["unknownword"]},
        }),
    );
    write_json(
        &split_dir.join("obj_attrs_split.json"),
        json!({"train": ["dog"], "test": ["zebra"]}),
    );
    write_json(&split_dir.join("object_list.json"), json!(["zebra", "dog"]));
    write_json(&split_dir.join("attribute_list.json"), json!(["red"]));

    VocabOptions {
        split_dir,
        dic_path,
        glove_vocab_path,
        answer_set_limit: 3,
        max_answer_len: 1,
    }
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn vocab_job_end_to_end() {
    let root = tempfile::tempdir().unwrap();
    let options = vocab_fixture(root.path());
    let summary = VocabJob::new(options.clone()).run(&NoProgress).unwrap();

    assert_eq!(summary.split_sizes["train"], 2);
    assert_eq!(summary.split_sizes["val"], 1);
    assert_eq!(summary.outputs.len(), 3);

    let caption_split = read_json(&options.caption_split_path());
    assert_eq!(caption_split, json!({"train": [1, 3], "val": [2]}));

    let vocab = read_json(&options.vocab_path());
    assert_eq!(
        vocab["vocab"],
        json!(["what", "color", "is", "red", "yes", "zebra", "<s>", "<e>", "<unk>"])
    );
    assert_eq!(vocab["dict"]["zebra"], json!(5));

    let answers = read_json(&options.answer_dict_path());
    assert_eq!(answers["vocab"], json!(["red", "yes", "zebra"]));
    assert_eq!(answers["num_train_answer"], json!(2));
    assert_eq!(answers["dict"], json!({"red": 0, "yes": 1, "zebra": 2}));
    assert_eq!(answers["is_object"], json!([0, 0, 1]));
    assert_eq!(answers["is_attribute"], json!([1, 0, 0]));
}

#[test]
fn vocab_job_aborts_before_writing_when_any_output_exists() {
    let root = tempfile::tempdir().unwrap();
    let options = vocab_fixture(root.path());
    std::fs::write(options.answer_dict_path(), "{}").unwrap();

    let err = VocabJob::new(options.clone()).run(&NoProgress).unwrap_err();
    assert!(matches!(
        err,
        VlmapError::Config(ConfigError::DestinationExists(_))
    ));
    assert!(!options.caption_split_path().exists());
    assert!(!options.vocab_path().exists());
    assert_eq!(std::fs::read_to_string(options.answer_dict_path()).unwrap(), "{}");
}

#[test]
fn vocab_job_removes_published_outputs_when_writing_fails() {
    let root = tempfile::tempdir().unwrap();
    let options = vocab_fixture(root.path());
    let claim = LateClaim::new("writing", options.vocab_path());

    let err = VocabJob::new(options.clone()).run(&claim).unwrap_err();
    assert!(claim.claimed.get());
    assert!(matches!(
        err,
        VlmapError::Config(ConfigError::DestinationExists(ref p)) if p == &options.vocab_path()
    ));
    assert!(!options.caption_split_path().exists());
    assert!(!options.answer_dict_path().exists());
    assert_eq!(std::fs::read_to_string(options.vocab_path()).unwrap(), "claimed");
}
