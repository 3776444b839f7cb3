//! vlmap Core - Visual-language dataset preprocessing library.
//!
//! Builds vocabularies, answer sets, and packed relationship datasets from
//! captioning and visual-relationship corpora. Every stage is a deterministic
//! transformation with explicit inputs and outputs.
//!
//! # Architecture
//!
//! ```text
//! JSON corpus → Normalize → Frequency Filter (vs. Vocabulary) → Assign IDs
//!             → Split → Pack → Structured Store + index + stats
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use vlmap_core::{Config, NoProgress, RelationshipJob, RelationshipOptions};
//!
//! fn main() -> vlmap_core::Result<()> {
//!     let config = Config::load()?;
//!     let job = RelationshipJob::new(RelationshipOptions::from_config(&config));
//!     let summary = job.run(&NoProgress)?;
//!     println!("Records: {}", summary.stats.num_data);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod corpus;
pub mod error;
pub mod filter;
pub mod ids;
pub mod output;
pub mod pack;
pub mod pipeline;
pub mod progress;
pub mod split;
pub mod store;
pub mod text;
pub mod vocabulary;

// Re-exports for convenient access
pub use config::Config;
pub use error::{ConfigError, DataError, Result, StoreError, StoreResult, VlmapError};
pub use filter::{FilterOutcome, FrequencyFilter, OccurrenceCounts, RetentionPolicy};
pub use ids::IdMap;
pub use pack::{PackStats, PackedSequences};
pub use pipeline::{
    AnswerDictionary, RelationshipJob, RelationshipOptions, RelationshipStats,
    RelationshipSummary, VocabJob, VocabOptions, VocabSummary,
};
pub use progress::{NoProgress, Progress};
pub use split::{HeldOutSplit, PositionalSplit, Split, SplitCounts};
pub use store::{Dataset, StoreReader, StoreWriter};
pub use vocabulary::Vocabulary;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
