//! Structured store: a single-file container of named groups and datasets.
//!
//! Groups nest by `/`-separated paths (`"<image_id>/<record>/names"`). The
//! writer is append-only and publishes the file only when finished; the reader
//! loads the directory once and seeks to individual datasets on demand.

mod format;
mod reader;
mod writer;

pub use format::{join, Dataset};
pub use reader::StoreReader;
pub use writer::{FinishedStore, StoreWriter};
