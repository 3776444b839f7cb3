//! The `vlmap inspect` command for looking at a finished dataset.

use clap::Args;
use std::path::PathBuf;
use vlmap_core::output::{read_index, IndexEntry};
use vlmap_core::pipeline::relationships::DATA_INFO;
use vlmap_core::store::join;
use vlmap_core::StoreReader;

/// Arguments for the `inspect` command.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Dataset directory (containing data.bin, id.txt, stats.txt)
    #[arg(required = true)]
    pub dir: PathBuf,

    /// List the records of this image using the index file
    #[arg(long)]
    pub image_id: Option<i64>,

    /// Print every field of one record
    #[arg(long)]
    pub record: Option<String>,
}

/// Execute the inspect command.
pub fn execute(args: InspectArgs) -> anyhow::Result<()> {
    if !args.dir.is_dir() {
        anyhow::bail!(
            "Dataset directory does not exist: {:?}\n\n  Hint: Check the path and try again.",
            args.dir
        );
    }

    if let Some(image_id) = args.image_id {
        let index = read_index(&args.dir.join("id.txt"))?;
        let records = records_for_image(&index, image_id);
        println!("Image {}: {} record(s)", image_id, records.len());
        for name in records {
            println!("  {}", name);
        }
        return Ok(());
    }

    let mut store = StoreReader::open(&args.dir.join("data.bin"))?;

    if let Some(record) = &args.record {
        let index = read_index(&args.dir.join("id.txt"))?;
        let Some(entry) = index.iter().find(|e| &e.record_name == record) else {
            anyhow::bail!("Record not found in index: {}", record);
        };
        let group = join(&entry.parent_id.to_string(), &entry.record_name);
        println!("{}", group);
        for field in store.children(&group) {
            let value = store.read(&join(&group, &field))?;
            println!("  {:<16} {}", field, value);
        }
        return Ok(());
    }

    println!("{}", store.path().display());
    for key in store.children(DATA_INFO) {
        let value = store.read(&join(DATA_INFO, &key))?;
        println!("  {:<26} {}", key, value);
    }
    Ok(())
}

/// Record names of one image, in index order.
fn records_for_image(index: &[IndexEntry], image_id: i64) -> Vec<&str> {
    index
        .iter()
        .filter(|e| e.parent_id == image_id)
        .map(|e| e.record_name.as_str())
        .collect()
}
