//! Map task execution (spec §4.2): read the input file, invoke the user
//! `map`, partition by [`crate::hash::partition_of`], publish one
//! intermediate file per reduce partition.

use std::path::{Path, PathBuf};

use crate::app::MapReduceApp;
use crate::error::{MrError, Result};
use crate::hash::partition_of;
use crate::types::KeyValue;
use crate::worker::io::atomic_write;

/// Intermediate file name for map task `m`, reduce partition `r`, rooted at
/// `base_dir` (the shared `mr-*` namespace, normally the process cwd).
pub fn intermediate_path(base_dir: &Path, map_id: u32, reduce_id: u32) -> PathBuf {
    base_dir.join(format!("mr-{map_id}-{reduce_id}"))
}

pub async fn execute(
    app: &dyn MapReduceApp,
    base_dir: &Path,
    map_id: u32,
    input_file: &str,
    reduce_n: u32,
) -> Result<()> {
    let input_path = base_dir.join(input_file);
    let contents = tokio::fs::read_to_string(&input_path)
        .await
        .map_err(|e| MrError::InputFile(input_path.clone(), e))?;

    let kvs = app
        .map(input_file, &contents)
        .map_err(MrError::Transform)?;

    let partitions = partition(kvs, reduce_n);

    // Partition r is created even when empty (spec §4.2 step 4).
    for (r, kvs_in_partition) in partitions.into_iter().enumerate() {
        let path = intermediate_path(base_dir, map_id, r as u32);
        let body = encode_records(&kvs_in_partition);
        atomic_write(&path, body.as_bytes()).await?;
    }

    Ok(())
}

fn partition(kvs: Vec<KeyValue>, reduce_n: u32) -> Vec<Vec<KeyValue>> {
    let mut partitions: Vec<Vec<KeyValue>> = (0..reduce_n).map(|_| Vec::new()).collect();
    for kv in kvs {
        let r = partition_of(&kv.key, reduce_n) as usize;
        partitions[r].push(kv);
    }
    partitions
}

fn encode_records(kvs: &[KeyValue]) -> String {
    let mut body = String::new();
    for kv in kvs {
        // Each record is independently parseable NDJSON (spec §6).
        body.push_str(&serde_json::to_string(kv).expect("KeyValue always serializes"));
        body.push('\n');
    }
    body
}
