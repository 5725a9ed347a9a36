//! Reduce task execution (spec §4.2): read the M intermediate files for a
//! partition, group by key, invoke the user `reduce`, publish the output.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::app::MapReduceApp;
use crate::error::{MrError, Result};
use crate::types::KeyValue;
use crate::worker::io::atomic_write;
use crate::worker::mapper::intermediate_path;

/// Output file name for reduce partition `r`, rooted at `base_dir`.
pub fn output_path(base_dir: &Path, reduce_id: u32) -> PathBuf {
    base_dir.join(format!("mr-out-{reduce_id}"))
}

pub async fn execute(
    app: &dyn MapReduceApp,
    base_dir: &Path,
    reduce_id: u32,
    map_n: u32,
) -> Result<()> {
    let mut kvs = read_partition(base_dir, reduce_id, map_n).await?;

    // Sorting is pure CPU work over an in-memory vector, the one place in
    // this worker where handing it to the thread pool pays for itself on a
    // partition with many keys.
    kvs.par_sort_by(|a, b| a.key.cmp(&b.key));

    let mut body = String::new();
    let mut index = 0;
    while index < kvs.len() {
        let key = kvs[index].key.clone();
        let mut end = index;
        while end < kvs.len() && kvs[end].key == key {
            end += 1;
        }
        let values: Vec<&str> = kvs[index..end].iter().map(|kv| kv.value.as_str()).collect();
        let reduced = app.reduce(&key, values).map_err(MrError::Transform)?;
        body.push_str(&format!("{key}\t{reduced}\n"));
        index = end;
    }

    atomic_write(&output_path(base_dir, reduce_id), body.as_bytes()).await
}

async fn read_partition(base_dir: &Path, reduce_id: u32, map_n: u32) -> Result<Vec<KeyValue>> {
    let mut kvs = Vec::new();
    for m in 0..map_n {
        let path = intermediate_path(base_dir, m, reduce_id);
        let contents = tokio::fs::read_to_string(&path).await.map_err(|_| {
            MrError::MissingIntermediate(path.display().to_string())
        })?;
        for line in contents.lines().filter(|l| !l.is_empty()) {
            let kv: KeyValue = serde_json::from_str(line)
                .map_err(|e| MrError::MalformedRecord { file: path.clone(), source: e })?;
            kvs.push(kv);
        }
    }
    Ok(kvs)
}
