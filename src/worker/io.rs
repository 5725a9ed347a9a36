//! The one publication mechanism every on-disk artifact goes through (spec
//! §4.2 step 5, §9 "Atomic publication"): write to `<name>.tmp`, then
//! rename onto the final name. No reader ever observes a partial file.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::error::{MrError, Result};

pub async fn atomic_write(final_path: &Path, contents: &[u8]) -> Result<()> {
    let tmp_path = tmp_path_for(final_path);

    let mut file = tokio::fs::File::create(&tmp_path)
        .await
        .map_err(|e| MrError::AtomicPublish { path: tmp_path.clone(), source: e })?;
    file.write_all(contents)
        .await
        .map_err(|e| MrError::AtomicPublish { path: tmp_path.clone(), source: e })?;
    file.sync_all()
        .await
        .map_err(|e| MrError::AtomicPublish { path: tmp_path.clone(), source: e })?;
    drop(file);

    tokio::fs::rename(&tmp_path, final_path)
        .await
        .map_err(|e| MrError::AtomicPublish { path: final_path.to_path_buf(), source: e })?;

    Ok(())
}

fn tmp_path_for(final_path: &Path) -> PathBuf {
    let mut os_string = final_path.as_os_str().to_owned();
    os_string.push(".tmp");
    PathBuf::from(os_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publishes_under_the_final_name_with_no_tmp_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("mr-0-0");

        atomic_write(&final_path, b"hello\n").await.unwrap();

        assert_eq!(tokio::fs::read(&final_path).await.unwrap(), b"hello\n");
        assert!(!tmp_path_for(&final_path).exists());
    }

    #[tokio::test]
    async fn empty_contents_still_create_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("mr-out-0");

        atomic_write(&final_path, b"").await.unwrap();

        assert_eq!(tokio::fs::read(&final_path).await.unwrap(), b"");
    }

    #[tokio::test]
    async fn rewriting_overwrites_the_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("mr-0-0");

        atomic_write(&final_path, b"first\n").await.unwrap();
        atomic_write(&final_path, b"second\n").await.unwrap();

        assert_eq!(tokio::fs::read(&final_path).await.unwrap(), b"second\n");
    }
}
