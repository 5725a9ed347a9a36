//! Rendezvous file handoff (spec §4.4): the coordinator writes its bound
//! `host:port` to a well-known file; workers poll it with backoff.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::error::{MrError, Result};

/// Write the rendezvous file. Called once, right after the listener binds.
pub async fn publish(path: &Path, addr: SocketAddr) -> Result<()> {
    tokio::fs::write(path, format!("{addr}\n"))
        .await
        .map_err(|e| MrError::Discovery(path.to_path_buf(), e))?;
    debug!(?path, %addr, "published coordinator rendezvous file");
    Ok(())
}

/// Remove the rendezvous file. Best-effort: a missing file is not an error,
/// since clean shutdown may race a worker that already consumed it.
pub async fn retract(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            debug!(?path, error = %e, "failed to remove rendezvous file on shutdown");
        }
    }
}

/// Poll for the rendezvous file with exponential backoff between `min` and
/// `max`, tolerating a coordinator that is still starting up.
pub async fn discover(path: &Path, min_backoff: Duration, max_backoff: Duration) -> Result<SocketAddr> {
    let mut backoff = min_backoff;
    loop {
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => {
                let addr = contents
                    .trim()
                    .parse::<SocketAddr>()
                    .map_err(|_| MrError::Discovery(
                        path.to_path_buf(),
                        std::io::Error::new(std::io::ErrorKind::InvalidData, "malformed host:port"),
                    ))?;
                return Ok(addr);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(?path, ?backoff, "rendezvous file not yet present, retrying");
                tokio::time::sleep(backoff).await;
                backoff = std::cmp::min(backoff * 2, max_backoff);
            }
            Err(e) => return Err(MrError::Discovery(path.to_path_buf(), e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_then_discover_round_trips_the_address() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coordinator_info.txt");
        let addr: SocketAddr = "127.0.0.1:4242".parse().unwrap();

        publish(&path, addr).await.unwrap();
        let found = discover(&path, Duration::from_millis(1), Duration::from_millis(5))
            .await
            .unwrap();
        assert_eq!(found, addr);
    }

    #[tokio::test]
    async fn retract_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coordinator_info.txt");
        let addr: SocketAddr = "127.0.0.1:4242".parse().unwrap();

        publish(&path, addr).await.unwrap();
        retract(&path).await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn retract_on_missing_file_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.txt");
        retract(&path).await;
    }
}
