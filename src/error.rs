//! Typed errors for the scheduling core.
//!
//! Internal operations return [`MrError`] so callers can match on *why*
//! something failed instead of parsing a message string. RPC replies never
//! carry this type directly (see [`crate::transport`]) — it is collapsed to
//! `{success: false, error: <string>}` at the RPC boundary and to a single
//! exit code at the binary boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MrError {
    #[error("input file {0:?} does not exist or cannot be read")]
    InputFile(std::path::PathBuf, #[source] std::io::Error),

    #[error("required reduce partition was never published: {0}")]
    MissingIntermediate(String),

    #[error("failed to publish {path:?} atomically")]
    AtomicPublish {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("intermediate record in {file:?} is not valid newline-delimited JSON: {source}")]
    MalformedRecord {
        file: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no task record for {kind:?} #{id}")]
    UnknownTask { kind: crate::types::TaskKind, id: u32 },

    #[error("failed to bind coordinator listener on {0}: {1}")]
    Bind(std::net::SocketAddr, #[source] std::io::Error),

    #[error("could not read coordinator rendezvous file {0:?}")]
    Discovery(std::path::PathBuf, #[source] std::io::Error),

    #[error("rpc call timed out after {0:?}")]
    RpcTimeout(std::time::Duration),

    #[error("rpc call failed")]
    Rpc(#[source] tarpc::client::RpcError),

    #[error("unknown application {0:?}; registered applications: {1:?}")]
    UnknownApp(String, Vec<&'static str>),

    #[error("invalid configuration value for {key}={value:?}: {reason}")]
    Config {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("user transform failed")]
    Transform(#[source] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, MrError>;
