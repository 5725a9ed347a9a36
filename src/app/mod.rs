//! The user-application extension point (spec §6, design note in §9).
//!
//! The original source dynamically loads a user module by path. We
//! re-architect that as a narrow trait dispatched through a compile-time
//! registry of named applications — adding an application means registering
//! another implementation of [`MapReduceApp`], not touching the worker loop.

pub mod wordcount;

use crate::error::{MrError, Result};
use crate::types::KeyValue;

/// The only extension point the scheduling core knows about.
///
/// Both methods must be deterministic given their inputs; `reduce` must
/// additionally be invariant to the order of `values` (spec §6).
pub trait MapReduceApp: Send + Sync {
    fn map(&self, filename: &str, contents: &str) -> anyhow::Result<Vec<KeyValue>>;
    fn reduce(&self, key: &str, values: Vec<&str>) -> anyhow::Result<String>;
}

/// Resolve `<app_name>` against the compile-time registry (spec §6 worker
/// CLI: `worker <app_name>`).
pub fn resolve(app_name: &str) -> Result<Box<dyn MapReduceApp>> {
    match app_name {
        "wordcount" => Ok(Box::new(wordcount::WordCount)),
        other => Err(MrError::UnknownApp(other.to_string(), registered_names())),
    }
}

fn registered_names() -> Vec<&'static str> {
    vec!["wordcount"]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_the_built_in_wordcount_app() {
        assert!(resolve("wordcount").is_ok());
    }

    #[test]
    fn rejects_unknown_app_names() {
        let err = resolve("does-not-exist").unwrap_err();
        assert!(matches!(err, MrError::UnknownApp(name, _) if name == "does-not-exist"));
    }
}
