//! Shared data model: task kinds, status, phase, and the wire record shapes
//! for intermediate and output files (see spec §3, §6).

use std::time::Instant;

use serde::{Deserialize, Serialize};

/// A single key/value pair, as produced by `map` and consumed by `reduce`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    Map,
    Reduce,
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskKind::Map => write!(f, "map"),
            TaskKind::Reduce => write!(f, "reduce"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Idle,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Map,
    Reduce,
    Done,
}

/// A coordinator-owned task record (spec §3).
///
/// `input` holds the one file a map task reads; it is unused for reduce
/// tasks, which derive their M intermediate inputs from `id` and `map_n`.
#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub kind: TaskKind,
    pub id: u32,
    pub status: TaskStatus,
    pub input: Option<String>,
    pub worker_id: Option<String>,
    pub start_time: Option<Instant>,
}

impl TaskRecord {
    pub fn new_map(id: u32, input: String) -> Self {
        Self {
            kind: TaskKind::Map,
            id,
            status: TaskStatus::Idle,
            input: Some(input),
            worker_id: None,
            start_time: None,
        }
    }

    pub fn new_reduce(id: u32) -> Self {
        Self {
            kind: TaskKind::Reduce,
            id,
            status: TaskStatus::Idle,
            input: None,
            worker_id: None,
            start_time: None,
        }
    }

    /// Invariant 4: an idle task carries neither assignment field.
    pub fn is_consistent(&self) -> bool {
        match self.status {
            TaskStatus::Idle => self.worker_id.is_none() && self.start_time.is_none(),
            TaskStatus::InProgress => self.worker_id.is_some() && self.start_time.is_some(),
            TaskStatus::Completed => true,
        }
    }
}

/// The coordinator's reply to `request_task` (spec §4.1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskReply {
    AssignMap {
        task_id: u32,
        input_file: String,
        reduce_n: u32,
    },
    AssignReduce {
        task_id: u32,
        map_n: u32,
    },
    Wait,
    Exit,
}
