//! The task registry and phase machine (spec §3, §4.1).
//!
//! This is the only piece of coordinator state, and it is only ever
//! touched from behind the coordinator's single mutex (see
//! [`crate::coordinator::Coordinator`]) — every method here assumes
//! exclusive access and is free of its own synchronization.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::{MrError, Result};
use crate::types::{Phase, TaskKind, TaskReply, TaskRecord, TaskStatus};

pub struct TaskRegistry {
    map_tasks: Vec<TaskRecord>,
    reduce_tasks: Vec<TaskRecord>,
    phase: Phase,
    map_n: u32,
    reduce_n: u32,
}

impl TaskRegistry {
    /// Create the registry for a job: one map task per input file (in
    /// argument order), then `reduce_n` reduce tasks (spec §3 lifecycle).
    pub fn new(inputs: Vec<String>, reduce_n: u32) -> Self {
        assert!(!inputs.is_empty(), "a job needs at least one input file");
        assert!(reduce_n >= 1, "a job needs at least one reduce partition");

        let map_n = inputs.len() as u32;
        let map_tasks = inputs
            .into_iter()
            .enumerate()
            .map(|(id, input)| TaskRecord::new_map(id as u32, input))
            .collect();
        let reduce_tasks = (0..reduce_n).map(TaskRecord::new_reduce).collect();

        Self {
            map_tasks,
            reduce_tasks,
            phase: Phase::Map,
            map_n,
            reduce_n,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    fn tasks_mut(&mut self, kind: TaskKind) -> &mut Vec<TaskRecord> {
        match kind {
            TaskKind::Map => &mut self.map_tasks,
            TaskKind::Reduce => &mut self.reduce_tasks,
        }
    }

    fn active_tasks_mut(&mut self) -> Option<&mut Vec<TaskRecord>> {
        match self.phase {
            Phase::Map => Some(&mut self.map_tasks),
            Phase::Reduce => Some(&mut self.reduce_tasks),
            Phase::Done => None,
        }
    }

    /// Assignment policy (spec §4.1): scan the active phase's tasks in id
    /// order, hand out the first `IDLE` one. Advance phases and retry when
    /// every task of the current phase has been accounted for.
    pub fn request_task(&mut self, worker_id: &str, now: Instant) -> TaskReply {
        loop {
            let map_n = self.map_n;
            let reduce_n = self.reduce_n;
            match self.phase {
                Phase::Map => {
                    if let Some(reply) = self.try_assign(TaskKind::Map, worker_id, now, |t| {
                        TaskReply::AssignMap {
                            task_id: t.id,
                            input_file: t.input.clone().expect("map task always has an input"),
                            reduce_n,
                        }
                    }) {
                        return reply;
                    }
                    if self.all_completed(TaskKind::Map) {
                        self.phase = Phase::Reduce;
                        info!("all map tasks completed, entering reduce phase");
                        continue;
                    }
                    return TaskReply::Wait;
                }
                Phase::Reduce => {
                    if let Some(reply) = self.try_assign(TaskKind::Reduce, worker_id, now, |t| {
                        TaskReply::AssignReduce {
                            task_id: t.id,
                            map_n,
                        }
                    }) {
                        return reply;
                    }
                    if self.all_completed(TaskKind::Reduce) {
                        self.phase = Phase::Done;
                        info!("all reduce tasks completed, job is done");
                        continue;
                    }
                    return TaskReply::Wait;
                }
                Phase::Done => return TaskReply::Exit,
            }
        }
    }

    fn try_assign(
        &mut self,
        kind: TaskKind,
        worker_id: &str,
        now: Instant,
        to_reply: impl FnOnce(&TaskRecord) -> TaskReply,
    ) -> Option<TaskReply> {
        let task = self
            .tasks_mut(kind)
            .iter_mut()
            .find(|t| t.status == TaskStatus::Idle)?;
        task.status = TaskStatus::InProgress;
        task.worker_id = Some(worker_id.to_string());
        task.start_time = Some(now);
        debug!(%kind, id = task.id, %worker_id, "assigned task");
        Some(to_reply(task))
    }

    fn all_completed(&self, kind: TaskKind) -> bool {
        match kind {
            TaskKind::Map => &self.map_tasks,
            TaskKind::Reduce => &self.reduce_tasks,
        }
        .iter()
        .all(|t| t.status == TaskStatus::Completed)
    }

    /// Completion report handling (spec §4.1). Stale or duplicate reports
    /// are accepted (idempotent no-ops) rather than rejected as errors —
    /// only a reference to a task that was never created is an error.
    pub fn complete_task(
        &mut self,
        worker_id: &str,
        kind: TaskKind,
        id: u32,
        success: bool,
    ) -> Result<()> {
        let task = self
            .tasks_mut(kind)
            .get_mut(id as usize)
            .filter(|t| t.id == id)
            .ok_or(MrError::UnknownTask { kind, id })?;

        match task.status {
            TaskStatus::Completed => {
                debug!(%kind, id, %worker_id, "ignoring completion for already-completed task");
                return Ok(());
            }
            TaskStatus::Idle => {
                // Reassigned away from the reporter (e.g. timed out, then a
                // replacement finished first) and since reclaimed further.
                // Nothing to reconcile; drop the report.
                warn!(%kind, id, %worker_id, "ignoring completion for idle (already reassigned) task");
                return Ok(());
            }
            TaskStatus::InProgress => {}
        }

        if task.worker_id.as_deref() != Some(worker_id) {
            warn!(
                %kind, id, %worker_id,
                assigned_to = ?task.worker_id,
                "ignoring completion from stale worker"
            );
            return Ok(());
        }

        if success {
            task.status = TaskStatus::Completed;
            task.worker_id = None;
            task.start_time = None;
            debug!(%kind, id, %worker_id, "task completed");
        } else {
            task.status = TaskStatus::Idle;
            task.worker_id = None;
            task.start_time = None;
            warn!(%kind, id, %worker_id, "task reported failure, returned to idle");
        }

        Ok(())
    }

    /// Timeout monitor tick (spec §4.1): reclaim every `IN_PROGRESS` task of
    /// the *active* phase whose lease has expired. Returns the reclaimed
    /// `(kind, id)` pairs for logging by the caller.
    pub fn reclaim_expired(&mut self, timeout: Duration, now: Instant) -> Vec<(TaskKind, u32)> {
        let Some(tasks) = self.active_tasks_mut() else {
            return Vec::new();
        };

        let mut reclaimed = Vec::new();
        for task in tasks.iter_mut() {
            if task.status == TaskStatus::InProgress {
                let elapsed = task.start_time.map(|start| now.duration_since(start));
                if elapsed.is_some_and(|e| e >= timeout) {
                    task.status = TaskStatus::Idle;
                    task.worker_id = None;
                    task.start_time = None;
                    reclaimed.push((task.kind, task.id));
                }
            }
        }
        reclaimed
    }

    #[cfg(test)]
    pub fn all_records_consistent(&self) -> bool {
        self.map_tasks.iter().all(TaskRecord::is_consistent)
            && self.reduce_tasks.iter().all(TaskRecord::is_consistent)
    }
}
