//! S3/S4 from spec §8: a worker crash during map is reclaimed and
//! reassigned, and a late completion from the original worker is ignored
//! once another worker has finished the task.

use std::time::{Duration, Instant};

use map_reduce_rs::app::wordcount::WordCount;
use map_reduce_rs::coordinator::registry::TaskRegistry;
use map_reduce_rs::types::{Phase, TaskKind, TaskReply};
use map_reduce_rs::worker::{mapper, reducer};

const TIMEOUT: Duration = Duration::from_secs(10);

/// S3 — worker crash during map: task 0 is reassigned after the timeout and
/// the job still completes with the correct output.
#[tokio::test]
async fn s3_crashed_map_task_is_reassigned_and_job_still_completes() {
    let dir = tempfile::tempdir().unwrap();
    tokio::fs::write(dir.path().join("a.txt"), "x y").await.unwrap();
    tokio::fs::write(dir.path().join("b.txt"), "y z").await.unwrap();

    let mut registry = TaskRegistry::new(vec!["a.txt".into(), "b.txt".into()], 1);
    let t0 = Instant::now();

    // w1 is assigned map task 0 and never reports (simulated crash).
    let reply = registry.request_task("w1", t0);
    assert_eq!(
        reply,
        TaskReply::AssignMap { task_id: 0, input_file: "a.txt".into(), reduce_n: 1 }
    );

    // w2 takes map task 1 and finishes normally.
    let reply = registry.request_task("w2", t0);
    let (task_id, input_file, reduce_n) = match reply {
        TaskReply::AssignMap { task_id, input_file, reduce_n } => (task_id, input_file, reduce_n),
        other => panic!("expected AssignMap, got {other:?}"),
    };
    mapper::execute(&WordCount, dir.path(), task_id, &input_file, reduce_n)
        .await
        .unwrap();
    registry.complete_task("w2", TaskKind::Map, task_id, true).unwrap();

    // Nothing else to assign yet: task 0 is still (believed) in progress.
    assert_eq!(registry.request_task("w3", t0), TaskReply::Wait);

    // TASK_TIMEOUT elapses; the monitor reclaims task 0.
    let after_timeout = t0 + TIMEOUT;
    let reclaimed = registry.reclaim_expired(TIMEOUT, after_timeout);
    assert_eq!(reclaimed, vec![(TaskKind::Map, 0)]);

    // w3 picks up the reclaimed task and finishes it.
    let reply = registry.request_task("w3", after_timeout);
    let (task_id, input_file, reduce_n) = match reply {
        TaskReply::AssignMap { task_id, input_file, reduce_n } => (task_id, input_file, reduce_n),
        other => panic!("expected AssignMap for the reclaimed task, got {other:?}"),
    };
    assert_eq!(task_id, 0);
    mapper::execute(&WordCount, dir.path(), task_id, &input_file, reduce_n)
        .await
        .unwrap();
    registry.complete_task("w3", TaskKind::Map, task_id, true).unwrap();

    assert_eq!(registry.phase(), Phase::Reduce);
    let reply = registry.request_task("w3", after_timeout);
    let (reduce_id, map_n) = match reply {
        TaskReply::AssignReduce { task_id, map_n } => (task_id, map_n),
        other => panic!("expected AssignReduce, got {other:?}"),
    };
    reducer::execute(&WordCount, dir.path(), reduce_id, map_n).await.unwrap();
    registry.complete_task("w3", TaskKind::Reduce, reduce_id, true).unwrap();

    assert_eq!(registry.phase(), Phase::Done);
    let output = tokio::fs::read_to_string(dir.path().join("mr-out-0")).await.unwrap();
    assert_eq!(output, "x\t1\ny\t2\nz\t1\n");
}

/// S4 — a late completion from the originally-crashed worker, arriving
/// after the reassigned worker already finished, changes nothing.
#[tokio::test]
async fn s4_late_completion_from_stale_worker_is_ignored() {
    let mut registry = TaskRegistry::new(vec!["a.txt".into(), "b.txt".into()], 1);
    let t0 = Instant::now();

    registry.request_task("w1", t0); // w1 gets map task 0, then "crashes"
    registry.request_task("w2", t0); // w2 gets map task 1
    registry.complete_task("w2", TaskKind::Map, 1, true).unwrap();

    let after_timeout = t0 + TIMEOUT;
    registry.reclaim_expired(TIMEOUT, after_timeout);
    registry.request_task("w3", after_timeout); // w3 gets the reclaimed task 0
    registry.complete_task("w3", TaskKind::Map, 0, true).unwrap();

    assert_eq!(registry.phase(), Phase::Reduce);

    // w1 "wakes up" and reports success for a task it no longer owns.
    registry.complete_task("w1", TaskKind::Map, 0, true).unwrap();

    // State is unchanged: still in reduce phase, task 0 still completed by w3.
    assert_eq!(registry.phase(), Phase::Reduce);
}
