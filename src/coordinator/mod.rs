//! The coordinator process (spec §4.1): task registry behind a single
//! mutex, served over [`tarpc`], plus a timeout monitor that reclaims
//! abandoned tasks and a rendezvous file for worker discovery (spec §4.4).

pub mod registry;

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use futures::future::{ready, Ready};
use futures::StreamExt;
use tarpc::context;
use tarpc::server::{incoming::Incoming, BaseChannel};
use tarpc::tokio_serde::formats::Json;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::discovery;
use crate::error::{MrError, Result};
use crate::types::{TaskKind, TaskReply};
use registry::TaskRegistry;

/// Upper bound on concurrently-served connections. Connections are
/// short-lived (spec §4.3: one request, one response, close), so this only
/// guards against an unbounded worker pool piling up at once.
const MAX_CONCURRENT_CONNECTIONS: usize = 1024;
/// Intermediate/output records are small; this just guards against a
/// pathological client rather than sizing for real workloads.
const MAX_FRAME_LENGTH: usize = 16 * 1024 * 1024;

/// RPC surface exposed to workers (spec §4.1, §6). `request_task` and
/// `complete_task` are the job's only two control-plane operations; a
/// worker drives all interaction, the coordinator never calls out.
#[tarpc::service]
pub trait Server {
    async fn request_task(worker_id: String) -> TaskReply;
    async fn complete_task(worker_id: String, task_kind: TaskKind, task_id: u32, success: bool) -> bool;
}

/// Shared coordinator handle. Cloning is cheap (two `Arc`s); every clone
/// serves the same underlying registry behind the same mutex, which is
/// exactly the concurrency discipline spec §5 calls for.
#[derive(Clone)]
pub struct Coordinator {
    registry: Arc<Mutex<TaskRegistry>>,
    config: Arc<Config>,
}

impl Coordinator {
    pub fn new(inputs: Vec<String>, reduce_n: u32, config: Config) -> Self {
        Self {
            registry: Arc::new(Mutex::new(TaskRegistry::new(inputs, reduce_n))),
            config: Arc::new(config),
        }
    }

    pub fn is_done(&self) -> bool {
        self.registry.lock().unwrap().is_done()
    }

    /// Run one timeout-monitor tick now (exposed for tests); production
    /// code instead calls [`Coordinator::spawn_timeout_monitor`].
    fn reclaim_expired(&self) {
        let reclaimed = self
            .registry
            .lock()
            .unwrap()
            .reclaim_expired(self.config.task_timeout, Instant::now());
        for (kind, id) in reclaimed {
            warn!(%kind, id, timeout = ?self.config.task_timeout, "reclaimed task after timeout");
        }
    }

    /// Background activity (spec §4.1, §5): wakes at `poll_interval`,
    /// reclaims any `IN_PROGRESS` task of the active phase past its lease.
    /// Runs until the job reaches `DONE`.
    pub fn spawn_timeout_monitor(&self) -> tokio::task::JoinHandle<()> {
        let coordinator = self.clone();
        let poll_interval = self.config.poll_interval;
        tokio::spawn(async move {
            while !coordinator.is_done() {
                sleep(poll_interval).await;
                coordinator.reclaim_expired();
            }
        })
    }
}

#[tarpc::server]
impl Server for Coordinator {
    type RequestTaskFut = Ready<TaskReply>;
    type CompleteTaskFut = Ready<bool>;

    fn request_task(self, _: context::Context, worker_id: String) -> Self::RequestTaskFut {
        let reply = self
            .registry
            .lock()
            .unwrap()
            .request_task(&worker_id, Instant::now());
        debug!(%worker_id, ?reply, "request_task");
        ready(reply)
    }

    fn complete_task(
        self,
        _: context::Context,
        worker_id: String,
        task_kind: TaskKind,
        task_id: u32,
        success: bool,
    ) -> Self::CompleteTaskFut {
        match self
            .registry
            .lock()
            .unwrap()
            .complete_task(&worker_id, task_kind, task_id, success)
        {
            Ok(()) => ready(true),
            Err(e @ MrError::UnknownTask { .. }) => {
                warn!(%worker_id, error = %e, "protocol error on complete_task");
                ready(false)
            }
            Err(e) => {
                warn!(%worker_id, error = %e, "unexpected error on complete_task");
                ready(false)
            }
        }
    }
}

/// Bind the listener, publish the rendezvous file, serve RPCs, run the
/// timeout monitor, and return once the job reaches `DONE`.
pub async fn run(inputs: Vec<String>, reduce_n: u32, config: Config) -> Result<()> {
    let coordinator = Coordinator::new(inputs, reduce_n, config.clone());

    let mut listener = tarpc::serde_transport::tcp::listen(config.coordinator_addr, Json::default)
        .await
        .map_err(|e| MrError::Bind(config.coordinator_addr, e))?;
    let bound_addr = listener.local_addr();
    listener.config_mut().max_frame_length(MAX_FRAME_LENGTH);

    discovery::publish(&config.coordinator_info_file, bound_addr).await?;
    info!(%bound_addr, "coordinator listening");

    let serve_coordinator = coordinator.clone();
    let server_task = tokio::spawn(async move {
        listener
            .filter_map(|r| async { r.ok() })
            .map(BaseChannel::with_defaults)
            .map(|channel| {
                let server = serve_coordinator.clone();
                channel.execute(server.serve()).for_each(|fut| async move {
                    tokio::spawn(fut);
                })
            })
            .buffer_unordered(MAX_CONCURRENT_CONNECTIONS)
            .for_each(|()| async {})
            .await;
    });

    let monitor_task = coordinator.spawn_timeout_monitor();

    while !coordinator.is_done() {
        sleep(config.poll_interval).await;
    }

    info!("job done, draining workers before shutdown");
    // Grace period so in-flight workers observe `Exit` before we tear down.
    sleep(config.poll_interval * 2).await;

    server_task.abort();
    monitor_task.abort();
    discovery::retract(&config.coordinator_info_file).await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_done_reflects_registry_state() {
        let coordinator = Coordinator::new(vec!["a.txt".into()], 1, Config::default());
        assert!(!coordinator.is_done());
    }

    #[tokio::test]
    async fn reclaim_expired_warns_but_does_not_panic_when_nothing_to_reclaim() {
        let coordinator = Coordinator::new(vec!["a.txt".into()], 1, Config::default());
        coordinator.reclaim_expired();
    }
}
