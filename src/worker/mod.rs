//! The worker process (spec §4.2): discover the coordinator, then loop
//! requesting a task, executing it, and reporting completion until told to
//! exit.

pub mod io;
pub mod mapper;
pub mod reducer;

use std::path::Path;
use std::time::Duration;

use tarpc::{client, context};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::app::MapReduceApp;
use crate::config::Config;
use crate::coordinator::ServerClient;
use crate::discovery;
use crate::error::{MrError, Result};
use crate::types::{TaskKind, TaskReply};

/// Generate a fresh, never-reused worker identity (spec §3).
pub fn new_worker_id() -> String {
    Uuid::new_v4().to_string()
}

/// Connect to the coordinator named by the rendezvous file, retrying with
/// exponential backoff (spec §7: "100 ms → 2 s") so a worker started
/// slightly ahead of the coordinator still joins the job.
pub async fn connect(config: &Config) -> Result<ServerClient> {
    let addr = discovery::discover(
        &config.coordinator_info_file,
        config.dial_backoff_min,
        config.dial_backoff_max,
    )
    .await?;

    let mut backoff = config.dial_backoff_min;
    loop {
        match tarpc::serde_transport::tcp::connect(addr, tarpc::tokio_serde::formats::Json::default).await {
            Ok(transport) => return Ok(ServerClient::new(client::Config::default(), transport).spawn()),
            Err(e) => {
                warn!(%addr, error = %e, ?backoff, "failed to dial coordinator, retrying");
                tokio::time::sleep(backoff).await;
                backoff = std::cmp::min(backoff * 2, config.dial_backoff_max);
            }
        }
    }
}

/// Drive the task loop until the coordinator replies `Exit` (spec §4.2
/// main loop).
pub async fn run(client: ServerClient, app: Box<dyn MapReduceApp>, base_dir: &Path, config: &Config) -> Result<()> {
    let worker_id = new_worker_id();
    info!(%worker_id, "worker started");

    loop {
        let reply = call_with_timeout(
            client.request_task(context::current(), worker_id.clone()),
            config.rpc_timeout,
        )
        .await?;

        match reply {
            TaskReply::Wait => {
                tokio::time::sleep(config.poll_interval).await;
            }
            TaskReply::Exit => {
                info!(%worker_id, "job done, exiting");
                return Ok(());
            }
            TaskReply::AssignMap { task_id, input_file, reduce_n } => {
                let success = mapper::execute(app.as_ref(), base_dir, task_id, &input_file, reduce_n)
                    .await
                    .map_err(|e| warn!(%worker_id, task_id, error = %e, "map task failed"))
                    .is_ok();
                report(&client, &worker_id, TaskKind::Map, task_id, success, config).await?;
            }
            TaskReply::AssignReduce { task_id, map_n } => {
                let success = reducer::execute(app.as_ref(), base_dir, task_id, map_n)
                    .await
                    .map_err(|e| warn!(%worker_id, task_id, error = %e, "reduce task failed"))
                    .is_ok();
                report(&client, &worker_id, TaskKind::Reduce, task_id, success, config).await?;
            }
        }
    }
}

async fn report(
    client: &ServerClient,
    worker_id: &str,
    kind: TaskKind,
    task_id: u32,
    success: bool,
    config: &Config,
) -> Result<()> {
    call_with_timeout(
        client.complete_task(context::current(), worker_id.to_string(), kind, task_id, success),
        config.rpc_timeout,
    )
    .await?;
    Ok(())
}

async fn call_with_timeout<T>(
    call: impl std::future::Future<Output = std::result::Result<T, tarpc::client::RpcError>>,
    timeout: Duration,
) -> Result<T> {
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            error!(error = %e, "rpc call failed");
            Err(MrError::Rpc(e))
        }
        Err(_) => Err(MrError::RpcTimeout(timeout)),
    }
}
