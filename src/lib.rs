//! A fault-tolerant MapReduce coordinator and worker pool.
//!
//! See `coordinator` for the task registry and phase machine, `worker` for
//! the task execution loop, and `app` for the user-transform extension
//! point.

pub mod app;
pub mod config;
pub mod coordinator;
pub mod discovery;
pub mod error;
pub mod hash;
pub mod types;
pub mod worker;
