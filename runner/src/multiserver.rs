//! `MultiServer`: co-locate several servers on one Tokio runtime. A small
//! development convenience that starts every server, runs the event loop
//! until interrupted, then shuts each one down in turn.

use crate::error::RunnerError;
use async_trait::async_trait;
use flux::logging::{self, Logger};
use std::sync::Arc;

/// One server process MultiServer knows how to drive: `startup` runs once
/// before the runtime starts spawning, `run_forever` is the server's own
/// event loop (expected to run until cancelled or a fatal error),
/// `shutdown` runs once after every server's task has been stopped.
#[async_trait]
pub trait ManagedServer: Send + Sync {
    fn name(&self) -> &str;

    async fn startup(&self) -> Result<(), RunnerError> {
        Ok(())
    }

    async fn run_forever(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn shutdown(&self) {}
}

pub struct MultiServer {
    pub(crate) servers: Vec<Arc<dyn ManagedServer>>,
    log: Logger,
}

impl MultiServer {
    pub fn new(servers: Vec<Arc<dyn ManagedServer>>) -> MultiServer {
        MultiServer {
            servers,
            log: logging::init("runner"),
        }
    }

    /// Runs `startup` on every server, spawns each `run_forever` as its own
    /// task, then blocks until Ctrl-C, at which point every task is
    /// aborted and `shutdown` is run on every server in turn.
    pub async fn run(&self) -> Result<(), RunnerError> {
        for server in &self.servers {
            logging::info!(self.log, "starting server"; "name" => server.name());
            server.startup().await?;
        }

        let mut tasks = Vec::new();
        for server in self.servers.clone() {
            let log = self.log.new(logging::o!("server" => server.name().to_string()));
            tasks.push(tokio::spawn(async move {
                if let Err(err) = server.run_forever().await {
                    logging::error!(log, "server exited with an error"; "error" => %err);
                }
            }));
        }

        if tokio::signal::ctrl_c().await.is_err() {
            logging::warn!(self.log, "failed to install ctrl-c handler; shutting down immediately");
        } else {
            logging::info!(self.log, "ctrl-c received, shutting down");
        }

        for task in &tasks {
            task.abort();
        }
        for server in &self.servers {
            server.shutdown().await;
        }
        Ok(())
    }
}
