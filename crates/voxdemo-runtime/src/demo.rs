//! A live demo session: the host plus the tasks that feed and watch it.

use anyhow::Context;
use tokio::task::JoinHandle;
use voxdemo_core::{Session, SystemEnv};

use crate::config::DemoConfig;
use crate::host::{self, HostHandle};
use crate::render::TranscriptPrinter;
use crate::{connection, watchdog};

pub struct LiveDemo {
    pub handle: HostHandle,
    host: JoinHandle<voxdemo_core::DemoStore<SystemEnv>>,
    workers: Vec<JoinHandle<()>>,
    printer: JoinHandle<std::io::Result<()>>,
}

impl LiveDemo {
    /// Spawn the host, the connection simulator, the watchdog and a printer.
    pub fn start(cfg: &DemoConfig, json: bool) -> Self {
        let (handle, host) = host::spawn(SystemEnv::new());

        let conn = {
            let handle = handle.clone();
            let cfg = cfg.connection.clone();
            tokio::spawn(async move {
                if let Err(e) = connection::run(handle, cfg).await {
                    tracing::warn!(error = %e, "connection simulator stopped");
                }
            })
        };
        let dog = {
            let handle = handle.clone();
            let deadline = std::time::Duration::from_millis(cfg.watchdog.deadline_ms);
            tokio::spawn(async move {
                if let Err(e) = watchdog::run(handle, deadline).await {
                    tracing::warn!(error = %e, "watchdog stopped");
                }
            })
        };

        let mut rx = handle.subscribe();
        let printer = tokio::spawn(async move {
            let mut printer = TranscriptPrinter::new();
            printer.follow(&mut rx, json, |_| false).await.map(|_| ())
        });

        Self {
            handle,
            host,
            workers: vec![conn, dog],
            printer,
        }
    }

    /// Stop the collaborators, drain the host and return the final session.
    pub async fn shutdown(self) -> anyhow::Result<Session> {
        // Workers hold handles; the host only stops once they are gone.
        for worker in &self.workers {
            worker.abort();
        }
        for worker in self.workers {
            let _ = worker.await;
        }
        drop(self.handle);

        let store = self.host.await.context("session host panicked")?;
        self.printer
            .await
            .context("printer panicked")?
            .context("failed to write transcript")?;

        tracing::debug!(revision = store.revision(), status = %store.status(), "demo finished");
        Ok(store.context().clone())
    }
}
