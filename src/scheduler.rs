//! Single-flight scheduling of conversion jobs
//!
//! The scheduler owns the queue store and drives one job at a time through
//! an injected runner. It is a two-state machine (Idle/Running) with
//! cooperative stop: a stop request demotes the active job back to Pending
//! and the loop winds down after the in-flight process exits. The process
//! itself is never killed, so a restarted run can never overlap with it.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::queue::job::RunOptions;
use crate::queue::store::{QueueStatus, QueueStore};
use crate::runner::env::{EnvironmentResolver, LaunchSpec};
use crate::runner::JobRunner;

/// Pause between jobs, cancellable so a stop request does not have to wait
/// out the delay.
#[derive(Debug)]
pub struct Pacer {
    delay: Duration,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub async fn wait(&self, cancel: &CancellationToken) {
        if self.delay.is_zero() {
            return;
        }
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(self.delay) => {}
        }
    }
}

/// Dispatches queued jobs sequentially through the runner.
#[derive(Clone)]
pub struct Scheduler {
    store: QueueStore,
    runner: Arc<dyn JobRunner>,
    resolver: Arc<dyn EnvironmentResolver>,
    pacer: Arc<Pacer>,
    /// Cancellation handle for the active run's pauses
    cancel: Arc<Mutex<CancellationToken>>,
}

impl Scheduler {
    pub fn new(
        store: QueueStore,
        runner: Arc<dyn JobRunner>,
        resolver: Arc<dyn EnvironmentResolver>,
        pause: Duration,
    ) -> Self {
        Self {
            store,
            runner,
            resolver,
            pacer: Arc::new(Pacer::new(pause)),
            cancel: Arc::new(Mutex::new(CancellationToken::new())),
        }
    }

    pub fn store(&self) -> &QueueStore {
        &self.store
    }

    /// Begin a run. Fails when a run is already active, when the options
    /// carry no output root, when the toolchain cannot be resolved, or when
    /// there is nothing to process. On success the loop runs on its own
    /// task until the backlog drains or a stop is requested.
    pub async fn start(&self, options: RunOptions) -> Result<()> {
        if self.store.is_running() {
            return Err(Error::AlreadyRunning);
        }
        if options.output_dir.as_os_str().is_empty() {
            return Err(Error::validation("no output directory selected"));
        }

        let launch = self.resolver.resolve(&options).await?;

        // Re-checked under the queue lock: a concurrent start may have won
        // between the fast check above and here.
        self.store.begin_run()?;

        let token = CancellationToken::new();
        *self.cancel.lock() = token.clone();

        let scheduler = self.clone();
        tokio::spawn(async move {
            scheduler.run_loop(launch, options, token).await;
        });

        Ok(())
    }

    async fn run_loop(&self, launch: LaunchSpec, options: RunOptions, cancel: CancellationToken) {
        tracing::info!("Conversion run started");

        loop {
            // Exits on stop request or an empty backlog; claiming also
            // marks the job Processing in the same locked step.
            let Some(job) = self.store.claim_next_pending() else {
                break;
            };

            tracing::info!(job_id = %job.id, name = %job.display_name, "Processing job");
            let outcome = self.runner.run(&job, &launch, &options).await;

            if !self.store.finalize(job.id, outcome) {
                tracing::debug!(
                    job_id = %job.id,
                    "Job was returned to the queue; discarding process result"
                );
            }

            self.pacer.wait(&cancel).await;
        }

        if self.store.finish_run() {
            tracing::info!("Conversion run stopped");
        } else {
            tracing::info!("Conversion queue drained");
        }
    }

    /// Request a cooperative stop. Always succeeds; the running flag drops
    /// once the loop observes the request.
    pub fn stop(&self) {
        tracing::info!("Stop requested");
        self.store.request_stop();
        self.cancel.lock().cancel();
    }

    pub fn status(&self) -> QueueStatus {
        self.store.status()
    }
}
