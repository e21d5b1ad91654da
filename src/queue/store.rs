//! FIFO queue state behind a single lock
//!
//! All job mutations plus the running/stop flags live under one mutex, which
//! is what keeps the single-Processing invariant and makes event publication
//! order equal mutation order: every state-changing method publishes its
//! events while still holding the lock.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::events::{EventBus, QueueEvent, StreamKind};
use crate::runner::RunOutcome;

use super::job::{Job, JobStatus};

/// Aggregate view of the queue, returned by the status call.
#[derive(Debug, Clone, Serialize)]
pub struct QueueStatus {
    pub running: bool,
    /// The job currently being processed, if any
    pub current: Option<Job>,
    pub pending: usize,
    pub completed: usize,
    pub errors: usize,
}

#[derive(Debug, Default)]
struct QueueState {
    jobs: Vec<Job>,
    running: bool,
    stop_requested: bool,
}

impl QueueState {
    fn count(&self, status: JobStatus) -> usize {
        self.jobs.iter().filter(|j| j.status == status).count()
    }
}

/// Ordered job store shared between the HTTP handlers, the scheduler loop
/// and the process runner.
#[derive(Debug, Clone)]
pub struct QueueStore {
    state: Arc<Mutex<QueueState>>,
    events: EventBus,
}

impl QueueStore {
    pub fn new(events: EventBus) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState::default())),
            events,
        }
    }

    /// Append one Pending job per path, in input order. Duplicate paths are
    /// allowed; each enqueue creates a fresh job.
    pub fn enqueue(&self, paths: Vec<PathBuf>) -> Vec<Job> {
        let mut state = self.state.lock();
        let mut created = Vec::with_capacity(paths.len());
        for path in paths {
            let job = Job::new(path);
            created.push(job.clone());
            state.jobs.push(job);
        }
        self.events.publish(QueueEvent::QueueUpdated {
            jobs: state.jobs.clone(),
        });
        created
    }

    /// Remove a job. Rejected while the job is being processed.
    pub fn remove(&self, id: Uuid) -> Result<Job> {
        let mut state = self.state.lock();
        let index = state
            .jobs
            .iter()
            .position(|j| j.id == id)
            .ok_or(Error::JobNotFound(id))?;
        if state.jobs[index].status == JobStatus::Processing {
            return Err(Error::invalid_state(
                "cannot remove a job while it is processing",
            ));
        }
        let job = state.jobs.remove(index);
        self.events.publish(QueueEvent::QueueUpdated {
            jobs: state.jobs.clone(),
        });
        Ok(job)
    }

    /// Empty the queue. Rejected while a run is active.
    pub fn clear(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.running {
            return Err(Error::Busy(
                "cannot clear the queue while a conversion run is active".to_string(),
            ));
        }
        state.jobs.clear();
        self.events.publish(QueueEvent::QueueUpdated {
            jobs: state.jobs.clone(),
        });
        Ok(())
    }

    /// Consistent snapshot of the job list.
    pub fn list(&self) -> Vec<Job> {
        self.state.lock().jobs.clone()
    }

    pub fn status(&self) -> QueueStatus {
        let state = self.state.lock();
        QueueStatus {
            running: state.running,
            current: state
                .jobs
                .iter()
                .find(|j| j.status == JobStatus::Processing)
                .cloned(),
            pending: state.count(JobStatus::Pending),
            completed: state.count(JobStatus::Completed),
            errors: state.count(JobStatus::Error),
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    // --- scheduler-side operations ---

    /// Flip to Running. Fails when already running or when there is no
    /// Pending job to work on.
    pub(crate) fn begin_run(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.running {
            return Err(Error::AlreadyRunning);
        }
        if state.count(JobStatus::Pending) == 0 {
            return Err(Error::NothingToDo);
        }
        state.running = true;
        state.stop_requested = false;
        Ok(())
    }

    /// Atomically select the earliest Pending job and mark it Processing.
    ///
    /// Returns `None` when a stop was requested or no Pending job remains,
    /// which are exactly the loop-exit conditions.
    pub(crate) fn claim_next_pending(&self) -> Option<Job> {
        let mut state = self.state.lock();
        if state.stop_requested {
            return None;
        }
        // Single-flight invariant: never a second Processing job
        if state.count(JobStatus::Processing) > 0 {
            return None;
        }
        let job = state
            .jobs
            .iter_mut()
            .find(|j| j.status == JobStatus::Pending)?;
        job.status = JobStatus::Processing;
        job.started_at = Some(Utc::now());
        job.progress = 0;
        job.error = None;
        let snapshot = job.clone();
        self.events.publish(QueueEvent::QueueUpdated {
            jobs: state.jobs.clone(),
        });
        self.events.publish(QueueEvent::JobStarted {
            job: snapshot.clone(),
        });
        Some(snapshot)
    }

    /// Record new progress for an active job. Ignored once the job left the
    /// Processing state or when the value would move backwards.
    pub(crate) fn record_progress(&self, id: Uuid, percent: u8) {
        let mut state = self.state.lock();
        let Some(job) = state.jobs.iter_mut().find(|j| j.id == id) else {
            return;
        };
        if job.status != JobStatus::Processing || percent <= job.progress {
            return;
        }
        job.progress = percent.min(100);
        let percent = job.progress;
        self.events.publish(QueueEvent::JobProgress {
            job_id: id,
            percent,
        });
    }

    /// Append one output line to an active job and forward it to observers.
    pub(crate) fn append_output(&self, id: Uuid, stream: StreamKind, text: &str) {
        let mut state = self.state.lock();
        let Some(job) = state.jobs.iter_mut().find(|j| j.id == id) else {
            return;
        };
        if job.status != JobStatus::Processing {
            return;
        }
        job.captured_output.push_str(text);
        job.captured_output.push('\n');
        self.events.publish(QueueEvent::ProcessOutput {
            job_id: id,
            stream,
            text: text.to_string(),
        });
    }

    /// Apply a runner outcome to a job. Returns false when the job was
    /// demoted back to Pending in the meantime (stop during processing), in
    /// which case the outcome is discarded.
    pub(crate) fn finalize(&self, id: Uuid, outcome: RunOutcome) -> bool {
        let mut state = self.state.lock();
        let Some(job) = state.jobs.iter_mut().find(|j| j.id == id) else {
            return false;
        };
        if job.status != JobStatus::Processing {
            return false;
        }
        match outcome {
            RunOutcome::Completed { output_dir } => {
                job.status = JobStatus::Completed;
                job.progress = 100;
                job.output_dir = Some(output_dir);
            }
            RunOutcome::Failed { message } => {
                job.status = JobStatus::Error;
                job.error = Some(message);
            }
        }
        job.completed_at = Some(Utc::now());
        let snapshot = job.clone();
        self.events.publish(QueueEvent::JobCompleted { job: snapshot });
        self.events.publish(QueueEvent::QueueUpdated {
            jobs: state.jobs.clone(),
        });
        true
    }

    /// Request a cooperative stop. A currently Processing job goes back to
    /// Pending with its progress cleared; the in-flight process keeps
    /// running and its result is discarded on exit.
    pub(crate) fn request_stop(&self) {
        let mut state = self.state.lock();
        state.stop_requested = true;
        if let Some(job) = state
            .jobs
            .iter_mut()
            .find(|j| j.status == JobStatus::Processing)
        {
            job.status = JobStatus::Pending;
            job.progress = 0;
            job.started_at = None;
        }
        self.events.publish(QueueEvent::QueueUpdated {
            jobs: state.jobs.clone(),
        });
        self.events.publish(QueueEvent::ProcessingStopped);
    }

    /// Return to idle once the loop exits. Reports whether the run ended by
    /// stop request (true) or by draining the backlog (false).
    pub(crate) fn finish_run(&self) -> bool {
        let mut state = self.state.lock();
        state.running = false;
        let stopped = state.stop_requested;
        state.stop_requested = false;
        if !stopped {
            self.events.publish(QueueEvent::QueueProcessingFinished);
        }
        stopped
    }
}
