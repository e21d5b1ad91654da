//! Queue event broadcasting
//!
//! State changes are published on a broadcast channel so any number of
//! observers (the SSE endpoint, tests, future frontends) can follow a run
//! without the queue or runner knowing about them.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::queue::job::Job;

/// Buffered events per subscriber before slow consumers start lagging.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Which pipe of the conversion process a line arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamKind::Stdout => write!(f, "stdout"),
            StreamKind::Stderr => write!(f, "stderr"),
        }
    }
}

/// A state change in the queue or in one of its jobs.
///
/// Events are published in the exact order the corresponding mutations
/// occur; a `JobCompleted` for a job is always preceded by its `JobStarted`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum QueueEvent {
    /// The job list changed (enqueue, remove, clear, status transitions)
    QueueUpdated { jobs: Vec<Job> },
    /// A job moved to Processing
    JobStarted { job: Job },
    /// A job reached a terminal status
    JobCompleted { job: Job },
    /// Estimated progress for the active job changed
    JobProgress { job_id: Uuid, percent: u8 },
    /// One output line from the conversion process
    ProcessOutput {
        job_id: Uuid,
        stream: StreamKind,
        text: String,
    },
    /// The run drained the backlog and returned to idle
    QueueProcessingFinished,
    /// A stop request was accepted
    ProcessingStopped,
}

impl QueueEvent {
    /// Wire name of the event, used as the SSE event type.
    pub fn name(&self) -> &'static str {
        match self {
            QueueEvent::QueueUpdated { .. } => "queue-updated",
            QueueEvent::JobStarted { .. } => "job-started",
            QueueEvent::JobCompleted { .. } => "job-completed",
            QueueEvent::JobProgress { .. } => "job-progress",
            QueueEvent::ProcessOutput { .. } => "process-output",
            QueueEvent::QueueProcessingFinished => "queue-processing-finished",
            QueueEvent::ProcessingStopped => "processing-stopped",
        }
    }
}

/// Clonable handle over the broadcast channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<QueueEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn publish(&self, event: QueueEvent) {
        let _ = self.tx.send(event);
    }

    /// Subscribe to all events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(EVENT_CHANNEL_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_arrive_in_publish_order() {
        tokio_test::block_on(async {
            let bus = EventBus::default();
            let mut rx = bus.subscribe();

            let id = Uuid::new_v4();
            bus.publish(QueueEvent::JobProgress {
                job_id: id,
                percent: 10,
            });
            bus.publish(QueueEvent::JobProgress {
                job_id: id,
                percent: 20,
            });
            bus.publish(QueueEvent::QueueProcessingFinished);

            assert!(matches!(
                rx.recv().await.unwrap(),
                QueueEvent::JobProgress { percent: 10, .. }
            ));
            assert!(matches!(
                rx.recv().await.unwrap(),
                QueueEvent::JobProgress { percent: 20, .. }
            ));
            assert!(matches!(
                rx.recv().await.unwrap(),
                QueueEvent::QueueProcessingFinished
            ));
        });
    }

    #[test]
    fn test_publish_without_subscribers_is_ok() {
        let bus = EventBus::default();
        bus.publish(QueueEvent::ProcessingStopped);
    }

    #[test]
    fn test_event_names() {
        assert_eq!(
            QueueEvent::QueueUpdated { jobs: vec![] }.name(),
            "queue-updated"
        );
        assert_eq!(
            QueueEvent::QueueProcessingFinished.name(),
            "queue-processing-finished"
        );
        assert_eq!(QueueEvent::ProcessingStopped.name(), "processing-stopped");
    }
}
