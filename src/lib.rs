//! mineru-queue: batch document conversion orchestration
//!
//! Queues documents and converts them one at a time by driving the external
//! MinerU toolchain as a subprocess. The queue is strictly FIFO and
//! single-flight: exactly one conversion process runs at any moment, its
//! output is streamed line-by-line into progress events, and a stop request
//! cooperatively winds the run down without killing the in-flight process.
//!
//! The crate exposes the orchestrator as a library (`Scheduler`,
//! `QueueStore`, `ProcessRunner`) and as an HTTP service (`server`) with an
//! SSE event stream.

pub mod config;
pub mod error;
pub mod events;
pub mod queue;
pub mod runner;
pub mod scheduler;
pub mod server;

pub use config::{AppConfig, ConvertSettings};
pub use error::{Error, Result};
pub use events::{EventBus, QueueEvent, StreamKind};
pub use queue::{Job, JobStatus, QueueStatus, QueueStore, RunOptions};
pub use runner::{JobRunner, ProcessRunner, RunOutcome};
pub use scheduler::Scheduler;
