//! Execution of a single conversion job as an external process

pub mod env;
pub mod progress;

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::events::StreamKind;
use crate::queue::job::{Job, RunOptions};
use crate::queue::store::QueueStore;

use self::env::LaunchSpec;
use self::progress::ProgressEstimator;

/// Terminal result of one job execution.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Completed { output_dir: PathBuf },
    Failed { message: String },
}

/// Runs exactly one job to completion.
#[async_trait]
pub trait JobRunner: Send + Sync {
    async fn run(&self, job: &Job, launch: &LaunchSpec, options: &RunOptions) -> RunOutcome;
}

/// Runs jobs by spawning the resolved conversion tool and supervising it:
/// per-job output directory, line-by-line output streaming, progress
/// estimation and exit-status interpretation.
pub struct ProcessRunner {
    store: QueueStore,
    progress: Arc<dyn ProgressEstimator>,
}

impl ProcessRunner {
    pub fn new(store: QueueStore, progress: Arc<dyn ProgressEstimator>) -> Self {
        Self { store, progress }
    }

    /// Argv for one job, assembled as discrete parameters rather than a
    /// shell string. Flags matching the tool's own defaults are omitted.
    fn build_args(input: &Path, output_dir: &Path, options: &RunOptions) -> Vec<String> {
        let mut args = vec![
            "-p".to_string(),
            input.display().to_string(),
            "-o".to_string(),
            output_dir.display().to_string(),
        ];

        if options.method != "auto" {
            args.push("-m".to_string());
            args.push(options.method.clone());
        }
        if options.backend != "pipeline" {
            args.push("-b".to_string());
            args.push(options.backend.clone());
        }
        if options.lang != "ch" {
            args.push("-l".to_string());
            args.push(options.lang.clone());
        }
        if let Some(url) = options.url.as_deref().filter(|u| !u.is_empty()) {
            args.push("-u".to_string());
            args.push(url.to_string());
        }
        if let Some(start) = options.start_page {
            args.push("-s".to_string());
            args.push(start.to_string());
        }
        if let Some(end) = options.end_page {
            args.push("-e".to_string());
            args.push(end.to_string());
        }
        args.push("-f".to_string());
        args.push(options.formula.to_string());
        args.push("-t".to_string());
        args.push(options.table.to_string());
        if let Some(device) = options.device.as_deref().filter(|d| !d.is_empty()) {
            args.push("-d".to_string());
            args.push(device.to_string());
        }
        if let Some(vram) = options.vram {
            args.push("--vram".to_string());
            args.push(vram.to_string());
        }
        if options.source != "huggingface" {
            args.push("--source".to_string());
            args.push(options.source.clone());
        }

        args
    }

    /// Stream one pipe line-by-line into the store. Stderr lines are also
    /// collected so a failing exit can report what the tool said.
    fn spawn_reader<R>(
        &self,
        job_id: uuid::Uuid,
        stream: StreamKind,
        reader: R,
        counter: Arc<AtomicU8>,
    ) -> JoinHandle<Vec<String>>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let store = self.store.clone();
        let estimator = self.progress.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(reader).lines();
            let mut collected = Vec::new();
            while let Ok(Some(line)) = lines.next_line().await {
                store.append_output(job_id, stream, &line);
                let current = counter.load(Ordering::Relaxed);
                if let Some(next) = estimator.advance(&line, current) {
                    counter.fetch_max(next, Ordering::Relaxed);
                    store.record_progress(job_id, next);
                }
                if stream == StreamKind::Stderr {
                    collected.push(line);
                }
            }
            collected
        })
    }

    async fn execute(&self, job: &Job, launch: &LaunchSpec, options: &RunOptions) -> Result<PathBuf> {
        let output_dir = options.output_dir.join(job.file_stem());
        tokio::fs::create_dir_all(&output_dir).await.map_err(|e| {
            Error::Process(format!(
                "failed to create output directory {}: {}",
                output_dir.display(),
                e
            ))
        })?;

        let args = Self::build_args(&job.source_path, &output_dir, options);
        tracing::info!(
            job_id = %job.id,
            name = %job.display_name,
            program = %launch.program,
            "Launching conversion process"
        );
        tracing::debug!(job_id = %job.id, ?args, "Conversion arguments");

        let mut child = launch
            .command()
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Process(format!("failed to launch '{}': {}", launch.program, e)))?;

        // Shared across both pipes so the estimate stays monotonic no
        // matter which pipe the markers arrive on.
        let counter = Arc::new(AtomicU8::new(0));

        let stdout_task = child
            .stdout
            .take()
            .map(|out| self.spawn_reader(job.id, StreamKind::Stdout, out, counter.clone()));
        let stderr_task = child
            .stderr
            .take()
            .map(|err| self.spawn_reader(job.id, StreamKind::Stderr, err, counter.clone()));

        let status = child
            .wait()
            .await
            .map_err(|e| Error::Process(format!("failed to wait for conversion process: {}", e)))?;

        if let Some(task) = stdout_task {
            let _ = task.await;
        }
        let stderr_lines = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => Vec::new(),
        };

        if status.success() {
            tracing::info!(job_id = %job.id, "Conversion process finished");
            return Ok(output_dir);
        }

        let stderr = stderr_lines.join("\n");
        let message = match status.code() {
            Some(code) if stderr.trim().is_empty() => {
                format!("process exited with code {}", code)
            }
            Some(code) => format!("process exited with code {}: {}", code, stderr.trim()),
            None => format!("process terminated by signal: {}", stderr.trim()),
        };
        Err(Error::Process(message))
    }
}

#[async_trait]
impl JobRunner for ProcessRunner {
    async fn run(&self, job: &Job, launch: &LaunchSpec, options: &RunOptions) -> RunOutcome {
        match self.execute(job, launch, options).await {
            Ok(output_dir) => RunOutcome::Completed { output_dir },
            Err(e) => {
                tracing::error!(job_id = %job.id, error = %e, "Conversion failed");
                RunOutcome::Failed {
                    message: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;
    use crate::runner::progress::MarkerProgress;

    fn run_options(output_dir: PathBuf) -> RunOptions {
        RunOptions {
            output_dir,
            ..Default::default()
        }
    }

    /// Launch spec that runs an inline shell script; the conversion args the
    /// runner appends land in `$1..` and are ignored by the script.
    fn script_launch(script: &str) -> LaunchSpec {
        LaunchSpec {
            program: "sh".to_string(),
            leading_args: vec!["-c".to_string(), script.to_string(), "convert".to_string()],
            env: Vec::new(),
        }
    }

    fn runner_with_store() -> (ProcessRunner, QueueStore) {
        let store = QueueStore::new(EventBus::default());
        let runner = ProcessRunner::new(store.clone(), Arc::new(MarkerProgress::default()));
        (runner, store)
    }

    fn claimed_job(store: &QueueStore, path: &str) -> Job {
        store.enqueue(vec![PathBuf::from(path)]);
        store.claim_next_pending().unwrap()
    }

    #[test]
    fn test_build_args_omits_tool_defaults() {
        let options = RunOptions::default();
        let args = ProcessRunner::build_args(
            Path::new("/docs/a.pdf"),
            Path::new("/out/a"),
            &options,
        );
        assert_eq!(
            args,
            vec!["-p", "/docs/a.pdf", "-o", "/out/a", "-f", "true", "-t", "true"]
        );
    }

    #[test]
    fn test_build_args_includes_overrides() {
        let options = RunOptions {
            output_dir: PathBuf::from("/out"),
            method: "ocr".to_string(),
            backend: "vlm-sglang-client".to_string(),
            lang: "en".to_string(),
            url: Some("http://localhost:30000".to_string()),
            start_page: Some(0),
            end_page: Some(9),
            formula: false,
            table: true,
            device: Some("cuda".to_string()),
            vram: Some(8),
            source: "modelscope".to_string(),
        };
        let args =
            ProcessRunner::build_args(Path::new("/docs/a.pdf"), Path::new("/out/a"), &options);
        assert_eq!(
            args,
            vec![
                "-p", "/docs/a.pdf", "-o", "/out/a",
                "-m", "ocr",
                "-b", "vlm-sglang-client",
                "-l", "en",
                "-u", "http://localhost:30000",
                "-s", "0",
                "-e", "9",
                "-f", "false",
                "-t", "true",
                "-d", "cuda",
                "--vram", "8",
                "--source", "modelscope",
            ]
        );
    }

    #[tokio::test]
    async fn test_successful_process_completes_with_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let (runner, store) = runner_with_store();
        let job = claimed_job(&store, "/docs/report.pdf");

        let launch = script_launch("echo processing page 1; echo processing page 2; echo done");
        let outcome = runner
            .run(&job, &launch, &run_options(dir.path().to_path_buf()))
            .await;

        let expected = dir.path().join("report");
        match outcome {
            RunOutcome::Completed { output_dir } => assert_eq!(output_dir, expected),
            RunOutcome::Failed { message } => panic!("unexpected failure: {}", message),
        }
        assert!(expected.is_dir());

        let record = &store.list()[0];
        assert!(record.captured_output.contains("processing page 1"));
        assert!(record.captured_output.contains("done"));
        // Marker lines advanced the estimate while the job was active
        assert!(record.progress > 0);
    }

    #[tokio::test]
    async fn test_nonzero_exit_reports_code_and_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let (runner, store) = runner_with_store();
        let job = claimed_job(&store, "/docs/broken.pdf");

        let launch = script_launch("echo 'model load failed' >&2; exit 137");
        let outcome = runner
            .run(&job, &launch, &run_options(dir.path().to_path_buf()))
            .await;

        match outcome {
            RunOutcome::Failed { message } => {
                assert!(message.contains("137"), "message: {}", message);
                assert!(message.contains("model load failed"), "message: {}", message);
            }
            RunOutcome::Completed { .. } => panic!("expected failure"),
        }
    }

    #[tokio::test]
    async fn test_spawn_failure_is_immediate() {
        let dir = tempfile::tempdir().unwrap();
        let (runner, store) = runner_with_store();
        let job = claimed_job(&store, "/docs/a.pdf");

        let launch = LaunchSpec::direct("/definitely/not/a/real/converter");
        let outcome = runner
            .run(&job, &launch, &run_options(dir.path().to_path_buf()))
            .await;

        match outcome {
            RunOutcome::Failed { message } => {
                assert!(message.contains("failed to launch"), "message: {}", message)
            }
            RunOutcome::Completed { .. } => panic!("expected failure"),
        }
        // No progress was claimed for a process that never started
        assert_eq!(store.list()[0].progress, 0);
    }

    #[tokio::test]
    async fn test_stderr_lines_are_streamed_too() {
        let dir = tempfile::tempdir().unwrap();
        let (runner, store) = runner_with_store();
        let job = claimed_job(&store, "/docs/a.pdf");

        let launch = script_launch("echo 'processing on stderr' >&2");
        let outcome = runner
            .run(&job, &launch, &run_options(dir.path().to_path_buf()))
            .await;

        assert!(matches!(outcome, RunOutcome::Completed { .. }));
        let record = &store.list()[0];
        assert!(record.captured_output.contains("processing on stderr"));
        assert!(record.progress > 0);
    }
}
