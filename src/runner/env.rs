//! Resolution of the external conversion tool invocation
//!
//! The tool is typically installed inside a conda environment, so the
//! resolver produces the full launch prefix (`conda run -n <env> mineru`)
//! rather than a bare executable, and probes availability with `--version`
//! before a run is allowed to start.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::ToolConfig;
use crate::error::{Error, Result};
use crate::queue::job::RunOptions;

/// Fully resolved invocation target for the conversion tool.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    /// Program handed to the OS
    pub program: String,
    /// Arguments that precede the per-job conversion arguments
    pub leading_args: Vec<String>,
    /// Extra environment variables for the process
    pub env: Vec<(String, String)>,
}

impl LaunchSpec {
    /// Direct invocation of a program with no prefix.
    pub fn direct(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            env: Vec::new(),
        }
    }

    /// Start building the command for this launch target.
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        cmd
    }
}

/// Resolves the executable invocation needed to run the conversion tool.
#[async_trait]
pub trait EnvironmentResolver: Send + Sync {
    /// Resolve the launch target, failing when the toolchain cannot be
    /// located. A failure here blocks `start` before any job is touched.
    async fn resolve(&self, options: &RunOptions) -> Result<LaunchSpec>;
}

/// Production resolver for the MinerU toolchain.
#[derive(Debug, Clone)]
pub struct MineruResolver {
    executable: String,
    conda_env: Option<String>,
}

impl MineruResolver {
    pub fn new(config: &ToolConfig) -> Self {
        Self {
            executable: config.executable.clone(),
            conda_env: config.conda_env.clone(),
        }
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }

    pub fn conda_env(&self) -> Option<&str> {
        self.conda_env.as_deref()
    }

    fn launch_spec(&self) -> LaunchSpec {
        match &self.conda_env {
            Some(env) => LaunchSpec {
                program: "conda".to_string(),
                leading_args: vec![
                    "run".to_string(),
                    "-n".to_string(),
                    env.clone(),
                    self.executable.clone(),
                ],
                env: Vec::new(),
            },
            None => LaunchSpec::direct(&self.executable),
        }
    }

    /// Check that the tool answers `--version` with exit code 0.
    pub async fn probe(&self) -> bool {
        let mut cmd = self.launch_spec().command();
        cmd.arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        matches!(cmd.status().await, Ok(status) if status.success())
    }
}

#[async_trait]
impl EnvironmentResolver for MineruResolver {
    async fn resolve(&self, _options: &RunOptions) -> Result<LaunchSpec> {
        if !self.probe().await {
            let location = match &self.conda_env {
                Some(env) => format!("conda environment '{}'", env),
                None => "PATH".to_string(),
            };
            return Err(Error::Environment(format!(
                "'{}' not found in {}; install the conversion tool or adjust the tool configuration",
                self.executable, location
            )));
        }
        Ok(self.launch_spec())
    }
}
