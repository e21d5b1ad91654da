//! Job records and per-run options

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ConvertSettings;

/// Job lifecycle status.
///
/// Transitions are Pending → Processing → Completed/Error, plus
/// Processing → Pending when a run is stopped mid-job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Error => write!(f, "error"),
        }
    }
}

/// One queued document conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    /// Document to convert
    pub source_path: PathBuf,
    /// File name shown to users
    pub display_name: String,
    pub status: JobStatus,
    /// Estimated progress, 0-100
    pub progress: u8,
    /// Accumulated tool output (both pipes)
    pub captured_output: String,
    /// Error message, set when status is Error
    pub error: Option<String>,
    /// Where converted output landed, set on success
    pub output_dir: Option<PathBuf>,
    pub added_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(source_path: PathBuf) -> Self {
        let display_name = source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| source_path.display().to_string());

        Self {
            id: Uuid::new_v4(),
            source_path,
            display_name,
            status: JobStatus::Pending,
            progress: 0,
            captured_output: String::new(),
            error: None,
            output_dir: None,
            added_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    /// File stem used to name the per-job output directory.
    pub fn file_stem(&self) -> String {
        self.source_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.display_name.clone())
    }
}

/// Per-run configuration, applied to every job started in one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOptions {
    /// Output root; each job writes into its own subdirectory of this
    #[serde(default)]
    pub output_dir: PathBuf,
    /// Parse method
    #[serde(default = "default_method")]
    pub method: String,
    /// Inference backend
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Document language hint
    #[serde(default = "default_lang")]
    pub lang: String,
    /// Server URL for client backends
    #[serde(default)]
    pub url: Option<String>,
    /// First page to convert (0-based)
    #[serde(default)]
    pub start_page: Option<u32>,
    /// Last page to convert
    #[serde(default)]
    pub end_page: Option<u32>,
    /// Enable formula recognition
    #[serde(default = "default_true")]
    pub formula: bool,
    /// Enable table recognition
    #[serde(default = "default_true")]
    pub table: bool,
    /// Inference device
    #[serde(default)]
    pub device: Option<String>,
    /// VRAM budget per process, in GB
    #[serde(default)]
    pub vram: Option<u32>,
    /// Model download source
    #[serde(default = "default_source")]
    pub source: String,
}

fn default_method() -> String {
    "auto".to_string()
}

fn default_backend() -> String {
    "pipeline".to_string()
}

fn default_lang() -> String {
    "ch".to_string()
}

fn default_source() -> String {
    "huggingface".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::new(),
            method: default_method(),
            backend: default_backend(),
            lang: default_lang(),
            url: None,
            start_page: None,
            end_page: None,
            formula: true,
            table: true,
            device: None,
            vram: None,
            source: default_source(),
        }
    }
}

impl RunOptions {
    /// Build run options from persisted settings plus an output root.
    pub fn from_settings(settings: &ConvertSettings, output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            method: settings.method.clone(),
            backend: settings.backend.clone(),
            lang: settings.lang.clone(),
            url: settings.url.clone(),
            start_page: None,
            end_page: None,
            formula: settings.formula,
            table: settings.table,
            device: settings.device.clone(),
            vram: None,
            source: settings.source.clone(),
        }
    }
}
