//! Configuration for the conversion queue service

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// External conversion tool configuration
    pub tool: ToolConfig,
    /// Queue/scheduling behavior
    pub queue: QueueConfig,
    /// Override for the persisted settings file location
    pub settings_path: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from a TOML file. A missing path falls back to
    /// defaults; an unreadable or malformed file is a hard error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Location of the persisted conversion settings record.
    pub fn settings_path(&self) -> PathBuf {
        self.settings_path.clone().unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("mineru-queue")
                .join("settings.json")
        })
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// External conversion tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Tool executable name or path
    pub executable: String,
    /// Conda environment the tool is installed in. `None` runs the
    /// executable straight from PATH.
    pub conda_env: Option<String>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            executable: "mineru".to_string(),
            conda_env: Some("MinerU".to_string()),
        }
    }
}

/// Queue and scheduling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Pause between jobs in milliseconds
    pub pause_ms: u64,
    /// Progress bump applied per "processing" output line
    pub progress_step: u8,
    /// Progress ceiling until the tool reports completion
    pub progress_cap: u8,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            pause_ms: 500,
            progress_step: 5,
            progress_cap: 90,
        }
    }
}

/// User-facing conversion settings, persisted between sessions.
///
/// Field set and defaults match what the conversion tool expects; loading
/// when no file exists yet yields these defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertSettings {
    /// Parse method: "auto", "txt" or "ocr"
    pub method: String,
    /// Inference backend
    pub backend: String,
    /// Document language hint
    pub lang: String,
    /// Server URL, only meaningful for client backends
    pub url: Option<String>,
    /// Enable formula recognition
    pub formula: bool,
    /// Enable table recognition
    pub table: bool,
    /// Inference device, e.g. "cpu" or "cuda"
    pub device: Option<String>,
    /// Model download source
    pub source: String,
}

impl Default for ConvertSettings {
    fn default() -> Self {
        Self {
            method: "auto".to_string(),
            backend: "pipeline".to_string(),
            lang: "ch".to_string(),
            url: None,
            formula: true,
            table: true,
            device: None,
            source: "huggingface".to_string(),
        }
    }
}

/// Loads and saves the conversion settings record as JSON.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load settings from disk, falling back to defaults when the file is
    /// missing or unreadable.
    pub fn load(&self) -> ConvertSettings {
        match fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(settings) => settings,
                Err(e) => {
                    tracing::warn!("Failed to parse settings file: {}", e);
                    ConvertSettings::default()
                }
            },
            Err(_) => ConvertSettings::default(),
        }
    }

    /// Save settings to disk, creating parent directories as needed.
    pub fn save(&self, settings: &ConvertSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings = ConvertSettings::default();
        assert_eq!(settings.method, "auto");
        assert_eq!(settings.backend, "pipeline");
        assert_eq!(settings.lang, "ch");
        assert!(settings.formula);
        assert!(settings.table);
        assert_eq!(settings.source, "huggingface");
        assert!(settings.url.is_none());
        assert!(settings.device.is_none());
    }

    #[test]
    fn test_settings_store_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        assert_eq!(store.load(), ConvertSettings::default());
    }

    #[test]
    fn test_settings_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("nested").join("settings.json"));

        let settings = ConvertSettings {
            method: "ocr".to_string(),
            lang: "en".to_string(),
            formula: false,
            device: Some("cuda".to_string()),
            ..Default::default()
        };
        store.save(&settings).unwrap();
        assert_eq!(store.load(), settings);
    }

    #[test]
    fn test_settings_store_corrupt_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();
        let store = SettingsStore::new(path);
        assert_eq!(store.load(), ConvertSettings::default());
    }

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.tool.executable, "mineru");
        assert_eq!(config.tool.conda_env.as_deref(), Some("MinerU"));
        assert_eq!(config.queue.pause_ms, 500);
    }

    #[test]
    fn test_app_config_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[server]
port = 9000

[tool]
executable = "mineru"
conda_env = "custom-env"

[queue]
pause_ms = 50
"#,
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.tool.conda_env.as_deref(), Some("custom-env"));
        assert_eq!(config.queue.pause_ms, 50);
        assert_eq!(config.queue.progress_step, 5);
    }

    #[test]
    fn test_app_config_missing_file_is_error() {
        let result = AppConfig::load(Some(Path::new("/definitely/not/here.toml")));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
