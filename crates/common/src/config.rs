//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::MoodscopeError;

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory where report artifacts are written.
    pub output_dir: PathBuf,

    /// Report defaults.
    pub report: ReportDefaults,

    /// Analysis run defaults.
    pub analysis: AnalysisDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default report parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDefaults {
    /// File stem shared by the text and JSON artifacts.
    pub name: String,
}

/// Default analysis parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisDefaults {
    /// Frame rate assumed when a session does not declare one.
    pub default_fps: f64,

    /// Emit a progress log line every N frames.
    pub progress_interval_frames: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "moodscope=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("outputs"),
            report: ReportDefaults::default(),
            analysis: AnalysisDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ReportDefaults {
    fn default() -> Self {
        Self {
            name: "summary".to_string(),
        }
    }
}

impl Default for AnalysisDefaults {
    fn default() -> Self {
        Self {
            default_fps: 20.0,
            progress_interval_frames: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match Self::from_json(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Parse a config document.
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Reject values that parse but cannot drive a run.
    pub fn validate(&self) -> Result<(), MoodscopeError> {
        let fps = self.analysis.default_fps;
        if !fps.is_finite() || fps <= 0.0 {
            return Err(MoodscopeError::config(format!(
                "analysis.default_fps must be positive, got {fps}"
            )));
        }

        let name = &self.report.name;
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(MoodscopeError::config(format!(
                "report.name must be a plain file stem, got {name:?}"
            )));
        }

        Ok(())
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("moodscope").join("config.json")
}
