//! Writing and reading report artifacts.

use std::path::{Path, PathBuf};

use moodscope_session_model::Report;

use crate::text::render_text;

/// Errors from writing or reading report files.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Structured mirror of the report, pretty-printed.
pub fn render_json(report: &Report) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

/// Write the text report and its JSON mirror, creating parent directories.
///
/// Both files are staged under `.tmp` names and only renamed into place once
/// both writes succeed, so a failed export leaves neither artifact behind.
pub fn export(report: &Report, text_path: &Path, json_path: &Path) -> Result<(), ReportError> {
    let json = render_json(report).map_err(|e| ReportError::Json {
        path: json_path.to_path_buf(),
        source: e,
    })?;

    let text_tmp = temp_path(text_path);
    let json_tmp = temp_path(json_path);
    let staged = write_file(&text_tmp, &render_text(report))
        .and_then(|()| write_file(&json_tmp, &json))
        .and_then(|()| rename(&text_tmp, text_path))
        .and_then(|()| rename(&json_tmp, json_path));
    if let Err(e) = staged {
        let _ = std::fs::remove_file(&text_tmp);
        let _ = std::fs::remove_file(&json_tmp);
        return Err(e);
    }

    tracing::info!(
        text = %text_path.display(),
        json = %json_path.display(),
        frames = report.total_frames,
        "Report exported"
    );
    Ok(())
}

/// Read a JSON snapshot written by [`export`].
pub fn load_snapshot(path: &Path) -> Result<Report, ReportError> {
    let content = std::fs::read_to_string(path).map_err(|e| ReportError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| ReportError::Json {
        path: path.to_path_buf(),
        source: e,
    })
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn rename(from: &Path, to: &Path) -> Result<(), ReportError> {
    std::fs::rename(from, to).map_err(|e| ReportError::Io {
        path: to.to_path_buf(),
        source: e,
    })
}

/// Write `content` to `path`, creating missing parent directories.
pub fn write_file(path: &Path, content: &str) -> Result<(), ReportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ReportError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    std::fs::write(path, content).map_err(|e| ReportError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}
