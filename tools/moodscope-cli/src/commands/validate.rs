//! Validate a MoodScope session bundle.

use std::path::PathBuf;

use moodscope_common::error::MoodscopeError;
use moodscope_session_model::LoadedSession;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    println!("Validating session at: {}", path.display());

    let session = LoadedSession::load(&path)
        .map_err(|e| MoodscopeError::session(format!("Failed to load session: {e}")))?;

    println!("  Name: {}", session.meta.name);
    println!("  Version: {}", session.meta.version);
    println!(
        "  Frame size: {}x{}",
        session.meta.frame_width, session.meta.frame_height
    );
    println!("  Frames: {}", session.frame_count());
    println!("  Detections: {}", session.total_detections());

    let errors = session.validate();
    if errors.is_empty() {
        println!("\nSession is valid.");
    } else {
        println!("\nValidation issues:");
        for error in &errors {
            println!("  - {error}");
        }
        println!(
            "\n{} issue(s) found. Analysis results may be misleading.",
            errors.len()
        );
    }

    Ok(())
}
