//! Show session information.

use std::path::PathBuf;

use moodscope_common::config::AppConfig;
use moodscope_common::error::MoodscopeError;
use moodscope_session_model::LoadedSession;

pub fn run(path: PathBuf, config: &AppConfig) -> anyhow::Result<()> {
    let session = LoadedSession::load(&path)
        .map_err(|e| MoodscopeError::session(format!("Failed to load session: {e}")))?;

    let meta = &session.meta;
    let fps = meta.fps.unwrap_or(config.analysis.default_fps);
    let frames = session.frame_count();

    println!("Session: {}", meta.name);
    println!("  Root: {}", session.root.display());
    println!("  Version: {}", meta.version);
    println!();

    println!("Frames:");
    println!("  Size: {}x{}", meta.frame_width, meta.frame_height);
    match meta.fps {
        Some(fps) => println!("  Rate: {fps}fps"),
        None => println!("  Rate: unknown (assuming {fps}fps)"),
    }
    println!("  Count: {frames}");
    if fps > 0.0 {
        println!("  Duration: {:.1}s", frames as f64 / fps);
    }
    println!();

    println!("Detections:");
    println!("  Faces: {}", session.total_detections());
    println!("  Frames with faces: {}", session.frames_with_detections());
    let first = session
        .frame_indices()
        .next()
        .and_then(|i| session.frame_path(i));
    if let Some(first) = first {
        println!("  First frame: {}", first.display());
    }
    let missing = session.missing_frames().len();
    if missing > 0 {
        println!("  Missing frames: {missing} (run `moodscope validate` for details)");
    }

    Ok(())
}
