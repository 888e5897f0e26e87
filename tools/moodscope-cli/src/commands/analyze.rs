//! Analyze a session frame by frame and export the report.

use std::path::PathBuf;

use moodscope_common::clock::AnalysisClock;
use moodscope_common::config::AppConfig;
use moodscope_common::error::MoodscopeError;
use moodscope_processing_core::{FramePipeline, TemporalAggregator};
use moodscope_report_engine::export;
use moodscope_session_model::{LoadedSession, SessionError};

pub fn run(
    session_dir: PathBuf,
    output_dir: PathBuf,
    name: String,
    max_frames: Option<u64>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    println!("Analyzing session at: {}", session_dir.display());

    if !session_dir.is_dir() {
        return Err(MoodscopeError::file_not_found(&session_dir).into());
    }

    let session = LoadedSession::load(&session_dir)
        .map_err(|e| MoodscopeError::session(format!("Failed to load session: {e}")))?;

    for issue in session.validate() {
        tracing::warn!("Session issue: {issue}");
    }

    let fps = session
        .meta
        .fps
        .filter(|fps| *fps > 0.0)
        .unwrap_or(config.analysis.default_fps);
    let available = session.frame_count() as u64;
    let frame_total = max_frames.map_or(available, |limit| limit.min(available));
    let frame_indices: Vec<u64> = session
        .frame_indices()
        .take(usize::try_from(frame_total).unwrap_or(usize::MAX))
        .collect();

    println!(
        "  Frames: {frame_total} of {available} @ {fps}fps, {} detection(s)",
        session.total_detections()
    );

    let clock = AnalysisClock::start();
    let mut pipeline =
        FramePipeline::with_aggregator(TemporalAggregator::with_clock(clock.clone()))
            .with_progress_interval(config.analysis.progress_interval_frames);

    let mut skipped = 0u64;
    let mut previous = 0u64;
    for frame_index in frame_indices {
        if frame_index != previous + 1 {
            tracing::warn!("Frames {}..{frame_index} are missing", previous + 1);
            pipeline.reset_motion();
        }
        previous = frame_index;

        let frame = match session.load_frame(frame_index) {
            Ok(frame) => frame,
            Err(e @ SessionError::ImageError { .. }) => {
                tracing::warn!("Skipping frame {frame_index}: {e}");
                pipeline.reset_motion();
                skipped += 1;
                continue;
            }
            Err(e) => return Err(anyhow::anyhow!("Failed to read frame {frame_index}: {e}")),
        };

        let outcome = pipeline
            .process_frame(frame_index, &frame, session.faces_for(frame_index))
            .map_err(|e| MoodscopeError::analysis(e.to_string()))?;

        tracing::debug!(
            frame = frame_index,
            media_secs = AnalysisClock::frame_to_secs(frame_index, fps),
            faces = outcome.faces.len(),
            dropped = outcome.dropped_faces,
            "Frame done"
        );
    }

    let report = pipeline.snapshot();
    let text_path = output_dir.join(format!("{name}.txt"));
    let json_path = output_dir.join(format!("{name}.json"));
    export(&report, &text_path, &json_path)
        .map_err(|e| MoodscopeError::report(format!("Failed to write report: {e}")))?;

    let quality = &report.quality_metrics;
    println!(
        "  Analyzed {} frames in {:.1}s",
        report.total_frames,
        clock.elapsed_secs()
    );
    if skipped > 0 {
        println!("  Skipped {skipped} undecodable frame(s)");
    }
    println!(
        "  Frames with faces: {} ({:.1}%)",
        quality.frames_with_faces,
        quality.detection_rate * 100.0
    );
    println!("  Face detections: {}", quality.total_face_detections);
    println!("  Expression transitions: {}", quality.total_transitions);
    println!();
    println!("Report written to: {}", text_path.display());
    println!("Snapshot written to: {}", json_path.display());

    Ok(())
}
