//! Per-frame glue: motion, face classification, aggregation.

use moodscope_session_model::{ActivityLabel, FaceDetection, GrayFrame, Report};
use serde::Serialize;

use crate::aggregator::{AggregateError, ClassificationPath, FaceObservation, TemporalAggregator};
use crate::expression::{classify_face, Classification};
use crate::motion::MotionClassifier;

/// Default number of frames between progress log lines.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 30;

/// What happened to one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameOutcome {
    pub frame_index: u64,
    pub activity: ActivityLabel,
    pub motion: Option<f64>,
    /// One entry per kept face, in detection order.
    pub faces: Vec<Classification>,
    /// Detections with no pixels inside the frame.
    pub dropped_faces: usize,
}

/// Runs frames through the classifiers in order and feeds the aggregator.
#[derive(Debug)]
pub struct FramePipeline {
    motion: MotionClassifier,
    aggregator: TemporalAggregator,
    progress_interval: u64,
}

impl Default for FramePipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl FramePipeline {
    pub fn new() -> Self {
        Self::with_aggregator(TemporalAggregator::new())
    }

    pub fn with_aggregator(aggregator: TemporalAggregator) -> Self {
        Self {
            motion: MotionClassifier::new(),
            aggregator,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    /// Log progress every `frames` frames; 0 disables progress lines.
    pub fn with_progress_interval(mut self, frames: u64) -> Self {
        self.progress_interval = frames;
        self
    }

    /// Classify one frame and its detections and fold the result in.
    ///
    /// An out-of-order `frame_index` is rejected before any state changes,
    /// including the motion baseline.
    pub fn process_frame(
        &mut self,
        frame_index: u64,
        frame: &GrayFrame,
        detections: &[FaceDetection],
    ) -> Result<FrameOutcome, AggregateError> {
        let previous = self.aggregator.last_frame();
        if frame_index <= previous {
            return Err(AggregateError::OutOfOrderFrame {
                previous,
                received: frame_index,
            });
        }

        let reading = self.motion.measure(frame);

        let mut faces = Vec::with_capacity(detections.len());
        let mut observations = Vec::with_capacity(detections.len());
        for detection in detections {
            let Some(classification) = classify_face(frame, detection) else {
                continue;
            };
            let area = detection
                .region
                .clamp_to(frame.width(), frame.height())
                .map(|r| r.area())
                .unwrap_or(0);
            observations.push(FaceObservation {
                label: classification.label(),
                confidence: detection.confidence,
                method: detection.method.clone(),
                area,
                path: if classification.is_fallback() {
                    ClassificationPath::Fallback
                } else {
                    ClassificationPath::Landmarks
                },
            });
            faces.push(classification);
        }

        self.aggregator
            .update(frame_index, &observations, reading.activity)?;

        let labels: Vec<&str> = observations.iter().map(|o| o.label.as_str()).collect();
        tracing::debug!(
            frame = frame_index,
            activity = reading.activity.as_str(),
            motion = reading.motion,
            "Frame classified: faces={:?}",
            labels
        );

        if self.progress_interval > 0 && self.aggregator.total_frames() % self.progress_interval == 0
        {
            tracing::info!(
                "Processed {} frames ({} faces so far)",
                self.aggregator.total_frames(),
                self.aggregator.total_detections()
            );
        }

        Ok(FrameOutcome {
            frame_index,
            activity: reading.activity,
            motion: reading.motion,
            dropped_faces: detections.len() - faces.len(),
            faces,
        })
    }

    pub fn aggregator(&self) -> &TemporalAggregator {
        &self.aggregator
    }

    pub fn snapshot(&self) -> Report {
        self.aggregator.snapshot()
    }

    /// Drop the motion baseline, e.g. after a gap in the frame source.
    pub fn reset_motion(&mut self) {
        self.motion.reset();
    }
}
