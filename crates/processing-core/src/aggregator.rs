//! Temporal aggregation of per-frame labels.
//!
//! Face slots are positions in a frame's detection list. Slot `i` in one
//! frame is assumed to be the same person as slot `i` in the next; no
//! re-identification is done, so runs and transitions are only meaningful
//! while the detector keeps faces in a stable order.

use std::collections::BTreeMap;

use moodscope_common::AnalysisClock;
use moodscope_session_model::{
    transition_key, ActivityLabel, ExpressionLabel, QualityMetrics, Report, TemporalSample,
};
use serde::Serialize;

/// A temporal sample is taken on every frame index divisible by this.
pub const SAMPLE_PERIOD_FRAMES: u64 = 30;

/// Which rule set produced a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationPath {
    Landmarks,
    Fallback,
}

/// One classified face, as fed to the aggregator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaceObservation {
    pub label: ExpressionLabel,
    /// Detector confidence in `[0.0, 1.0]`.
    pub confidence: f64,
    /// Detector name.
    pub method: String,
    /// Clamped region area in pixels.
    pub area: u64,
    pub path: ClassificationPath,
}

impl FaceObservation {
    /// An observation carrying only a label.
    pub fn from_label(label: ExpressionLabel) -> Self {
        Self {
            label,
            confidence: 1.0,
            method: "unknown".to_string(),
            area: 0,
            path: ClassificationPath::Landmarks,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Run {
    label: ExpressionLabel,
    start_frame: u64,
}

/// Errors from feeding the aggregator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AggregateError {
    #[error("frame {received} received after frame {previous}; frame indices must increase")]
    OutOfOrderFrame { previous: u64, received: u64 },
}

/// Running counters for one analysis run.
#[derive(Debug, Clone)]
pub struct TemporalAggregator {
    clock: AnalysisClock,
    last_frame: u64,
    total_frames: u64,
    activities: BTreeMap<ActivityLabel, u64>,
    emotions: BTreeMap<ExpressionLabel, u64>,
    runs: BTreeMap<usize, Run>,
    transitions: BTreeMap<String, u64>,
    durations: BTreeMap<ExpressionLabel, Vec<u64>>,
    samples: Vec<TemporalSample>,

    // Detection statistics
    frames_with_faces: u64,
    frames_without_faces: u64,
    total_detections: u64,
    confidence_sum: f64,
    area_sum: u64,
    methods: BTreeMap<String, u64>,
    fallback_count: u64,
}

impl Default for TemporalAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl TemporalAggregator {
    pub fn new() -> Self {
        Self::with_clock(AnalysisClock::start())
    }

    /// Use `clock` to stamp temporal samples and snapshots.
    pub fn with_clock(clock: AnalysisClock) -> Self {
        Self {
            clock,
            last_frame: 0,
            total_frames: 0,
            activities: BTreeMap::new(),
            emotions: BTreeMap::new(),
            runs: BTreeMap::new(),
            transitions: BTreeMap::new(),
            durations: BTreeMap::new(),
            samples: Vec::new(),
            frames_with_faces: 0,
            frames_without_faces: 0,
            total_detections: 0,
            confidence_sum: 0.0,
            area_sum: 0,
            methods: BTreeMap::new(),
            fallback_count: 0,
        }
    }

    /// Fold one frame into the running state.
    ///
    /// `frame_index` is 1-based and must be greater than every index
    /// accepted before; otherwise nothing changes and an error is returned.
    pub fn update(
        &mut self,
        frame_index: u64,
        faces: &[FaceObservation],
        activity: ActivityLabel,
    ) -> Result<(), AggregateError> {
        if frame_index <= self.last_frame {
            return Err(AggregateError::OutOfOrderFrame {
                previous: self.last_frame,
                received: frame_index,
            });
        }
        self.last_frame = frame_index;
        self.total_frames += 1;
        *self.activities.entry(activity).or_insert(0) += 1;

        if faces.is_empty() {
            self.frames_without_faces += 1;
        } else {
            self.frames_with_faces += 1;
        }

        for (slot, face) in faces.iter().enumerate() {
            *self.emotions.entry(face.label).or_insert(0) += 1;
            self.total_detections += 1;
            self.confidence_sum += face.confidence;
            self.area_sum += face.area;
            *self.methods.entry(face.method.clone()).or_insert(0) += 1;
            if face.path == ClassificationPath::Fallback {
                self.fallback_count += 1;
            }
            self.track(slot, face.label, frame_index);
        }

        if frame_index % SAMPLE_PERIOD_FRAMES == 0 {
            self.samples.push(TemporalSample {
                frame: frame_index,
                face_count: faces.len(),
                emotions: faces.iter().map(|f| f.label).collect(),
                timestamp: self.clock.now_rfc3339(),
            });
        }

        Ok(())
    }

    fn track(&mut self, slot: usize, label: ExpressionLabel, frame_index: u64) {
        let run = self.runs.entry(slot).or_insert(Run {
            label,
            start_frame: frame_index,
        });
        if run.label == label {
            return;
        }

        let duration = frame_index - run.start_frame;
        self.durations.entry(run.label).or_default().push(duration);
        *self
            .transitions
            .entry(transition_key(run.label, label))
            .or_insert(0) += 1;
        tracing::debug!(
            "Slot {slot}: {} -> {} at frame {frame_index} after {duration} frames",
            run.label,
            label
        );
        *run = Run {
            label,
            start_frame: frame_index,
        };
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn total_detections(&self) -> u64 {
        self.total_detections
    }

    /// Last accepted frame index (0 before the first update).
    pub fn last_frame(&self) -> u64 {
        self.last_frame
    }

    pub fn total_transitions(&self) -> u64 {
        self.transitions.values().sum()
    }

    /// Derive an immutable report from the current state.
    ///
    /// Runs still open are not closed, so their frames do not appear in
    /// `emotion_durations`.
    pub fn snapshot(&self) -> Report {
        let total_transitions = self.total_transitions();
        let detections = self.total_detections as f64;

        let (average_confidence, average_face_size, emotional_stability) =
            if self.total_detections == 0 {
                (0.0, 0.0, 0.0)
            } else {
                (
                    self.confidence_sum / detections,
                    self.area_sum as f64 / detections,
                    (1.0 - total_transitions as f64 / detections).clamp(0.0, 1.0),
                )
            };

        let detection_rate = if self.total_frames == 0 {
            0.0
        } else {
            self.frames_with_faces as f64 / self.total_frames as f64
        };

        Report {
            generated_at: self.clock.now_rfc3339(),
            total_frames: self.total_frames,
            activities: self.activities.clone(),
            emotions: self.emotions.clone(),
            quality_metrics: QualityMetrics {
                frames_with_faces: self.frames_with_faces,
                frames_without_faces: self.frames_without_faces,
                total_face_detections: self.total_detections,
                detection_rate,
                average_confidence,
                average_face_size,
                emotional_stability,
                total_transitions,
                fallback_classifications: self.fallback_count,
            },
            detection_methods: self.methods.clone(),
            transitions: self.transitions.clone(),
            emotion_durations: self.durations.clone(),
            temporal_samples: self.samples.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn faces(labels: &[ExpressionLabel]) -> Vec<FaceObservation> {
        labels.iter().copied().map(FaceObservation::from_label).collect()
    }

    #[test]
    fn test_duration_and_transition_recorded_on_change() {
        use ExpressionLabel::*;
        let mut agg = TemporalAggregator::new();
        for (frame, label) in [(1, Happy), (2, Happy), (3, Sad)] {
            agg.update(frame, &faces(&[label]), ActivityLabel::Still).unwrap();
        }
        let report = agg.snapshot();
        assert_eq!(report.emotion_durations.get(&Happy), Some(&vec![2]));
        assert_eq!(report.emotion_durations.get(&Sad), None);
        assert_eq!(report.transitions.get("happy->sad"), Some(&1));
        assert_eq!(report.transitions.len(), 1);
    }

    #[test]
    fn test_slots_are_tracked_independently() {
        use ExpressionLabel::*;
        let mut agg = TemporalAggregator::new();
        agg.update(1, &faces(&[Happy, Sad]), ActivityLabel::Still)
            .unwrap();
        agg.update(2, &faces(&[Happy, Neutral]), ActivityLabel::Still)
            .unwrap();
        let report = agg.snapshot();
        assert_eq!(report.transitions.get("sad->neutral"), Some(&1));
        assert_eq!(report.quality_metrics.total_transitions, 1);
        assert_eq!(report.emotions.get(&Happy), Some(&2));
    }

    #[test]
    fn test_slot_run_survives_frames_without_faces() {
        use ExpressionLabel::*;
        let mut agg = TemporalAggregator::new();
        agg.update(1, &faces(&[Happy]), ActivityLabel::Still).unwrap();
        agg.update(2, &[], ActivityLabel::Still).unwrap();
        agg.update(5, &faces(&[Sad]), ActivityLabel::Still).unwrap();
        let report = agg.snapshot();
        assert_eq!(report.emotion_durations.get(&Happy), Some(&vec![4]));
        assert_eq!(report.quality_metrics.frames_without_faces, 1);
        assert_eq!(report.quality_metrics.frames_with_faces, 2);
    }

    #[test]
    fn test_out_of_order_frame_is_rejected_without_side_effects() {
        let mut agg = TemporalAggregator::new();
        agg.update(5, &faces(&[ExpressionLabel::Happy]), ActivityLabel::Still)
            .unwrap();
        let before = agg.snapshot();

        let err = agg
            .update(5, &faces(&[ExpressionLabel::Sad]), ActivityLabel::Still)
            .unwrap_err();
        assert_eq!(
            err,
            AggregateError::OutOfOrderFrame {
                previous: 5,
                received: 5
            }
        );
        assert!(agg.update(3, &[], ActivityLabel::Still).is_err());

        let after = agg.snapshot();
        assert_eq!(after.total_frames, before.total_frames);
        assert_eq!(after.emotions, before.emotions);
        assert_eq!(agg.last_frame(), 5);
    }

    #[test]
    fn test_frame_zero_is_rejected() {
        let mut agg = TemporalAggregator::new();
        assert!(agg.update(0, &[], ActivityLabel::Unknown).is_err());
        assert_eq!(agg.total_frames(), 0);
    }

    #[test]
    fn test_samples_every_thirtieth_frame() {
        let mut agg = TemporalAggregator::new();
        for frame in 1..=65 {
            let labels = if frame == 60 {
                vec![ExpressionLabel::Happy, ExpressionLabel::Sad]
            } else {
                vec![]
            };
            agg.update(frame, &faces(&labels), ActivityLabel::Still)
                .unwrap();
        }
        let samples = agg.snapshot().temporal_samples;
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].frame, 30);
        assert_eq!(samples[0].face_count, 0);
        assert_eq!(samples[1].frame, 60);
        assert_eq!(
            samples[1].emotions,
            vec![ExpressionLabel::Happy, ExpressionLabel::Sad]
        );
        assert!(chrono_like(&samples[1].timestamp));
    }

    fn chrono_like(ts: &str) -> bool {
        ts.len() >= 20 && ts.as_bytes()[4] == b'-' && ts.contains('T')
    }

    #[test]
    fn test_detection_statistics() {
        let mut agg = TemporalAggregator::new();
        let observations = vec![
            FaceObservation {
                label: ExpressionLabel::Neutral,
                confidence: 0.9,
                method: "mediapipe".to_string(),
                area: 3000,
                path: ClassificationPath::Landmarks,
            },
            FaceObservation {
                label: ExpressionLabel::Sad,
                confidence: 0.5,
                method: "haar".to_string(),
                area: 1000,
                path: ClassificationPath::Fallback,
            },
        ];
        agg.update(1, &observations, ActivityLabel::Unknown).unwrap();
        agg.update(2, &[], ActivityLabel::Still).unwrap();

        let q = agg.snapshot().quality_metrics;
        assert_eq!(q.total_face_detections, 2);
        assert!((q.detection_rate - 0.5).abs() < 1e-9);
        assert!((q.average_confidence - 0.7).abs() < 1e-9);
        assert!((q.average_face_size - 2000.0).abs() < 1e-9);
        assert_eq!(q.fallback_classifications, 1);
        assert!((q.emotional_stability - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_snapshot() {
        let report = TemporalAggregator::new().snapshot();
        assert!(report.is_empty());
        assert_eq!(report.quality_metrics.emotional_stability, 0.0);
        assert_eq!(report.quality_metrics.detection_rate, 0.0);
        assert!(report.temporal_samples.is_empty());
    }

    fn activity() -> impl Strategy<Value = ActivityLabel> {
        prop::sample::select(ActivityLabel::ALL.to_vec())
    }

    fn expression() -> impl Strategy<Value = ExpressionLabel> {
        prop::sample::select(ExpressionLabel::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn prop_counts_match_inputs(
            frames in prop::collection::vec(
                (1u64..4, activity(), prop::collection::vec(expression(), 0..4)),
                0..80,
            )
        ) {
            let mut agg = TemporalAggregator::new();
            let mut frame_index = 0;
            let mut detections = 0u64;
            for (step, activity, labels) in &frames {
                frame_index += step;
                detections += labels.len() as u64;
                agg.update(frame_index, &faces(labels), *activity).unwrap();
            }

            let report = agg.snapshot();
            prop_assert_eq!(report.activities.values().sum::<u64>(), frames.len() as u64);
            prop_assert_eq!(report.total_frames, frames.len() as u64);
            prop_assert_eq!(report.emotions.values().sum::<u64>(), detections);

            let closed_runs: u64 = report.emotion_durations.values().map(|d| d.len() as u64).sum();
            prop_assert_eq!(closed_runs, report.quality_metrics.total_transitions);
            prop_assert!(report.quality_metrics.total_transitions <= detections);

            let stability = report.quality_metrics.emotional_stability;
            prop_assert!((0.0..=1.0).contains(&stability));
            prop_assert!(report.emotion_durations.values().flatten().all(|d| *d > 0));
        }
    }
}
