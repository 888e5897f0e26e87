//! Report snapshot types.
//!
//! A [`Report`] is an immutable, serializable copy of everything the
//! aggregator accumulated during one run. Renderers only ever read it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::label::{ActivityLabel, ExpressionLabel};

/// Detection quality figures derived at snapshot time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub frames_with_faces: u64,
    pub frames_without_faces: u64,
    pub total_face_detections: u64,
    /// Share of frames with at least one face, in `[0.0, 1.0]`.
    pub detection_rate: f64,
    /// Mean detector confidence over all detections (0 with none).
    pub average_confidence: f64,
    /// Mean face area in pixels over all detections (0 with none).
    pub average_face_size: f64,
    /// `1 - transitions / detections`, clamped to `[0.0, 1.0]`; 0 with no detections.
    pub emotional_stability: f64,
    pub total_transitions: u64,
    /// Detections labelled by the intensity-only fallback rules.
    pub fallback_classifications: u64,
}

/// Periodic sample of the per-frame face state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalSample {
    pub frame: u64,
    pub face_count: usize,
    pub emotions: Vec<ExpressionLabel>,
    /// RFC 3339 wall-clock time the sample was taken.
    pub timestamp: String,
}

/// Aggregated result of one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// RFC 3339 wall-clock time the snapshot was taken.
    pub generated_at: String,
    pub total_frames: u64,
    pub activities: BTreeMap<ActivityLabel, u64>,
    pub emotions: BTreeMap<ExpressionLabel, u64>,
    pub quality_metrics: QualityMetrics,
    #[serde(default)]
    pub detection_methods: BTreeMap<String, u64>,
    /// `"from->to"` label changes within a face slot.
    pub transitions: BTreeMap<String, u64>,
    /// Closed run lengths (in frames) per label, in the order they closed.
    #[serde(default)]
    pub emotion_durations: BTreeMap<ExpressionLabel, Vec<u64>>,
    pub temporal_samples: Vec<TemporalSample>,
}

/// One row of a frequency table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedCount<L> {
    pub label: L,
    pub count: u64,
    /// Share of the table total, in percent.
    pub percentage: f64,
}

impl Report {
    /// No frames were analyzed.
    pub fn is_empty(&self) -> bool {
        self.total_frames == 0
    }

    /// Activities sorted by count (descending), ties by label order.
    pub fn activity_ranking(&self) -> Vec<RankedCount<ActivityLabel>> {
        rank(&self.activities)
    }

    /// Expressions sorted by count (descending), ties by label order.
    pub fn emotion_ranking(&self) -> Vec<RankedCount<ExpressionLabel>> {
        rank(&self.emotions)
    }

    /// Mean closed-run length for a label, if any run of it has closed.
    pub fn average_duration(&self, label: ExpressionLabel) -> Option<f64> {
        let durations = self.emotion_durations.get(&label)?;
        if durations.is_empty() {
            return None;
        }
        Some(durations.iter().sum::<u64>() as f64 / durations.len() as f64)
    }

    /// The `limit` most frequent transitions, ties broken by key.
    pub fn top_transitions(&self, limit: usize) -> Vec<(&str, u64)> {
        let mut entries: Vec<(&str, u64)> = self
            .transitions
            .iter()
            .map(|(key, count)| (key.as_str(), *count))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries.truncate(limit);
        entries
    }
}

fn rank<L: Copy + Ord>(counts: &BTreeMap<L, u64>) -> Vec<RankedCount<L>> {
    let total: u64 = counts.values().sum();
    let mut rows: Vec<RankedCount<L>> = counts
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(label, count)| RankedCount {
            label: *label,
            count: *count,
            percentage: if total == 0 {
                0.0
            } else {
                *count as f64 / total as f64 * 100.0
            },
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> Report {
        let mut report = Report {
            total_frames: 10,
            ..Default::default()
        };
        report.emotions.insert(ExpressionLabel::Neutral, 6);
        report.emotions.insert(ExpressionLabel::Happy, 4);
        report
            .emotion_durations
            .insert(ExpressionLabel::Neutral, vec![2, 4]);
        report.transitions.insert("happy->sad".to_string(), 2);
        report.transitions.insert("neutral->happy".to_string(), 5);
        report.transitions.insert("sad->neutral".to_string(), 2);
        report
    }

    #[test]
    fn test_emotion_ranking_orders_by_count() {
        let report = sample_report();
        let ranking = report.emotion_ranking();
        assert_eq!(ranking[0].label, ExpressionLabel::Neutral);
        assert!((ranking[0].percentage - 60.0).abs() < 1e-9);
        assert_eq!(ranking[1].label, ExpressionLabel::Happy);
        assert!((ranking[1].percentage - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_average_duration() {
        let report = sample_report();
        assert_eq!(report.average_duration(ExpressionLabel::Neutral), Some(3.0));
        assert_eq!(report.average_duration(ExpressionLabel::Happy), None);
    }

    #[test]
    fn test_top_transitions_breaks_ties_by_key() {
        let report = sample_report();
        let top = report.top_transitions(2);
        assert_eq!(top, vec![("neutral->happy", 5), ("happy->sad", 2)]);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let report = sample_report();
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["total_frames"], 10);
        assert_eq!(value["emotions"]["happy"], 4);
        assert_eq!(value["transitions"]["neutral->happy"], 5);
        assert!(value["quality_metrics"]["detection_rate"].is_number());
        assert!(value["temporal_samples"].is_array());

        let parsed: Report = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, report);
    }
}
