//! Human-readable report.

use moodscope_session_model::Report;

/// Transitions listed in the text report.
pub const TOP_TRANSITIONS: usize = 10;
/// Temporal samples listed in the text report.
pub const SAMPLES_SHOWN: usize = 5;

pub const LOW_DETECTION_RATE: f64 = 0.3;
pub const LOW_CONFIDENCE: f64 = 0.4;
pub const LOW_STABILITY: f64 = 0.5;
/// Average face area in pixels below which faces count as small.
pub const SMALL_FACE_AREA: f64 = 2000.0;

const WIDTH: usize = 60;
const NO_DATA: &str = "  No data.";

/// Render the sectioned text report.
pub fn render_text(report: &Report) -> String {
    let mut lines = vec![];
    lines.push("=".repeat(WIDTH));
    lines.push("VIDEO ANALYSIS SUMMARY".to_string());
    lines.push("=".repeat(WIDTH));

    section(&mut lines, "GENERAL", general(report));
    section(&mut lines, "DETECTION QUALITY", quality(report));
    section(&mut lines, "DETECTION METHODS", methods(report));
    section(&mut lines, "ACTIVITIES", activities(report));
    section(&mut lines, "EXPRESSIONS", expressions(report));
    section(&mut lines, "TOP TRANSITIONS", transitions(report));
    section(&mut lines, "TEMPORAL SAMPLES", samples(report));

    let advice = if report.is_empty() {
        vec![]
    } else {
        let advice = recommendations(report);
        if advice.is_empty() {
            vec!["  None. Detection quality looks adequate.".to_string()]
        } else {
            advice.into_iter().map(|r| format!("  - {r}")).collect()
        }
    };
    section(&mut lines, "RECOMMENDATIONS", advice);

    lines.push(String::new());
    lines.push("=".repeat(WIDTH));
    lines.push(String::new());
    lines.join("\n")
}

fn section(lines: &mut Vec<String>, title: &str, body: Vec<String>) {
    lines.push(String::new());
    lines.push("-".repeat(WIDTH));
    lines.push(title.to_string());
    lines.push("-".repeat(WIDTH));
    if body.is_empty() {
        lines.push(NO_DATA.to_string());
    } else {
        lines.extend(body);
    }
}

fn general(report: &Report) -> Vec<String> {
    if report.is_empty() {
        return vec![];
    }
    vec![
        format!("  Frames analyzed: {}", report.total_frames),
        format!("  Generated at: {}", report.generated_at),
    ]
}

fn quality(report: &Report) -> Vec<String> {
    if report.is_empty() {
        return vec![];
    }
    let q = &report.quality_metrics;
    vec![
        format!("  Frames with faces: {}", q.frames_with_faces),
        format!("  Frames without faces: {}", q.frames_without_faces),
        format!("  Detection rate: {:.1}%", q.detection_rate * 100.0),
        format!("  Face detections: {}", q.total_face_detections),
        format!("  Average confidence: {:.2}", q.average_confidence),
        format!("  Average face size: {:.0} px", q.average_face_size),
        format!("  Emotional stability: {:.2}", q.emotional_stability),
        format!("  Expression transitions: {}", q.total_transitions),
        format!("  Intensity-only classifications: {}", q.fallback_classifications),
    ]
}

fn methods(report: &Report) -> Vec<String> {
    let total: u64 = report.detection_methods.values().sum();
    if total == 0 {
        return vec![];
    }
    let mut rows: Vec<(&String, &u64)> = report.detection_methods.iter().collect();
    rows.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    rows.into_iter()
        .map(|(method, count)| {
            format!(
                "  {method}: {count} ({:.1}%)",
                *count as f64 / total as f64 * 100.0
            )
        })
        .collect()
}

fn activities(report: &Report) -> Vec<String> {
    report
        .activity_ranking()
        .into_iter()
        .map(|row| {
            format!(
                "  {}: {} frames ({:.1}%)",
                row.label, row.count, row.percentage
            )
        })
        .collect()
}

fn expressions(report: &Report) -> Vec<String> {
    report
        .emotion_ranking()
        .into_iter()
        .map(|row| {
            let duration = match report.average_duration(row.label) {
                Some(frames) => format!("{frames:.1} frames"),
                None => "n/a".to_string(),
            };
            format!(
                "  {}: {} ({:.1}%)  avg duration: {duration}",
                row.label, row.count, row.percentage
            )
        })
        .collect()
}

fn transitions(report: &Report) -> Vec<String> {
    report
        .top_transitions(TOP_TRANSITIONS)
        .into_iter()
        .map(|(key, count)| format!("  {key}: {count}"))
        .collect()
}

fn samples(report: &Report) -> Vec<String> {
    report
        .temporal_samples
        .iter()
        .take(SAMPLES_SHOWN)
        .map(|sample| {
            let labels: Vec<&str> = sample.emotions.iter().map(|l| l.as_str()).collect();
            format!(
                "  frame {} ({}): {} face(s) [{}]",
                sample.frame,
                sample.timestamp,
                sample.face_count,
                labels.join(", ")
            )
        })
        .collect()
}

/// Advice derived from the quality metrics.
///
/// Confidence and stability are only judged when at least one face was
/// detected.
pub fn recommendations(report: &Report) -> Vec<String> {
    let q = &report.quality_metrics;
    let mut advice = vec![];

    if q.detection_rate < LOW_DETECTION_RATE {
        advice.push(format!(
            "Faces were found in only {:.1}% of frames. Improve lighting or move the camera closer.",
            q.detection_rate * 100.0
        ));
    }

    if q.total_face_detections > 0 {
        if q.average_confidence < LOW_CONFIDENCE {
            advice.push(format!(
                "Average detector confidence is {:.2}. Check focus and framing.",
                q.average_confidence
            ));
        }
        if q.emotional_stability < LOW_STABILITY {
            advice.push(format!(
                "Emotional stability is {:.2}. Expressions change often or face order is unstable.",
                q.emotional_stability
            ));
        }
    }

    if q.average_face_size > 0.0 && q.average_face_size < SMALL_FACE_AREA {
        advice.push(format!(
            "Faces average {:.0} px. Use a higher resolution or a tighter shot.",
            q.average_face_size
        ));
    }

    advice
}

#[cfg(test)]
mod tests {
    use moodscope_session_model::{
        ActivityLabel, ExpressionLabel, QualityMetrics, TemporalSample,
    };

    use super::*;

    fn report() -> Report {
        let mut report = Report {
            generated_at: "2026-01-01T00:00:00+00:00".to_string(),
            total_frames: 10,
            quality_metrics: QualityMetrics {
                frames_with_faces: 8,
                frames_without_faces: 2,
                total_face_detections: 8,
                detection_rate: 0.8,
                average_confidence: 0.9,
                average_face_size: 5000.0,
                emotional_stability: 0.875,
                total_transitions: 1,
                fallback_classifications: 0,
            },
            ..Default::default()
        };
        report.activities.insert(ActivityLabel::Still, 7);
        report.activities.insert(ActivityLabel::Unknown, 1);
        report.activities.insert(ActivityLabel::LightMotion, 2);
        report.emotions.insert(ExpressionLabel::Neutral, 5);
        report.emotions.insert(ExpressionLabel::Happy, 3);
        report
            .emotion_durations
            .insert(ExpressionLabel::Neutral, vec![5]);
        report.detection_methods.insert("mediapipe".to_string(), 8);
        report.transitions.insert("neutral->happy".to_string(), 1);
        report
    }

    #[test]
    fn test_empty_report_has_no_data_everywhere() {
        let text = render_text(&Report::default());
        assert_eq!(text.matches("No data.").count(), 8);
        assert!(!text.contains("NaN"));
    }

    #[test]
    fn test_expression_lines() {
        let text = render_text(&report());
        assert!(text.contains("neutral: 5 (62.5%)  avg duration: 5.0 frames"));
        assert!(text.contains("happy: 3 (37.5%)  avg duration: n/a"));
        let neutral = text.find("neutral: 5").unwrap();
        let happy = text.find("happy: 3").unwrap();
        assert!(neutral < happy);
    }

    #[test]
    fn test_activity_and_method_lines() {
        let text = render_text(&report());
        assert!(text.contains("still: 7 frames (70.0%)"));
        assert!(text.contains("light_motion: 2 frames (20.0%)"));
        assert!(text.contains("mediapipe: 8 (100.0%)"));
        assert!(text.contains("neutral->happy: 1"));
        assert!(text.contains("Detection rate: 80.0%"));
    }

    #[test]
    fn test_no_samples_section_says_no_data() {
        let text = render_text(&report());
        let samples = text.split("TEMPORAL SAMPLES").nth(1).unwrap();
        assert!(samples.trim_start_matches(['-', '\n']).starts_with(NO_DATA));
    }

    #[test]
    fn test_only_first_five_samples() {
        let mut report = report();
        for i in 1..=7u64 {
            report.temporal_samples.push(TemporalSample {
                frame: i * 30,
                face_count: 1,
                emotions: vec![ExpressionLabel::Happy],
                timestamp: "t".to_string(),
            });
        }
        let text = render_text(&report);
        assert!(text.contains("frame 150 (t): 1 face(s) [happy]"));
        assert!(!text.contains("frame 180"));
    }

    #[test]
    fn test_healthy_report_has_no_recommendations() {
        let report = report();
        assert!(recommendations(&report).is_empty());
        let text = render_text(&report);
        let tail = text.split("RECOMMENDATIONS").nth(1).unwrap();
        assert!(tail.contains("None. Detection quality looks adequate."));
    }

    #[test]
    fn test_recommendation_triggers() {
        let mut report = report();
        report.quality_metrics.detection_rate = 0.2;
        report.quality_metrics.average_confidence = 0.3;
        report.quality_metrics.emotional_stability = 0.4;
        report.quality_metrics.average_face_size = 1500.0;
        assert_eq!(recommendations(&report).len(), 4);
    }

    #[test]
    fn test_confidence_and_stability_skipped_without_faces() {
        let report = Report {
            total_frames: 5,
            quality_metrics: QualityMetrics {
                frames_without_faces: 5,
                ..Default::default()
            },
            ..Default::default()
        };
        let advice = recommendations(&report);
        assert_eq!(advice.len(), 1);
        assert!(advice[0].contains("0.0% of frames"));
    }
}
