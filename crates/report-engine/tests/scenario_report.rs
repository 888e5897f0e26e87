use moodscope_processing_core::{FaceObservation, TemporalAggregator};
use moodscope_report_engine::{recommendations, render_text};
use moodscope_session_model::{ActivityLabel, ExpressionLabel};

fn run(labels: impl Iterator<Item = ExpressionLabel>) -> TemporalAggregator {
    let mut aggregator = TemporalAggregator::new();
    for (i, label) in labels.enumerate() {
        aggregator
            .update(
                i as u64 + 1,
                &[FaceObservation::from_label(label)],
                ActivityLabel::Still,
            )
            .unwrap();
    }
    aggregator
}

#[test]
fn sixty_neutral_then_forty_happy() {
    let labels = std::iter::repeat(ExpressionLabel::Neutral)
        .take(60)
        .chain(std::iter::repeat(ExpressionLabel::Happy).take(40));
    let report = run(labels).snapshot();
    let text = render_text(&report);

    assert!(text.contains("happy: 40 (40.0%)"));
    assert!(text.contains("neutral: 60 (60.0%)  avg duration: 60.0 frames"));
    assert!(text.contains("still: 100 frames (100.0%)"));
    assert!(text.contains("neutral->happy: 1"));
    assert!(text.contains("Emotional stability: 0.99"));
    assert_eq!(report.quality_metrics.total_transitions, 1);
    assert!((report.quality_metrics.emotional_stability - 0.99).abs() < 1e-9);
    assert!(!text.contains("No data."));
}

#[test]
fn flickering_labels_recommend_checking_stability() {
    let labels = (0..20).map(|i| {
        if i % 2 == 0 {
            ExpressionLabel::Happy
        } else {
            ExpressionLabel::Sad
        }
    });
    let report = run(labels).snapshot();
    let advice = recommendations(&report);
    assert!(advice.iter().any(|a| a.contains("Emotional stability")));
}

#[test]
fn zero_frames_render_placeholders() {
    let report = TemporalAggregator::new().snapshot();
    let text = render_text(&report);
    assert_eq!(text.matches("No data.").count(), 8);
}
