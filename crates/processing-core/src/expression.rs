//! Rule-based expression classification.
//!
//! The landmark rules form an ordered cascade: the first rule that matches
//! wins, and the rules overlap, so their order is part of the behavior.
//! When no landmark set is available the fallback rules look at region
//! intensity alone.

use moodscope_session_model::{ExpressionLabel, FaceDetection, GrayFrame};
use serde::Serialize;

use crate::features::{self, FeatureVector};
use crate::region::{FaceCrop, IntensityStats};

pub const SURPRISE_MOUTH_OPEN: f64 = 0.08;
pub const SURPRISE_EYE_OPEN: f64 = 0.045;

pub const GRIMACE_ASYMMETRY: f64 = 0.15;
pub const GRIMACE_MOUTH_OPEN: f64 = 0.03;

pub const DISDAIN_EYEBROW_DIFF: f64 = 0.035;

/// Upper bound of a "closed" mouth for disdain, sad and thoughtful.
pub const CLOSED_MOUTH: f64 = 0.035;

pub const DISTRESS_MOUTH_OPEN: (f64, f64) = (0.04, 0.07);
pub const DISTRESS_MEAN: (f64, f64) = (60.0, 110.0);
pub const DISTRESS_STD: f64 = 35.0;
pub const DISTRESS_EYE_OPEN: f64 = 0.04;

pub const SMILE_MOUTH_OPEN: f64 = 0.05;
/// Brighter open-mouth faces read as smiling, darker ones as happy.
pub const SMILE_MEAN: f64 = 95.0;

pub const SAD_MEAN: f64 = 75.0;

pub const THOUGHTFUL_MEAN: (f64, f64) = (70.0, 125.0);
pub const THOUGHTFUL_STD: f64 = 35.0;
pub const THOUGHTFUL_EYE_Y: f64 = 0.52;
pub const THOUGHTFUL_EYE_OPEN: f64 = 0.035;

pub const FALLBACK_SAD_MEAN: f64 = 65.0;
pub const FALLBACK_THOUGHTFUL_MEAN: (f64, f64) = (65.0, 120.0);
pub const FALLBACK_THOUGHTFUL_STD: f64 = 25.0;

/// Why a face was labelled by the intensity-only rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// The detector supplied no landmark set.
    NoLandmarks,
    /// The detector supplied a landmark set with no points.
    EmptyLandmarks,
}

/// Outcome of classifying one detected face.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "path", rename_all = "snake_case")]
pub enum Classification {
    Landmarks {
        label: ExpressionLabel,
        features: FeatureVector,
        intensity: IntensityStats,
    },
    Fallback {
        label: ExpressionLabel,
        intensity: IntensityStats,
        reason: FallbackReason,
    },
}

impl Classification {
    pub fn label(&self) -> ExpressionLabel {
        match self {
            Classification::Landmarks { label, .. } | Classification::Fallback { label, .. } => {
                *label
            }
        }
    }

    pub fn intensity(&self) -> IntensityStats {
        match self {
            Classification::Landmarks { intensity, .. }
            | Classification::Fallback { intensity, .. } => *intensity,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Classification::Fallback { .. })
    }
}

/// Run the landmark cascade.
pub fn classify(features: &FeatureVector, intensity: IntensityStats) -> ExpressionLabel {
    let mouth = features.mouth_open;
    let eye = features.eye_open;
    let IntensityStats { mean, std } = intensity;

    if features.face_orientation.is_turned() {
        return ExpressionLabel::TurnedFace;
    }

    if mouth > SURPRISE_MOUTH_OPEN && eye > SURPRISE_EYE_OPEN {
        return ExpressionLabel::Surprised;
    }

    if features.mouth_asymmetry > GRIMACE_ASYMMETRY && mouth > GRIMACE_MOUTH_OPEN {
        return ExpressionLabel::Grimace;
    }

    if let Some(eyebrow_diff) = features.eyebrow_diff {
        if eyebrow_diff > DISDAIN_EYEBROW_DIFF && mouth < CLOSED_MOUTH {
            return ExpressionLabel::Disdain;
        }
    }

    if in_range(mouth, DISTRESS_MOUTH_OPEN)
        && in_range(mean, DISTRESS_MEAN)
        && std > DISTRESS_STD
        && eye < DISTRESS_EYE_OPEN
    {
        return ExpressionLabel::Distress;
    }

    if mouth > SMILE_MOUTH_OPEN {
        return if mean > SMILE_MEAN {
            ExpressionLabel::Smiling
        } else {
            ExpressionLabel::Happy
        };
    }

    if mouth < CLOSED_MOUTH && mean < SAD_MEAN {
        return ExpressionLabel::Sad;
    }

    if mouth < CLOSED_MOUTH
        && in_range(mean, THOUGHTFUL_MEAN)
        && std < THOUGHTFUL_STD
        && features.eye_y.is_some_and(|y| y > THOUGHTFUL_EYE_Y)
        && eye < THOUGHTFUL_EYE_OPEN
    {
        return ExpressionLabel::Thoughtful;
    }

    ExpressionLabel::Neutral
}

/// Intensity-only rules, used when feature extraction cannot run.
pub fn fallback(intensity: IntensityStats) -> ExpressionLabel {
    if intensity.mean < FALLBACK_SAD_MEAN {
        ExpressionLabel::Sad
    } else if in_range(intensity.mean, FALLBACK_THOUGHTFUL_MEAN)
        && intensity.std < FALLBACK_THOUGHTFUL_STD
    {
        ExpressionLabel::Thoughtful
    } else {
        ExpressionLabel::Neutral
    }
}

/// Classify one detection against its frame.
///
/// Returns `None` when the detector box has no pixels inside the frame.
pub fn classify_face(frame: &GrayFrame, detection: &FaceDetection) -> Option<Classification> {
    let Some(crop) = FaceCrop::sample(frame, &detection.region) else {
        tracing::debug!(
            "Dropping face {:?}: no pixels inside {}x{} frame",
            detection.region,
            frame.width(),
            frame.height()
        );
        return None;
    };

    let classification = match detection.landmarks.as_ref() {
        None => Classification::Fallback {
            label: fallback(crop.intensity),
            intensity: crop.intensity,
            reason: FallbackReason::NoLandmarks,
        },
        Some(landmarks) if landmarks.is_empty() => Classification::Fallback {
            label: fallback(crop.intensity),
            intensity: crop.intensity,
            reason: FallbackReason::EmptyLandmarks,
        },
        Some(landmarks) => {
            let features = features::extract(landmarks, crop.width(), crop.height());
            Classification::Landmarks {
                label: classify(&features, crop.intensity),
                features,
                intensity: crop.intensity,
            }
        }
    };

    Some(classification)
}

fn in_range(value: f64, (low, high): (f64, f64)) -> bool {
    value >= low && value <= high
}
