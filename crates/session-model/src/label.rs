//! Categorical labels produced by the classifiers.
//!
//! Both label sets are closed. Their serialized form is the snake_case name,
//! which is also what appears in reports and transition keys.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Global per-frame motion intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLabel {
    /// No previous frame to compare against yet.
    Unknown,
    Still,
    LightMotion,
    ModerateMotion,
    IntenseMotion,
}

impl ActivityLabel {
    pub const ALL: [ActivityLabel; 5] = [
        ActivityLabel::Unknown,
        ActivityLabel::Still,
        ActivityLabel::LightMotion,
        ActivityLabel::ModerateMotion,
        ActivityLabel::IntenseMotion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLabel::Unknown => "unknown",
            ActivityLabel::Still => "still",
            ActivityLabel::LightMotion => "light_motion",
            ActivityLabel::ModerateMotion => "moderate_motion",
            ActivityLabel::IntenseMotion => "intense_motion",
        }
    }
}

impl fmt::Display for ActivityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-face facial expression category.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionLabel {
    /// Face is turned to one side; expression geometry is unreliable.
    TurnedFace,
    Surprised,
    Grimace,
    Disdain,
    Distress,
    Smiling,
    Happy,
    Sad,
    Thoughtful,
    #[default]
    Neutral,
}

impl ExpressionLabel {
    pub const ALL: [ExpressionLabel; 10] = [
        ExpressionLabel::TurnedFace,
        ExpressionLabel::Surprised,
        ExpressionLabel::Grimace,
        ExpressionLabel::Disdain,
        ExpressionLabel::Distress,
        ExpressionLabel::Smiling,
        ExpressionLabel::Happy,
        ExpressionLabel::Sad,
        ExpressionLabel::Thoughtful,
        ExpressionLabel::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpressionLabel::TurnedFace => "turned_face",
            ExpressionLabel::Surprised => "surprised",
            ExpressionLabel::Grimace => "grimace",
            ExpressionLabel::Disdain => "disdain",
            ExpressionLabel::Distress => "distress",
            ExpressionLabel::Smiling => "smiling",
            ExpressionLabel::Happy => "happy",
            ExpressionLabel::Sad => "sad",
            ExpressionLabel::Thoughtful => "thoughtful",
            ExpressionLabel::Neutral => "neutral",
        }
    }
}

impl fmt::Display for ExpressionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Head orientation derived from nose/eye horizontal symmetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceOrientation {
    #[default]
    Frontal,
    Left,
    Right,
}

impl FaceOrientation {
    pub fn is_turned(&self) -> bool {
        !matches!(self, FaceOrientation::Frontal)
    }
}

/// Key used for a label change inside one face slot, e.g. `"neutral->happy"`.
pub fn transition_key(from: ExpressionLabel, to: ExpressionLabel) -> String {
    format!("{from}->{to}")
}
