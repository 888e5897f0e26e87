//! Global motion classification by frame differencing.
//!
//! The motion value of a frame is the mean absolute per-pixel difference
//! against the previous grayscale frame. It is bucketed into four bands:
//!
//! | motion value      | label             |
//! |-------------------|-------------------|
//! | `< 3.0`           | `still`           |
//! | `[3.0, 8.0)`      | `light_motion`    |
//! | `[8.0, 20.0)`     | `moderate_motion` |
//! | `>= 20.0`         | `intense_motion`  |

use moodscope_session_model::{ActivityLabel, GrayFrame};
use serde::Serialize;

/// Lower bound of `light_motion`.
pub const LIGHT_MOTION_THRESHOLD: f64 = 3.0;
/// Lower bound of `moderate_motion`.
pub const MODERATE_MOTION_THRESHOLD: f64 = 8.0;
/// Lower bound of `intense_motion`.
pub const INTENSE_MOTION_THRESHOLD: f64 = 20.0;

/// Result of classifying one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MotionReading {
    pub activity: ActivityLabel,
    /// Mean absolute difference; `None` when there was nothing to compare against.
    pub motion: Option<f64>,
}

/// Frame-difference activity classifier. Holds only the previous frame.
#[derive(Debug, Default)]
pub struct MotionClassifier {
    previous: Option<GrayFrame>,
}

impl MotionClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `frame` against the previous one and keep it for the next call.
    pub fn classify(&mut self, frame: &GrayFrame) -> ActivityLabel {
        self.measure(frame).activity
    }

    /// Like [`classify`](Self::classify), also returning the raw motion value.
    pub fn measure(&mut self, frame: &GrayFrame) -> MotionReading {
        let reading = match self.previous.as_ref() {
            None => MotionReading {
                activity: ActivityLabel::Unknown,
                motion: None,
            },
            Some(prev) if !prev.same_dimensions(frame) => {
                tracing::warn!(
                    "Frame size changed from {}x{} to {}x{}; motion baseline reset",
                    prev.width(),
                    prev.height(),
                    frame.width(),
                    frame.height()
                );
                MotionReading {
                    activity: ActivityLabel::Unknown,
                    motion: None,
                }
            }
            Some(prev) => {
                let motion = mean_abs_diff(prev, frame);
                MotionReading {
                    activity: classify_motion(motion),
                    motion: Some(motion),
                }
            }
        };

        self.previous = Some(frame.clone());
        reading
    }

    /// Forget the stored frame; the next call returns `unknown`.
    pub fn reset(&mut self) {
        self.previous = None;
    }

    pub fn has_baseline(&self) -> bool {
        self.previous.is_some()
    }
}

/// Map a motion value onto its activity band.
pub fn classify_motion(motion: f64) -> ActivityLabel {
    if motion < LIGHT_MOTION_THRESHOLD {
        ActivityLabel::Still
    } else if motion < MODERATE_MOTION_THRESHOLD {
        ActivityLabel::LightMotion
    } else if motion < INTENSE_MOTION_THRESHOLD {
        ActivityLabel::ModerateMotion
    } else {
        ActivityLabel::IntenseMotion
    }
}

/// Mean absolute difference of two equally sized frames (0 for empty frames).
fn mean_abs_diff(a: &GrayFrame, b: &GrayFrame) -> f64 {
    let n = a.data().len();
    if n == 0 {
        return 0.0;
    }
    let total: u64 = a
        .data()
        .iter()
        .zip(b.data())
        .map(|(x, y)| u64::from(x.abs_diff(*y)))
        .sum();
    total as f64 / n as f64
}
