//! Geometric features from face-mesh landmarks.
//!
//! Indices follow the 468-point face mesh (478 with refined irises).
//! Every measurement degrades to a neutral value (0.0 or `None`) when the
//! landmark set is too short, an index is out of range, or a denominator is
//! zero. Distances are normalized by the face region height so that the
//! rule thresholds are independent of face size.

use moodscope_session_model::{FaceOrientation, LandmarkSet};
use serde::{Deserialize, Serialize};

pub const UPPER_LIP: usize = 13;
pub const LOWER_LIP: usize = 14;
pub const LEFT_MOUTH_CORNER: usize = 61;
pub const RIGHT_MOUTH_CORNER: usize = 291;
pub const LEFT_EYE_TOP: usize = 159;
pub const LEFT_EYE_BOTTOM: usize = 145;
pub const RIGHT_EYE_TOP: usize = 386;
pub const RIGHT_EYE_BOTTOM: usize = 374;
pub const NOSE_TIP: usize = 4;

pub const LEFT_EYEBROW: [usize; 10] = [336, 296, 334, 293, 300, 276, 283, 282, 295, 285];
pub const RIGHT_EYEBROW: [usize; 10] = [70, 63, 105, 66, 107, 55, 65, 52, 53, 46];
pub const LEFT_EYE_CONTOUR: [usize; 5] = [33, 133, 157, 158, 159];
pub const RIGHT_EYE_CONTOUR: [usize; 5] = [362, 386, 387, 388, 263];

/// Orientation needs at least this many points.
pub const MIN_ORIENTATION_LANDMARKS: usize = 10;
/// Mouth asymmetry needs at least this many points.
pub const MIN_MOUTH_LANDMARKS: usize = 300;
/// Below this nose/eye symmetry ratio the face counts as turned.
pub const TURN_SYMMETRY_THRESHOLD: f64 = 0.6;

/// Normalized measurements for one face in one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Lip gap divided by region height.
    pub mouth_open: f64,
    /// Mean eyelid gap divided by region height.
    pub eye_open: f64,
    /// Mean normalized y of the four eyelid points.
    pub eye_y: Option<f64>,
    /// Absolute difference of mean eyebrow heights.
    pub eyebrow_diff: Option<f64>,
    /// Absolute difference of mouth corner heights.
    pub mouth_corner_tilt: f64,
    /// Corner height difference relative to the lip gap.
    pub mouth_asymmetry: f64,
    pub face_orientation: FaceOrientation,
    /// `min(left, right) / max(left, right)` nose-to-eye distance.
    pub symmetry_ratio: f64,
}

/// Compute every feature for a face region of `region_width x region_height` pixels.
///
/// An empty landmark set yields the all-neutral vector.
pub fn extract(landmarks: &LandmarkSet, region_width: u32, region_height: u32) -> FeatureVector {
    let w = f64::from(region_width);
    let h = f64::from(region_height);

    let mouth_open = normalized_distance(landmarks, UPPER_LIP, LOWER_LIP, w, h);
    let left_eye = normalized_distance(landmarks, LEFT_EYE_TOP, LEFT_EYE_BOTTOM, w, h);
    let right_eye = normalized_distance(landmarks, RIGHT_EYE_TOP, RIGHT_EYE_BOTTOM, w, h);
    let (face_orientation, symmetry_ratio) = face_orientation(landmarks);

    FeatureVector {
        mouth_open,
        eye_open: (left_eye + right_eye) / 2.0,
        eye_y: eye_y(landmarks),
        eyebrow_diff: eyebrow_diff(landmarks),
        mouth_corner_tilt: mouth_corner_tilt(landmarks),
        mouth_asymmetry: mouth_asymmetry(landmarks),
        face_orientation,
        symmetry_ratio,
    }
}

/// Pixel distance between two landmarks, 0.0 if either is missing.
pub fn landmark_distance(landmarks: &LandmarkSet, i: usize, j: usize, w: f64, h: f64) -> f64 {
    match (landmarks.get(i), landmarks.get(j)) {
        (Some(a), Some(b)) => {
            let dx = (a.x - b.x) * w;
            let dy = (a.y - b.y) * h;
            (dx * dx + dy * dy).sqrt()
        }
        _ => 0.0,
    }
}

fn normalized_distance(landmarks: &LandmarkSet, i: usize, j: usize, w: f64, h: f64) -> f64 {
    if h <= 0.0 {
        return 0.0;
    }
    landmark_distance(landmarks, i, j, w, h) / h
}

/// Mean x over the indices that exist, `None` if none do.
pub fn mean_x(landmarks: &LandmarkSet, indices: &[usize]) -> Option<f64> {
    mean(indices.iter().filter_map(|i| landmarks.get(*i)).map(|p| p.x))
}

/// Mean y over the indices that exist, `None` if none do.
pub fn mean_y(landmarks: &LandmarkSet, indices: &[usize]) -> Option<f64> {
    mean(indices.iter().filter_map(|i| landmarks.get(*i)).map(|p| p.y))
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

fn y_or_zero(landmarks: &LandmarkSet, index: usize) -> f64 {
    landmarks.get(index).map(|p| p.y).unwrap_or(0.0)
}

/// Mean height of the eyelids; `None` unless all four points exist.
pub fn eye_y(landmarks: &LandmarkSet) -> Option<f64> {
    let ys = [LEFT_EYE_TOP, LEFT_EYE_BOTTOM, RIGHT_EYE_TOP, RIGHT_EYE_BOTTOM]
        .iter()
        .map(|i| landmarks.get(*i).map(|p| p.y))
        .collect::<Option<Vec<f64>>>()?;
    Some(ys.iter().sum::<f64>() / ys.len() as f64)
}

pub fn eyebrow_diff(landmarks: &LandmarkSet) -> Option<f64> {
    let left = mean_y(landmarks, &LEFT_EYEBROW)?;
    let right = mean_y(landmarks, &RIGHT_EYEBROW)?;
    Some((left - right).abs())
}

pub fn mouth_corner_tilt(landmarks: &LandmarkSet) -> f64 {
    match (
        landmarks.get(LEFT_MOUTH_CORNER),
        landmarks.get(RIGHT_MOUTH_CORNER),
    ) {
        (Some(l), Some(r)) => (l.y - r.y).abs(),
        _ => 0.0,
    }
}

/// Classify head yaw from nose-to-eye horizontal distances.
///
/// Returns the orientation and the symmetry ratio (0.0 when undetermined).
pub fn face_orientation(landmarks: &LandmarkSet) -> (FaceOrientation, f64) {
    if landmarks.len() < MIN_ORIENTATION_LANDMARKS {
        return (FaceOrientation::Frontal, 0.0);
    }

    let (Some(left_eye_x), Some(right_eye_x), Some(nose)) = (
        mean_x(landmarks, &LEFT_EYE_CONTOUR),
        mean_x(landmarks, &RIGHT_EYE_CONTOUR),
        landmarks.get(NOSE_TIP),
    ) else {
        return (FaceOrientation::Frontal, 0.0);
    };

    let left_dist = (nose.x - left_eye_x).abs();
    let right_dist = (right_eye_x - nose.x).abs();
    if left_dist == 0.0 || right_dist == 0.0 {
        return (FaceOrientation::Frontal, 0.0);
    }

    let symmetry_ratio = left_dist.min(right_dist) / left_dist.max(right_dist);
    if symmetry_ratio >= TURN_SYMMETRY_THRESHOLD {
        return (FaceOrientation::Frontal, symmetry_ratio);
    }

    if right_dist - left_dist > 0.0 {
        (FaceOrientation::Right, symmetry_ratio)
    } else {
        (FaceOrientation::Left, symmetry_ratio)
    }
}

/// Mouth corner height difference relative to the lip gap.
pub fn mouth_asymmetry(landmarks: &LandmarkSet) -> f64 {
    if landmarks.len() < MIN_MOUTH_LANDMARKS {
        return 0.0;
    }
    let corner_diff =
        (y_or_zero(landmarks, LEFT_MOUTH_CORNER) - y_or_zero(landmarks, RIGHT_MOUTH_CORNER)).abs();
    let vertical_open =
        (y_or_zero(landmarks, UPPER_LIP) - y_or_zero(landmarks, LOWER_LIP)).abs();
    if vertical_open == 0.0 {
        return 0.0;
    }
    corner_diff / vertical_open
}
