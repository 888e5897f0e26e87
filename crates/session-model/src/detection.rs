//! Face detections supplied by an external detector.
//!
//! Detection lines are stored as append-only JSONL, one object per frame:
//!
//! ```text
//! {"frame":12,"faces":[{"region":{"x":40,"y":32,"width":120,"height":140},"confidence":0.93,"method":"mediapipe","landmarks":[[0.41,0.37],...]}]}
//! ```
//!
//! Landmark points are normalized to `[0.0, 1.0]` relative to the face region.

use serde::{Deserialize, Serialize};

/// Axis-aligned face bounding box in frame pixels.
///
/// Detectors may report boxes that hang off the frame edge, so the origin is
/// signed; use [`FaceRegion::clamp_to`] before sampling pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceRegion {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl FaceRegion {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Area in pixels (0 for degenerate boxes).
    pub fn area(&self) -> u64 {
        if self.width <= 0 || self.height <= 0 {
            return 0;
        }
        self.width as u64 * self.height as u64
    }

    /// Intersect with a `frame_width x frame_height` frame.
    ///
    /// Returns `None` when the box is degenerate or lies entirely outside.
    pub fn clamp_to(&self, frame_width: u32, frame_height: u32) -> Option<FaceRegion> {
        if self.width <= 0 || self.height <= 0 {
            return None;
        }
        let fw = i64::from(frame_width);
        let fh = i64::from(frame_height);
        let x0 = i64::from(self.x).max(0);
        let y0 = i64::from(self.y).max(0);
        let x1 = (i64::from(self.x) + i64::from(self.width)).min(fw);
        let y1 = (i64::from(self.y) + i64::from(self.height)).min(fh);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(FaceRegion {
            x: x0 as i32,
            y: y0 as i32,
            width: (x1 - x0) as i32,
            height: (y1 - y0) as i32,
        })
    }
}

/// A single normalized landmark point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LandmarkPoint {
    pub x: f64,
    pub y: f64,
}

impl LandmarkPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<[f64; 2]> for LandmarkPoint {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<LandmarkPoint> for [f64; 2] {
    fn from(p: LandmarkPoint) -> Self {
        [p.x, p.y]
    }
}

/// Positionally indexed face-mesh landmarks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkSet {
    points: Vec<LandmarkPoint>,
}

impl LandmarkSet {
    pub fn new(points: Vec<LandmarkPoint>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<LandmarkPoint> {
        self.points.get(index).copied()
    }

    pub fn points(&self) -> &[LandmarkPoint] {
        &self.points
    }

    /// Overwrite one point. Out-of-range indices are ignored.
    pub fn set(&mut self, index: usize, point: LandmarkPoint) {
        if let Some(slot) = self.points.get_mut(index) {
            *slot = point;
        }
    }
}

fn default_confidence() -> f64 {
    0.5
}

fn default_method() -> String {
    "unknown".to_string()
}

/// One face found by the detector in one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceDetection {
    pub region: FaceRegion,

    /// Detector confidence in `[0.0, 1.0]`.
    #[serde(default = "default_confidence")]
    pub confidence: f64,

    /// Detector that produced the box, e.g. `mediapipe` or `haar`.
    #[serde(default = "default_method")]
    pub method: String,

    /// Face-mesh landmarks, absent when no mesh was found.
    #[serde(default)]
    pub landmarks: Option<LandmarkSet>,
}

impl FaceDetection {
    pub fn new(region: FaceRegion, confidence: f64, method: impl Into<String>) -> Self {
        Self {
            region,
            confidence,
            method: method.into(),
            landmarks: None,
        }
    }

    pub fn with_landmarks(mut self, landmarks: LandmarkSet) -> Self {
        self.landmarks = Some(landmarks);
        self
    }
}

/// All detections for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameDetections {
    /// 1-based frame index.
    pub frame: u64,

    #[serde(default)]
    pub faces: Vec<FaceDetection>,
}

/// Parse detection lines from JSONL content (one JSON object per line).
pub fn parse_detections(jsonl: &str) -> Result<Vec<FrameDetections>, serde_json::Error> {
    jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}

/// Serialize detection lines to JSONL format.
pub fn serialize_detections(lines: &[FrameDetections]) -> Result<String, serde_json::Error> {
    let mut output = String::new();
    for line in lines {
        output.push_str(&serde_json::to_string(line)?);
        output.push('\n');
    }
    Ok(output)
}
