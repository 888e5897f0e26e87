//! Face region sampling.

use moodscope_session_model::{FaceRegion, GrayFrame};
use serde::{Deserialize, Serialize};

/// Grayscale statistics of a face region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IntensityStats {
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
}

impl IntensityStats {
    pub fn new(mean: f64, std: f64) -> Self {
        Self { mean, std }
    }
}

/// A detector box clamped to the frame, with its intensity statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceCrop {
    pub region: FaceRegion,
    pub intensity: IntensityStats,
}

impl FaceCrop {
    /// Clamp `region` to `frame` and sample it. `None` if nothing remains.
    pub fn sample(frame: &GrayFrame, region: &FaceRegion) -> Option<Self> {
        let clamped = region.clamp_to(frame.width(), frame.height())?;
        let intensity = intensity_stats(frame, &clamped)?;
        Some(Self {
            region: clamped,
            intensity,
        })
    }

    pub fn width(&self) -> u32 {
        self.region.width as u32
    }

    pub fn height(&self) -> u32 {
        self.region.height as u32
    }

    pub fn area(&self) -> u64 {
        self.region.area()
    }
}

/// Mean and population standard deviation over an already clamped region.
///
/// Returns `None` for an empty region.
pub fn intensity_stats(frame: &GrayFrame, region: &FaceRegion) -> Option<IntensityStats> {
    if region.width <= 0 || region.height <= 0 || region.x < 0 || region.y < 0 {
        return None;
    }
    let x0 = region.x as usize;
    let x1 = (x0 + region.width as usize).min(frame.width() as usize);

    let mut count = 0u64;
    let mut sum = 0u64;
    let mut sum_sq = 0u64;
    for y in region.y as u32..(region.y + region.height) as u32 {
        let row = frame.row(y);
        if x0 >= row.len() {
            continue;
        }
        for v in &row[x0..x1.min(row.len())] {
            let v = u64::from(*v);
            count += 1;
            sum += v;
            sum_sq += v * v;
        }
    }

    if count == 0 {
        return None;
    }
    let n = count as f64;
    let mean = sum as f64 / n;
    let variance = (sum_sq as f64 / n - mean * mean).max(0.0);
    Some(IntensityStats {
        mean,
        std: variance.sqrt(),
    })
}
