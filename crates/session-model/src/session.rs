//! Session bundles on disk.
//!
//! A session is the hand-off point between an external face detector and
//! the analysis engine:
//!
//! ```text
//! <session>/
//!   meta/session.json      metadata
//!   meta/detections.jsonl  one line per frame with detected faces
//!   frames/                one still image per frame, named by frame number
//! ```
//!
//! A frame's index is the number in its file stem (`000007.png` and `7.png`
//! are both frame 7), so gaps and unpadded names keep their frame numbers.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::detection::{parse_detections, serialize_detections, FaceDetection, FrameDetections};
use crate::frame::GrayFrame;

const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "pgm", "pnm", "tif", "tiff"];

/// Session metadata (`meta/session.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMeta {
    /// Schema version.
    pub version: String,

    /// Human-readable session name.
    pub name: String,

    /// Frame dimensions in pixels.
    pub frame_width: u32,
    pub frame_height: u32,

    /// Source frame rate, when known.
    #[serde(default)]
    pub fps: Option<f64>,
}

impl SessionMeta {
    pub fn new(name: impl Into<String>, frame_width: u32, frame_height: u32) -> Self {
        Self {
            version: "1.0".to_string(),
            name: name.into(),
            frame_width,
            frame_height,
            fps: None,
        }
    }
}

/// A session loaded from disk. Frames are decoded lazily.
#[derive(Debug, Clone)]
pub struct LoadedSession {
    pub root: PathBuf,
    pub meta: SessionMeta,
    detections: BTreeMap<u64, Vec<FaceDetection>>,
    frame_paths: BTreeMap<u64, PathBuf>,
    rejected_frames: Vec<RejectedFrame>,
}

/// An image in `frames/` that cannot be used as a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedFrame {
    pub path: PathBuf,
    pub reason: RejectReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The file stem is not a frame number.
    NotNumbered,
    /// Frame numbers start at 1.
    ZeroIndex,
    /// Another file already claims the same frame number.
    Duplicate,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::NotNumbered => write!(f, "file name is not a frame number"),
            RejectReason::ZeroIndex => write!(f, "frame numbers start at 1"),
            RejectReason::Duplicate => write!(f, "duplicate frame number"),
        }
    }
}

impl LoadedSession {
    /// Load metadata, detection lines, and the frame listing.
    pub fn load(root: impl AsRef<Path>) -> Result<Self, SessionError> {
        let root = root.as_ref().to_path_buf();

        let meta_path = root.join("meta").join("session.json");
        let meta_json = std::fs::read_to_string(&meta_path).map_err(|e| SessionError::IoError {
            path: meta_path.clone(),
            source: e,
        })?;
        let meta: SessionMeta =
            serde_json::from_str(&meta_json).map_err(|e| SessionError::ParseError {
                path: meta_path.clone(),
                source: e,
            })?;

        let detections_path = root.join("meta").join("detections.jsonl");
        let detections = if detections_path.exists() {
            let content = std::fs::read_to_string(&detections_path).map_err(|e| {
                SessionError::IoError {
                    path: detections_path.clone(),
                    source: e,
                }
            })?;
            let lines = parse_detections(&content).map_err(|e| SessionError::ParseError {
                path: detections_path.clone(),
                source: e,
            })?;
            index_detections(lines)
        } else {
            tracing::warn!(
                "No detections file at {:?}; every frame will have zero faces",
                detections_path
            );
            BTreeMap::new()
        };

        let (frame_paths, rejected_frames) = list_frames(&root.join("frames"))?;

        Ok(Self {
            root,
            meta,
            detections,
            frame_paths,
            rejected_frames,
        })
    }

    /// Create a new session on disk with the standard directory structure.
    pub fn create(
        root: impl AsRef<Path>,
        meta: SessionMeta,
        detections: &[FrameDetections],
    ) -> Result<Self, SessionError> {
        let root = root.as_ref().to_path_buf();

        for subdir in &["meta", "frames"] {
            std::fs::create_dir_all(root.join(subdir)).map_err(|e| SessionError::IoError {
                path: root.join(subdir),
                source: e,
            })?;
        }

        let meta_path = root.join("meta").join("session.json");
        let meta_json =
            serde_json::to_string_pretty(&meta).map_err(|e| SessionError::ParseError {
                path: meta_path.clone(),
                source: e,
            })?;
        std::fs::write(&meta_path, meta_json).map_err(|e| SessionError::IoError {
            path: meta_path,
            source: e,
        })?;

        let detections_path = root.join("meta").join("detections.jsonl");
        let jsonl = serialize_detections(detections).map_err(|e| SessionError::ParseError {
            path: detections_path.clone(),
            source: e,
        })?;
        std::fs::write(&detections_path, jsonl).map_err(|e| SessionError::IoError {
            path: detections_path,
            source: e,
        })?;

        Self::load(root)
    }

    /// Number of frames found in `frames/`.
    pub fn frame_count(&self) -> usize {
        self.frame_paths.len()
    }

    /// Frame numbers present on disk, ascending.
    pub fn frame_indices(&self) -> impl Iterator<Item = u64> + '_ {
        self.frame_paths.keys().copied()
    }

    /// Highest frame number on disk, or 0 when there are no frames.
    pub fn last_frame(&self) -> u64 {
        self.frame_paths.keys().next_back().copied().unwrap_or(0)
    }

    /// Frame numbers in `1..=last_frame()` with no image.
    pub fn missing_frames(&self) -> Vec<u64> {
        (1..=self.last_frame())
            .filter(|i| !self.frame_paths.contains_key(i))
            .collect()
    }

    /// Images in `frames/` that were not assigned a frame number.
    pub fn rejected_frames(&self) -> &[RejectedFrame] {
        &self.rejected_frames
    }

    /// Path of the frame numbered `frame_index`.
    pub fn frame_path(&self, frame_index: u64) -> Option<&Path> {
        self.frame_paths.get(&frame_index).map(PathBuf::as_path)
    }

    /// Decode the frame with the given 1-based index to grayscale.
    pub fn load_frame(&self, frame_index: u64) -> Result<GrayFrame, SessionError> {
        let path = self
            .frame_path(frame_index)
            .ok_or_else(|| SessionError::ValidationError {
                message: format!(
                    "frame {frame_index} has no image (last frame is {})",
                    self.last_frame()
                ),
            })?;
        let img = image::open(path).map_err(|e| SessionError::ImageError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(GrayFrame::from(img.to_luma8()))
    }

    /// Detections for a 1-based frame index (empty when none were recorded).
    pub fn faces_for(&self, frame_index: u64) -> &[FaceDetection] {
        self.detections
            .get(&frame_index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Total face detections across all recorded lines.
    pub fn total_detections(&self) -> usize {
        self.detections.values().map(Vec::len).sum()
    }

    /// Frames that have at least one detection.
    pub fn frames_with_detections(&self) -> usize {
        self.detections.values().filter(|faces| !faces.is_empty()).count()
    }

    /// Check the bundle for problems that would make an analysis misleading.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = vec![];

        if self.frame_paths.is_empty() {
            errors.push("No frames found in frames/".to_string());
        }

        if self.meta.frame_width == 0 || self.meta.frame_height == 0 {
            errors.push(format!(
                "Invalid frame size in metadata: {}x{}",
                self.meta.frame_width, self.meta.frame_height
            ));
        }

        if let Some(fps) = self.meta.fps {
            if fps <= 0.0 || !fps.is_finite() {
                errors.push(format!("Invalid fps in metadata: {fps}"));
            }
        }

        for frame in self.missing_frames() {
            errors.push(format!("Missing frame {frame}"));
        }

        for rejected in &self.rejected_frames {
            errors.push(format!(
                "Ignored {}: {}",
                rejected.path.display(),
                rejected.reason
            ));
        }

        let last = self.last_frame();
        for frame in self.detections.keys() {
            if *frame == 0 || *frame > last {
                errors.push(format!(
                    "Detection line references frame {frame} outside 1..={last}"
                ));
            } else if !self.frame_paths.contains_key(frame) {
                errors.push(format!(
                    "Detection line references frame {frame}, which has no image"
                ));
            }
        }

        for (frame, faces) in &self.detections {
            for (slot, face) in faces.iter().enumerate() {
                if !(0.0..=1.0).contains(&face.confidence) {
                    errors.push(format!(
                        "Frame {frame} face {slot}: confidence {} outside [0, 1]",
                        face.confidence
                    ));
                }
            }
        }

        errors
    }
}

/// Merge lines into a per-frame map. Repeated frame numbers append faces in
/// line order so slot positions stay stable.
fn index_detections(lines: Vec<FrameDetections>) -> BTreeMap<u64, Vec<FaceDetection>> {
    let mut map: BTreeMap<u64, Vec<FaceDetection>> = BTreeMap::new();
    for line in lines {
        map.entry(line.frame).or_default().extend(line.faces);
    }
    map
}

type FrameListing = (BTreeMap<u64, PathBuf>, Vec<RejectedFrame>);

/// Map image files to frame numbers parsed from their stems.
fn list_frames(dir: &Path) -> Result<FrameListing, SessionError> {
    if !dir.exists() {
        return Ok((BTreeMap::new(), vec![]));
    }
    let entries = std::fs::read_dir(dir).map_err(|e| SessionError::IoError {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut images = vec![];
    for entry in entries {
        let entry = entry.map_err(|e| SessionError::IoError {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        let is_frame = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if is_frame && path.is_file() {
            images.push(path);
        }
    }
    // Sorted so the winner among duplicate numbers does not depend on
    // directory order.
    images.sort();

    let mut frames = BTreeMap::new();
    let mut rejected = vec![];
    for path in images {
        let number = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty() && stem.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|stem| stem.parse::<u64>().ok());
        let reason = match number {
            None => RejectReason::NotNumbered,
            Some(0) => RejectReason::ZeroIndex,
            Some(n) if frames.contains_key(&n) => RejectReason::Duplicate,
            Some(n) => {
                frames.insert(n, path);
                continue;
            }
        };
        tracing::warn!("Ignoring {:?}: {}", path, reason);
        rejected.push(RejectedFrame { path, reason });
    }
    Ok((frames, rejected))
}

/// Errors that can occur when working with sessions.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Cannot decode frame {path}: {source}")]
    ImageError {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Invalid session: {message}")]
    ValidationError { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::FaceRegion;

    fn write_frame(root: &Path, name: &str, value: u8) {
        let img = image::GrayImage::from_pixel(8, 6, image::Luma([value]));
        img.save(root.join("frames").join(name)).unwrap();
    }

    #[test]
    fn test_session_create_and_load() {
        let dir = std::env::temp_dir().join("moodscope_test_session");
        let _ = std::fs::remove_dir_all(&dir);

        let detections = vec![FrameDetections {
            frame: 2,
            faces: vec![FaceDetection::new(FaceRegion::new(1, 1, 4, 4), 0.8, "haar")],
        }];
        LoadedSession::create(&dir, SessionMeta::new("Unit", 8, 6), &detections).unwrap();
        write_frame(&dir, "000002.png", 40);
        write_frame(&dir, "000001.png", 10);
        std::fs::write(dir.join("frames").join("notes.txt"), "ignored").unwrap();

        let session = LoadedSession::load(&dir).unwrap();
        assert_eq!(session.meta.name, "Unit");
        assert_eq!(session.frame_count(), 2);
        assert!(session.faces_for(1).is_empty());
        assert_eq!(session.faces_for(2).len(), 1);
        assert_eq!(session.total_detections(), 1);

        let first = session.load_frame(1).unwrap();
        assert_eq!((first.width(), first.height()), (8, 6));
        assert!(first.data().iter().all(|v| *v == 10));
        assert!(session.load_frame(3).is_err());
        assert!(session.validate().is_empty());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_validate_reports_out_of_range_lines() {
        let dir = std::env::temp_dir().join("moodscope_test_session_validate");
        let _ = std::fs::remove_dir_all(&dir);

        let detections = vec![FrameDetections {
            frame: 9,
            faces: vec![FaceDetection::new(FaceRegion::new(0, 0, 2, 2), 1.5, "haar")],
        }];
        let session =
            LoadedSession::create(&dir, SessionMeta::new("Broken", 8, 6), &detections).unwrap();

        let errors = session.validate();
        assert!(errors.iter().any(|e| e.contains("No frames found")));
        assert!(errors.iter().any(|e| e.contains("frame 9 outside")));
        assert!(errors.iter().any(|e| e.contains("confidence 1.5")));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unpadded_names_keep_numeric_order() {
        let dir = std::env::temp_dir().join("moodscope_test_session_unpadded");
        let _ = std::fs::remove_dir_all(&dir);

        LoadedSession::create(&dir, SessionMeta::new("Unpadded", 8, 6), &[]).unwrap();
        for i in 1..=10u8 {
            write_frame(&dir, &format!("{i}.png"), i * 10);
        }

        let session = LoadedSession::load(&dir).unwrap();
        assert_eq!(session.frame_count(), 10);
        assert_eq!(
            session.frame_indices().collect::<Vec<_>>(),
            (1..=10).collect::<Vec<_>>()
        );
        assert_eq!(
            session.frame_path(2).and_then(|p| p.file_name()),
            Some(std::ffi::OsStr::new("2.png"))
        );
        assert!(session.load_frame(10).unwrap().data().iter().all(|v| *v == 100));
        assert!(session.validate().is_empty());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_gap_keeps_detections_on_their_frame() {
        let dir = std::env::temp_dir().join("moodscope_test_session_gap");
        let _ = std::fs::remove_dir_all(&dir);

        let detections = vec![
            FrameDetections {
                frame: 3,
                faces: vec![FaceDetection::new(FaceRegion::new(0, 0, 4, 4), 0.9, "haar")],
            },
            FrameDetections {
                frame: 4,
                faces: vec![],
            },
        ];
        LoadedSession::create(&dir, SessionMeta::new("Gap", 8, 6), &detections).unwrap();
        write_frame(&dir, "000001.png", 10);
        write_frame(&dir, "000002.png", 20);
        write_frame(&dir, "000004.png", 40);
        write_frame(&dir, "cover.png", 0);
        write_frame(&dir, "000000.png", 0);
        write_frame(&dir, "4.png", 0);

        let session = LoadedSession::load(&dir).unwrap();
        assert_eq!(session.frame_indices().collect::<Vec<_>>(), vec![1, 2, 4]);
        assert_eq!(session.last_frame(), 4);
        assert_eq!(session.missing_frames(), vec![3]);
        assert!(session.frame_path(3).is_none());
        assert!(session.load_frame(3).is_err());
        assert_eq!(
            session.frame_path(4).and_then(|p| p.file_name()),
            Some(std::ffi::OsStr::new("000004.png"))
        );
        assert!(session.faces_for(4).is_empty());

        let reasons: Vec<RejectReason> =
            session.rejected_frames().iter().map(|r| r.reason).collect();
        assert_eq!(reasons.len(), 3);
        assert!(reasons.contains(&RejectReason::NotNumbered));
        assert!(reasons.contains(&RejectReason::ZeroIndex));
        assert!(reasons.contains(&RejectReason::Duplicate));

        let errors = session.validate();
        assert!(errors.iter().any(|e| e == "Missing frame 3"));
        assert!(errors
            .iter()
            .any(|e| e.contains("frame 3, which has no image")));
        assert!(errors.iter().any(|e| e.contains("cover.png")));
        assert!(errors.iter().any(|e| e.contains("duplicate frame number")));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_meta_is_io_error() {
        let dir = std::env::temp_dir().join("moodscope_test_session_missing");
        let _ = std::fs::remove_dir_all(&dir);
        let err = LoadedSession::load(&dir).unwrap_err();
        assert!(matches!(err, SessionError::IoError { .. }));
    }

    #[test]
    fn test_repeated_frame_lines_append_faces() {
        let lines = vec![
            FrameDetections {
                frame: 1,
                faces: vec![FaceDetection::new(FaceRegion::new(0, 0, 2, 2), 0.9, "a")],
            },
            FrameDetections {
                frame: 1,
                faces: vec![FaceDetection::new(FaceRegion::new(4, 0, 2, 2), 0.7, "b")],
            },
        ];
        let map = index_detections(lines);
        let faces = &map[&1];
        assert_eq!(faces.len(), 2);
        assert_eq!(faces[0].method, "a");
        assert_eq!(faces[1].method, "b");
    }
}
