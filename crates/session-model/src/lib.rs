//! MoodScope Session Model
//!
//! Defines the core data contracts shared by the analysis crates:
//! - **Labels:** Activity and expression categories
//! - **Frames:** Grayscale pixel buffers handed to the classifiers
//! - **Detections:** Face regions and optional landmark sets from an external detector
//! - **Session:** On-disk bundle of frames and detection lines
//! - **Report:** Serializable snapshot of an aggregated analysis run
//!
//! Landmark coordinates are normalized to `[0.0, 1.0]` relative to the
//! face region they were computed for.

pub mod detection;
pub mod frame;
pub mod label;
pub mod report;
pub mod session;

pub use detection::*;
pub use frame::*;
pub use label::*;
pub use report::*;
pub use session::*;
