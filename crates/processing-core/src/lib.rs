//! MoodScope Processing Core
//!
//! Heuristic per-frame analysis and its temporal summary:
//! - **Motion:** Frame-difference activity classification
//! - **Features:** Normalized geometry from face-mesh landmarks
//! - **Expression:** Ordered rule cascade with an intensity-only fallback
//! - **Aggregator:** Counts, runs, transitions and detection quality
//! - **Pipeline:** One frame through all of the above, in order
//!
//! This crate is pure computation. No I/O, no detector dependencies.
//! All inputs are data; all outputs are data.

pub mod aggregator;
pub mod expression;
pub mod features;
pub mod motion;
pub mod pipeline;
pub mod region;

pub use aggregator::{AggregateError, FaceObservation, TemporalAggregator};
pub use expression::{classify_face, Classification, FallbackReason};
pub use features::FeatureVector;
pub use motion::MotionClassifier;
pub use pipeline::{FrameOutcome, FramePipeline};
pub use region::IntensityStats;
