//! MoodScope Common Utilities
//!
//! Shared infrastructure for all MoodScope crates:
//! - Error types and result aliases
//! - Analysis clock for stamping temporal samples
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
