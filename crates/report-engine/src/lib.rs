//! MoodScope Report Engine
//!
//! Turns an aggregated [`Report`](moodscope_session_model::Report) into the
//! two artifacts of an analysis run:
//!
//! ```text
//! Report ──┬── render_text ──► <name>.txt   (sectioned, human readable)
//!          └── serde_json  ──► <name>.json  (structured mirror)
//! ```
//!
//! Rendering never mutates the report and copes with empty runs.

pub mod export;
pub mod text;

pub use export::*;
pub use text::{recommendations, render_text};
