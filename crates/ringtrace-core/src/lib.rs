//! # Ringtrace Core
//!
//! Core abstractions for the ringtrace money-muling detection engine.
//!
//! This crate provides:
//! - Error types shared across the pipeline
//! - Detection thresholds and windows (`DetectionConfig`)
//! - Pipeline stage labels and progress reporting

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod stage;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::DetectionConfig;
    pub use crate::error::{EngineError, Result};
    pub use crate::stage::{ProgressSink, Stage};
}
