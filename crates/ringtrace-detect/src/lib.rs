//! # Ringtrace Detect
//!
//! Deterministic money-muling detection over transaction graphs.
//!
//! The engine ingests a bounded batch of validated transactions and
//! produces a forensic report flagging accounts likely participating in
//! muling networks, grouped into fraud rings with risk scores. Output is
//! byte-stable across runs for identical input.
//!
//! ## Pipeline
//!
//! - `graph` - directed multigraph with per-node analysis state
//! - `cycles` - simple routing loops of 3-5 accounts
//! - `smurfing` - windowed distinct-counterparty fan-in/fan-out
//! - `shell` - layered chains through pass-through accounts
//! - `merge` - canonical dedup, subset elimination, overlap union
//! - `scoring` - rule-based account and ring scores
//! - `report` - stable serialization contract
//! - `pipeline` - fixed-order orchestration with progress callbacks
//!
//! ## Example
//!
//! ```
//! use ringtrace_detect::pipeline::DetectionPipeline;
//! use ringtrace_detect::types::Transaction;
//!
//! let batch = vec![
//!     Transaction::new("T1", "A", "B", 100.0, 0),
//!     Transaction::new("T2", "B", "C", 100.0, 3_600_000),
//!     Transaction::new("T3", "C", "A", 100.0, 7_200_000),
//! ];
//! let report = DetectionPipeline::new().run(&batch).unwrap();
//! assert_eq!(report.fraud_rings.len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cycles;
pub mod generation;
pub mod graph;
pub mod merge;
pub mod pipeline;
pub mod report;
pub mod scoring;
pub mod shell;
pub mod smurfing;
pub mod types;

pub use cycles::CycleDetector;
pub use graph::TransactionGraph;
pub use merge::RingMerger;
pub use pipeline::DetectionPipeline;
pub use report::ForensicReport;
pub use scoring::ScoringEngine;
pub use shell::ShellChainDetector;
pub use smurfing::SmurfingDetector;
pub use types::{FraudRing, PatternType, Transaction};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::cycles::CycleDetector;
    pub use crate::generation::{GenerationConfig, NetworkGenerator};
    pub use crate::graph::{AccountNode, TransactionEdge, TransactionGraph};
    pub use crate::merge::RingMerger;
    pub use crate::pipeline::DetectionPipeline;
    pub use crate::report::{ForensicReport, ReportSummary, SuspiciousAccount};
    pub use crate::scoring::ScoringEngine;
    pub use crate::shell::ShellChainDetector;
    pub use crate::smurfing::SmurfingDetector;
    pub use crate::types::{FraudRing, PatternType, RingCandidate, Transaction};
    pub use ringtrace_core::prelude::*;
}
