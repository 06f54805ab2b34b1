//! Pipeline stages and progress reporting.
//!
//! The pipeline runs a fixed sequence of stages and notifies an optional
//! host callback at each stage boundary so a UI can repaint. These are the
//! only suspension points; the engine is otherwise single-threaded batch
//! compute.

use std::fmt;

/// Pipeline stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Transaction graph construction.
    GraphBuild,
    /// Circular-routing detection.
    CycleScan,
    /// Temporal smurfing detection.
    SmurfingScan,
    /// Shell-chain detection.
    ShellScan,
    /// Ring canonicalization and merging.
    RingMerge,
    /// Account and ring scoring.
    Scoring,
    /// Report assembly.
    Assemble,
}

impl Stage {
    /// All stages, in execution order.
    pub const ALL: &'static [Stage] = &[
        Stage::GraphBuild,
        Stage::CycleScan,
        Stage::SmurfingScan,
        Stage::ShellScan,
        Stage::RingMerge,
        Stage::Scoring,
        Stage::Assemble,
    ];

    /// Stage label reported to the host callback.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Stage::GraphBuild => "graph_build",
            Stage::CycleScan => "cycle_scan",
            Stage::SmurfingScan => "smurfing_scan",
            Stage::ShellScan => "shell_scan",
            Stage::RingMerge => "ring_merge",
            Stage::Scoring => "scoring",
            Stage::Assemble => "assemble",
        }
    }

    /// Cumulative percent complete once this stage has finished.
    #[must_use]
    pub const fn percent_complete(&self) -> u8 {
        match self {
            Stage::GraphBuild => 10,
            Stage::CycleScan => 30,
            Stage::SmurfingScan => 50,
            Stage::ShellScan => 70,
            Stage::RingMerge => 85,
            Stage::Scoring => 95,
            Stage::Assemble => 100,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Host progress callback: stage label and percent in [0, 100].
pub type ProgressFn = Box<dyn FnMut(&str, u8)>;

/// Forwards stage completions to an optional host callback.
#[derive(Default)]
pub struct ProgressSink {
    callback: Option<ProgressFn>,
}

impl ProgressSink {
    /// A sink that drops all notifications.
    #[must_use]
    pub fn disabled() -> Self {
        Self { callback: None }
    }

    /// A sink forwarding to the given callback.
    #[must_use]
    pub fn new(callback: impl FnMut(&str, u8) + 'static) -> Self {
        Self {
            callback: Some(Box::new(callback)),
        }
    }

    /// Notify the host that a stage has completed.
    pub fn completed(&mut self, stage: Stage) {
        if let Some(callback) = &mut self.callback {
            callback(stage.label(), stage.percent_complete());
        }
    }
}

impl fmt::Debug for ProgressSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressSink")
            .field("enabled", &self.callback.is_some())
            .finish()
    }
}
