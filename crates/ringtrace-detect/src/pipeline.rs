//! The fixed-order detection pipeline.
//!
//! build -> cycles -> smurfing -> shell -> merge -> score -> assemble.
//! Detector order is part of the contract: pattern attribution on nodes
//! accumulates across detectors, so reordering would change the first-seen
//! dedup in the report. Single-threaded; the progress callback boundaries
//! are the only suspension points.

use crate::cycles::CycleDetector;
use crate::graph::TransactionGraph;
use crate::merge::RingMerger;
use crate::report::ForensicReport;
use crate::scoring::ScoringEngine;
use crate::shell::ShellChainDetector;
use crate::smurfing::SmurfingDetector;
use crate::types::{FraudRing, Transaction};
use ringtrace_core::config::DetectionConfig;
use ringtrace_core::error::{EngineError, Result};
use ringtrace_core::stage::{ProgressSink, Stage};
use std::time::Instant;

/// Orchestrates one detection run over a validated transaction batch.
#[derive(Debug, Default)]
pub struct DetectionPipeline {
    config: DetectionConfig,
    progress: ProgressSink,
}

impl DetectionPipeline {
    /// Create a pipeline with the contract configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DetectionConfig::default())
    }

    /// Create a pipeline with a custom configuration.
    #[must_use]
    pub fn with_config(config: DetectionConfig) -> Self {
        Self {
            config,
            progress: ProgressSink::disabled(),
        }
    }

    /// Install a host progress callback (stage label, percent in [0, 100]).
    #[must_use]
    pub fn on_progress(mut self, callback: impl FnMut(&str, u8) + 'static) -> Self {
        self.progress = ProgressSink::new(callback);
        self
    }

    /// Run the pipeline over one batch.
    ///
    /// An empty batch yields the empty report; the stages all no-op over a
    /// graph with no nodes.
    ///
    /// # Errors
    /// [`EngineError::InvariantViolation`] when a post-merge consistency
    /// check fails, which indicates a bug. No partial results are emitted.
    pub fn run(&mut self, transactions: &[Transaction]) -> Result<ForensicReport> {
        let started = Instant::now();
        if transactions.is_empty() {
            tracing::warn!("empty transaction batch, report will be empty");
        }

        let mut graph = TransactionGraph::build(transactions);
        tracing::info!(
            accounts = graph.node_count(),
            edges = graph.edge_count(),
            transactions = transactions.len(),
            "transaction graph built"
        );
        self.progress.completed(Stage::GraphBuild);

        let mut candidates = CycleDetector::compute(&mut graph, &self.config);
        tracing::debug!(candidates = candidates.len(), "cycle scan complete");
        self.progress.completed(Stage::CycleScan);

        let smurfing = SmurfingDetector::compute(&mut graph, &self.config);
        tracing::debug!(candidates = smurfing.len(), "smurfing scan complete");
        candidates.extend(smurfing);
        self.progress.completed(Stage::SmurfingScan);

        let shell = ShellChainDetector::compute(&mut graph, &self.config);
        tracing::debug!(candidates = shell.len(), "shell scan complete");
        candidates.extend(shell);
        self.progress.completed(Stage::ShellScan);

        let mut rings = RingMerger::merge(candidates, &mut graph, &self.config);
        tracing::info!(rings = rings.len(), "rings merged");
        self.progress.completed(Stage::RingMerge);

        ScoringEngine::score_accounts(&mut graph);
        ScoringEngine::score_rings(&mut rings, &graph);
        self.progress.completed(Stage::Scoring);

        validate(&graph, &rings)?;

        let elapsed = (started.elapsed().as_secs_f64() * 10.0).round() / 10.0;
        let report = ForensicReport::assemble(&graph, rings, elapsed);
        self.progress.completed(Stage::Assemble);
        Ok(report)
    }
}

/// Post-merge consistency checks. A failure here is a bug, never a
/// property of the input.
fn validate(graph: &TransactionGraph, rings: &[FraudRing]) -> Result<()> {
    for (index, ring) in rings.iter().enumerate() {
        let expected_id = format!("RING_{:03}", index + 1);
        if ring.ring_id != expected_id {
            return Err(EngineError::invariant(format!(
                "ring id {} at position {index}, expected {expected_id}",
                ring.ring_id
            )));
        }
        if ring.member_accounts.is_empty() {
            return Err(EngineError::invariant(format!(
                "ring {} has no members",
                ring.ring_id
            )));
        }
        if ring
            .member_accounts
            .windows(2)
            .any(|pair| pair[0] >= pair[1])
        {
            return Err(EngineError::invariant(format!(
                "ring {} members are not sorted and unique",
                ring.ring_id
            )));
        }
        for account_id in &ring.member_accounts {
            let Some(node) = graph.node(account_id) else {
                return Err(EngineError::invariant(format!(
                    "ring {} references unknown account {account_id}",
                    ring.ring_id
                )));
            };
            if !node.is_suspicious {
                return Err(EngineError::invariant(format!(
                    "ring {} member {account_id} is not marked suspicious",
                    ring.ring_id
                )));
            }
            if !node.ring_ids.contains(&ring.ring_id) {
                return Err(EngineError::invariant(format!(
                    "account {account_id} is missing membership of ring {}",
                    ring.ring_id
                )));
            }
        }
    }

    for (i, ring) in rings.iter().enumerate() {
        for other in &rings[i + 1..] {
            let members: std::collections::BTreeSet<&str> =
                ring.member_accounts.iter().map(String::as_str).collect();
            let other_members: std::collections::BTreeSet<&str> =
                other.member_accounts.iter().map(String::as_str).collect();
            if members == other_members {
                return Err(EngineError::invariant(format!(
                    "rings {} and {} share a member set",
                    ring.ring_id, other.ring_id
                )));
            }
            if members.is_subset(&other_members) || other_members.is_subset(&members) {
                return Err(EngineError::invariant(format!(
                    "rings {} and {} are in a subset relation",
                    ring.ring_id, other.ring_id
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringtrace_core::config::HOUR_MS;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn tx(id: &str, sender: &str, receiver: &str, timestamp_ms: i64) -> Transaction {
        Transaction::new(id, sender, receiver, 100.0, timestamp_ms)
    }

    #[test]
    fn test_empty_input_yields_empty_report() {
        let report = DetectionPipeline::new().run(&[]).unwrap();
        assert!(report.suspicious_accounts.is_empty());
        assert!(report.fraud_rings.is_empty());
        assert_eq!(report.summary.total_accounts_analyzed, 0);
        assert_eq!(report.summary.fraud_rings_detected, 0);
    }

    #[test]
    fn test_progress_reaches_every_stage() {
        let seen: Rc<RefCell<Vec<(String, u8)>>> = Rc::default();
        let inner = Rc::clone(&seen);
        let mut pipeline = DetectionPipeline::new().on_progress(move |label, percent| {
            inner.borrow_mut().push((label.to_string(), percent));
        });

        pipeline
            .run(&[
                tx("T1", "A", "B", HOUR_MS),
                tx("T2", "B", "C", 2 * HOUR_MS),
                tx("T3", "C", "A", 3 * HOUR_MS),
            ])
            .unwrap();

        let seen = seen.borrow();
        assert_eq!(seen.len(), Stage::ALL.len());
        assert_eq!(seen.first().unwrap().0, "graph_build");
        assert_eq!(seen.last().unwrap(), &("assemble".to_string(), 100));
        assert!(seen.windows(2).all(|w| w[0].1 < w[1].1));
    }

    #[test]
    fn test_benign_traffic_yields_no_rings() {
        // A handful of unrelated transfers: no cycles, no bursts, no
        // chains of qualifying shape.
        let report = DetectionPipeline::new()
            .run(&[
                tx("T1", "A", "B", HOUR_MS),
                tx("T2", "C", "D", 200 * HOUR_MS),
                tx("T3", "E", "F", 400 * HOUR_MS),
            ])
            .unwrap();
        assert!(report.fraud_rings.is_empty());
        assert!(report.suspicious_accounts.is_empty());
        assert_eq!(report.summary.total_accounts_analyzed, 6);
    }

    #[test]
    fn test_pipeline_is_reusable_and_counter_resets() {
        let batch = [
            tx("T1", "A", "B", HOUR_MS),
            tx("T2", "B", "C", 2 * HOUR_MS),
            tx("T3", "C", "A", 3 * HOUR_MS),
        ];
        let mut pipeline = DetectionPipeline::new();
        let first = pipeline.run(&batch).unwrap();
        let second = pipeline.run(&batch).unwrap();

        assert_eq!(first.fraud_rings[0].ring_id, "RING_001");
        assert_eq!(
            second.fraud_rings[0].ring_id, "RING_001",
            "ring counter must reset per run"
        );
    }
}
