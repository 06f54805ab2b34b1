//! Forensic report assembly.
//!
//! The serialized shape is a stable contract: exact field names, no
//! additional top-level fields. Scores carry one fractional digit.

use crate::graph::TransactionGraph;
use crate::types::{FraudRing, PatternType};
use serde::Serialize;

/// One flagged account entry.
#[derive(Debug, Clone, Serialize)]
pub struct SuspiciousAccount {
    /// Account id.
    pub account_id: String,
    /// Suspicion score in [0, 100], one decimal.
    pub suspicion_score: f64,
    /// Pattern tags, deduplicated in first-seen order.
    pub detected_patterns: Vec<PatternType>,
    /// First ring this account belongs to, or null.
    pub ring_id: Option<String>,
}

/// Aggregate counters for the run.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    /// Distinct accounts observed in the input.
    pub total_accounts_analyzed: usize,
    /// Accounts flagged by at least one detector.
    pub suspicious_accounts_flagged: usize,
    /// Merged rings in the report.
    pub fraud_rings_detected: usize,
    /// Wall-clock seconds from pipeline start to assembly, one decimal.
    pub processing_time_seconds: f64,
}

/// The forensic report.
#[derive(Debug, Clone, Serialize)]
pub struct ForensicReport {
    /// Flagged accounts, score descending, ties by account id ascending.
    pub suspicious_accounts: Vec<SuspiciousAccount>,
    /// Merged rings in ring-id order.
    pub fraud_rings: Vec<FraudRing>,
    /// Aggregate counters.
    pub summary: ReportSummary,
}

impl ForensicReport {
    /// Assemble the report from post-scoring graph state.
    #[must_use]
    pub fn assemble(
        graph: &TransactionGraph,
        fraud_rings: Vec<FraudRing>,
        processing_time_seconds: f64,
    ) -> Self {
        let mut suspicious_accounts: Vec<SuspiciousAccount> = graph
            .nodes()
            .filter(|node| node.is_suspicious)
            .map(|node| SuspiciousAccount {
                account_id: node.account_id.clone(),
                suspicion_score: node.suspicion_score,
                detected_patterns: node.unique_patterns(),
                ring_id: node.ring_ids.first().cloned(),
            })
            .collect();
        suspicious_accounts.sort_by(|a, b| {
            b.suspicion_score
                .total_cmp(&a.suspicion_score)
                .then_with(|| a.account_id.cmp(&b.account_id))
        });

        let summary = ReportSummary {
            total_accounts_analyzed: graph.node_count(),
            suspicious_accounts_flagged: suspicious_accounts.len(),
            fraud_rings_detected: fraud_rings.len(),
            processing_time_seconds,
        };

        Self {
            suspicious_accounts,
            fraud_rings,
            summary,
        }
    }

    /// Serialize with the stable field layout.
    ///
    /// # Errors
    /// Returns the underlying serializer error; the report types themselves
    /// always serialize.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
