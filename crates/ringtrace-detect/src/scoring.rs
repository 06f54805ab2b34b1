//! Account suspicion and ring risk scoring.
//!
//! Rule-based and deterministic: suspicious accounts start at a base score,
//! gain a fixed weight per unique pattern, and a bonus for membership in
//! multiple rings. Ring risk is the mean of member scores.

use crate::graph::TransactionGraph;
use crate::types::FraudRing;

/// Base score for any account placed in a surviving ring.
const BASE_SCORE: f64 = 20.0;

/// Bonus for membership in more than one merged ring.
const MULTI_RING_BONUS: f64 = 10.0;

/// Scoring engine.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine;

impl ScoringEngine {
    /// Round half away from zero to one decimal place.
    fn round_one_decimal(value: f64) -> f64 {
        (value * 10.0).round() / 10.0
    }

    /// Write suspicion scores onto every node.
    pub fn score_accounts(graph: &mut TransactionGraph) {
        for node in graph.nodes_mut() {
            if !node.is_suspicious {
                node.suspicion_score = 0.0;
                continue;
            }
            let mut score = BASE_SCORE;
            for pattern in node.unique_patterns() {
                score += pattern.score_weight();
            }
            if node.ring_ids.len() > 1 {
                score += MULTI_RING_BONUS;
            }
            node.suspicion_score = Self::round_one_decimal(score.clamp(0.0, 100.0));
        }
    }

    /// Overwrite each ring's risk with the mean member suspicion score.
    pub fn score_rings(rings: &mut [FraudRing], graph: &TransactionGraph) {
        for ring in rings {
            if ring.member_accounts.is_empty() {
                ring.risk_score = 0.0;
                continue;
            }
            let total: f64 = ring
                .member_accounts
                .iter()
                .map(|account_id| graph.node(account_id).map_or(0.0, |n| n.suspicion_score))
                .sum();
            ring.risk_score =
                Self::round_one_decimal(total / ring.member_accounts.len() as f64);
        }
    }
}
