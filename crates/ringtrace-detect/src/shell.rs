//! Shell chain detection.
//!
//! Finds layered forwarding chains: 3-6 accounts long, every interior
//! account a low-activity pass-through shell, and at least one hop moving
//! the money onward within the rapid-forwarding window. A chain that
//! closes back on its head is a routing loop and is left to cycle
//! detection.

use crate::graph::{AccountNode, TransactionEdge, TransactionGraph};
use crate::types::{PatternType, RingCandidate};
use ringtrace_core::config::DetectionConfig;
use std::collections::{BTreeSet, HashSet};

/// Shell chain scan kernel.
#[derive(Debug, Clone, Default)]
pub struct ShellChainDetector;

struct Frame {
    successors: Vec<String>,
    next: usize,
}

impl ShellChainDetector {
    /// Find shell-network rings and mark their members on the graph.
    ///
    /// # Arguments
    /// * `graph` - Transaction graph; member analysis state is updated
    /// * `config` - Detection thresholds
    pub fn compute(graph: &mut TransactionGraph, config: &DetectionConfig) -> Vec<RingCandidate> {
        let starts: Vec<String> = graph.account_ids().map(str::to_owned).collect();

        let mut chains: Vec<Vec<String>> = Vec::new();
        for start in &starts {
            Self::scan_from(graph, start, config, &mut chains);
        }

        let mut seen: HashSet<String> = HashSet::new();
        let mut rings = Vec::new();
        for chain in chains {
            // A chain whose tail links back to its head is a routing loop;
            // that finding belongs to the cycle family.
            if graph
                .successors(&chain[chain.len() - 1])
                .contains(&chain[0])
            {
                continue;
            }
            if !Self::intermediates_shell_like(graph, &chain, config) {
                continue;
            }
            if !Self::has_rapid_forwarding(graph, &chain, config) {
                continue;
            }
            let members: BTreeSet<String> = chain.iter().cloned().collect();
            let key = members
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(",");
            if !seen.insert(key) {
                continue;
            }

            for account_id in &members {
                if let Some(node) = graph.node_mut(account_id) {
                    node.mark(PatternType::ShellNetwork);
                }
            }
            let risk = (55.0 + 8.0 * chain.len() as f64).min(100.0);
            rings.push(RingCandidate::new(members, PatternType::ShellNetwork, risk));
        }
        rings
    }

    /// Iterative DFS over simple paths. The first hop from the start is
    /// unconditional (chain endpoints may be non-shells); every later hop
    /// must enter an account whose total degree stays within the shell
    /// bound. Every path of qualifying length is recorded.
    fn scan_from(
        graph: &TransactionGraph,
        start: &str,
        config: &DetectionConfig,
        out: &mut Vec<Vec<String>>,
    ) {
        let shell_max = config.shell_intermediate_degree.1;
        let mut path: Vec<String> = vec![start.to_owned()];
        let mut stack = vec![Frame {
            successors: graph.successors(start).iter().cloned().collect(),
            next: 0,
        }];

        while let Some(frame) = stack.last_mut() {
            if frame.next >= frame.successors.len() {
                stack.pop();
                path.pop();
                continue;
            }
            let candidate = frame.successors[frame.next].clone();
            frame.next += 1;

            if path.len() >= config.shell_chain_max_len || path.contains(&candidate) {
                continue;
            }
            if path.len() > 1 {
                let degree = graph.node(&candidate).map_or(0, AccountNode::total_degree);
                if degree > shell_max {
                    continue;
                }
            }

            path.push(candidate.clone());
            if path.len() >= config.shell_chain_min_len {
                out.push(path.clone());
            }
            stack.push(Frame {
                successors: graph.successors(&candidate).iter().cloned().collect(),
                next: 0,
            });
        }
    }

    /// Every interior account must look like a pass-through shell.
    fn intermediates_shell_like(
        graph: &TransactionGraph,
        chain: &[String],
        config: &DetectionConfig,
    ) -> bool {
        let (lo, hi) = config.shell_intermediate_degree;
        chain[1..chain.len() - 1].iter().all(|account_id| {
            let degree = graph.node(account_id).map_or(0, AccountNode::total_degree);
            degree >= lo && degree <= hi
        })
    }

    /// At least one hop must forward within the rapid window. A negative
    /// gap (the outgoing transfer booked before the inbound one) still
    /// qualifies as below the threshold.
    fn has_rapid_forwarding(
        graph: &TransactionGraph,
        chain: &[String],
        config: &DetectionConfig,
    ) -> bool {
        chain.windows(3).any(|hop| {
            let inbound = graph
                .edge(&hop[0], &hop[1])
                .and_then(TransactionEdge::latest_ms);
            let outbound = graph
                .edge(&hop[1], &hop[2])
                .and_then(TransactionEdge::earliest_ms);
            match (inbound, outbound) {
                (Some(received), Some(forwarded)) => {
                    forwarded - received < config.rapid_forward_ms
                }
                _ => false,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Transaction;
    use ringtrace_core::config::HOUR_MS;

    fn tx(id: &str, sender: &str, receiver: &str, timestamp_ms: i64) -> Transaction {
        Transaction::new(id, sender, receiver, 900.0, timestamp_ms)
    }

    /// A->B->C->D->E, consecutive hops one hour apart.
    fn five_hop_chain() -> Vec<Transaction> {
        vec![
            tx("T1", "A", "B", HOUR_MS),
            tx("T2", "B", "C", 2 * HOUR_MS),
            tx("T3", "C", "D", 3 * HOUR_MS),
            tx("T4", "D", "E", 4 * HOUR_MS),
        ]
    }

    #[test]
    fn test_chain_detected_with_subchains() {
        let mut graph = TransactionGraph::build(&five_hop_chain());
        let rings = ShellChainDetector::compute(&mut graph, &DetectionConfig::default());

        // Every 3..=5-node window of the chain qualifies on its own; the
        // merger later collapses the strict subsets.
        let keys: Vec<String> = rings.iter().map(RingCandidate::canonical_key).collect();
        assert!(keys.contains(&"A,B,C,D,E".to_string()), "keys: {keys:?}");
        assert!(keys.contains(&"A,B,C".to_string()));
        for ring in &rings {
            assert_eq!(ring.pattern, PatternType::ShellNetwork);
        }
        assert!(graph.node("C").unwrap().is_suspicious);
    }

    #[test]
    fn test_full_chain_risk_score() {
        let mut graph = TransactionGraph::build(&five_hop_chain());
        let rings = ShellChainDetector::compute(&mut graph, &DetectionConfig::default());
        let full = rings
            .iter()
            .find(|r| r.members.len() == 5)
            .expect("full chain present");
        assert!((full.risk_score - 95.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_closed_loop_left_to_cycle_detection() {
        // A->B->C->A: every path of this triangle closes on its head, so
        // no shell ring may shadow the cycle finding.
        let mut graph = TransactionGraph::build(&[
            tx("T1", "A", "B", HOUR_MS),
            tx("T2", "B", "C", 2 * HOUR_MS),
            tx("T3", "C", "A", 3 * HOUR_MS),
        ]);
        let rings = ShellChainDetector::compute(&mut graph, &DetectionConfig::default());
        assert!(rings.is_empty());
        assert!(!graph.node("A").unwrap().is_suspicious);
    }

    #[test]
    fn test_slow_forwarding_rejected() {
        // Every hop waits 100 hours; no triple forwards inside the window.
        let mut graph = TransactionGraph::build(&[
            tx("T1", "A", "B", 0),
            tx("T2", "B", "C", 100 * HOUR_MS),
            tx("T3", "C", "D", 200 * HOUR_MS),
        ]);
        let rings = ShellChainDetector::compute(&mut graph, &DetectionConfig::default());
        assert!(rings.is_empty());
    }

    #[test]
    fn test_negative_gap_qualifies() {
        // C forwards before the inbound booking lands; still rapid.
        let mut graph = TransactionGraph::build(&[
            tx("T1", "A", "B", 5 * HOUR_MS),
            tx("T2", "B", "C", 2 * HOUR_MS),
            tx("T3", "C", "D", 300 * HOUR_MS),
        ]);
        let rings = ShellChainDetector::compute(&mut graph, &DetectionConfig::default());
        assert!(
            rings.iter().any(|r| r.members.len() == 4),
            "A->B gap is negative and must qualify"
        );
    }

    #[test]
    fn test_busy_intermediate_rejected() {
        // B has extra traffic pushing its total degree to 4.
        let mut txs = five_hop_chain();
        txs.push(tx("X1", "B", "Q1", 10 * HOUR_MS));
        txs.push(tx("X2", "Q2", "B", 11 * HOUR_MS));
        let mut graph = TransactionGraph::build(&txs);
        let rings = ShellChainDetector::compute(&mut graph, &DetectionConfig::default());

        // B may still open a chain (endpoints need not be shells), but no
        // surviving chain crosses it as an interior hop.
        assert!(
            rings.iter().all(|r| !r.members.contains("A")),
            "every chain from A has B as an interior hop"
        );
        assert!(rings.iter().any(|r| r.canonical_key() == "B,C,D,E"));
        // The tail C->D->E still stands on its own.
        assert!(rings.iter().any(|r| r.canonical_key() == "C,D,E"));
    }

    #[test]
    fn test_chain_capped_at_six_nodes() {
        let accounts: Vec<String> = ('A'..='H').map(|c| c.to_string()).collect();
        let txs: Vec<Transaction> = accounts
            .windows(2)
            .enumerate()
            .map(|(i, hop)| tx(&format!("T{i}"), &hop[0], &hop[1], (i as i64 + 1) * HOUR_MS))
            .collect();
        let mut graph = TransactionGraph::build(&txs);
        let rings = ShellChainDetector::compute(&mut graph, &DetectionConfig::default());
        assert!(rings.iter().all(|r| r.members.len() <= 6));
        assert!(rings.iter().any(|r| r.members.len() == 6));
    }
}
