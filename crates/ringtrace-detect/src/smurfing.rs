//! Temporal smurfing detection.
//!
//! Flags aggregator accounts with high distinct-counterparty fan-in or
//! fan-out inside a rolling 72-hour window. High-volume accounts above the
//! legitimacy cutoff are excluded entirely.

use crate::graph::TransactionGraph;
use crate::types::{PatternType, RingCandidate};
use ringtrace_core::config::DetectionConfig;
use std::collections::BTreeSet;

/// Flow direction under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum FlowDirection {
    Incoming,
    Outgoing,
}

/// Smurfing scan kernel.
#[derive(Debug, Clone, Default)]
pub struct SmurfingDetector;

impl SmurfingDetector {
    /// Find fan-in and fan-out rings and mark their members on the graph.
    ///
    /// At most one fan-in and one fan-out ring per aggregator.
    ///
    /// # Arguments
    /// * `graph` - Transaction graph; member analysis state is updated
    /// * `config` - Detection thresholds
    pub fn compute(graph: &mut TransactionGraph, config: &DetectionConfig) -> Vec<RingCandidate> {
        let accounts: Vec<String> = graph.account_ids().map(str::to_owned).collect();

        let mut rings = Vec::new();
        let mut flagged: BTreeSet<(String, FlowDirection)> = BTreeSet::new();

        for account_id in &accounts {
            let degree = graph
                .node(account_id)
                .map_or(0, |node| node.total_degree());
            if degree > config.legitimacy_degree_cutoff {
                // High-volume legitimate hub (e.g. a merchant account).
                continue;
            }

            for direction in [FlowDirection::Incoming, FlowDirection::Outgoing] {
                if flagged.contains(&(account_id.clone(), direction)) {
                    continue;
                }
                let Some(window_set) = Self::peak_window(graph, account_id, direction, config)
                else {
                    continue;
                };

                let pattern = match direction {
                    FlowDirection::Incoming => PatternType::FanIn72h,
                    FlowDirection::Outgoing => PatternType::FanOut72h,
                };
                let risk = (60.0 + 2.0 * window_set.len() as f64).min(100.0);

                let mut members = window_set;
                members.insert(account_id.clone());
                for member in &members {
                    if let Some(node) = graph.node_mut(member) {
                        node.mark(pattern);
                    }
                }
                rings.push(RingCandidate::new(members, pattern, risk));
                flagged.insert((account_id.clone(), direction));
            }
        }
        rings
    }

    /// The largest distinct-counterparty set observed in any window
    /// position, when it meets the threshold. The first peak wins when
    /// several windows tie.
    fn peak_window(
        graph: &TransactionGraph,
        account_id: &str,
        direction: FlowDirection,
        config: &DetectionConfig,
    ) -> Option<BTreeSet<String>> {
        let counterparties = match direction {
            FlowDirection::Incoming => graph.predecessors(account_id),
            FlowDirection::Outgoing => graph.successors(account_id),
        };
        if counterparties.len() < config.smurfing_min_counterparties {
            return None;
        }

        let mut events: Vec<(i64, &str)> = Vec::new();
        for counterparty in counterparties {
            let edge = match direction {
                FlowDirection::Incoming => graph.edge(counterparty, account_id),
                FlowDirection::Outgoing => graph.edge(account_id, counterparty),
            };
            if let Some(edge) = edge {
                for tx in &edge.transactions {
                    events.push((tx.timestamp_ms, counterparty.as_str()));
                }
            }
        }
        events.sort_unstable();

        let mut best: Option<BTreeSet<&str>> = None;
        let mut start = 0;
        for end in 0..events.len() {
            while events[end].0 - events[start].0 > config.smurfing_window_ms {
                start += 1;
            }
            let distinct: BTreeSet<&str> =
                events[start..=end].iter().map(|(_, cp)| *cp).collect();
            if distinct.len() > best.as_ref().map_or(0, BTreeSet::len) {
                best = Some(distinct);
            }
        }

        let best = best?;
        (best.len() >= config.smurfing_min_counterparties)
            .then(|| best.into_iter().map(str::to_owned).collect())
    }
}
