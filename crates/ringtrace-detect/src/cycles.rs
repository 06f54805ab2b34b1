//! Circular routing detection.
//!
//! Enumerates simple directed cycles of 3-5 accounts with a bounded-depth
//! iterative DFS from every node, collapses rotations and reversals through
//! canonical member keys, and drops cycles wholly contained in larger ones.

use crate::graph::TransactionGraph;
use crate::types::{PatternType, RingCandidate};
use ringtrace_core::config::DetectionConfig;
use std::collections::{BTreeSet, HashSet};

/// Cycle scan kernel.
#[derive(Debug, Clone, Default)]
pub struct CycleDetector;

struct Frame {
    successors: Vec<String>,
    next: usize,
}

impl CycleDetector {
    /// Find cycle rings and mark their members on the graph.
    ///
    /// # Arguments
    /// * `graph` - Transaction graph; member analysis state is updated
    /// * `config` - Detection thresholds
    pub fn compute(graph: &mut TransactionGraph, config: &DetectionConfig) -> Vec<RingCandidate> {
        let starts: Vec<String> = graph.account_ids().map(str::to_owned).collect();

        let mut raw_cycles: Vec<Vec<String>> = Vec::new();
        for start in &starts {
            Self::scan_from(graph, start, config.cycle_max_len, &mut raw_cycles);
        }

        let deduped = Self::canonicalize(raw_cycles);
        let survivors = Self::drop_subsets(deduped);

        let mut rings = Vec::with_capacity(survivors.len());
        for members in survivors {
            let Some(pattern) = PatternType::cycle(members.len()) else {
                continue;
            };
            for account_id in &members {
                if let Some(node) = graph.node_mut(account_id) {
                    node.mark(pattern);
                }
            }
            // Provisional only: the merger and the scoring engine both
            // overwrite ring risk downstream.
            let risk = (50.0 + 10.0 * members.len() as f64).min(100.0);
            rings.push(RingCandidate::new(members, pattern, risk));
        }
        rings
    }

    /// Iterative DFS from one start node. Paths never exceed `max_len`
    /// nodes and never revisit a node already on the path; a cycle is
    /// recorded when the tail links back to the start with at least three
    /// nodes on the path.
    fn scan_from(
        graph: &TransactionGraph,
        start: &str,
        max_len: usize,
        out: &mut Vec<Vec<String>>,
    ) {
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

            if candidate == start {
                // Self-loops (len 1) and back-and-forth pairs (len 2) are
                // below the minimum cycle length.
                if path.len() >= 3 {
                    out.push(path.clone());
                }
                continue;
            }
            if path.len() < max_len && !path.contains(&candidate) {
                path.push(candidate.clone());
                stack.push(Frame {
                    successors: graph.successors(&candidate).iter().cloned().collect(),
                    next: 0,
                });
            }
        }
    }

    /// Collapse rotations and reversals: the canonical key is the sorted
    /// member set, and the first occurrence wins.
    fn canonicalize(raw: Vec<Vec<String>>) -> Vec<BTreeSet<String>> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut out = Vec::new();
        for cycle in raw {
            let members: BTreeSet<String> = cycle.into_iter().collect();
            let key = members
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(",");
            if seen.insert(key) {
                out.push(members);
            }
        }
        out
    }

    /// Discard candidates whose member set is a strict subset of another
    /// candidate's. Equal-size sets never subsume each other.
    fn drop_subsets(candidates: Vec<BTreeSet<String>>) -> Vec<BTreeSet<String>> {
        let keep: Vec<bool> = candidates
            .iter()
            .map(|members| {
                !candidates
                    .iter()
                    .any(|other| members.len() < other.len() && members.is_subset(other))
            })
            .collect();
        candidates
            .into_iter()
            .zip(keep)
            .filter_map(|(members, keep)| keep.then_some(members))
            .collect()
    }
}
