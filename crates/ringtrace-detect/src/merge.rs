//! Ring canonicalization and merging.
//!
//! Collapses the candidates from all detectors into the final ring set:
//! exact dedup by canonical key, strict-subset elimination, then transitive
//! overlap union through a disjoint-set structure. Pairwise overlap is not
//! transitive on its own; only union-find gives the required closure.

use crate::graph::TransactionGraph;
use crate::types::{FraudRing, RingCandidate};
use ringtrace_core::config::DetectionConfig;
use std::collections::HashMap;

// ============================================================================
// Disjoint Set
// ============================================================================

/// Union-find with path compression.
#[derive(Debug)]
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, item: usize) -> usize {
        let mut root = item;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut current = item;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a != root_b {
            // Lower index wins the root so emission order stays stable.
            let (low, high) = if root_a < root_b {
                (root_a, root_b)
            } else {
                (root_b, root_a)
            };
            self.parent[high] = low;
        }
    }
}

// ============================================================================
// Ring Merger
// ============================================================================

/// Merges detector candidates into the final ring set.
#[derive(Debug, Clone, Default)]
pub struct RingMerger;

impl RingMerger {
    /// Merge candidates, assign dense `RING_NNN` ids, and rebuild per-node
    /// ring membership on the graph.
    ///
    /// # Arguments
    /// * `candidates` - Cycle, smurfing, and shell candidates, in that order
    /// * `graph` - Transaction graph; `ring_ids` on nodes are rebuilt
    /// * `config` - Detection thresholds
    pub fn merge(
        candidates: Vec<RingCandidate>,
        graph: &mut TransactionGraph,
        config: &DetectionConfig,
    ) -> Vec<FraudRing> {
        let deduped = Self::dedup_exact(candidates);
        let survivors = Self::drop_subsets(deduped);
        let groups = Self::union_by_overlap(&survivors, config.merge_overlap_threshold);
        let merged = Self::collect_groups(survivors, groups);
        let merged = Self::absorb_contained(merged);
        let rings = Self::assign_ids(merged);
        Self::rebuild_memberships(&rings, graph);
        rings
    }

    /// Stage 1: one representative per canonical key, preferring the
    /// highest-severity pattern. Ties keep the earliest candidate.
    fn dedup_exact(candidates: Vec<RingCandidate>) -> Vec<RingCandidate> {
        let mut index_by_key: HashMap<String, usize> = HashMap::new();
        let mut out: Vec<RingCandidate> = Vec::new();
        for candidate in candidates {
            let key = candidate.canonical_key();
            match index_by_key.get(&key) {
                Some(&i) => {
                    if candidate.pattern.severity() > out[i].pattern.severity() {
                        out[i] = candidate;
                    }
                }
                None => {
                    index_by_key.insert(key, out.len());
                    out.push(candidate);
                }
            }
        }
        out
    }

    /// Stage 2: discard rings whose member set is a strict subset of
    /// another surviving ring's.
    fn drop_subsets(candidates: Vec<RingCandidate>) -> Vec<RingCandidate> {
        let keep: Vec<bool> = candidates
            .iter()
            .map(|candidate| {
                !candidates
                    .iter()
                    .any(|other| candidate.is_strict_subset_of(other))
            })
            .collect();
        candidates
            .into_iter()
            .zip(keep)
            .filter_map(|(candidate, keep)| keep.then_some(candidate))
            .collect()
    }

    /// Stage 3: union rings whose member overlap reaches the threshold on
    /// either side.
    fn union_by_overlap(candidates: &[RingCandidate], threshold: f64) -> DisjointSet {
        let mut groups = DisjointSet::new(candidates.len());
        for i in 0..candidates.len() {
            for j in (i + 1)..candidates.len() {
                let overlap = candidates[i]
                    .members
                    .intersection(&candidates[j].members)
                    .count() as f64;
                if overlap / candidates[i].members.len() as f64 >= threshold
                    || overlap / candidates[j].members.len() as f64 >= threshold
                {
                    groups.union(i, j);
                }
            }
        }
        groups
    }

    /// Stage 4: one merged group per disjoint-set root, in first-appearance
    /// order. Members are the union, pattern the group's highest severity,
    /// risk the group maximum (the scoring engine overwrites it from
    /// member scores).
    fn collect_groups(candidates: Vec<RingCandidate>, mut groups: DisjointSet) -> Vec<RingCandidate> {
        let mut root_order: Vec<usize> = Vec::new();
        let mut merged: HashMap<usize, RingCandidate> = HashMap::new();

        for (i, candidate) in candidates.into_iter().enumerate() {
            let root = groups.find(i);
            match merged.get_mut(&root) {
                None => {
                    root_order.push(root);
                    merged.insert(root, candidate);
                }
                Some(group) => {
                    group.members.extend(candidate.members);
                    if candidate.pattern.severity() > group.pattern.severity() {
                        group.pattern = candidate.pattern;
                    }
                    if candidate.risk_score > group.risk_score {
                        group.risk_score = candidate.risk_score;
                    }
                }
            }
        }

        root_order
            .into_iter()
            .filter_map(|root| merged.remove(&root))
            .collect()
    }

    /// A union can swallow a smaller surviving group whole: its members end
    /// up fully contained in the merged set even though the pairwise
    /// overlap never reached the threshold against any single constituent.
    /// Fold such groups into their container so the final ring set stays
    /// free of subset relations.
    fn absorb_contained(mut groups: Vec<RingCandidate>) -> Vec<RingCandidate> {
        let mut index = 0;
        while index < groups.len() {
            let container = (0..groups.len())
                .find(|&other| other != index && groups[index].members.is_subset(&groups[other].members));
            match container {
                Some(other) => {
                    let inner = groups.remove(index);
                    let other = if other > index { other - 1 } else { other };
                    let target = &mut groups[other];
                    if inner.pattern.severity() > target.pattern.severity() {
                        target.pattern = inner.pattern;
                    }
                    if inner.risk_score > target.risk_score {
                        target.risk_score = inner.risk_score;
                    }
                }
                None => index += 1,
            }
        }
        groups
    }

    /// Assign dense `RING_NNN` ids in emission order. The counter restarts
    /// at 1 every run.
    fn assign_ids(groups: Vec<RingCandidate>) -> Vec<FraudRing> {
        groups
            .into_iter()
            .enumerate()
            .map(|(position, group)| FraudRing {
                ring_id: format!("RING_{:03}", position + 1),
                member_accounts: group.members.iter().cloned().collect(),
                pattern_type: group.pattern,
                risk_score: group.risk_score,
            })
            .collect()
    }

    /// Clear and repopulate node ring membership from the merged set.
    fn rebuild_memberships(rings: &[FraudRing], graph: &mut TransactionGraph) {
        for node in graph.nodes_mut() {
            node.ring_ids.clear();
        }
        for ring in rings {
            for account_id in &ring.member_accounts {
                if let Some(node) = graph.node_mut(account_id) {
                    node.ring_ids.push(ring.ring_id.clone());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PatternType, Transaction};
    use std::collections::BTreeSet;

    fn members(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn candidate(ids: &[&str], pattern: PatternType, risk: f64) -> RingCandidate {
        RingCandidate::new(members(ids), pattern, risk)
    }

    fn graph_for(ids: &[&str]) -> TransactionGraph {
        // One incoming transfer per account so every id exists as a node.
        let txs: Vec<Transaction> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| Transaction::new(format!("T{i}"), "SRC", *id, 10.0, i as i64))
            .collect();
        TransactionGraph::build(&txs)
    }

    #[test]
    fn test_exact_dedup_prefers_severity() {
        let mut graph = graph_for(&["A", "B", "C"]);
        let rings = RingMerger::merge(
            vec![
                candidate(&["A", "B", "C"], PatternType::CycleLength3, 80.0),
                candidate(&["A", "B", "C"], PatternType::ShellNetwork, 79.0),
            ],
            &mut graph,
            &DetectionConfig::default(),
        );

        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].pattern_type, PatternType::ShellNetwork);
    }

    #[test]
    fn test_subset_elimination_across_families() {
        let mut graph = graph_for(&["A", "B", "C", "D"]);
        let rings = RingMerger::merge(
            vec![
                candidate(&["A", "B", "C", "D"], PatternType::CycleLength4, 90.0),
                candidate(&["B", "C", "D"], PatternType::ShellNetwork, 79.0),
            ],
            &mut graph,
            &DetectionConfig::default(),
        );

        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].pattern_type, PatternType::CycleLength4);
        assert_eq!(rings[0].member_accounts, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_overlap_union_merges_both_sides() {
        // 4 of 5 members shared: 80% overlap on each side.
        let mut graph = graph_for(&["A", "B", "C", "D", "E", "F"]);
        let rings = RingMerger::merge(
            vec![
                candidate(&["A", "B", "C", "D", "E"], PatternType::CycleLength5, 100.0),
                candidate(&["A", "B", "C", "D", "F"], PatternType::CycleLength5, 100.0),
            ],
            &mut graph,
            &DetectionConfig::default(),
        );

        assert_eq!(rings.len(), 1);
        assert_eq!(
            rings[0].member_accounts,
            vec!["A", "B", "C", "D", "E", "F"]
        );
        assert_eq!(rings[0].pattern_type, PatternType::CycleLength5);
    }

    #[test]
    fn test_union_find_transitivity() {
        // A overlaps B, B overlaps C; A and C alone fall below threshold
        // but must land in one group.
        let mut graph = graph_for(&["A", "B", "C", "D", "E", "F", "G", "H"]);
        let rings = RingMerger::merge(
            vec![
                candidate(&["A", "B", "C", "D", "E"], PatternType::CycleLength5, 100.0),
                candidate(&["B", "C", "D", "E", "F"], PatternType::CycleLength5, 100.0),
                candidate(&["C", "D", "E", "F", "G"], PatternType::CycleLength5, 100.0),
            ],
            &mut graph,
            &DetectionConfig::default(),
        );

        assert_eq!(rings.len(), 1, "transitive closure must group all three");
        assert_eq!(
            rings[0].member_accounts,
            vec!["A", "B", "C", "D", "E", "F", "G"]
        );
    }

    #[test]
    fn test_low_overlap_stays_separate() {
        let mut graph = graph_for(&["A", "B", "C", "X", "Y", "Z"]);
        let rings = RingMerger::merge(
            vec![
                candidate(&["A", "B", "C"], PatternType::CycleLength3, 80.0),
                candidate(&["X", "Y", "Z"], PatternType::CycleLength3, 80.0),
            ],
            &mut graph,
            &DetectionConfig::default(),
        );

        assert_eq!(rings.len(), 2);
        assert_eq!(rings[0].ring_id, "RING_001");
        assert_eq!(rings[1].ring_id, "RING_002");
    }

    #[test]
    fn test_membership_rebuild() {
        let mut graph = graph_for(&["A", "B", "C"]);
        // Stale membership from a previous pass must be wiped.
        graph.node_mut("A").unwrap().ring_ids.push("RING_999".into());

        let rings = RingMerger::merge(
            vec![candidate(&["A", "B", "C"], PatternType::CycleLength3, 80.0)],
            &mut graph,
            &DetectionConfig::default(),
        );

        assert_eq!(rings.len(), 1);
        for account in ["A", "B", "C"] {
            assert_eq!(
                graph.node(account).unwrap().ring_ids,
                vec!["RING_001".to_string()],
                "{account} membership"
            );
        }
    }

    #[test]
    fn test_union_cannot_leave_a_contained_ring_behind() {
        // R1 and R2 union at exactly 70% overlap; {H, I, K} ends up fully
        // inside the merged set without ever clearing the threshold
        // against R1 or R2 alone.
        let r1 = ["A", "B", "C", "D", "E", "F", "G", "H", "I", "J"];
        let r2 = ["A", "B", "C", "D", "E", "F", "G", "K", "L", "M"];
        let all: Vec<&str> = r1.iter().chain(&["K", "L", "M"]).copied().collect();
        let mut graph = graph_for(&all);
        let rings = RingMerger::merge(
            vec![
                candidate(&r1, PatternType::CycleLength5, 100.0),
                candidate(&r2, PatternType::CycleLength5, 100.0),
                candidate(&["H", "I", "K"], PatternType::ShellNetwork, 79.0),
            ],
            &mut graph,
            &DetectionConfig::default(),
        );

        assert_eq!(rings.len(), 1, "contained group must fold into its container");
        assert_eq!(rings[0].member_accounts.len(), 13);
        assert_eq!(
            rings[0].pattern_type,
            PatternType::ShellNetwork,
            "absorbed group carries the higher severity"
        );
    }

    #[test]
    fn test_ring_ids_dense_from_one() {
        let mut graph = graph_for(&["A", "B", "C", "P", "Q", "R", "X", "Y", "Z"]);
        let rings = RingMerger::merge(
            vec![
                candidate(&["A", "B", "C"], PatternType::CycleLength3, 80.0),
                candidate(&["P", "Q", "R"], PatternType::FanIn72h, 70.0),
                candidate(&["X", "Y", "Z"], PatternType::ShellNetwork, 79.0),
            ],
            &mut graph,
            &DetectionConfig::default(),
        );

        let ids: Vec<&str> = rings.iter().map(|r| r.ring_id.as_str()).collect();
        assert_eq!(ids, vec!["RING_001", "RING_002", "RING_003"]);
    }
}
