//! Directed transaction multigraph with per-node analysis state.
//!
//! Built in one pass over the input in arrival order. Topology (nodes,
//! edges, adjacency) is immutable after the build; only the analysis state
//! on nodes mutates as detectors run. All collections are ordered so every
//! traversal is deterministic.

use crate::types::{PatternType, Transaction};
use std::collections::{BTreeMap, BTreeSet};

static EMPTY_ADJACENCY: BTreeSet<String> = BTreeSet::new();

// ============================================================================
// Nodes and Edges
// ============================================================================

/// One account observed in the input.
#[derive(Debug, Clone)]
pub struct AccountNode {
    /// Opaque account id.
    pub account_id: String,
    /// Incoming transaction count (transactions, not distinct senders).
    pub in_degree: usize,
    /// Outgoing transaction count.
    pub out_degree: usize,
    /// Total received amount.
    pub total_in: f64,
    /// Total sent amount.
    pub total_out: f64,
    /// Transactions where this account is sender or receiver, in insertion
    /// order.
    pub transactions: Vec<Transaction>,
    /// Set once any detector places the account in a surviving ring.
    pub is_suspicious: bool,
    /// Rule-based suspicion score, written by the scoring engine.
    pub suspicion_score: f64,
    /// Pattern tags in detection order; may repeat across detections and
    /// is deduplicated first-seen at output.
    pub detected_patterns: Vec<PatternType>,
    /// Ids of merged rings containing this account, in ring-id order.
    pub ring_ids: Vec<String>,
}

impl AccountNode {
    fn new(account_id: &str) -> Self {
        Self {
            account_id: account_id.to_owned(),
            in_degree: 0,
            out_degree: 0,
            total_in: 0.0,
            total_out: 0.0,
            transactions: Vec::new(),
            is_suspicious: false,
            suspicion_score: 0.0,
            detected_patterns: Vec::new(),
            ring_ids: Vec::new(),
        }
    }

    /// In-degree plus out-degree, counting transactions.
    #[must_use]
    pub fn total_degree(&self) -> usize {
        self.in_degree + self.out_degree
    }

    /// Pattern tags deduplicated in first-seen order.
    #[must_use]
    pub fn unique_patterns(&self) -> Vec<PatternType> {
        let mut unique = Vec::new();
        for pattern in &self.detected_patterns {
            if !unique.contains(pattern) {
                unique.push(*pattern);
            }
        }
        unique
    }

    /// Flag the account for a detected pattern.
    pub fn mark(&mut self, pattern: PatternType) {
        self.is_suspicious = true;
        self.detected_patterns.push(pattern);
    }
}

/// All transactions between one ordered (source, target) pair.
#[derive(Debug, Clone)]
pub struct TransactionEdge {
    /// Sender account id.
    pub source: String,
    /// Receiver account id.
    pub target: String,
    /// Transactions on this edge, in insertion order.
    pub transactions: Vec<Transaction>,
    /// Cached sum of amounts.
    pub total_amount: f64,
    /// Cached transaction count.
    pub count: usize,
}

impl TransactionEdge {
    fn new(source: &str, target: &str) -> Self {
        Self {
            source: source.to_owned(),
            target: target.to_owned(),
            transactions: Vec::new(),
            total_amount: 0.0,
            count: 0,
        }
    }

    /// Earliest timestamp on this edge. Input may arrive out of timestamp
    /// order, so this scans rather than trusting insertion order.
    #[must_use]
    pub fn earliest_ms(&self) -> Option<i64> {
        self.transactions.iter().map(|tx| tx.timestamp_ms).min()
    }

    /// Latest timestamp on this edge.
    #[must_use]
    pub fn latest_ms(&self) -> Option<i64> {
        self.transactions.iter().map(|tx| tx.timestamp_ms).max()
    }
}

// ============================================================================
// Graph
// ============================================================================

/// Directed multigraph of accounts.
#[derive(Debug, Clone, Default)]
pub struct TransactionGraph {
    nodes: BTreeMap<String, AccountNode>,
    edges: BTreeMap<(String, String), TransactionEdge>,
    successors: BTreeMap<String, BTreeSet<String>>,
    predecessors: BTreeMap<String, BTreeSet<String>>,
}

impl TransactionGraph {
    /// Build the graph in one pass over the input, in arrival order.
    #[must_use]
    pub fn build(transactions: &[Transaction]) -> Self {
        let mut graph = Self::default();
        for tx in transactions {
            graph.ingest(tx);
        }
        graph
    }

    fn ingest(&mut self, tx: &Transaction) {
        let sender = self
            .nodes
            .entry(tx.sender.clone())
            .or_insert_with(|| AccountNode::new(&tx.sender));
        sender.out_degree += 1;
        sender.total_out += tx.amount;
        sender.transactions.push(tx.clone());

        if tx.is_self_loop() {
            // Same node plays both roles; the transaction is already on its
            // list once.
            sender.in_degree += 1;
            sender.total_in += tx.amount;
        } else {
            let receiver = self
                .nodes
                .entry(tx.receiver.clone())
                .or_insert_with(|| AccountNode::new(&tx.receiver));
            receiver.in_degree += 1;
            receiver.total_in += tx.amount;
            receiver.transactions.push(tx.clone());
        }

        let edge = self
            .edges
            .entry((tx.sender.clone(), tx.receiver.clone()))
            .or_insert_with(|| TransactionEdge::new(&tx.sender, &tx.receiver));
        edge.transactions.push(tx.clone());
        edge.total_amount += tx.amount;
        edge.count += 1;

        self.successors
            .entry(tx.sender.clone())
            .or_default()
            .insert(tx.receiver.clone());
        self.predecessors
            .entry(tx.receiver.clone())
            .or_default()
            .insert(tx.sender.clone());
    }

    /// Number of distinct accounts.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of distinct (sender, receiver) pairs.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Look up an account.
    #[must_use]
    pub fn node(&self, account_id: &str) -> Option<&AccountNode> {
        self.nodes.get(account_id)
    }

    /// Look up an account for analysis-state mutation.
    pub fn node_mut(&mut self, account_id: &str) -> Option<&mut AccountNode> {
        self.nodes.get_mut(account_id)
    }

    /// Account ids in ascending order.
    pub fn account_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// All nodes, in account-id order.
    pub fn nodes(&self) -> impl Iterator<Item = &AccountNode> {
        self.nodes.values()
    }

    /// All nodes for analysis-state mutation, in account-id order.
    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut AccountNode> {
        self.nodes.values_mut()
    }

    /// The edge for one ordered (source, target) pair, if any transaction
    /// exists on it.
    #[must_use]
    pub fn edge(&self, source: &str, target: &str) -> Option<&TransactionEdge> {
        self.edges.get(&(source.to_owned(), target.to_owned()))
    }

    /// Direct successors of an account. Multiple transactions between the
    /// same pair contribute a single entry.
    #[must_use]
    pub fn successors(&self, account_id: &str) -> &BTreeSet<String> {
        self.successors.get(account_id).unwrap_or(&EMPTY_ADJACENCY)
    }

    /// Direct predecessors of an account.
    #[must_use]
    pub fn predecessors(&self, account_id: &str) -> &BTreeSet<String> {
        self.predecessors.get(account_id).unwrap_or(&EMPTY_ADJACENCY)
    }
}
