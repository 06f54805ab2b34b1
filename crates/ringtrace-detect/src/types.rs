//! Data model: transactions, pattern tags, ring candidates, fraud rings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ============================================================================
// Transaction
// ============================================================================

/// A validated financial transaction.
///
/// Upstream parsing guarantees well-formed fields; the engine rejects
/// nothing. Duplicate ids are treated as separate observations, timestamps
/// may arrive out of order, and self-loops (sender == receiver) are
/// preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction id.
    pub id: String,
    /// Sender account id.
    pub sender: String,
    /// Receiver account id.
    pub receiver: String,
    /// Positive monetary amount.
    pub amount: f64,
    /// Timestamp, Unix epoch milliseconds.
    pub timestamp_ms: i64,
}

impl Transaction {
    /// Create a transaction.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        sender: impl Into<String>,
        receiver: impl Into<String>,
        amount: f64,
        timestamp_ms: i64,
    ) -> Self {
        Self {
            id: id.into(),
            sender: sender.into(),
            receiver: receiver.into(),
            amount,
            timestamp_ms,
        }
    }

    /// True when sender and receiver are the same account.
    #[must_use]
    pub fn is_self_loop(&self) -> bool {
        self.sender == self.receiver
    }
}

// ============================================================================
// Pattern Tags
// ============================================================================

/// Laundering pattern tags attached to accounts and rings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternType {
    /// Closed routing loop through 3 accounts.
    #[serde(rename = "cycle_length_3")]
    CycleLength3,
    /// Closed routing loop through 4 accounts.
    #[serde(rename = "cycle_length_4")]
    CycleLength4,
    /// Closed routing loop through 5 accounts.
    #[serde(rename = "cycle_length_5")]
    CycleLength5,
    /// Many distinct senders into one aggregator within the window.
    #[serde(rename = "fan_in_72h")]
    FanIn72h,
    /// One account dispersing to many distinct receivers within the window.
    #[serde(rename = "fan_out_72h")]
    FanOut72h,
    /// Layered chain through low-activity pass-through accounts.
    #[serde(rename = "shell_network")]
    ShellNetwork,
}

impl PatternType {
    /// The canonical tag string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            PatternType::CycleLength3 => "cycle_length_3",
            PatternType::CycleLength4 => "cycle_length_4",
            PatternType::CycleLength5 => "cycle_length_5",
            PatternType::FanIn72h => "fan_in_72h",
            PatternType::FanOut72h => "fan_out_72h",
            PatternType::ShellNetwork => "shell_network",
        }
    }

    /// Severity rank; a higher rank outranks a lower one when rings with
    /// identical members collide in the merger.
    #[must_use]
    pub const fn severity(&self) -> u8 {
        match self {
            PatternType::ShellNetwork => 5,
            PatternType::CycleLength5 => 4,
            PatternType::CycleLength4 => 3,
            PatternType::CycleLength3 => 2,
            PatternType::FanIn72h => 1,
            PatternType::FanOut72h => 0,
        }
    }

    /// Additive suspicion-score contribution for an account carrying this
    /// tag.
    #[must_use]
    pub const fn score_weight(&self) -> f64 {
        match self {
            PatternType::CycleLength3 => 20.0,
            PatternType::CycleLength4 => 30.0,
            PatternType::CycleLength5 => 40.0,
            PatternType::FanIn72h | PatternType::FanOut72h => 35.0,
            PatternType::ShellNetwork => 25.0,
        }
    }

    /// The cycle tag for a member count, when in the supported 3..=5 range.
    #[must_use]
    pub fn cycle(len: usize) -> Option<PatternType> {
        match len {
            3 => Some(PatternType::CycleLength3),
            4 => Some(PatternType::CycleLength4),
            5 => Some(PatternType::CycleLength5),
            _ => None,
        }
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Rings
// ============================================================================

/// A ring candidate produced by a detector, before merging.
///
/// Candidates are plain values; `RING_NNN` ids exist only after the merger
/// assigns them.
#[derive(Debug, Clone)]
pub struct RingCandidate {
    /// Member account ids.
    pub members: BTreeSet<String>,
    /// Pattern that produced the candidate.
    pub pattern: PatternType,
    /// Provisional risk score, replaced during merge and scoring.
    pub risk_score: f64,
}

impl RingCandidate {
    /// Create a candidate.
    #[must_use]
    pub fn new(members: BTreeSet<String>, pattern: PatternType, risk_score: f64) -> Self {
        Self {
            members,
            pattern,
            risk_score,
        }
    }

    /// Canonical identity: sorted members joined by `,`. Rotations and
    /// reversals of the same member set share one key.
    #[must_use]
    pub fn canonical_key(&self) -> String {
        self.members
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// True when this candidate's member set is a strict subset of the
    /// other's.
    #[must_use]
    pub fn is_strict_subset_of(&self, other: &RingCandidate) -> bool {
        self.members.len() < other.members.len() && self.members.is_subset(&other.members)
    }
}

/// A merged fraud ring as it appears in the report.
#[derive(Debug, Clone, Serialize)]
pub struct FraudRing {
    /// Stable label `RING_NNN`, zero-padded to 3 digits, dense from
    /// `RING_001`.
    pub ring_id: String,
    /// Member account ids, ascending.
    pub member_accounts: Vec<String>,
    /// Highest-severity pattern among the constituents.
    pub pattern_type: PatternType,
    /// Risk score in [0, 100], one decimal.
    pub risk_score: f64,
}
