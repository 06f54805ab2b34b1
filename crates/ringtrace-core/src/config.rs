//! Detection thresholds and windows.

use serde::{Deserialize, Serialize};

/// One hour in milliseconds.
pub const HOUR_MS: i64 = 3_600_000;

/// Tunable constants of the detection pipeline.
///
/// The defaults carry the contract values. The report contract treats them
/// as build-time constants; tests construct variants through the `with_*`
/// builders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Maximum number of nodes on a cycle path.
    pub cycle_max_len: usize,

    /// Width of the smurfing sliding window, in milliseconds.
    pub smurfing_window_ms: i64,

    /// Minimum distinct counterparties inside one window for a
    /// fan-in/fan-out flag.
    pub smurfing_min_counterparties: usize,

    /// Total degree above which an account is treated as high-volume
    /// legitimate and excluded from smurfing detection.
    pub legitimacy_degree_cutoff: usize,

    /// Inclusive total-degree range for shell-chain intermediaries.
    pub shell_intermediate_degree: (usize, usize),

    /// Minimum number of nodes on a shell chain.
    pub shell_chain_min_len: usize,

    /// Maximum number of nodes on a shell chain.
    pub shell_chain_max_len: usize,

    /// Maximum gap between receiving and forwarding for the
    /// rapid-forwarding test, in milliseconds.
    pub rapid_forward_ms: i64,

    /// Member-overlap ratio at which two rings merge.
    pub merge_overlap_threshold: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            cycle_max_len: 5,
            smurfing_window_ms: 72 * HOUR_MS,
            smurfing_min_counterparties: 10,
            legitimacy_degree_cutoff: 100,
            shell_intermediate_degree: (2, 3),
            shell_chain_min_len: 3,
            shell_chain_max_len: 6,
            rapid_forward_ms: 72 * HOUR_MS,
            merge_overlap_threshold: 0.70,
        }
    }
}

impl DetectionConfig {
    /// Set the maximum cycle path length.
    #[must_use]
    pub fn with_cycle_max_len(mut self, len: usize) -> Self {
        self.cycle_max_len = len;
        self
    }

    /// Set the smurfing window width.
    #[must_use]
    pub fn with_smurfing_window_ms(mut self, window_ms: i64) -> Self {
        self.smurfing_window_ms = window_ms;
        self
    }

    /// Set the distinct-counterparty threshold.
    #[must_use]
    pub fn with_smurfing_min_counterparties(mut self, count: usize) -> Self {
        self.smurfing_min_counterparties = count;
        self
    }

    /// Set the rapid-forwarding window.
    #[must_use]
    pub fn with_rapid_forward_ms(mut self, window_ms: i64) -> Self {
        self.rapid_forward_ms = window_ms;
        self
    }

    /// Set the ring-merge overlap threshold.
    #[must_use]
    pub fn with_merge_overlap_threshold(mut self, threshold: f64) -> Self {
        self.merge_overlap_threshold = threshold;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_defaults() {
        let config = DetectionConfig::default();
        assert_eq!(config.cycle_max_len, 5);
        assert_eq!(config.smurfing_window_ms, 259_200_000);
        assert_eq!(config.smurfing_min_counterparties, 10);
        assert_eq!(config.legitimacy_degree_cutoff, 100);
        assert_eq!(config.shell_intermediate_degree, (2, 3));
        assert_eq!(config.shell_chain_min_len, 3);
        assert_eq!(config.shell_chain_max_len, 6);
        assert_eq!(config.rapid_forward_ms, 259_200_000);
        assert!((config.merge_overlap_threshold - 0.70).abs() < f64::EPSILON);
    }

    #[test]
    fn test_builders() {
        let config = DetectionConfig::default()
            .with_smurfing_min_counterparties(3)
            .with_rapid_forward_ms(24 * HOUR_MS);
        assert_eq!(config.smurfing_min_counterparties, 3);
        assert_eq!(config.rapid_forward_ms, 86_400_000);
    }
}
