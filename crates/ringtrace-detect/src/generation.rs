//! Synthetic mule-network generation.
//!
//! Builds deterministic transaction batches with planted laundering
//! topologies (routing loops, fan-in bursts, shell chains) over background
//! traffic. Used by benches and the end-to-end determinism tests; not part
//! of the report contract.

use crate::types::Transaction;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ringtrace_core::config::HOUR_MS;

/// Epoch base for generated timestamps.
const BASE_MS: i64 = 1_700_000_000_000;

/// Shape of a generated network.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Planted routing loops of 3-5 accounts.
    pub cycle_rings: usize,
    /// Planted fan-in bursts (one aggregator, 10+ senders inside 72 h).
    pub fan_in_bursts: usize,
    /// Planted 5-account shell chains.
    pub shell_chains: usize,
    /// Background transfers between ordinary accounts.
    pub background_transfers: usize,
    /// Ordinary account pool size.
    pub background_accounts: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            cycle_rings: 2,
            fan_in_bursts: 1,
            shell_chains: 1,
            background_transfers: 60,
            background_accounts: 40,
        }
    }
}

/// Deterministic generator: one seed, one network.
#[derive(Debug)]
pub struct NetworkGenerator {
    rng: StdRng,
    next_tx: usize,
}

impl NetworkGenerator {
    /// Create a generator for a seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            next_tx: 0,
        }
    }

    /// Generate one batch with the planted topologies.
    pub fn generate(&mut self, config: &GenerationConfig) -> Vec<Transaction> {
        let mut batch = Vec::new();
        for ring in 0..config.cycle_rings {
            self.plant_cycle(ring, &mut batch);
        }
        for burst in 0..config.fan_in_bursts {
            self.plant_fan_in(burst, &mut batch);
        }
        for chain in 0..config.shell_chains {
            self.plant_shell_chain(chain, &mut batch);
        }
        self.background(config, &mut batch);
        batch
    }

    fn transfer(&mut self, sender: String, receiver: String, timestamp_ms: i64) -> Transaction {
        let id = format!("TX{:06}", self.next_tx);
        self.next_tx += 1;
        let amount: f64 = self.rng.gen_range(100.0..9_500.0);
        Transaction::new(id, sender, receiver, (amount * 100.0).round() / 100.0, timestamp_ms)
    }

    /// A closed loop of 3-5 dedicated accounts, hops one hour apart.
    fn plant_cycle(&mut self, ring: usize, batch: &mut Vec<Transaction>) {
        let len = self.rng.gen_range(3..=5);
        let accounts: Vec<String> = (0..len).map(|i| format!("CYC{ring:02}_{i}")).collect();
        let start = BASE_MS + ring as i64 * 24 * HOUR_MS;
        for i in 0..len {
            let tx = self.transfer(
                accounts[i].clone(),
                accounts[(i + 1) % len].clone(),
                start + i as i64 * HOUR_MS,
            );
            batch.push(tx);
        }
    }

    /// 10-14 dedicated senders converging on one aggregator inside 48 h.
    fn plant_fan_in(&mut self, burst: usize, batch: &mut Vec<Transaction>) {
        let senders = self.rng.gen_range(10..=14);
        let aggregator = format!("AGG{burst:02}");
        let start = BASE_MS + burst as i64 * 96 * HOUR_MS;
        for i in 0..senders {
            let offset = self.rng.gen_range(0_i64..48) * HOUR_MS;
            let tx = self.transfer(
                format!("SND{burst:02}_{i:02}"),
                aggregator.clone(),
                start + offset,
            );
            batch.push(tx);
        }
    }

    /// An open 5-account chain forwarding within one hour per hop.
    fn plant_shell_chain(&mut self, chain: usize, batch: &mut Vec<Transaction>) {
        let accounts: Vec<String> = (0..5).map(|i| format!("SHL{chain:02}_{i}")).collect();
        let start = BASE_MS + chain as i64 * 48 * HOUR_MS;
        for (i, pair) in accounts.windows(2).enumerate() {
            let tx = self.transfer(
                pair[0].clone(),
                pair[1].clone(),
                start + i as i64 * HOUR_MS,
            );
            batch.push(tx);
        }
    }

    /// Ordinary transfers across a dedicated pool, spread over 30 days.
    fn background(&mut self, config: &GenerationConfig, batch: &mut Vec<Transaction>) {
        for _ in 0..config.background_transfers {
            let sender = self.rng.gen_range(0..config.background_accounts);
            let mut receiver = self.rng.gen_range(0..config.background_accounts);
            if receiver == sender {
                receiver = (receiver + 1) % config.background_accounts;
            }
            let offset = self.rng.gen_range(0_i64..30 * 24) * HOUR_MS;
            let tx = self.transfer(
                format!("ACC{sender:03}"),
                format!("ACC{receiver:03}"),
                BASE_MS + offset,
            );
            batch.push(tx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_batch() {
        let config = GenerationConfig::default();
        let first = NetworkGenerator::new(42).generate(&config);
        let second = NetworkGenerator::new(42).generate(&config);
        assert_eq!(first, second);
    }

    #[test]
    fn test_distinct_seeds_differ() {
        let config = GenerationConfig::default();
        let first = NetworkGenerator::new(1).generate(&config);
        let second = NetworkGenerator::new(2).generate(&config);
        assert_ne!(first, second);
    }

    #[test]
    fn test_planted_structures_present() {
        let config = GenerationConfig::default();
        let batch = NetworkGenerator::new(7).generate(&config);

        assert!(batch.iter().any(|tx| tx.sender.starts_with("CYC00_")));
        assert!(batch.iter().any(|tx| tx.receiver == "AGG00"));
        assert!(batch.iter().any(|tx| tx.sender.starts_with("SHL00_")));
        let fan_in = batch.iter().filter(|tx| tx.receiver == "AGG00").count();
        assert!(fan_in >= 10, "burst must clear the counterparty threshold");
    }

    #[test]
    fn test_no_self_loops_in_background() {
        let config = GenerationConfig {
            background_transfers: 500,
            ..GenerationConfig::default()
        };
        let batch = NetworkGenerator::new(3).generate(&config);
        assert!(batch.iter().all(|tx| !tx.is_self_loop()));
    }

    #[test]
    fn test_transaction_ids_unique() {
        let batch = NetworkGenerator::new(11).generate(&GenerationConfig::default());
        let mut ids: Vec<&str> = batch.iter().map(|tx| tx.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), batch.len());
    }
}
