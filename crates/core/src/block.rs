//! Blocks and proof-of-work mining.

use crate::hash::{hash, Hash};
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Timestamp of the genesis block: 2019-01-01T00:00:00Z in milliseconds.
pub const GENESIS_TIMESTAMP: u64 = 1_546_300_800_000;

/// An ordered batch of transactions linked to its predecessor by hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Unix timestamp in milliseconds.
    pub timestamp: u64,
    /// Transactions in this block, in submission order.
    pub transactions: Vec<Transaction>,
    /// Hash of the previous block ([`Hash::ZERO`] for genesis).
    pub previous_hash: Hash,
    /// Proof-of-work search counter.
    pub nonce: u64,
    /// Stored hash. Equal to [`Block::compute_hash`] unless the block was edited.
    pub hash: Hash,
}

/// Hashed content of a block, in canonical field order.
#[derive(Serialize)]
struct BlockContent<'a> {
    previous_hash: &'a Hash,
    timestamp: u64,
    transactions: &'a [Transaction],
    nonce: u64,
}

/// Result of a cancellable mining run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MiningOutcome {
    /// The stored hash now satisfies the difficulty.
    Mined { attempts: u64 },
    /// The cancel flag was raised before a solution was found.
    Cancelled { attempts: u64 },
}

impl MiningOutcome {
    /// Number of nonces tried.
    pub fn attempts(&self) -> u64 {
        match self {
            MiningOutcome::Mined { attempts } | MiningOutcome::Cancelled { attempts } => *attempts,
        }
    }

    pub fn is_mined(&self) -> bool {
        matches!(self, MiningOutcome::Mined { .. })
    }
}

impl Block {
    /// Create a block with nonce 0 and its hash computed once.
    pub fn new(timestamp: u64, transactions: Vec<Transaction>, previous_hash: Hash) -> Self {
        let mut block = Self {
            timestamp,
            transactions,
            previous_hash,
            nonce: 0,
            hash: Hash::ZERO,
        };
        block.hash = block.compute_hash();
        block
    }

    /// Create the fixed, unmined genesis block.
    pub fn genesis() -> Self {
        Self::new(GENESIS_TIMESTAMP, Vec::new(), Hash::ZERO)
    }

    /// Get the current Unix timestamp in milliseconds.
    pub fn current_timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_millis() as u64
    }

    /// Hash the block's current content. Does not touch the stored hash.
    pub fn compute_hash(&self) -> Hash {
        let content = BlockContent {
            previous_hash: &self.previous_hash,
            timestamp: self.timestamp,
            transactions: &self.transactions,
            nonce: self.nonce,
        };
        let encoded = bincode::serialize(&content).expect("serialization should not fail");
        hash(&encoded)
    }

    /// Whether the stored hash matches the block's current content.
    pub fn is_hash_consistent(&self) -> bool {
        self.hash == self.compute_hash()
    }

    /// Whether the stored hash starts with `difficulty` zero hex digits.
    pub fn meets_difficulty(&self, difficulty: u32) -> bool {
        self.hash.meets_difficulty(difficulty)
    }

    /// Search nonces until the hash starts with `difficulty` zero hex digits.
    ///
    /// Blocks until a solution is found; the expected number of attempts is
    /// `16^difficulty`. Never returns for a difficulty above
    /// [`MAX_DIFFICULTY`](crate::hash::MAX_DIFFICULTY). Returns the attempt count.
    pub fn mine(&mut self, difficulty: u32) -> u64 {
        let never = AtomicBool::new(false);
        self.mine_with_cancel(difficulty, &never).attempts()
    }

    /// Like [`Block::mine`], but checks `cancel` before every attempt.
    ///
    /// A cancelled block keeps the nonce it reached, with a consistent hash.
    pub fn mine_with_cancel(&mut self, difficulty: u32, cancel: &AtomicBool) -> MiningOutcome {
        let mut attempts = 0u64;
        while !self.hash.meets_difficulty(difficulty) {
            if cancel.load(Ordering::Relaxed) {
                debug!(nonce = self.nonce, attempts, "mining cancelled");
                return MiningOutcome::Cancelled { attempts };
            }
            self.nonce = self.nonce.wrapping_add(1);
            self.hash = self.compute_hash();
            attempts += 1;
        }
        debug!(hash = %self.hash, nonce = self.nonce, attempts, "block mined");
        MiningOutcome::Mined { attempts }
    }

    /// Whether every transaction verifies. Stops at the first one that does not.
    pub fn has_valid_transactions(&self) -> bool {
        self.transactions
            .iter()
            .all(|tx| matches!(tx.is_valid(), Ok(true)))
    }

    /// Check if this is the genesis block.
    pub fn is_genesis(&self) -> bool {
        self.previous_hash == Hash::ZERO && self.timestamp == GENESIS_TIMESTAMP
    }

    /// Get the number of transactions in this block.
    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Address, Keypair};

    fn signed_transfer(keypair: &Keypair, amount: i64) -> Transaction {
        Transaction::new(keypair.address(), Address::from_bytes([2u8; 32]), amount)
            .signed(keypair)
            .unwrap()
    }

    #[test]
    fn test_genesis_block() {
        let genesis = Block::genesis();

        assert!(genesis.is_genesis());
        assert_eq!(genesis.previous_hash, Hash::ZERO);
        assert_eq!(genesis.nonce, 0);
        assert_eq!(genesis.timestamp, GENESIS_TIMESTAMP);
        assert!(genesis.transactions.is_empty());
        assert!(genesis.is_hash_consistent());
    }

    #[test]
    fn test_genesis_hash_reproducible() {
        assert_eq!(Block::genesis().hash, Block::genesis().hash);
        assert_eq!(Block::genesis(), Block::genesis());
    }

    #[test]
    fn test_new_block_hash_computed_at_nonce_zero() {
        let keypair = Keypair::generate();
        let block = Block::new(1_000, vec![signed_transfer(&keypair, 5)], Hash::ZERO);

        assert_eq!(block.nonce, 0);
        assert_eq!(block.hash, block.compute_hash());
        assert_eq!(block.tx_count(), 1);
    }

    #[test]
    fn test_compute_hash_covers_every_field() {
        let keypair = Keypair::generate();
        let block = Block::new(1_000, vec![signed_transfer(&keypair, 5)], Hash::ZERO);
        let original = block.compute_hash();

        let mut edited = block.clone();
        edited.timestamp += 1;
        assert_ne!(edited.compute_hash(), original);

        let mut edited = block.clone();
        edited.nonce += 1;
        assert_ne!(edited.compute_hash(), original);

        let mut edited = block.clone();
        edited.previous_hash = Hash::from_bytes([1u8; 32]);
        assert_ne!(edited.compute_hash(), original);

        let mut edited = block.clone();
        edited.transactions[0].amount = 6;
        assert_ne!(edited.compute_hash(), original);

        let mut edited = block;
        edited.transactions[0].signature = None;
        assert_ne!(edited.compute_hash(), original);
    }

    #[test]
    fn test_edit_leaves_stored_hash_stale() {
        let mut block = Block::new(1_000, Vec::new(), Hash::ZERO);
        let stored = block.hash;

        block.timestamp = 2_000;
        assert_eq!(block.hash, stored);
        assert!(!block.is_hash_consistent());
    }

    #[test]
    fn test_mining_satisfies_difficulty() {
        for difficulty in 0..=3 {
            let mut block = Block::new(1_000, Vec::new(), Hash::ZERO);
            block.mine(difficulty);

            assert!(block.meets_difficulty(difficulty));
            assert!(block
                .hash
                .to_hex()
                .starts_with(&"0".repeat(difficulty as usize)));
            assert!(block.is_hash_consistent());
        }
    }

    #[test]
    fn test_mining_difficulty_zero_is_noop() {
        let mut block = Block::new(1_000, Vec::new(), Hash::ZERO);
        let before = block.clone();
        assert_eq!(block.mine(0), 0);
        assert_eq!(block, before);
    }

    #[test]
    fn test_mining_attempts_match_nonce() {
        let mut block = Block::new(1_000, Vec::new(), Hash::ZERO);
        let attempts = block.mine(2);
        assert_eq!(attempts, block.nonce);
    }

    #[test]
    fn test_mining_cancelled() {
        let mut block = Block::new(1_000, Vec::new(), Hash::ZERO);
        let cancel = AtomicBool::new(true);

        let outcome = block.mine_with_cancel(crate::hash::MAX_DIFFICULTY, &cancel);

        assert_eq!(outcome, MiningOutcome::Cancelled { attempts: 0 });
        assert!(!outcome.is_mined());
        assert!(block.is_hash_consistent());
    }

    #[test]
    fn test_has_valid_transactions() {
        let keypair = Keypair::generate();
        let reward = Transaction::reward(keypair.address(), 100);
        let block = Block::new(
            1_000,
            vec![signed_transfer(&keypair, 5), reward],
            Hash::ZERO,
        );
        assert!(block.has_valid_transactions());
    }

    #[test]
    fn test_has_valid_transactions_rejects_tampered() {
        let keypair = Keypair::generate();
        let mut tampered = signed_transfer(&keypair, 5);
        tampered.amount = 500;

        let block = Block::new(
            1_000,
            vec![signed_transfer(&keypair, 1), tampered],
            Hash::ZERO,
        );
        assert!(!block.has_valid_transactions());
    }

    #[test]
    fn test_has_valid_transactions_rejects_unsigned() {
        let keypair = Keypair::generate();
        let unsigned = Transaction::new(keypair.address(), Address::from_bytes([2u8; 32]), 5);
        let block = Block::new(1_000, vec![unsigned], Hash::ZERO);

        // Missing signatures are reported as invalid, never as a panic or error.
        assert!(!block.has_valid_transactions());
    }

    #[test]
    fn test_empty_block_has_valid_transactions() {
        assert!(Block::genesis().has_valid_transactions());
    }
}
