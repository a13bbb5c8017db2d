//! Core ledger primitives for powchain.
//!
//! This crate provides the integrity engine's building blocks:
//! - Cryptographic primitives (hashing, signing, addresses)
//! - Transactions and their signatures
//! - Blocks and proof-of-work mining

pub mod block;
pub mod crypto;
pub mod hash;
pub mod transaction;

// Re-export commonly used types at the crate root
pub use block::{Block, MiningOutcome, GENESIS_TIMESTAMP};
pub use crypto::{Address, CryptoError, Keypair, PublicKey, Signature};
pub use hash::{hash, Hash, H256, MAX_DIFFICULTY};
pub use transaction::{Sender, Transaction, TransactionError};
