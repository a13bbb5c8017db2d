//! Chain orchestration for powchain.
//!
//! This crate turns the core primitives into a working ledger:
//! - **Blockchain**: block list, pending pool, mining and whole-chain validation
//! - **Mempool**: ordered pool of submitted transactions
//! - **SharedChain**: the same chain behind a lock, mining off the lock
//!
//! # Example
//!
//! ```rust,no_run
//! use powchain_chain::{Blockchain, ChainConfig};
//! use powchain_core::{Keypair, Transaction};
//!
//! let mut chain = Blockchain::new(ChainConfig::default()).unwrap();
//! let alice = Keypair::generate();
//! let bob = Keypair::generate();
//!
//! let tx = Transaction::new(alice.address(), bob.address(), 10)
//!     .signed(&alice)
//!     .unwrap();
//! chain.add_transaction(tx).unwrap();
//! chain.mine_pending_transactions(alice.address());
//!
//! assert!(chain.is_chain_valid());
//! assert_eq!(chain.balance_of(&bob.address()), 10);
//! ```

pub mod blockchain;
pub mod config;
pub mod mempool;
pub mod shared;

// Re-export commonly used types
pub use blockchain::{Blockchain, ChainError, ChainViolation};
pub use config::{ChainConfig, DEFAULT_DIFFICULTY, DEFAULT_MINING_REWARD};
pub use mempool::Mempool;
pub use shared::SharedChain;
