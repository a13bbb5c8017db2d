//! Main chain orchestration.
//!
//! The [`Blockchain`] owns the block list and the pending pool. It accepts signed
//! transactions, mines them into blocks, answers balance and history queries and
//! re-derives every hash and signature on validation.

use crate::config::ChainConfig;
use crate::mempool::Mempool;
use powchain_core::{Address, Block, Transaction, TransactionError};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during chain operations.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("transaction must include from and to address")]
    MissingAddress,

    #[error("cannot add invalid transaction to chain")]
    InvalidTransaction {
        #[source]
        source: Option<TransactionError>,
    },

    #[error("difficulty {difficulty} exceeds the maximum of {max}")]
    InvalidDifficulty { difficulty: u32, max: u32 },

    #[error("chain tip moved while mining")]
    StaleTip,

    #[error("mining was cancelled")]
    MiningCancelled,
}

pub type Result<T> = std::result::Result<T, ChainError>;

/// The first check a block failed during chain validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChainViolation {
    #[error("block {index} contains an invalid transaction")]
    InvalidTransactions { index: usize },

    #[error("block {index} hash does not match its content")]
    HashMismatch { index: usize },

    #[error("block {index} does not link to the previous block")]
    BrokenLink { index: usize },
}

impl ChainViolation {
    /// Index of the offending block.
    pub fn index(&self) -> usize {
        match self {
            ChainViolation::InvalidTransactions { index }
            | ChainViolation::HashMismatch { index }
            | ChainViolation::BrokenLink { index } => *index,
        }
    }
}

/// A single node's chain of blocks plus its pending pool.
#[derive(Debug, Clone)]
pub struct Blockchain {
    /// Blocks in chain order. Index 0 is always genesis.
    pub(crate) blocks: Vec<Block>,
    /// Transactions waiting for the next block.
    pub(crate) pending: Mempool,
    /// Configuration.
    pub(crate) config: ChainConfig,
}

impl Blockchain {
    /// Create a chain holding only the genesis block.
    pub fn new(config: ChainConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    fn with_config(config: ChainConfig) -> Self {
        Self {
            blocks: vec![Self::genesis_block()],
            pending: Mempool::new(),
            config,
        }
    }

    /// The fixed genesis block every chain starts from.
    pub fn genesis_block() -> Block {
        Block::genesis()
    }

    /// Get the latest block.
    pub fn latest_block(&self) -> &Block {
        &self.blocks[self.blocks.len() - 1]
    }

    /// All blocks in chain order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Number of blocks, genesis included.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false: a chain holds at least its genesis block.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Transactions waiting for the next block.
    pub fn pending_transactions(&self) -> &[Transaction] {
        self.pending.transactions()
    }

    pub fn difficulty(&self) -> u32 {
        self.config.difficulty
    }

    pub fn mining_reward(&self) -> i64 {
        self.config.mining_reward
    }

    /// Mutable access to a stored block.
    ///
    /// The chain never edits stored blocks itself; this exists to simulate
    /// tampering, which [`Blockchain::is_chain_valid`] then detects.
    pub fn block_mut(&mut self, index: usize) -> Option<&mut Block> {
        self.blocks.get_mut(index)
    }

    /// Submit a transaction to the pending pool.
    ///
    /// No balance check is made: a wallet may spend more than it holds.
    pub fn add_transaction(&mut self, tx: Transaction) -> Result<()> {
        Self::check_transaction(&tx)?;
        debug!(from = ?tx.from, to = ?tx.to, amount = tx.amount, "transaction accepted");
        self.pending.push(tx);
        Ok(())
    }

    pub(crate) fn check_transaction(tx: &Transaction) -> Result<()> {
        if !tx.is_addressed() {
            return Err(ChainError::MissingAddress);
        }
        match tx.is_valid() {
            Ok(true) => Ok(()),
            Ok(false) => Err(ChainError::InvalidTransaction { source: None }),
            Err(e) => Err(ChainError::InvalidTransaction { source: Some(e) }),
        }
    }

    /// Mine every pending transaction into a new block.
    ///
    /// Afterwards the pool holds exactly one reward transaction paying
    /// `reward_address`, which is included in the next mined block.
    pub fn mine_pending_transactions(&mut self, reward_address: Address) -> &Block {
        let transactions = self.pending.take();
        let mut block = self.next_block(transactions);
        block.mine(self.config.difficulty);

        self.pending
            .replace(vec![Transaction::reward(reward_address, self.config.mining_reward)]);
        self.append_block(block)
    }

    /// Build an unmined block on top of the current tip.
    pub(crate) fn next_block(&self, transactions: Vec<Transaction>) -> Block {
        Block::new(
            Block::current_timestamp(),
            transactions,
            self.latest_block().hash,
        )
    }

    pub(crate) fn append_block(&mut self, block: Block) -> &Block {
        info!(
            height = self.blocks.len(),
            hash = %block.hash,
            transactions = block.tx_count(),
            "block appended"
        );
        self.blocks.push(block);
        self.latest_block()
    }

    /// Net balance of `address` over every mined transaction.
    ///
    /// Summed in `i128`: amounts are unchecked `i64`s, so a handful of extreme
    /// transfers would overflow an `i64` accumulator.
    pub fn balance_of(&self, address: &Address) -> i128 {
        self.all_transactions().fold(0, |mut balance, tx| {
            if tx.is_sent_by(address) {
                balance -= i128::from(tx.amount);
            }
            if tx.is_received_by(address) {
                balance += i128::from(tx.amount);
            }
            balance
        })
    }

    /// Every mined transaction that `address` sent or received, in chain order.
    pub fn transactions_for_wallet(
        &self,
        address: Address,
    ) -> impl Iterator<Item = &Transaction> + '_ {
        self.all_transactions().filter(move |tx| tx.involves(&address))
    }

    fn all_transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.blocks.iter().flat_map(|block| block.transactions.iter())
    }

    /// Whether every non-genesis block has valid transactions, a consistent hash
    /// and a correct link to its predecessor.
    pub fn is_chain_valid(&self) -> bool {
        match self.validate() {
            Ok(()) => true,
            Err(violation) => {
                warn!(%violation, "chain validation failed");
                false
            }
        }
    }

    /// Validate the chain, reporting the first violation found.
    ///
    /// Genesis is not checked. Blocks are never modified.
    pub fn validate(&self) -> std::result::Result<(), ChainViolation> {
        for (index, pair) in self.blocks.windows(2).enumerate() {
            let (previous, current) = (&pair[0], &pair[1]);
            let index = index + 1;

            if !current.has_valid_transactions() {
                return Err(ChainViolation::InvalidTransactions { index });
            }
            if !current.is_hash_consistent() {
                return Err(ChainViolation::HashMismatch { index });
            }
            if current.previous_hash != previous.hash {
                return Err(ChainViolation::BrokenLink { index });
            }
        }
        Ok(())
    }
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::with_config(ChainConfig::default())
    }
}
