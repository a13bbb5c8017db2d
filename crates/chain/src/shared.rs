//! A chain shared between threads.
//!
//! Submissions and queries take the lock briefly; proof-of-work runs without
//! holding it. Mining drains the pool in one swap, and the reward is appended
//! afterwards, so transactions submitted while a block is being mined stay in
//! the pool for the next one.

use crate::blockchain::{Blockchain, ChainError, Result};
use parking_lot::{RwLock, RwLockReadGuard};
use powchain_core::{Address, Block, MiningOutcome, Transaction};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// Thread-safe handle to a [`Blockchain`].
#[derive(Clone)]
pub struct SharedChain {
    inner: Arc<RwLock<Blockchain>>,
}

impl SharedChain {
    pub fn new(blockchain: Blockchain) -> Self {
        Self {
            inner: Arc::new(RwLock::new(blockchain)),
        }
    }

    /// Read-only view for queries and validation. Blocks appends while held.
    pub fn read(&self) -> RwLockReadGuard<'_, Blockchain> {
        self.inner.read()
    }

    /// Submit a transaction. Validation happens before the lock is taken.
    pub fn add_transaction(&self, tx: Transaction) -> Result<()> {
        Blockchain::check_transaction(&tx)?;
        self.inner.write().pending.push(tx);
        Ok(())
    }

    /// Mine everything pending into a new block and queue the reward.
    pub fn mine_pending_transactions(&self, reward_address: Address) -> Result<Block> {
        let never = AtomicBool::new(false);
        self.mine_pending_transactions_with_cancel(reward_address, &never)
    }

    /// Like [`SharedChain::mine_pending_transactions`], aborting when `cancel` is raised.
    ///
    /// On cancellation, or when the tip changed while mining, the drained
    /// transactions go back to the front of the pool.
    pub fn mine_pending_transactions_with_cancel(
        &self,
        reward_address: Address,
        cancel: &AtomicBool,
    ) -> Result<Block> {
        let (mut block, difficulty) = self.begin_block();
        let outcome = block.mine_with_cancel(difficulty, cancel);
        self.finish_block(block, outcome, reward_address)
    }

    /// Drain the pool into an unmined block on the current tip.
    fn begin_block(&self) -> (Block, u32) {
        let mut chain = self.inner.write();
        let transactions = chain.pending.take();
        (chain.next_block(transactions), chain.config.difficulty)
    }

    fn finish_block(
        &self,
        block: Block,
        outcome: MiningOutcome,
        reward_address: Address,
    ) -> Result<Block> {
        let mut chain = self.inner.write();
        if let MiningOutcome::Cancelled { attempts } = outcome {
            debug!(attempts, "returning drained transactions after cancellation");
            chain.pending.restore_front(block.transactions);
            return Err(ChainError::MiningCancelled);
        }
        if chain.latest_block().hash != block.previous_hash {
            warn!(hash = %block.hash, "discarding block mined on a stale tip");
            chain.pending.restore_front(block.transactions);
            return Err(ChainError::StaleTip);
        }

        let reward = Transaction::reward(reward_address, chain.config.mining_reward);
        chain.pending.push(reward);
        Ok(chain.append_block(block).clone())
    }

    /// Mine on a worker thread so callers can keep submitting.
    pub fn spawn_miner(&self, reward_address: Address) -> JoinHandle<Result<Block>> {
        let chain = self.clone();
        thread::spawn(move || chain.mine_pending_transactions(reward_address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChainConfig;
    use powchain_core::Keypair;

    fn shared(difficulty: u32) -> SharedChain {
        SharedChain::new(Blockchain::new(ChainConfig::new(difficulty, 100)).unwrap())
    }

    fn transfer(keypair: &Keypair, amount: i64) -> Transaction {
        Transaction::new(keypair.address(), Keypair::generate().address(), amount)
            .signed(keypair)
            .unwrap()
    }

    #[test]
    fn test_shared_mining() {
        let chain = shared(1);
        let keypair = Keypair::generate();
        chain.add_transaction(transfer(&keypair, 5)).unwrap();

        let block = chain.mine_pending_transactions(keypair.address()).unwrap();

        let view = chain.read();
        assert_eq!(view.len(), 2);
        assert_eq!(view.latest_block(), &block);
        assert_eq!(view.pending_transactions().len(), 1);
        assert!(view.pending_transactions()[0].is_reward());
        assert!(view.is_chain_valid());
    }

    #[test]
    fn test_shared_rejects_invalid() {
        let chain = shared(0);
        let keypair = Keypair::generate();
        let tx = Transaction::new(keypair.address(), Keypair::generate().address(), 5);

        assert!(matches!(
            chain.add_transaction(tx),
            Err(ChainError::InvalidTransaction { .. })
        ));
        assert!(chain.read().pending_transactions().is_empty());
    }

    #[test]
    fn test_cancelled_mining_restores_pool() {
        let chain = shared(powchain_core::MAX_DIFFICULTY - 2);
        let keypair = Keypair::generate();
        chain.add_transaction(transfer(&keypair, 5)).unwrap();
        chain.add_transaction(transfer(&keypair, 6)).unwrap();

        let cancel = AtomicBool::new(true);
        let result = chain.mine_pending_transactions_with_cancel(keypair.address(), &cancel);

        assert!(matches!(result, Err(ChainError::MiningCancelled)));
        let view = chain.read();
        assert_eq!(view.len(), 1);
        let amounts: Vec<i64> = view.pending_transactions().iter().map(|tx| tx.amount).collect();
        assert_eq!(amounts, vec![5, 6]);
    }

    #[test]
    fn test_submissions_during_mining_are_kept() {
        let chain = shared(0);
        let keypair = Keypair::generate();
        chain.add_transaction(transfer(&keypair, 1)).unwrap();

        let (mut block, difficulty) = chain.begin_block();
        assert!(chain.read().pending_transactions().is_empty());

        // Submitted after the pool was drained, before the block lands.
        let late = transfer(&keypair, 2);
        chain.add_transaction(late.clone()).unwrap();

        let outcome = block.mine_with_cancel(difficulty, &AtomicBool::new(false));
        let mined = chain.finish_block(block, outcome, keypair.address()).unwrap();

        assert_eq!(mined.transactions.len(), 1);
        assert_eq!(mined.transactions[0].amount, 1);
        let view = chain.read();
        assert_eq!(view.len(), 2);
        let pending = view.pending_transactions();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0], late);
        assert!(pending[1].is_reward());
        assert_eq!(pending[1].to, Some(keypair.address()));
    }

    #[test]
    fn test_spawn_miner() {
        let chain = shared(1);
        let keypair = Keypair::generate();
        chain.add_transaction(transfer(&keypair, 5)).unwrap();

        let block = chain.spawn_miner(keypair.address()).join().unwrap().unwrap();

        assert!(block.meets_difficulty(1));
        assert_eq!(chain.read().len(), 2);
    }

    #[test]
    fn test_stale_tip_restores_pool() {
        let chain = shared(0);
        let keypair = Keypair::generate();
        chain.add_transaction(transfer(&keypair, 5)).unwrap();

        let (mut stale, difficulty) = chain.begin_block();
        chain.mine_pending_transactions(keypair.address()).unwrap();
        let outcome = stale.mine_with_cancel(difficulty, &AtomicBool::new(false));

        let result = chain.finish_block(stale, outcome, keypair.address());

        assert!(matches!(result, Err(ChainError::StaleTip)));
        let view = chain.read();
        assert_eq!(view.len(), 2);
        let pending = view.pending_transactions();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].amount, 5);
        assert!(pending[1].is_reward());
    }
}
