//! Pending-transaction pool.
//!
//! Holds submitted transactions, in submission order, until they are packaged
//! into the next mined block.

use powchain_core::Transaction;
use std::mem;

/// Ordered pool of transactions waiting for a block.
#[derive(Debug, Clone, Default)]
pub struct Mempool {
    transactions: Vec<Transaction>,
}

impl Mempool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of transactions in the pool.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Check if the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Append a transaction.
    pub fn push(&mut self, tx: Transaction) {
        self.transactions.push(tx);
    }

    /// Pending transactions in submission order.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Swap the pool's contents for `next`, returning what was pending.
    ///
    /// This is the single drain-and-refill step used when mining, so the pool is
    /// never observed half-drained.
    pub fn replace(&mut self, next: Vec<Transaction>) -> Vec<Transaction> {
        mem::replace(&mut self.transactions, next)
    }

    /// Drain everything, leaving the pool empty.
    pub fn take(&mut self) -> Vec<Transaction> {
        self.replace(Vec::new())
    }

    /// Put a drained batch back ahead of anything submitted since.
    pub fn restore_front(&mut self, mut batch: Vec<Transaction>) {
        batch.append(&mut self.transactions);
        self.transactions = batch;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use powchain_core::Address;

    fn reward(amount: i64) -> Transaction {
        Transaction::reward(Address::from_bytes([1u8; 32]), amount)
    }

    #[test]
    fn test_push_keeps_order() {
        let mut pool = Mempool::new();
        pool.push(reward(1));
        pool.push(reward(2));

        assert_eq!(pool.len(), 2);
        assert_eq!(pool.transactions()[0].amount, 1);
        assert_eq!(pool.transactions()[1].amount, 2);
    }

    #[test]
    fn test_replace_returns_previous() {
        let mut pool = Mempool::new();
        pool.push(reward(1));
        pool.push(reward(2));

        let drained = pool.replace(vec![reward(100)]);

        assert_eq!(drained.len(), 2);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.transactions()[0].amount, 100);
    }

    #[test]
    fn test_take_empties_pool() {
        let mut pool = Mempool::new();
        pool.push(reward(1));

        let drained = pool.take();
        assert_eq!(drained.len(), 1);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_restore_front() {
        let mut pool = Mempool::new();
        pool.push(reward(1));
        pool.push(reward(2));
        let drained = pool.take();

        pool.push(reward(3));
        pool.restore_front(drained);

        let amounts: Vec<i64> = pool.transactions().iter().map(|tx| tx.amount).collect();
        assert_eq!(amounts, vec![1, 2, 3]);
    }
}
