//! Chain configuration.

use crate::blockchain::{ChainError, Result};
use powchain_core::MAX_DIFFICULTY;
use serde::{Deserialize, Serialize};

/// Default number of leading zero hex digits a mined block hash needs.
pub const DEFAULT_DIFFICULTY: u32 = 2;

/// Default amount paid to a miner for each block.
pub const DEFAULT_MINING_REWARD: i64 = 100;

/// Chain configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Leading zero hex digits required of every mined block hash.
    pub difficulty: u32,
    /// Amount of the reward transaction queued after each mined block.
    pub mining_reward: i64,
}

impl ChainConfig {
    pub fn new(difficulty: u32, mining_reward: i64) -> Self {
        Self {
            difficulty,
            mining_reward,
        }
    }

    /// Reject settings the miner could never satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.difficulty > MAX_DIFFICULTY {
            return Err(ChainError::InvalidDifficulty {
                difficulty: self.difficulty,
                max: MAX_DIFFICULTY,
            });
        }
        Ok(())
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            mining_reward: DEFAULT_MINING_REWARD,
        }
    }
}
