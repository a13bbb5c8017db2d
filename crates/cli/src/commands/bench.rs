//! Mining benchmark across difficulties.

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use powchain_core::{Block, Hash, MAX_DIFFICULTY};
use std::time::Instant;

#[derive(Args)]
pub struct BenchArgs {
    /// Highest difficulty to mine at
    #[arg(short, long, default_value = "4")]
    max_difficulty: u32,
}

pub fn run(args: BenchArgs) -> Result<()> {
    if args.max_difficulty > MAX_DIFFICULTY {
        bail!(
            "Difficulty {} exceeds the maximum of {}",
            args.max_difficulty,
            MAX_DIFFICULTY
        );
    }

    println!("{}", "Mining an empty block:".bold().cyan());
    println!();

    for difficulty in 0..=args.max_difficulty {
        let mut block = Block::new(Block::current_timestamp(), Vec::new(), Hash::ZERO);
        let started = Instant::now();
        let attempts = block.mine(difficulty);
        let elapsed = started.elapsed();

        println!(
            "  {} {} attempts in {:.2?} (expected ~{})",
            format!("d={}", difficulty).bright_black(),
            attempts.to_string().bright_cyan(),
            elapsed,
            16u64.saturating_pow(difficulty)
        );
    }

    println!();
    Ok(())
}
