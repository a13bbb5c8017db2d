//! CLI commands module.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use powchain_chain::{Blockchain, ChainConfig};
use std::fs;
use std::path::PathBuf;

mod bench;
mod demo;
mod keygen;
mod tamper;

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a new keypair
    Keygen(keygen::KeygenArgs),
    /// Sign, submit and mine a transfer, then print balances
    Demo(demo::DemoArgs),
    /// Edit a mined block and show that validation catches it
    Tamper(tamper::TamperArgs),
    /// Measure mining work across difficulties
    Bench(bench::BenchArgs),
}

pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Keygen(args) => keygen::run(args),
        Commands::Demo(args) => demo::run(args),
        Commands::Tamper(args) => tamper::run(args),
        Commands::Bench(args) => bench::run(args),
    }
}

/// Chain settings shared by commands that build a chain.
#[derive(Args)]
pub struct ChainArgs {
    /// JSON file with `difficulty` and `mining_reward`
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Leading zero hex digits required of each block hash
    #[arg(short, long)]
    difficulty: Option<u32>,

    /// Reward paid for each mined block
    #[arg(short, long)]
    reward: Option<i64>,
}

impl ChainArgs {
    /// Resolve the config: defaults, then the config file, then flags.
    pub fn load_config(&self) -> Result<ChainConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let contents = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?;
                serde_json::from_str(&contents)
                    .with_context(|| format!("Invalid config file: {}", path.display()))?
            }
            None => ChainConfig::default(),
        };

        if let Some(difficulty) = self.difficulty {
            config.difficulty = difficulty;
        }
        if let Some(reward) = self.reward {
            config.mining_reward = reward;
        }
        Ok(config)
    }

    pub fn build_chain(&self) -> Result<Blockchain> {
        let config = self.load_config()?;
        Blockchain::new(config).context("Invalid chain configuration")
    }
}
