//! End-to-end demo: sign a transfer, mine it, report balances.

use super::ChainArgs;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use powchain_core::{Keypair, Transaction};
use std::time::Instant;

/// Private key of the demo wallet.
const DEMO_PRIVATE_KEY: &str = "317abde5cd123476700d075036eb59b9d65a1ecbad02e6cc2e199566dc138c79";

#[derive(Args)]
pub struct DemoArgs {
    #[command(flatten)]
    chain: ChainArgs,

    /// Hex private key of the sending wallet
    #[arg(short, long, default_value = DEMO_PRIVATE_KEY)]
    key: String,

    /// Amount to transfer
    #[arg(short, long, default_value = "10")]
    amount: i64,
}

pub fn run(args: DemoArgs) -> Result<()> {
    let mut chain = args.chain.build_chain()?;
    let wallet = Keypair::from_hex(&args.key).context("Invalid private key")?;
    let recipient = Keypair::generate().address();

    println!("{}", "Wallets:".bold().cyan());
    println!("  Sender:    {}", wallet.address().to_hex().bright_yellow());
    println!("  Recipient: {}", recipient.to_hex().bright_yellow());
    println!();

    let tx = Transaction::new(wallet.address(), recipient, args.amount).signed(&wallet)?;
    chain.add_transaction(tx)?;
    println!(
        "{}  Submitted transfer of {}",
        "✓".green().bold(),
        args.amount.to_string().bright_cyan()
    );

    println!();
    println!(
        "{}",
        format!("Starting the miner (difficulty {})...", chain.difficulty()).bold()
    );
    let started = Instant::now();
    let block = chain.mine_pending_transactions(wallet.address());
    println!(
        "{}  Block mined: {} (nonce {}, {:.2?})",
        "✓".green().bold(),
        block.hash.to_hex().bright_yellow(),
        block.nonce,
        started.elapsed()
    );

    println!();
    println!("{}", "Balances:".bold().cyan());
    println!(
        "  Sender:    {}",
        chain.balance_of(&wallet.address()).to_string().bright_cyan()
    );
    println!(
        "  Recipient: {}",
        chain.balance_of(&recipient).to_string().bright_cyan()
    );
    println!(
        "  {}",
        format!(
            "(reward of {} is pending until the next block)",
            chain.mining_reward()
        )
        .bright_black()
    );

    println!();
    println!("{}", "Sender history:".bold().cyan());
    for tx in chain.transactions_for_wallet(wallet.address()) {
        let to = tx.to.map(|a| a.to_hex()).unwrap_or_default();
        println!("  -> {} {}", to.bright_black(), tx.amount.to_string().bright_cyan());
    }

    println!();
    print_validity(chain.is_chain_valid());
    Ok(())
}

pub(super) fn print_validity(valid: bool) {
    if valid {
        println!("Is blockchain valid? {}", "true".green().bold());
    } else {
        println!("Is blockchain valid? {}", "false".red().bold());
    }
}
