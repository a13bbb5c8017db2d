//! Tamper demo: edit a mined block and watch validation fail.

use super::demo::print_validity;
use super::ChainArgs;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use powchain_chain::Blockchain;
use powchain_core::{Keypair, Transaction};

#[derive(Args)]
pub struct TamperArgs {
    #[command(flatten)]
    chain: ChainArgs,

    /// Also recompute the edited block's hash and relink its successor
    #[arg(long)]
    relink: bool,
}

pub fn run(args: TamperArgs) -> Result<()> {
    let mut chain = args.chain.build_chain()?;
    let bob = Keypair::generate();
    let alice = Keypair::generate();
    let ronaldo = Keypair::generate();
    let messi = Keypair::generate();

    chain.add_transaction(Transaction::new(bob.address(), alice.address(), 500).signed(&bob)?)?;
    chain.mine_pending_transactions(bob.address());
    chain.add_transaction(
        Transaction::new(ronaldo.address(), messi.address(), 200).signed(&ronaldo)?,
    )?;
    chain.mine_pending_transactions(ronaldo.address());

    println!("{}", "Mined chain:".bold().cyan());
    print_blocks(&chain);
    print_validity(chain.is_chain_valid());

    println!();
    println!("{}", "Changing block 1's transfer amount to 1...".bold());
    let block = chain.block_mut(1).context("Block 1 not found")?;
    block.transactions[0].amount = 1;

    if args.relink {
        println!("{}", "Recomputing block 1's hash and relinking block 2...".bold());
        block.hash = block.compute_hash();
        let new_hash = block.hash;
        let next = chain.block_mut(2).context("Block 2 not found")?;
        next.previous_hash = new_hash;
        next.hash = next.compute_hash();
    }

    println!();
    print_blocks(&chain);
    print_validity(chain.is_chain_valid());
    if let Err(violation) = chain.validate() {
        println!("  {}", violation.to_string().red());
    }

    Ok(())
}

fn print_blocks(chain: &Blockchain) {
    for (height, block) in chain.blocks().iter().enumerate() {
        println!(
            "  {} {} {} {}",
            format!("#{}", height).bright_black(),
            block.hash.to_hex()[..16].bright_yellow(),
            format!("prev {}", &block.previous_hash.to_hex()[..16]).bright_black(),
            format!("({} txs)", block.tx_count()).bright_black()
        );
    }
}
