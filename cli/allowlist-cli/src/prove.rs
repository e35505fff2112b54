use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use allowlist_cli::{write_file_atomic, Address, Allowlist};

use crate::build_tree::load_addresses;

#[derive(Args, Debug)]
pub struct Cli {
    /// Input file containing Ethereum addresses (one per line)
    #[arg(short, long, conflicts_with = "addresses", required_unless_present = "addresses")]
    input: Option<PathBuf>,

    /// Comma-separated addresses, instead of an input file
    #[arg(short, long)]
    addresses: Option<String>,

    /// Address to prove membership for
    #[arg(short = 'w', long)]
    address: String,

    /// Output JSON file; printed to stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub fn run(args: &Cli) -> Result<()> {
    let raw = load_addresses(args.input.as_ref(), args.addresses.as_deref())?;
    let allowlist = Allowlist::from_addresses(&raw).context("Failed to build Merkle tree")?;

    let address = Address::parse(&args.address).context("Invalid address")?;
    let claim = allowlist
        .membership_proof(&address)
        .with_context(|| format!("{} is not on the allowlist", address.to_checksum()))?;

    if !claim.verify()? {
        anyhow::bail!("Generated proof does not verify against the root");
    }

    let json_output = serde_json::to_string_pretty(&claim).context("Failed to serialize proof")?;
    match &args.output {
        Some(path) => {
            println!("Writing proof to {:?}...", path);
            write_file_atomic(path, &json_output).context("Failed to write proof file")?;
            println!("Leaf index: {}", claim.leaf_index);
            println!("Proof length: {} nodes", claim.merkle_proof.len());
        }
        None => println!("{}", json_output),
    }

    Ok(())
}
