use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::info;

use allowlist_cli::{read_address_file, split_address_list, Allowlist};

#[derive(Args, Debug)]
pub struct Cli {
    /// Input file containing Ethereum addresses (one per line)
    #[arg(short, long, conflicts_with = "addresses", required_unless_present = "addresses")]
    input: Option<PathBuf>,

    /// Comma-separated addresses, instead of an input file
    #[arg(short, long)]
    addresses: Option<String>,

    /// Output JSON file mapping each address to its proof
    #[arg(short, long, default_value = "merkletree.json")]
    proofs_output: PathBuf,

    /// Output file for the Merkle root
    #[arg(short, long, default_value = "merkleroot.txt")]
    root_output: PathBuf,
}

/// Loads the raw address list from whichever source the arguments name.
pub fn load_addresses(input: Option<&PathBuf>, addresses: Option<&str>) -> Result<Vec<String>> {
    match (input, addresses) {
        (Some(path), _) => {
            println!("Reading addresses from {:?}...", path);
            read_address_file(path)
        }
        (None, Some(list)) => Ok(split_address_list(list)),
        (None, None) => anyhow::bail!("Provide --input or --addresses"),
    }
}

pub fn run(args: Cli) -> Result<()> {
    let raw = load_addresses(args.input.as_ref(), args.addresses.as_deref())?;

    println!("Total addresses: {}", raw.len());
    println!("Building Merkle tree...");

    let allowlist = Allowlist::from_addresses(&raw).context("Failed to build Merkle tree")?;
    info!(
        leaves = allowlist.len(),
        levels = allowlist.levels().len(),
        "tree built"
    );

    println!("Merkle root: {}", allowlist.root_hex());

    println!("Writing proofs to {:?}...", args.proofs_output);
    allowlist.write_artifacts(&args.proofs_output, &args.root_output)?;
    println!("Root written to {:?}", args.root_output);

    println!("Done!");
    Ok(())
}
