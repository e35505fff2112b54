use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use allowlist_cli::{hex_encode, parse_hash32, MembershipProof};

#[derive(Args, Debug)]
pub struct Cli {
    /// Proof JSON produced by the `prove` command
    #[arg(short, long)]
    claim: PathBuf,

    /// Expected root, overriding the one stored in the claim
    #[arg(short, long)]
    root: Option<String>,
}

pub fn run(args: &Cli) -> Result<()> {
    let content = std::fs::read_to_string(&args.claim).context("Failed to read claim file")?;
    let mut claim: MembershipProof =
        serde_json::from_str(&content).context("Failed to parse claim JSON")?;

    if let Some(root) = &args.root {
        let root = parse_hash32(root).context("Invalid Merkle root")?;
        claim.merkle_root = hex_encode(root);
    }

    if claim.verify()? {
        println!(
            "{} is included under root {}",
            claim.address.to_checksum(),
            claim.merkle_root
        );
        Ok(())
    } else {
        anyhow::bail!(
            "Proof for {} does not verify against root {}",
            claim.address.to_checksum(),
            claim.merkle_root
        )
    }
}
