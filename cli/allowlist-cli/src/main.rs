#![forbid(unsafe_code)]
#![allow(unreachable_pub)]

use clap::{Parser, Subcommand};
use tracing_subscriber::filter::EnvFilter;

mod build_tree;
mod console;
mod prove;
mod verify;

#[derive(Parser, Debug)]
#[command(name = "allowlist")]
#[command(about = "Merkle allowlist builder and whitelist sale console", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the Merkle root and per-address proofs for an allowlist
    BuildTree(build_tree::Cli),
    /// Produce a membership proof for one address
    Prove(prove::Cli),
    /// Check a membership proof against its root
    Verify(verify::Cli),
    /// Interact with the whitelist sale contract
    Sale(console::Cli),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::BuildTree(args) => build_tree::run(args)?,
        Commands::Prove(args) => prove::run(&args)?,
        Commands::Verify(args) => verify::run(&args)?,
        Commands::Sale(args) => console::run(args)?,
    }

    Ok(())
}
