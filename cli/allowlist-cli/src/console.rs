use alloy_primitives::U256;
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use allowlist_cli::config::DEFAULT_RPC_URL;
use allowlist_cli::sale::{
    format_ether, ChainTransport, CommandKind, Console, ConsoleError, JsonRpcTransport, SaleClient,
    SaleCommand, SubmitError,
};
use allowlist_cli::{parse_hash32, read_proof_map, Address, Config, Hash32};

#[derive(Args, Debug)]
pub struct Cli {
    /// JSON-RPC endpoint of a node that manages the account
    #[arg(long, env = "ALLOWLIST_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,

    /// Whitelist sale contract address
    #[arg(long, env = "ALLOWLIST_SALE_ADDRESS")]
    sale_address: Address,

    /// NFT contract address
    #[arg(long, env = "ALLOWLIST_NFT_ADDRESS")]
    nft_address: Address,

    /// Account the node sends transactions from
    #[arg(long, env = "ALLOWLIST_ACCOUNT")]
    account: Address,

    /// Seconds between receipt polls
    #[arg(long, default_value_t = 2)]
    poll_interval_secs: u64,

    /// Seconds to wait for a transaction receipt
    #[arg(long, default_value_t = 120)]
    receipt_timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the commands available to this account
    Commands,
    /// Check whether an address is whitelisted
    CheckWhitelist {
        /// Address to check (owner only; users always check themselves)
        address: Option<Address>,
    },
    /// Show how many NFTs an address has minted
    Minted {
        /// Address to check (owner only; users always check themselves)
        address: Option<Address>,
    },
    /// Mint NFTs from the on-chain whitelist
    Mint {
        quantity: u64,
        /// Submit without stopping at the cost quote
        #[arg(short, long)]
        yes: bool,
    },
    /// Mint NFTs using this account's Merkle proof
    MintWithProof {
        quantity: u64,
        /// Proofs JSON written by `build-tree`
        #[arg(short, long, default_value = "merkletree.json")]
        proofs: PathBuf,
        /// Submit without stopping at the cost quote
        #[arg(short, long)]
        yes: bool,
    },
    /// Add comma-separated addresses to the whitelist
    Add {
        #[arg(value_delimiter = ',', required = true)]
        addresses: Vec<Address>,
    },
    /// Remove comma-separated addresses from the whitelist
    Remove {
        #[arg(value_delimiter = ',', required = true)]
        addresses: Vec<Address>,
    },
    /// Publish a Merkle root to the sale contract
    SetRoot {
        /// Root as hex
        #[arg(long, conflicts_with = "root_file", required_unless_present = "root_file")]
        root: Option<String>,
        /// Root file written by `build-tree`
        #[arg(long)]
        root_file: Option<PathBuf>,
    },
    /// Show the total number of NFTs minted
    TotalMinted,
    /// Withdraw the sale balance to the owner
    Withdraw,
}

impl Cli {
    fn config(&self) -> Config {
        Config::new(self.sale_address, self.nft_address, self.account)
            .with_rpc_url(&self.rpc_url)
            .with_receipt_timing(
                Duration::from_secs(self.poll_interval_secs),
                Duration::from_secs(self.receipt_timeout_secs),
            )
    }
}

fn load_root(root: Option<&str>, root_file: Option<&PathBuf>) -> Result<Hash32> {
    match (root, root_file) {
        (Some(hex_root), _) => parse_hash32(hex_root).context("Invalid Merkle root"),
        (None, Some(path)) => {
            let content = std::fs::read_to_string(path).context("Failed to read root file")?;
            parse_hash32(&content).context("Invalid Merkle root in file")
        }
        (None, None) => anyhow::bail!("Provide --root or --root-file"),
    }
}

fn load_own_proof(path: &PathBuf, account: &Address) -> Result<Vec<Hash32>> {
    let proofs = read_proof_map(path)?;
    let entry = proofs
        .get(&account.to_string())
        .with_context(|| format!("{} has no proof in {:?}", account.to_checksum(), path))?;
    entry
        .iter()
        .map(|element| parse_hash32(element).context("Invalid proof element"))
        .collect()
}

fn print_commands<T: ChainTransport>(console: &Console<T>) {
    println!("Logged in as: {}", console.account().to_checksum());
    println!("Role: {}", console.role());
    for (idx, kind) in CommandKind::available(console.role()).iter().enumerate() {
        println!("{}. {}", idx + 1, kind.label());
    }
}

pub fn run(args: Cli) -> Result<()> {
    let config = args.config();
    let transport = JsonRpcTransport::new(&config);
    let client = SaleClient::new(transport, &config);
    let console = Console::connect(client).context("Failed to resolve account role")?;

    let (command, confirmed) = match args.command {
        Command::Commands => {
            print_commands(&console);
            return Ok(());
        }
        Command::CheckWhitelist { address } => (SaleCommand::CheckWhitelist { address }, true),
        Command::Minted { address } => (SaleCommand::Minted { address }, true),
        Command::Mint { quantity, yes } => (
            SaleCommand::Mint {
                quantity: U256::from(quantity),
            },
            yes,
        ),
        Command::MintWithProof {
            quantity,
            proofs,
            yes,
        } => {
            let proof = load_own_proof(&proofs, &console.account())?;
            let quantity = U256::from(quantity);
            (SaleCommand::MintWithProof { quantity, proof }, yes)
        }
        Command::Add { addresses } => (SaleCommand::AddToWhitelist { addresses }, true),
        Command::Remove { addresses } => (SaleCommand::RemoveFromWhitelist { addresses }, true),
        Command::SetRoot { root, root_file } => {
            let root = load_root(root.as_deref(), root_file.as_ref())?;
            (SaleCommand::SetRoot { root }, true)
        }
        Command::TotalMinted => (SaleCommand::TotalMinted, true),
        Command::Withdraw => (SaleCommand::Withdraw, true),
    };

    if !confirmed {
        let cost = console.quote(&command)?;
        println!("Total cost: {} ETH", format_ether(cost));
        println!("Re-run with --yes to submit the transaction.");
        return Ok(());
    }

    match console.execute(command) {
        Ok(outcome) => {
            println!("{}", outcome);
            Ok(())
        }
        Err(ConsoleError::Submit(SubmitError::InsufficientFunds { message })) => {
            anyhow::bail!("Insufficient funds! ({})", message)
        }
        Err(err) => Err(err.into()),
    }
}
