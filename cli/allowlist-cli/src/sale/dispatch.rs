//! Role-gated sale commands.
//!
//! Each [`SaleCommand`] maps to a [`CommandKind`]; the [`COMMANDS`] table says
//! which roles may run it. Dispatch checks the table before any chain call.

use std::fmt;

use alloy_primitives::U256;
use thiserror::Error;
use tracing::{debug, info};

use crate::address::Address;
use crate::common::Hash32;
use crate::error::MerkleError;
use crate::sale::contract::SaleClient;
use crate::sale::transport::{ChainTransport, Receipt, SubmitError};

const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Owner,
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Owner => write!(f, "OWNER"),
            Role::User => write!(f, "USER"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    CheckWhitelist,
    Minted,
    Mint,
    MintWithProof,
    AddToWhitelist,
    RemoveFromWhitelist,
    SetRoot,
    TotalMinted,
    Withdraw,
}

const ANY: &[Role] = &[Role::Owner, Role::User];
const OWNER_ONLY: &[Role] = &[Role::Owner];
const USER_ONLY: &[Role] = &[Role::User];

/// Command table: kind, label, roles allowed to run it.
pub const COMMANDS: &[(CommandKind, &str, &[Role])] = &[
    (CommandKind::CheckWhitelist, "Check whitelist", ANY),
    (CommandKind::Minted, "Minted NFTs", ANY),
    (CommandKind::Mint, "Mint NFT", USER_ONLY),
    (CommandKind::MintWithProof, "Mint NFT with Merkle proof", USER_ONLY),
    (CommandKind::AddToWhitelist, "Add to whitelist", OWNER_ONLY),
    (CommandKind::RemoveFromWhitelist, "Remove from whitelist", OWNER_ONLY),
    (CommandKind::SetRoot, "Set Merkle root", OWNER_ONLY),
    (CommandKind::TotalMinted, "Total minted", OWNER_ONLY),
    (CommandKind::Withdraw, "Withdraw ETH", OWNER_ONLY),
];

impl CommandKind {
    fn entry(self) -> Option<&'static (CommandKind, &'static str, &'static [Role])> {
        COMMANDS.iter().find(|(kind, _, _)| *kind == self)
    }

    pub fn label(self) -> &'static str {
        self.entry().map_or("unknown command", |entry| entry.1)
    }

    pub fn permits(self, role: Role) -> bool {
        self.entry().is_some_and(|(_, _, roles)| roles.contains(&role))
    }

    /// Commands `role` may run, in table order.
    pub fn available(role: Role) -> Vec<CommandKind> {
        COMMANDS
            .iter()
            .filter(|(_, _, roles)| roles.contains(&role))
            .map(|(kind, _, _)| *kind)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaleCommand {
    /// Users always check their own account; owners may pass any address.
    CheckWhitelist { address: Option<Address> },
    Minted { address: Option<Address> },
    Mint { quantity: U256 },
    MintWithProof { quantity: U256, proof: Vec<Hash32> },
    AddToWhitelist { addresses: Vec<Address> },
    RemoveFromWhitelist { addresses: Vec<Address> },
    SetRoot { root: Hash32 },
    TotalMinted,
    Withdraw,
}

impl SaleCommand {
    pub fn kind(&self) -> CommandKind {
        match self {
            SaleCommand::CheckWhitelist { .. } => CommandKind::CheckWhitelist,
            SaleCommand::Minted { .. } => CommandKind::Minted,
            SaleCommand::Mint { .. } => CommandKind::Mint,
            SaleCommand::MintWithProof { .. } => CommandKind::MintWithProof,
            SaleCommand::AddToWhitelist { .. } => CommandKind::AddToWhitelist,
            SaleCommand::RemoveFromWhitelist { .. } => CommandKind::RemoveFromWhitelist,
            SaleCommand::SetRoot { .. } => CommandKind::SetRoot,
            SaleCommand::TotalMinted => CommandKind::TotalMinted,
            SaleCommand::Withdraw => CommandKind::Withdraw,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("{command} is not available to the {role} role")]
    NotPermitted { command: &'static str, role: Role },

    #[error("{0} is not whitelisted")]
    NotWhitelisted(Address),

    #[error("Already minted {already_minted}, requesting {requested} exceeds the wallet limit of {max}")]
    ExceedsWalletLimit {
        already_minted: U256,
        requested: U256,
        max: U256,
    },

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("No addresses given")]
    NoAddresses,

    #[error(transparent)]
    Submit(#[from] SubmitError),

    #[error(transparent)]
    Merkle(#[from] MerkleError),
}

/// Result of a dispatched command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Whitelisted { address: Address, whitelisted: bool },
    Minted { address: Address, count: U256 },
    TotalMinted(U256),
    Submitted { receipt: Receipt, value: U256 },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Whitelisted {
                address,
                whitelisted,
            } => {
                let status = if *whitelisted {
                    "whitelisted"
                } else {
                    "not whitelisted"
                };
                write!(f, "{} is {}", address.to_checksum(), status)
            }
            Outcome::Minted { address, count } => {
                write!(f, "{} has minted {} NFTs", address.to_checksum(), count)
            }
            Outcome::TotalMinted(count) => write!(f, "Total NFTs minted: {}", count),
            Outcome::Submitted { receipt, value } => {
                write!(f, "Transaction {} mined", receipt.tx_hash_hex())?;
                if let Some(block) = receipt.block_number {
                    write!(f, " in block {}", block)?;
                }
                if !value.is_zero() {
                    write!(f, " (paid {} ETH)", format_ether(*value))?;
                }
                Ok(())
            }
        }
    }
}

/// Renders a wei amount as decimal ether without trailing zeros.
pub fn format_ether(wei: U256) -> String {
    let unit = U256::from(WEI_PER_ETHER);
    let whole = wei / unit;
    let fraction = (wei % unit).to::<u128>();
    if fraction == 0 {
        return whole.to_string();
    }
    let digits = format!("{:018}", fraction);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

/// Sale client bound to the caller's role.
pub struct Console<T> {
    client: SaleClient<T>,
    role: Role,
}

impl<T: ChainTransport> Console<T> {
    /// Resolves the caller's role by comparing its account with the NFT owner.
    pub fn connect(client: SaleClient<T>) -> Result<Self, ConsoleError> {
        let owner = client.owner()?;
        let role = if owner == client.account() {
            Role::Owner
        } else {
            Role::User
        };
        info!(account = %client.account(), %role, "console connected");
        Ok(Console { client, role })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn account(&self) -> Address {
        self.client.account()
    }

    /// Total cost in wei of minting `quantity` tokens, after checking the
    /// caller's wallet limit.
    pub fn quote_mint(&self, quantity: U256) -> Result<U256, ConsoleError> {
        if quantity.is_zero() {
            return Err(ConsoleError::InvalidQuantity(
                "quantity must be at least 1".to_string(),
            ));
        }

        let max = self.client.max_per_wallet()?;
        let already_minted = self.client.minted_per_wallet(&self.account())?;
        if already_minted.saturating_add(quantity) > max {
            return Err(ConsoleError::ExceedsWalletLimit {
                already_minted,
                requested: quantity,
                max,
            });
        }

        let price = self.client.price_per_nft()?;
        price.checked_mul(quantity).ok_or_else(|| {
            ConsoleError::InvalidQuantity(format!("cost of {} tokens overflows", quantity))
        })
    }

    fn authorize(&self, kind: CommandKind) -> Result<(), ConsoleError> {
        if kind.permits(self.role) {
            Ok(())
        } else {
            Err(ConsoleError::NotPermitted {
                command: kind.label(),
                role: self.role,
            })
        }
    }

    fn require_whitelisted(&self) -> Result<(), ConsoleError> {
        let account = self.account();
        if self.client.is_whitelisted(&account)? {
            Ok(())
        } else {
            Err(ConsoleError::NotWhitelisted(account))
        }
    }

    /// Runs every pre-check of `command` without submitting anything and
    /// returns the value in wei it would attach.
    pub fn quote(&self, command: &SaleCommand) -> Result<U256, ConsoleError> {
        self.authorize(command.kind())?;
        match command {
            SaleCommand::Mint { quantity } => {
                self.require_whitelisted()?;
                self.quote_mint(*quantity)
            }
            SaleCommand::MintWithProof { quantity, .. } => self.quote_mint(*quantity),
            _ => Ok(U256::ZERO),
        }
    }

    pub fn execute(&self, command: SaleCommand) -> Result<Outcome, ConsoleError> {
        let kind = command.kind();
        self.authorize(kind)?;
        debug!(command = kind.label(), role = %self.role, "dispatching");

        match command {
            SaleCommand::CheckWhitelist { address } => {
                let address = self.target(address);
                let whitelisted = self.client.is_whitelisted(&address)?;
                Ok(Outcome::Whitelisted {
                    address,
                    whitelisted,
                })
            }
            SaleCommand::Minted { address } => {
                let address = self.target(address);
                let count = self.client.minted_per_wallet(&address)?;
                Ok(Outcome::Minted { address, count })
            }
            SaleCommand::Mint { quantity } => {
                self.require_whitelisted()?;
                let value = self.quote_mint(quantity)?;
                let receipt = self.client.mint(quantity, value)?;
                Ok(Outcome::Submitted { receipt, value })
            }
            SaleCommand::MintWithProof { quantity, proof } => {
                let value = self.quote_mint(quantity)?;
                let receipt = self.client.mint_with_proof(quantity, &proof, value)?;
                Ok(Outcome::Submitted { receipt, value })
            }
            SaleCommand::AddToWhitelist { addresses } => {
                if addresses.is_empty() {
                    return Err(ConsoleError::NoAddresses);
                }
                let receipt = self.client.add_to_whitelist(&addresses)?;
                Ok(Outcome::Submitted {
                    receipt,
                    value: U256::ZERO,
                })
            }
            SaleCommand::RemoveFromWhitelist { addresses } => {
                if addresses.is_empty() {
                    return Err(ConsoleError::NoAddresses);
                }
                let receipt = self.client.remove_from_whitelist(&addresses)?;
                Ok(Outcome::Submitted {
                    receipt,
                    value: U256::ZERO,
                })
            }
            SaleCommand::SetRoot { root } => {
                let receipt = self.client.set_merkle_root(&root)?;
                Ok(Outcome::Submitted {
                    receipt,
                    value: U256::ZERO,
                })
            }
            SaleCommand::TotalMinted => Ok(Outcome::TotalMinted(self.client.total_minted()?)),
            SaleCommand::Withdraw => {
                let receipt = self.client.withdraw()?;
                Ok(Outcome::Submitted {
                    receipt,
                    value: U256::ZERO,
                })
            }
        }
    }

    fn target(&self, requested: Option<Address>) -> Address {
        match (self.role, requested) {
            (Role::Owner, Some(address)) => address,
            _ => self.account(),
        }
    }
}
