use alloy_primitives::U256;
use alloy_sol_types::{Revert, SolError};
use serde_json::Value;
use thiserror::Error;

use crate::address::Address;
use crate::common::{hex_encode, Hash32};

/// JSON-RPC code geth uses for execution reverts that carry revert data.
const EXECUTION_REVERTED: i64 = 3;
/// Generic server error code, used among others for rejected transactions.
const SERVER_ERROR: i64 = -32000;

/// Failures on the transaction path. Kept apart from `MerkleError` so callers
/// can tell a bad allowlist from a bad submission.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Insufficient funds: {message}")]
    InsufficientFunds { message: String },

    #[error("Execution reverted: {reason}")]
    Reverted { reason: String },

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Timed out waiting for receipt of {tx_hash}")]
    ReceiptTimeout { tx_hash: String },

    #[error("Transaction {tx_hash} was mined but failed")]
    Failed { tx_hash: String },
}

impl SubmitError {
    /// Maps a JSON-RPC error object onto a typed failure.
    pub fn from_rpc(code: i64, message: &str, data: Option<&Value>) -> Self {
        if code == EXECUTION_REVERTED || message.starts_with("execution reverted") {
            let reason = data
                .and_then(Value::as_str)
                .and_then(|hex_data| hex::decode(hex_data.trim_start_matches("0x")).ok())
                .and_then(|bytes| Revert::abi_decode(&bytes, true).ok())
                .map(|revert| revert.reason)
                .unwrap_or_else(|| {
                    message
                        .strip_prefix("execution reverted: ")
                        .unwrap_or(message)
                        .to_string()
                });
            return SubmitError::Reverted { reason };
        }

        if code == SERVER_ERROR && message.to_ascii_lowercase().starts_with("insufficient funds") {
            return SubmitError::InsufficientFunds {
                message: message.to_string(),
            };
        }

        SubmitError::Rpc {
            code,
            message: message.to_string(),
        }
    }

    pub fn is_insufficient_funds(&self) -> bool {
        matches!(self, SubmitError::InsufficientFunds { .. })
    }
}

impl From<alloy_sol_types::Error> for SubmitError {
    fn from(err: alloy_sol_types::Error) -> Self {
        SubmitError::Decode(err.to_string())
    }
}

/// A state-changing contract call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub from: Address,
    pub to: Address,
    pub data: Vec<u8>,
    /// Attached value in wei.
    pub value: U256,
}

/// Outcome of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub transaction_hash: Hash32,
    pub block_number: Option<u64>,
    pub gas_used: Option<u64>,
    pub success: bool,
}

impl Receipt {
    pub fn tx_hash_hex(&self) -> String {
        hex_encode(self.transaction_hash)
    }
}

/// The channel through which contract calls reach the chain.
pub trait ChainTransport {
    /// Executes a read-only call and returns the raw return data.
    fn call(&self, to: &Address, data: &[u8]) -> Result<Vec<u8>, SubmitError>;

    /// Submits a transaction and waits for its receipt.
    fn send(&self, request: &CallRequest) -> Result<Receipt, SubmitError>;
}

impl<T: ChainTransport + ?Sized> ChainTransport for &T {
    fn call(&self, to: &Address, data: &[u8]) -> Result<Vec<u8>, SubmitError> {
        (**self).call(to, data)
    }

    fn send(&self, request: &CallRequest) -> Result<Receipt, SubmitError> {
        (**self).send(request)
    }
}
