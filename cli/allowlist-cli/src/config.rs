use std::time::Duration;

use crate::address::Address;

pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_RECEIPT_TIMEOUT: Duration = Duration::from_secs(120);

/// Everything the sale client needs to reach the chain, passed in explicitly.
#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_url: String,
    pub sale_address: Address,
    pub nft_address: Address,
    /// Node-managed account that sends transactions and is checked for ownership.
    pub account: Address,
    pub receipt_poll_interval: Duration,
    pub receipt_timeout: Duration,
}

impl Config {
    pub fn new(sale_address: Address, nft_address: Address, account: Address) -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            sale_address,
            nft_address,
            account,
            receipt_poll_interval: DEFAULT_POLL_INTERVAL,
            receipt_timeout: DEFAULT_RECEIPT_TIMEOUT,
        }
    }

    pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = rpc_url.into();
        self
    }

    pub fn with_receipt_timing(mut self, poll_interval: Duration, timeout: Duration) -> Self {
        self.receipt_poll_interval = poll_interval;
        self.receipt_timeout = timeout;
        self
    }
}
