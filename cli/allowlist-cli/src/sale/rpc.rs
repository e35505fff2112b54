use std::cell::Cell;
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::address::Address;
use crate::common::{hex_encode, parse_hash32};
use crate::config::Config;
use crate::sale::transport::{CallRequest, ChainTransport, Receipt, SubmitError};

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReceiptResponse {
    transaction_hash: String,
    block_number: Option<String>,
    gas_used: Option<String>,
    status: Option<String>,
}

/// Ethereum JSON-RPC transport over blocking HTTP.
///
/// Transactions are sent with `eth_sendTransaction`, so the node signs for
/// the configured account.
pub struct JsonRpcTransport {
    client: Client,
    rpc_url: String,
    poll_interval: Duration,
    receipt_timeout: Duration,
    next_id: Cell<u64>,
}

impl JsonRpcTransport {
    pub fn new(config: &Config) -> Self {
        JsonRpcTransport {
            client: Client::new(),
            rpc_url: config.rpc_url.clone(),
            poll_interval: config.receipt_poll_interval,
            receipt_timeout: config.receipt_timeout,
            next_id: Cell::new(1),
        }
    }

    fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, SubmitError> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!(method, id, "sending JSON-RPC request");

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .map_err(|e| SubmitError::Transport(format!("{} failed: {}", method, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(SubmitError::Transport(format!(
                "HTTP {} from {}: {}",
                status, self.rpc_url, error_text
            )));
        }

        let rpc: RpcResponse = response
            .json()
            .map_err(|e| SubmitError::Decode(format!("{} response: {}", method, e)))?;

        if let Some(error) = rpc.error {
            return Err(SubmitError::from_rpc(
                error.code,
                &error.message,
                error.data.as_ref(),
            ));
        }

        serde_json::from_value(rpc.result)
            .map_err(|e| SubmitError::Decode(format!("{} result: {}", method, e)))
    }

    fn wait_for_receipt(&self, tx_hash: &str) -> Result<Receipt, SubmitError> {
        let started = Instant::now();
        loop {
            let receipt: Option<ReceiptResponse> =
                self.request("eth_getTransactionReceipt", json!([tx_hash]))?;
            if let Some(receipt) = receipt {
                return parse_receipt(receipt);
            }
            if started.elapsed() >= self.receipt_timeout {
                return Err(SubmitError::ReceiptTimeout {
                    tx_hash: tx_hash.to_string(),
                });
            }
            std::thread::sleep(self.poll_interval);
        }
    }
}

impl ChainTransport for JsonRpcTransport {
    fn call(&self, to: &Address, data: &[u8]) -> Result<Vec<u8>, SubmitError> {
        let result: String = self.request(
            "eth_call",
            json!([{ "to": to.to_string(), "data": hex_encode(data) }, "latest"]),
        )?;
        hex::decode(result.trim_start_matches("0x"))
            .map_err(|e| SubmitError::Decode(format!("eth_call data: {}", e)))
    }

    fn send(&self, request: &CallRequest) -> Result<Receipt, SubmitError> {
        let tx_hash: String = self.request(
            "eth_sendTransaction",
            json!([{
                "from": request.from.to_string(),
                "to": request.to.to_string(),
                "data": hex_encode(&request.data),
                "value": format!("0x{:x}", request.value),
            }]),
        )?;
        info!(%tx_hash, "transaction sent");

        let receipt = self.wait_for_receipt(&tx_hash)?;
        if !receipt.success {
            return Err(SubmitError::Failed { tx_hash });
        }
        info!(%tx_hash, block = ?receipt.block_number, "transaction mined");
        Ok(receipt)
    }
}

fn parse_quantity(field: &str, value: &str) -> Result<u64, SubmitError> {
    u64::from_str_radix(value.trim_start_matches("0x"), 16)
        .map_err(|e| SubmitError::Decode(format!("{} {:?}: {}", field, value, e)))
}

fn parse_receipt(receipt: ReceiptResponse) -> Result<Receipt, SubmitError> {
    let transaction_hash = parse_hash32(&receipt.transaction_hash)
        .map_err(|e| SubmitError::Decode(format!("transactionHash: {}", e)))?;
    let block_number = receipt
        .block_number
        .as_deref()
        .map(|v| parse_quantity("blockNumber", v))
        .transpose()?;
    let gas_used = receipt
        .gas_used
        .as_deref()
        .map(|v| parse_quantity("gasUsed", v))
        .transpose()?;
    // pre-Byzantium receipts carry no status
    let success = match receipt.status.as_deref() {
        Some(status) => parse_quantity("status", status)? == 1,
        None => true,
    };

    Ok(Receipt {
        transaction_hash,
        block_number,
        gas_used,
        success,
    })
}
