//! JSON-RPC wallet provider
//!
//! Thin client for an Ethereum node or signer that manages the user's
//! accounts (a local dev node, Frame, Clef...). Signing prompts happen on
//! the signer's side; a refusal comes back as EIP-1193 error 4001.

use async_trait::async_trait;
use lair_core::abi::{self, ParamType};
use lair_core::{Address, TxHash, U256};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::provider::{
    BlockHeader, BlockTag, CallRequest, Log, LogFilter, ProviderError, ProviderResult,
    TransactionReceipt, TransactionRequest, WalletProvider,
};

/// JSON-RPC "method not found"
const METHOD_NOT_FOUND_CODE: i64 = -32601;

/// Selector of Solidity's `Error(string)` revert payload
const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

#[derive(Debug)]
pub struct JsonRpcProvider {
    endpoint: String,
    client: Client,
    next_id: AtomicU64,
}

impl JsonRpcProvider {
    pub fn new(endpoint: impl Into<String>, request_timeout: Duration) -> ProviderResult<Self> {
        let endpoint = endpoint.into();
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        log::info!("📡 JSON-RPC provider initialized: {}", endpoint);
        Ok(Self {
            endpoint,
            client,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request(&self, method: &str, params: Value) -> ProviderResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        log::debug!("→ {} (id {})", method, id);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    ProviderError::Unavailable(format!("{}: {}", self.endpoint, e))
                } else {
                    ProviderError::Transport(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            log::error!("❌ {} failed: HTTP {}", method, response.status());
            return Err(ProviderError::Transport(format!("HTTP {}", response.status())));
        }

        let envelope: RpcResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        envelope.into_result()
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl RpcResponse {
    fn into_result(self) -> ProviderResult<Value> {
        if let Some(err) = self.error {
            let message = match err.data.as_ref().and_then(revert_reason) {
                Some(reason) => format!("{}: {}", err.message, reason),
                None => err.message,
            };
            log::warn!("⚠️ RPC error {}: {}", err.code, message);
            return Err(ProviderError::from_rpc(err.code, message));
        }
        Ok(self.result.unwrap_or(Value::Null))
    }
}

/// Extract the reason string from an `Error(string)` revert payload
fn revert_reason(data: &Value) -> Option<String> {
    let raw = match data {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map.get("data")?.as_str()?,
        _ => return None,
    };
    let bytes = hex::decode(raw.trim_start_matches("0x")).ok()?;
    if bytes.len() < 4 || bytes[..4] != ERROR_STRING_SELECTOR {
        return None;
    }
    abi::decode(&[ParamType::String], &bytes[4..])
        .ok()?
        .pop()?
        .into_string()
        .ok()
}

// ============================================================================
// Wire format helpers
// ============================================================================

fn quantity(value: u64) -> String {
    format!("0x{:x}", value)
}

fn big_quantity(value: &U256) -> String {
    format!("{:#x}", value)
}

fn data_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn block_tag(tag: BlockTag) -> String {
    match tag {
        BlockTag::Earliest => "earliest".to_string(),
        BlockTag::Latest => "latest".to_string(),
        BlockTag::Number(n) => quantity(n),
    }
}

fn parse_quantity(raw: &str) -> ProviderResult<u64> {
    u64::from_str_radix(raw.trim_start_matches("0x"), 16)
        .map_err(|e| ProviderError::InvalidResponse(format!("quantity {}: {}", raw, e)))
}

fn parse_big_quantity(raw: &str) -> ProviderResult<U256> {
    let digits = raw.trim_start_matches("0x");
    if digits.is_empty() {
        return Ok(U256::default());
    }
    U256::parse_bytes(digits.as_bytes(), 16)
        .ok_or_else(|| ProviderError::InvalidResponse(format!("quantity {}", raw)))
}

fn parse_data(raw: &str) -> ProviderResult<Vec<u8>> {
    hex::decode(raw.trim_start_matches("0x"))
        .map_err(|e| ProviderError::InvalidResponse(format!("data: {}", e)))
}

fn parse_hash(raw: &str) -> ProviderResult<TxHash> {
    raw.parse()
        .map_err(|e| ProviderError::InvalidResponse(format!("hash {}: {}", raw, e)))
}

fn parse_address(raw: &str) -> ProviderResult<Address> {
    raw.parse()
        .map_err(|e| ProviderError::InvalidResponse(format!("address {}: {}", raw, e)))
}

fn from_value<T: for<'de> Deserialize<'de>>(value: Value) -> ProviderResult<T> {
    serde_json::from_value(value).map_err(|e| ProviderError::InvalidResponse(e.to_string()))
}

#[derive(Debug, Deserialize)]
struct WireBlock {
    number: String,
    timestamp: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireLog {
    address: String,
    topics: Vec<String>,
    data: String,
    #[serde(default)]
    block_number: Option<String>,
    #[serde(default)]
    transaction_hash: Option<String>,
    #[serde(default)]
    log_index: Option<String>,
}

impl WireLog {
    fn into_log(self) -> ProviderResult<Log> {
        Ok(Log {
            address: parse_address(&self.address)?,
            topics: self
                .topics
                .iter()
                .map(|t| parse_hash(t))
                .collect::<ProviderResult<Vec<_>>>()?,
            data: parse_data(&self.data)?,
            block_number: self.block_number.as_deref().map(parse_quantity).transpose()?,
            transaction_hash: self.transaction_hash.as_deref().map(parse_hash).transpose()?,
            log_index: self.log_index.as_deref().map(parse_quantity).transpose()?,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireReceipt {
    transaction_hash: String,
    block_number: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    gas_used: Option<String>,
    #[serde(default)]
    logs: Vec<WireLog>,
}

impl WireReceipt {
    fn into_receipt(self) -> ProviderResult<TransactionReceipt> {
        Ok(TransactionReceipt {
            transaction_hash: parse_hash(&self.transaction_hash)?,
            block_number: parse_quantity(&self.block_number)?,
            // Pre-Byzantium receipts carry no status; treat them as successful
            status: match self.status.as_deref() {
                Some(s) => parse_quantity(s)? == 1,
                None => true,
            },
            gas_used: match self.gas_used.as_deref() {
                Some(g) => parse_big_quantity(g)?,
                None => U256::default(),
            },
            logs: self
                .logs
                .into_iter()
                .map(WireLog::into_log)
                .collect::<ProviderResult<Vec<_>>>()?,
        })
    }
}

#[async_trait]
impl WalletProvider for JsonRpcProvider {
    async fn request_accounts(&self) -> ProviderResult<Vec<Address>> {
        let result = match self.request("eth_requestAccounts", json!([])).await {
            // Plain nodes don't implement the wallet method
            Err(ProviderError::Rpc { code, .. }) if code == METHOD_NOT_FOUND_CODE => {
                self.request("eth_accounts", json!([])).await?
            }
            other => other?,
        };
        let accounts: Vec<String> = from_value(result)?;
        accounts.iter().map(|a| parse_address(a)).collect()
    }

    async fn chain_id(&self) -> ProviderResult<u64> {
        let result: String = from_value(self.request("eth_chainId", json!([])).await?)?;
        parse_quantity(&result)
    }

    async fn switch_chain(&self, chain_id: u64) -> ProviderResult<()> {
        self.request(
            "wallet_switchEthereumChain",
            json!([{ "chainId": quantity(chain_id) }]),
        )
        .await?;
        Ok(())
    }

    async fn block_number(&self) -> ProviderResult<u64> {
        let result: String = from_value(self.request("eth_blockNumber", json!([])).await?)?;
        parse_quantity(&result)
    }

    async fn block(&self, number: u64) -> ProviderResult<Option<BlockHeader>> {
        let result = self
            .request("eth_getBlockByNumber", json!([quantity(number), false]))
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        let block: WireBlock = from_value(result)?;
        Ok(Some(BlockHeader {
            number: parse_quantity(&block.number)?,
            timestamp: parse_quantity(&block.timestamp)?,
        }))
    }

    async fn logs(&self, filter: &LogFilter) -> ProviderResult<Vec<Log>> {
        let topics: Vec<Value> = filter
            .topic0
            .iter()
            .map(|t| Value::String(t.to_hex()))
            .collect();
        let params = json!([{
            "address": filter.address.to_hex(),
            "topics": topics,
            "fromBlock": block_tag(filter.from_block),
            "toBlock": block_tag(filter.to_block),
        }]);
        let logs: Vec<WireLog> = from_value(self.request("eth_getLogs", params).await?)?;
        log::debug!("✅ Retrieved {} logs", logs.len());
        logs.into_iter().map(WireLog::into_log).collect()
    }

    async fn call(&self, request: &CallRequest) -> ProviderResult<Vec<u8>> {
        let mut call = json!({
            "to": request.to.to_hex(),
            "data": data_hex(&request.data),
        });
        if let Some(from) = request.from {
            call["from"] = Value::String(from.to_hex());
        }
        let result: String = from_value(self.request("eth_call", json!([call, "latest"])).await?)?;
        parse_data(&result)
    }

    async fn send_transaction(&self, request: &TransactionRequest) -> ProviderResult<TxHash> {
        let mut tx = json!({
            "from": request.from.to_hex(),
            "to": request.to.to_hex(),
            "data": data_hex(&request.data),
            "value": big_quantity(&request.value),
        });
        if let Some(gas) = request.gas {
            tx["gas"] = Value::String(quantity(gas));
        }
        let result: String = from_value(self.request("eth_sendTransaction", json!([tx])).await?)?;
        let hash = parse_hash(&result)?;
        log::info!("✅ Transaction submitted: {}", hash);
        Ok(hash)
    }

    async fn transaction_receipt(&self, hash: &TxHash) -> ProviderResult<Option<TransactionReceipt>> {
        let result = self
            .request("eth_getTransactionReceipt", json!([hash.to_hex()]))
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        let receipt: WireReceipt = from_value(result)?;
        receipt.into_receipt().map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lair_core::abi::{encode, Token};

    #[test]
    fn test_quantity_formatting() {
        assert_eq!(quantity(5), "0x5");
        assert_eq!(big_quantity(&U256::from(1_500_000_000_000u64)), "0x15d3ef79800");
        assert_eq!(big_quantity(&U256::default()), "0x0");
        assert_eq!(block_tag(BlockTag::Number(0)), "0x0");
        assert_eq!(block_tag(BlockTag::Latest), "latest");
    }

    #[test]
    fn test_quantity_parsing() {
        assert_eq!(parse_quantity("0x1f4").unwrap(), 500);
        assert!(parse_quantity("0xzz").is_err());
        assert_eq!(parse_big_quantity("0x").unwrap(), U256::default());
        assert_eq!(parse_big_quantity("0xde0b6b3a7640000").unwrap(), U256::from(10u64.pow(18)));
    }

    #[test]
    fn test_revert_reason_extraction() {
        let mut payload = ERROR_STRING_SELECTOR.to_vec();
        payload.extend(encode(&[Token::String("Governor: proposal not successful".into())]));
        let data = Value::String(data_hex(&payload));

        assert_eq!(
            revert_reason(&data).as_deref(),
            Some("Governor: proposal not successful")
        );
        assert!(revert_reason(&json!({ "data": data_hex(&payload) })).is_some());
        assert_eq!(revert_reason(&Value::String("0x1234".into())), None);
    }

    #[test]
    fn test_error_envelope_maps_user_rejection() {
        let envelope: RpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": 4001, "message": "User denied transaction signature" }
        }))
        .unwrap();
        assert!(matches!(envelope.into_result(), Err(ProviderError::UserRejected(_))));
    }

    #[test]
    fn test_receipt_conversion() {
        let wire: WireReceipt = serde_json::from_value(json!({
            "transactionHash": format!("0x{}", "ab".repeat(32)),
            "blockNumber": "0x10",
            "status": "0x0",
            "gasUsed": "0x5208",
            "logs": [{
                "address": format!("0x{}", "11".repeat(20)),
                "topics": [format!("0x{}", "22".repeat(32))],
                "data": "0x",
                "logIndex": "0x1"
            }]
        }))
        .unwrap();

        let receipt = wire.into_receipt().unwrap();
        assert_eq!(receipt.block_number, 16);
        assert!(!receipt.status);
        assert_eq!(receipt.gas_used, U256::from(21_000u32));
        assert_eq!(receipt.logs.len(), 1);
        assert_eq!(receipt.logs[0].log_index, Some(1));
        assert!(receipt.logs[0].data.is_empty());
    }
}
