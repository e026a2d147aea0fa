//! Wallet provider boundary
//!
//! The capability set any wallet-injected (or node-managed) provider must
//! offer the governance client. [`crate::rpc::JsonRpcProvider`] implements
//! it over Ethereum JSON-RPC; tests use in-memory providers.

use async_trait::async_trait;
use lair_core::{Address, TxHash, U256};
use thiserror::Error;

/// EIP-1193 "user rejected request"
pub const USER_REJECTED_CODE: i64 = 4001;

/// EIP-3326 "unrecognized chain id"
pub const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("User rejected request: {0}")]
    UserRejected(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Classify a JSON-RPC error object
    pub fn from_rpc(code: i64, message: String) -> Self {
        if code == USER_REJECTED_CODE {
            ProviderError::UserRejected(message)
        } else {
            ProviderError::Rpc { code, message }
        }
    }
}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTag {
    Earliest,
    Latest,
    Number(u64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockHeader {
    pub number: u64,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<TxHash>,
    pub data: Vec<u8>,
    pub block_number: Option<u64>,
    pub transaction_hash: Option<TxHash>,
    pub log_index: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogFilter {
    pub address: Address,
    /// Only topic0 (the event signature) is filtered on
    pub topic0: Option<TxHash>,
    pub from_block: BlockTag,
    pub to_block: BlockTag,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallRequest {
    pub from: Option<Address>,
    pub to: Address,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    pub data: Vec<u8>,
    pub value: U256,
    pub gas: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionReceipt {
    pub transaction_hash: TxHash,
    pub block_number: u64,
    /// `false` when the transaction was mined but execution reverted
    pub status: bool,
    pub gas_used: U256,
    pub logs: Vec<Log>,
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Ask the wallet for account access (`eth_requestAccounts`)
    async fn request_accounts(&self) -> ProviderResult<Vec<Address>>;

    async fn chain_id(&self) -> ProviderResult<u64>;

    /// Ask the wallet to switch networks (`wallet_switchEthereumChain`)
    async fn switch_chain(&self, chain_id: u64) -> ProviderResult<()>;

    async fn block_number(&self) -> ProviderResult<u64>;

    async fn block(&self, number: u64) -> ProviderResult<Option<BlockHeader>>;

    async fn logs(&self, filter: &LogFilter) -> ProviderResult<Vec<Log>>;

    /// Read-only contract call (`eth_call` at `latest`)
    async fn call(&self, request: &CallRequest) -> ProviderResult<Vec<u8>>;

    /// Sign and broadcast; returns as soon as the wallet hands back a hash
    async fn send_transaction(&self, request: &TransactionRequest) -> ProviderResult<TxHash>;

    async fn transaction_receipt(&self, hash: &TxHash) -> ProviderResult<Option<TransactionReceipt>>;
}
