//! In-memory wallet provider for session tests

#![allow(dead_code)]

use async_trait::async_trait;
use lair_core::abi::{encode, Token};
use lair_core::{selector, Address, TxHash, U256};
use lair_governance::{
    BlockHeader, CallRequest, ClientConfig, Deployment, DeploymentBook, GovernorContract, Log,
    LogFilter, ProviderError, ProviderResult, TransactionReceipt, TransactionRequest,
    WalletProvider,
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

pub const CHAIN_ID: u64 = 5;
pub const GENESIS_TIME: u64 = 1_600_000_000;
pub const BLOCK_TIME: u64 = 12;

pub fn account() -> Address {
    Address([0xa1; 20])
}

pub fn governor() -> Address {
    Address([0x90; 20])
}

pub fn token() -> Address {
    Address([0x70; 20])
}

pub fn deployments() -> DeploymentBook {
    let mut book = DeploymentBook::new();
    book.insert(CHAIN_ID, Deployment::new(governor(), token()));
    book
}

pub fn config() -> ClientConfig {
    ClientConfig {
        chain_id: CHAIN_ID,
        confirmation_timeout_secs: 5,
        poll_interval_ms: 10,
        ..ClientConfig::default()
    }
}

/// `ProposalCreated` log for a single-action proposal
pub fn created_log(id: u64, start_block: u64, end_block: u64, description: &str) -> Log {
    let data = encode(&[
        Token::uint(id),
        Token::Address(account()),
        Token::Array(vec![Token::Address(governor())]),
        Token::Array(vec![Token::uint(1_500_000_000u64)]),
        Token::Array(vec![Token::String(String::new())]),
        Token::Array(vec![Token::Bytes(GovernorContract::encode_set_boosted_contract(token()))]),
        Token::uint(start_block),
        Token::uint(end_block),
        Token::String(description.to_string()),
    ]);
    Log {
        address: governor(),
        topics: vec![GovernorContract::proposal_created_topic()],
        data,
        block_number: Some(start_block.saturating_sub(1)),
        transaction_hash: None,
        log_index: Some(0),
    }
}

/// `Action` log as emitted by `contribute()`
pub fn action_log(amount: U256) -> Log {
    let mut initiator = [0u8; 32];
    initiator[12..].copy_from_slice(account().as_bytes());
    Log {
        address: governor(),
        topics: vec![GovernorContract::action_topic(), TxHash(initiator), TxHash([0u8; 32])],
        data: encode(&[
            Token::FixedBytes(vec![0u8; 32]),
            Token::String("CONTRIBUTION RECEIVED".to_string()),
            Token::Uint(amount),
        ]),
        block_number: None,
        transaction_hash: None,
        log_index: None,
    }
}

struct MockState {
    accounts: Vec<Address>,
    chain_id: u64,
    switch_requests: Vec<u64>,
    deny_switch: bool,
    height: u64,
    logs: Vec<Log>,
    logs_calls: usize,
    calls: usize,
    responses: HashMap<[u8; 4], Vec<u8>>,
    send_failures: HashMap<[u8; 4], ProviderError>,
    emitted: HashMap<[u8; 4], Vec<Log>>,
    withhold_receipts: bool,
    sent: Vec<TransactionRequest>,
    receipts: HashMap<TxHash, TransactionReceipt>,
    missing_blocks: HashSet<u64>,
}

pub struct MockProvider {
    state: Mutex<MockState>,
}

impl MockProvider {
    pub fn new(height: u64) -> Self {
        Self {
            state: Mutex::new(MockState {
                accounts: vec![account()],
                chain_id: CHAIN_ID,
                switch_requests: Vec::new(),
                deny_switch: false,
                height,
                logs: Vec::new(),
                logs_calls: 0,
                calls: 0,
                responses: HashMap::new(),
                send_failures: HashMap::new(),
                emitted: HashMap::new(),
                withhold_receipts: false,
                sent: Vec::new(),
                receipts: HashMap::new(),
                missing_blocks: HashSet::new(),
            }),
        }
    }

    pub fn with_chain_id(self, chain_id: u64) -> Self {
        self.state.lock().unwrap().chain_id = chain_id;
        self
    }

    /// Simulate the user changing network in the wallet
    pub fn set_chain_id(&self, chain_id: u64) {
        self.state.lock().unwrap().chain_id = chain_id;
    }

    pub fn deny_switch(&self) {
        self.state.lock().unwrap().deny_switch = true;
    }

    pub fn chain(&self) -> u64 {
        self.state.lock().unwrap().chain_id
    }

    pub fn switch_requests(&self) -> Vec<u64> {
        self.state.lock().unwrap().switch_requests.clone()
    }

    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    pub fn push_log(&self, log: Log) {
        self.state.lock().unwrap().logs.push(log);
    }

    /// Answer `eth_call`s to `signature` with `tokens`
    pub fn respond(&self, signature: &str, tokens: &[Token]) {
        self.state
            .lock()
            .unwrap()
            .responses
            .insert(selector(signature), encode(tokens));
    }

    pub fn fail_send(&self, signature: &str, error: ProviderError) {
        self.state
            .lock()
            .unwrap()
            .send_failures
            .insert(selector(signature), error);
    }

    pub fn clear_send_failure(&self, signature: &str) {
        self.state
            .lock()
            .unwrap()
            .send_failures
            .remove(&selector(signature));
    }

    /// Logs mined with every successful `signature` transaction
    pub fn emit_on(&self, signature: &str, logs: Vec<Log>) {
        self.state
            .lock()
            .unwrap()
            .emitted
            .insert(selector(signature), logs);
    }

    pub fn withhold_receipts(&self) {
        self.state.lock().unwrap().withhold_receipts = true;
    }

    pub fn drop_block(&self, number: u64) {
        self.state.lock().unwrap().missing_blocks.insert(number);
    }

    pub fn logs_calls(&self) -> usize {
        self.state.lock().unwrap().logs_calls
    }

    pub fn sent(&self) -> Vec<TransactionRequest> {
        self.state.lock().unwrap().sent.clone()
    }

    /// Transactions sent for `signature`
    pub fn sent_count(&self, signature: &str) -> usize {
        let wanted = selector(signature);
        self.sent()
            .iter()
            .filter(|tx| tx.data.len() >= 4 && tx.data[..4] == wanted)
            .count()
    }
}

fn selector_of(data: &[u8]) -> [u8; 4] {
    let mut out = [0u8; 4];
    if data.len() >= 4 {
        out.copy_from_slice(&data[..4]);
    }
    out
}

#[async_trait]
impl WalletProvider for MockProvider {
    async fn request_accounts(&self) -> ProviderResult<Vec<Address>> {
        Ok(self.state.lock().unwrap().accounts.clone())
    }

    async fn chain_id(&self) -> ProviderResult<u64> {
        Ok(self.state.lock().unwrap().chain_id)
    }

    async fn switch_chain(&self, chain_id: u64) -> ProviderResult<()> {
        let mut state = self.state.lock().unwrap();
        state.switch_requests.push(chain_id);
        if state.deny_switch {
            return Err(ProviderError::UserRejected("User rejected the request".to_string()));
        }
        state.chain_id = chain_id;
        Ok(())
    }

    async fn block_number(&self) -> ProviderResult<u64> {
        Ok(self.state.lock().unwrap().height)
    }

    async fn block(&self, number: u64) -> ProviderResult<Option<BlockHeader>> {
        let state = self.state.lock().unwrap();
        if number > state.height || state.missing_blocks.contains(&number) {
            return Ok(None);
        }
        Ok(Some(BlockHeader {
            number,
            timestamp: GENESIS_TIME + number * BLOCK_TIME,
        }))
    }

    async fn logs(&self, filter: &LogFilter) -> ProviderResult<Vec<Log>> {
        let mut state = self.state.lock().unwrap();
        state.logs_calls += 1;
        Ok(state
            .logs
            .iter()
            .filter(|log| log.address == filter.address)
            .filter(|log| filter.topic0.is_none() || log.topics.first() == filter.topic0.as_ref())
            .cloned()
            .collect())
    }

    async fn call(&self, request: &CallRequest) -> ProviderResult<Vec<u8>> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        state
            .responses
            .get(&selector_of(&request.data))
            .cloned()
            .ok_or_else(|| ProviderError::Rpc {
                code: -32000,
                message: "execution reverted".to_string(),
            })
    }

    async fn send_transaction(&self, request: &TransactionRequest) -> ProviderResult<TxHash> {
        let mut state = self.state.lock().unwrap();
        let sig = selector_of(&request.data);
        if let Some(error) = state.send_failures.get(&sig) {
            return Err(error.clone());
        }

        state.sent.push(request.clone());
        state.height += 1;
        let mut hash = [0u8; 32];
        hash[24..].copy_from_slice(&(state.sent.len() as u64).to_be_bytes());
        let hash = TxHash(hash);

        let logs = state.emitted.get(&sig).cloned().unwrap_or_default();
        state.logs.extend(logs.iter().cloned());
        let receipt = TransactionReceipt {
            transaction_hash: hash,
            block_number: state.height,
            status: true,
            gas_used: U256::from(100_000u32),
            logs,
        };
        state.receipts.insert(hash, receipt);
        Ok(hash)
    }

    async fn transaction_receipt(&self, hash: &TxHash) -> ProviderResult<Option<TransactionReceipt>> {
        let state = self.state.lock().unwrap();
        if state.withhold_receipts {
            return Ok(None);
        }
        Ok(state.receipts.get(hash).cloned())
    }
}

