//! Governance session
//!
//! A [`GovernanceSession`] is the only way to reach the governor: it can
//! only be obtained from [`GovernanceSession::open`], which fails unless the
//! wallet is connected, on the right network, and the contracts are deployed
//! there. Every read and write afterwards re-checks the network first and
//! switches back if the wallet has wandered off. Everything the session
//! caches (proposals, chain head, voting power) is dropped with it.

use chrono::Utc;
use lair_core::{Address, U256};
use std::sync::Arc;
use std::time::Duration;

use crate::config::ClientConfig;
use crate::connector::{ChainConnector, Contracts};
use crate::contracts::{GovernorContract, TokenContract};
use crate::error::{GovernanceError, Result};
use crate::estimator::{self, BlockTimeEstimator};
use crate::proposal::{Proposal, ProposalState};
use crate::provider::{BlockHeader, CallRequest, WalletProvider};
use crate::store::ProposalStore;

pub struct GovernanceSession {
    pub(crate) connector: ChainConnector,
    pub(crate) contracts: Contracts,
    pub(crate) store: ProposalStore,
    pub(crate) account: Address,
    pub(crate) current_block: BlockHeader,
    pub(crate) voting_power: U256,
    pub(crate) target_chain_id: u64,
    pub(crate) confirmation_timeout: Duration,
    pub(crate) poll_interval: Duration,
    estimator: BlockTimeEstimator,
}

impl GovernanceSession {
    /// Connect, select the network, bind the contracts and load every proposal
    pub async fn open(mut connector: ChainConnector, config: &ClientConfig) -> Result<Self> {
        let account = connector.connect().await?;
        connector.ensure_network(config.chain_id).await?;
        let contracts = connector.contracts()?;
        log::info!(
            "🏛️ Governor {} / token {} on chain {}",
            contracts.governor.address(),
            contracts.token.address(),
            contracts.chain_id
        );

        let provider = Arc::clone(connector.provider());
        let voting_power = match read_voting_power(provider.as_ref(), &contracts.token, account).await {
            Ok(power) => power,
            Err(e) => {
                log::warn!("⚠️ Could not read voting power: {}", e);
                U256::default()
            }
        };
        let current_block = read_head(provider.as_ref()).await?;

        let mut store = ProposalStore::new();
        store.load_all(provider.as_ref(), &contracts.governor).await?;

        log::info!(
            "✅ Session open for {} at block {} ({} proposals, voting power {})",
            account,
            current_block.number,
            store.len(),
            voting_power
        );

        Ok(Self {
            connector,
            contracts,
            store,
            account,
            current_block,
            voting_power,
            target_chain_id: config.chain_id,
            confirmation_timeout: config.confirmation_timeout(),
            poll_interval: config.poll_interval(),
            estimator: BlockTimeEstimator::default(),
        })
    }

    pub fn provider(&self) -> &dyn WalletProvider {
        self.connector.provider().as_ref()
    }

    pub fn account(&self) -> Address {
        self.account
    }

    pub fn contracts(&self) -> &Contracts {
        &self.contracts
    }

    pub fn current_block(&self) -> &BlockHeader {
        &self.current_block
    }

    pub fn voting_power(&self) -> &U256 {
        &self.voting_power
    }

    pub fn proposals(&self) -> &[Proposal] {
        self.store.proposals()
    }

    pub fn find(&self, id: &U256) -> Option<&Proposal> {
        self.store.find(id)
    }

    pub(crate) fn cached(&self, id: &U256) -> Result<&Proposal> {
        self.store
            .find(id)
            .ok_or_else(|| GovernanceError::ProposalNotFound(id.to_string()))
    }

    /// Proposals whose voting window is still open at the cached head
    pub fn open_proposal_count(&self) -> usize {
        self.store.open_count(self.current_block.number)
    }

    /// Check the wallet is still on the deployment chain, switching back if not
    pub(crate) async fn ensure_network(&mut self) -> Result<()> {
        self.connector.ensure_network(self.target_chain_id).await
    }

    pub async fn reload(&mut self) -> Result<&[Proposal]> {
        self.ensure_network().await?;
        let provider = Arc::clone(self.connector.provider());
        self.store
            .load_all(provider.as_ref(), &self.contracts.governor)
            .await
    }

    pub async fn refresh_tally(&mut self, id: &U256) -> Result<&Proposal> {
        self.ensure_network().await?;
        let provider = Arc::clone(self.connector.provider());
        self.store
            .refresh_tally(provider.as_ref(), &self.contracts.governor, id)
            .await
    }

    pub async fn refresh_status(&mut self, id: &U256) -> Result<&Proposal> {
        self.ensure_network().await?;
        let provider = Arc::clone(self.connector.provider());
        self.store
            .refresh_status(provider.as_ref(), &self.contracts.governor, id)
            .await
    }

    /// Re-read the chain head; keeps the cached one if the read fails
    pub async fn refresh_current_block(&mut self) -> &BlockHeader {
        match self.fetch_head().await {
            Ok(head) => self.current_block = head,
            Err(e) => log::warn!("⚠️ Could not refresh current block: {}", e),
        }
        &self.current_block
    }

    /// Re-read `getVotes(account)`; keeps the cached value if the read fails
    pub async fn refresh_voting_power(&mut self) -> &U256 {
        match self.fetch_voting_power().await {
            Ok(power) => self.voting_power = power,
            Err(e) => log::warn!("⚠️ Could not refresh voting power: {}", e),
        }
        &self.voting_power
    }

    pub async fn proposal_state(&mut self, id: &U256) -> Result<ProposalState> {
        let data = self
            .read(self.contracts.governor.address(), GovernorContract::encode_state(id))
            .await?;
        Ok(GovernorContract::decode_state(&data)?)
    }

    /// Accounts that have voted on `id`
    pub async fn list_voters(&mut self, id: &U256) -> Result<Vec<Address>> {
        let data = self
            .read(self.contracts.governor.address(), GovernorContract::encode_get_votes_of(id))
            .await?;
        Ok(GovernorContract::decode_voters(&data)?)
    }

    pub async fn estimate_block_time(&mut self) -> Option<f64> {
        if let Err(e) = self.ensure_network().await {
            log::warn!("⚠️ Block time not estimated: {}", e);
            return None;
        }
        self.estimator.estimate(self.provider()).await
    }

    /// Human phrase for when `block_number` is reached, relative to now
    pub fn time_remaining(&self, block_number: u64, avg_block_time: Option<f64>) -> String {
        estimator::time_remaining(block_number, &self.current_block, avg_block_time, Utc::now())
    }

    /// Drop the session and its caches
    pub fn disconnect(mut self) {
        self.store.clear();
        self.connector.disconnect();
    }

    async fn fetch_head(&mut self) -> Result<BlockHeader> {
        self.ensure_network().await?;
        read_head(self.provider()).await
    }

    async fn fetch_voting_power(&mut self) -> Result<U256> {
        self.ensure_network().await?;
        read_voting_power(self.provider(), &self.contracts.token, self.account).await
    }

    async fn read(&mut self, to: Address, data: Vec<u8>) -> Result<Vec<u8>> {
        self.ensure_network().await?;
        let request = CallRequest {
            from: Some(self.account),
            to,
            data,
        };
        self.provider().call(&request).await.map_err(GovernanceError::read)
    }
}

async fn read_voting_power(provider: &dyn WalletProvider, token: &TokenContract, account: Address) -> Result<U256> {
    let request = CallRequest {
        from: Some(account),
        to: token.address(),
        data: TokenContract::encode_get_votes(account),
    };
    let data = provider.call(&request).await.map_err(GovernanceError::read)?;
    Ok(TokenContract::decode_votes(&data)?)
}

async fn read_head(provider: &dyn WalletProvider) -> Result<BlockHeader> {
    let number = provider.block_number().await.map_err(GovernanceError::read)?;
    provider
        .block(number)
        .await
        .map_err(GovernanceError::read)?
        .ok_or_else(|| GovernanceError::ReadFailure(format!("block {} not found", number)))
}
