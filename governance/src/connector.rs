//! Wallet connection and network selection

use lair_core::Address;
use std::sync::Arc;

use crate::contracts::{GovernorContract, TokenContract};
use crate::deployment::{Deployment, DeploymentBook};
use crate::error::{GovernanceError, Result};
use crate::provider::{ProviderError, WalletProvider};

/// Currently connected account and chain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionState {
    pub account: Option<Address>,
    pub chain_id: Option<u64>,
}

/// Handles to the deployed contracts on the active chain
#[derive(Debug, Clone, PartialEq)]
pub struct Contracts {
    pub chain_id: u64,
    pub governor: GovernorContract,
    pub token: TokenContract,
    pub deployment: Deployment,
}

pub struct ChainConnector {
    provider: Arc<dyn WalletProvider>,
    deployments: DeploymentBook,
    state: ConnectionState,
}

impl ChainConnector {
    pub fn new(provider: Arc<dyn WalletProvider>, deployments: DeploymentBook) -> Self {
        Self {
            provider,
            deployments,
            state: ConnectionState::default(),
        }
    }

    pub fn provider(&self) -> &Arc<dyn WalletProvider> {
        &self.provider
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn account(&self) -> Result<Address> {
        self.state.account.ok_or(GovernanceError::NotConnected)
    }

    /// Request account access from the wallet
    pub async fn connect(&mut self) -> Result<Address> {
        let accounts = self.provider.request_accounts().await.map_err(|e| match e {
            ProviderError::UserRejected(msg) => {
                log::warn!("⚠️ Account access declined: {}", msg);
                GovernanceError::UserRejected(msg)
            }
            other => {
                log::error!("❌ No wallet provider: {}. Please install or start a wallet", other);
                GovernanceError::ProviderUnavailable(other.to_string())
            }
        })?;

        let account = accounts
            .first()
            .copied()
            .ok_or_else(|| GovernanceError::UserRejected("no accounts authorized".to_string()))?;

        log::info!("🔗 Connected account {}", account);
        self.state.account = Some(account);
        Ok(account)
    }

    /// Make sure the provider is on `target_chain_id`, asking it to switch if not
    pub async fn ensure_network(&mut self, target_chain_id: u64) -> Result<()> {
        let current = self.provider.chain_id().await.map_err(GovernanceError::read)?;
        if current == target_chain_id {
            self.state.chain_id = Some(current);
            return Ok(());
        }

        log::warn!(
            "⚠️ Connected to chain {}, switching to {}",
            current,
            target_chain_id
        );
        // Nothing may talk to the contracts until the switch lands
        self.state.chain_id = None;

        match self.provider.switch_chain(target_chain_id).await {
            Ok(()) => {}
            Err(ProviderError::UserRejected(msg)) => {
                log::warn!("⚠️ Network switch denied: {}", msg);
                return Err(GovernanceError::NetworkSwitchDenied(target_chain_id));
            }
            Err(e) => {
                log::error!("❌ Network switch failed: {}", e);
                return Err(GovernanceError::NetworkMismatch {
                    expected: target_chain_id,
                    actual: current,
                });
            }
        }

        let switched = self.provider.chain_id().await.map_err(GovernanceError::read)?;
        if switched != target_chain_id {
            return Err(GovernanceError::NetworkMismatch {
                expected: target_chain_id,
                actual: switched,
            });
        }

        log::info!("✅ Switched to chain {}", switched);
        self.state.chain_id = Some(switched);
        Ok(())
    }

    /// Contract handles for the active chain
    pub fn contracts(&self) -> Result<Contracts> {
        let chain_id = self.state.chain_id.ok_or(GovernanceError::NotConnected)?;
        let deployment = self.deployments.get(chain_id).ok_or_else(|| {
            log::error!("❌ Contracts not deployed to detected network (chain {})", chain_id);
            GovernanceError::ContractsNotDeployed(chain_id)
        })?;

        Ok(Contracts {
            chain_id,
            governor: GovernorContract::new(deployment.governor),
            token: TokenContract::new(deployment.token),
            deployment: deployment.clone(),
        })
    }

    pub fn disconnect(&mut self) {
        log::info!("🔌 Disconnected");
        self.state = ConnectionState::default();
    }
}
