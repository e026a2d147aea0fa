//! Governance client error types

use lair_core::{AbiError, TxHash, UnitError};
use thiserror::Error;

use crate::provider::ProviderError;

#[derive(Error, Debug)]
pub enum GovernanceError {
    #[error("No wallet provider available: {0}")]
    ProviderUnavailable(String),

    #[error("User rejected the request: {0}")]
    UserRejected(String),

    #[error("Wrong network: connected to chain {actual}, contracts live on chain {expected}")]
    NetworkMismatch { expected: u64, actual: u64 },

    #[error("Network switch to chain {0} was denied")]
    NetworkSwitchDenied(u64),

    #[error("Contracts not deployed to detected network (chain {0})")]
    ContractsNotDeployed(u64),

    #[error("Transaction rejected by wallet: {0}")]
    TransactionRejected(String),

    #[error("Transaction reverted: {0}")]
    TransactionReverted(String),

    #[error("Transaction {hash} not confirmed after {waited_secs}s")]
    TransactionTimeout { hash: TxHash, waited_secs: u64 },

    #[error("Read failed: {0}")]
    ReadFailure(String),

    #[error("Proposal expired: voting ended at block {end_block}, current block is {current_block}")]
    VotingClosed { current_block: u64, end_block: u64 },

    #[error("Still in vote duration: voting ends at block {end_block}, current block is {current_block}")]
    VotingInProgress { current_block: u64, end_block: u64 },

    #[error("Proposal not found: {0}")]
    ProposalNotFound(String),

    #[error("No account connected")]
    NotConnected,

    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] UnitError),

    #[error("Decode error: {0}")]
    Decode(#[from] AbiError),
}

impl GovernanceError {
    /// Connection and deployment failures end the session
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GovernanceError::ProviderUnavailable(_)
                | GovernanceError::NetworkMismatch { .. }
                | GovernanceError::NetworkSwitchDenied(_)
                | GovernanceError::ContractsNotDeployed(_)
        )
    }

    /// Map a failed read through the provider
    pub(crate) fn read(err: ProviderError) -> Self {
        match err {
            ProviderError::Unavailable(msg) => GovernanceError::ProviderUnavailable(msg),
            other => GovernanceError::ReadFailure(other.to_string()),
        }
    }

    /// Map a failed transaction submission
    pub(crate) fn submission(err: ProviderError) -> Self {
        match err {
            ProviderError::UserRejected(msg) => GovernanceError::TransactionRejected(msg),
            ProviderError::Unavailable(msg) => GovernanceError::ProviderUnavailable(msg),
            ProviderError::Rpc { message, .. } => GovernanceError::TransactionReverted(message),
            // Nothing reached the chain
            ProviderError::Transport(msg) => GovernanceError::TransactionRejected(msg),
            other => GovernanceError::TransactionReverted(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, GovernanceError>;
