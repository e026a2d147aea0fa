//! LavishLair governance client
//!
//! Talks to an NFT-gated OpenZeppelin-style governor through a wallet
//! provider: connects the account, keeps a session cache of proposals, and
//! submits proposals, votes, delegation, queue/execute, contributions and
//! payouts.

pub mod actions;
pub mod config;
pub mod connector;
pub mod contracts;
pub mod deployment;
pub mod error;
pub mod estimator;
pub mod formatter;
pub mod proposal;
pub mod provider;
pub mod rpc;
pub mod session;
pub mod store;
pub mod transaction;

pub use actions::{
    ContributeOutcome, DelegateOutcome, ExecuteOutcome, GovernanceCall, ProposeOutcome,
    VoteOutcome,
};
pub use config::{ClientConfig, ConfigError};
pub use connector::{ChainConnector, ConnectionState, Contracts};
pub use contracts::{ActionEvent, GovernorContract, TokenContract};
pub use deployment::{Deployment, DeploymentBook};
pub use error::{GovernanceError, Result};
pub use estimator::{humanize, project_timestamp, time_remaining, BlockTimeEstimator, BLOCK_SPAN};
pub use formatter::{format_proposal, FormatError, ProposalView, RawProposal};
pub use proposal::{ExecutionStatus, Proposal, ProposalState, VoteChoice, VoteTally};
pub use provider::{
    BlockHeader, BlockTag, CallRequest, Log, LogFilter, ProviderError, ProviderResult,
    TransactionReceipt, TransactionRequest, WalletProvider,
};
pub use rpc::JsonRpcProvider;
pub use session::GovernanceSession;
pub use store::ProposalStore;
pub use transaction::PendingTransaction;
