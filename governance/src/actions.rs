//! State-changing governance actions
//!
//! Every action follows the same path: check the network, build the call,
//! submit it from the session account and wait for the receipt within the
//! configured bound. Amounts arrive as decimal strings and are converted to
//! minor units before anything is sent.

use lair_core::{format_units, parse_units, Address, ETHER_DECIMALS, U256};
use std::sync::Arc;

use crate::contracts::{GovernorContract, TokenContract};
use crate::error::Result;
use crate::proposal::{ExecutionStatus, Proposal, VoteChoice};
use crate::provider::{TransactionReceipt, TransactionRequest};
use crate::session::GovernanceSession;
use crate::transaction;
use crate::GovernanceError;

/// A contract call the session can submit
#[derive(Debug, Clone, PartialEq)]
pub enum GovernanceCall {
    Propose {
        token_contract: Address,
        description: String,
    },
    CastVote {
        proposal_id: U256,
        choice: VoteChoice,
    },
    Delegate,
    Queue(Proposal),
    Execute(Proposal),
    Contribute {
        amount: U256,
    },
    PayBeneficiary {
        proposal_id: U256,
    },
    MintVotingToken {
        to: Address,
    },
}

impl GovernanceCall {
    pub fn name(&self) -> &'static str {
        match self {
            GovernanceCall::Propose { .. } => "propose",
            GovernanceCall::CastVote { .. } => "castVote",
            GovernanceCall::Delegate => "delegate",
            GovernanceCall::Queue(_) => "queue",
            GovernanceCall::Execute(_) => "execute",
            GovernanceCall::Contribute { .. } => "contribute",
            GovernanceCall::PayBeneficiary { .. } => "payBeneficiary",
            GovernanceCall::MintVotingToken { .. } => "safeMint",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProposeOutcome {
    pub receipt: TransactionReceipt,
    /// Id from the `ProposalCreated` event in the receipt
    pub proposal_id: Option<U256>,
    /// Requested boost in minor units
    pub boost_amount: U256,
}

#[derive(Debug, Clone)]
pub struct VoteOutcome {
    pub receipt: TransactionReceipt,
    pub proposal: Proposal,
}

#[derive(Debug, Clone)]
pub struct DelegateOutcome {
    pub receipt: TransactionReceipt,
    pub voting_power: U256,
}

#[derive(Debug, Clone)]
pub struct ExecuteOutcome {
    pub queue: Option<TransactionReceipt>,
    pub execute: TransactionReceipt,
}

#[derive(Debug, Clone)]
pub struct ContributeOutcome {
    pub receipt: TransactionReceipt,
    /// Amount the governor reports as received, as a decimal string
    pub credited: Option<String>,
}

impl GovernanceSession {
    /// Transaction for `call`, sent from the session account
    pub fn build_transaction(&self, call: &GovernanceCall) -> TransactionRequest {
        let deployment = &self.contracts.deployment;
        let governor = self.contracts.governor.address();
        let token = self.contracts.token.address();
        let gas = Some(deployment.gas_limit);

        let (to, data, value, gas) = match call {
            GovernanceCall::Propose {
                token_contract,
                description,
            } => (
                governor,
                GovernorContract::encode_propose(
                    &[governor],
                    &[deployment.proposal_value.clone()],
                    &[GovernorContract::encode_set_boosted_contract(*token_contract)],
                    description,
                ),
                U256::default(),
                gas,
            ),
            GovernanceCall::CastVote { proposal_id, choice } => (
                governor,
                GovernorContract::encode_cast_vote(proposal_id, *choice),
                U256::default(),
                gas,
            ),
            GovernanceCall::Delegate => (
                token,
                TokenContract::encode_delegate(self.account),
                U256::default(),
                gas,
            ),
            GovernanceCall::Queue(proposal) => (
                governor,
                GovernorContract::encode_queue(proposal),
                U256::default(),
                gas,
            ),
            GovernanceCall::Execute(proposal) => (
                governor,
                GovernorContract::encode_execute(proposal),
                deployment.execute_value.clone(),
                gas,
            ),
            GovernanceCall::Contribute { amount } => (
                governor,
                GovernorContract::encode_contribute(),
                amount.clone(),
                None,
            ),
            GovernanceCall::PayBeneficiary { proposal_id } => (
                governor,
                GovernorContract::encode_pay_beneficiary(proposal_id),
                U256::default(),
                None,
            ),
            GovernanceCall::MintVotingToken { to } => (
                token,
                TokenContract::encode_safe_mint(*to),
                U256::default(),
                None,
            ),
        };

        TransactionRequest {
            from: self.account,
            to,
            data,
            value,
            gas,
        }
    }

    /// Submit `call` and wait for its receipt
    pub async fn submit(&mut self, call: GovernanceCall) -> Result<TransactionReceipt> {
        self.ensure_network().await?;

        let request = self.build_transaction(&call);
        let provider = Arc::clone(self.connector.provider());
        let pending = transaction::submit(provider.as_ref(), &request).await?;
        log::info!("📤 {} submitted: {}", call.name(), pending.hash);

        let receipt = pending
            .confirm(provider.as_ref(), self.confirmation_timeout, self.poll_interval)
            .await?;
        log::info!("✅ {} confirmed in block {}", call.name(), receipt.block_number);
        Ok(receipt)
    }

    /// Propose boosting `token_contract`; reloads every proposal afterwards
    pub async fn propose(
        &mut self,
        token_contract: Address,
        description: &str,
        boost_amount: &str,
    ) -> Result<ProposeOutcome> {
        let boost_amount = parse_units(boost_amount, ETHER_DECIMALS)?;
        let receipt = self
            .submit(GovernanceCall::Propose {
                token_contract,
                description: description.to_string(),
            })
            .await?;

        let proposal_id = self.contracts.governor.find_created_proposal_id(&receipt.logs);
        // The proposal is on chain; a failed reload only leaves the list stale
        if let Err(e) = self.reload().await {
            log::warn!("⚠️ Proposal submitted but the list could not be reloaded: {}", e);
        }

        Ok(ProposeOutcome {
            receipt,
            proposal_id,
            boost_amount,
        })
    }

    pub async fn vote(&mut self, proposal_id: &U256, choice: VoteChoice) -> Result<VoteOutcome> {
        let end_block = self.cached(proposal_id)?.end_block;
        let current_block = self.current_block.number;
        if current_block > end_block {
            log::warn!("⚠️ Proposal expired!");
            return Err(GovernanceError::VotingClosed {
                current_block,
                end_block,
            });
        }

        let receipt = self
            .submit(GovernanceCall::CastVote {
                proposal_id: proposal_id.clone(),
                choice,
            })
            .await?;
        let proposal = match self.refresh_tally(proposal_id).await.cloned() {
            Ok(proposal) => proposal,
            Err(e) => {
                log::warn!("⚠️ Vote cast but tally not refreshed: {}", e);
                self.cached(proposal_id)?.clone()
            }
        };

        Ok(VoteOutcome { receipt, proposal })
    }

    /// Delegate the account's voting power to itself
    pub async fn delegate(&mut self) -> Result<DelegateOutcome> {
        let receipt = self.submit(GovernanceCall::Delegate).await?;
        let voting_power = self.refresh_voting_power().await.clone();
        Ok(DelegateOutcome {
            receipt,
            voting_power,
        })
    }

    /// Queue the proposal through the timelock, then execute it
    pub async fn queue_then_execute(&mut self, proposal_id: &U256) -> Result<ExecuteOutcome> {
        let proposal = self.cached(proposal_id)?.clone();
        let current_block = self.current_block.number;
        if proposal.is_voting_in_progress(current_block) {
            log::warn!("⚠️ Still in vote duration!");
            return Err(GovernanceError::VotingInProgress {
                current_block,
                end_block: proposal.end_block,
            });
        }

        let queue = self.submit(GovernanceCall::Queue(proposal)).await?;
        self.store.set_status(proposal_id, ExecutionStatus::Queued)?;

        let mut outcome = self.execute(proposal_id).await?;
        outcome.queue = Some(queue);
        Ok(outcome)
    }

    /// Execute an already-queued proposal
    pub async fn execute(&mut self, proposal_id: &U256) -> Result<ExecuteOutcome> {
        let proposal = self.cached(proposal_id)?.clone();
        let execute = self.submit(GovernanceCall::Execute(proposal)).await?;
        self.store.set_status(proposal_id, ExecutionStatus::Executed)?;
        Ok(ExecuteOutcome {
            queue: None,
            execute,
        })
    }

    /// Send `amount` (decimal) to the governor's `contribute()`
    pub async fn contribute(&mut self, amount: &str) -> Result<ContributeOutcome> {
        let amount = parse_units(amount, ETHER_DECIMALS)?;
        let receipt = self.submit(GovernanceCall::Contribute { amount }).await?;

        let credited = match self.contracts.governor.find_action(&receipt.logs) {
            Some(Ok(event)) => Some(format_units(&event.amount, ETHER_DECIMALS)),
            Some(Err(e)) => {
                log::warn!("⚠️ Could not decode Action event: {}", e);
                None
            }
            None => None,
        };

        Ok(ContributeOutcome { receipt, credited })
    }

    pub async fn payout_beneficiary(&mut self, proposal_id: &U256) -> Result<TransactionReceipt> {
        self.submit(GovernanceCall::PayBeneficiary {
            proposal_id: proposal_id.clone(),
        })
        .await
    }

    pub async fn mint_voting_token(&mut self, to: Address) -> Result<TransactionReceipt> {
        self.submit(GovernanceCall::MintVotingToken { to }).await
    }
}
