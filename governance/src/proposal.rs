//! Proposal types

use lair_core::{keccak256, Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::formatter::RawProposal;

/// Local view of where a proposal is in the queue/execute pipeline
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    #[default]
    NotQueued,
    Queued,
    Executed,
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecutionStatus::NotQueued => "not_queued",
            ExecutionStatus::Queued => "queued",
            ExecutionStatus::Executed => "executed",
        };
        f.write_str(s)
    }
}

impl FromStr for ExecutionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_queued" => Ok(ExecutionStatus::NotQueued),
            "queued" => Ok(ExecutionStatus::Queued),
            "executed" => Ok(ExecutionStatus::Executed),
            other => Err(format!("unknown execution status: {}", other)),
        }
    }
}

/// On-chain lifecycle as reported by the governor's `state(id)`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProposalState {
    Pending,
    Active,
    Canceled,
    Defeated,
    Succeeded,
    Queued,
    Expired,
    Executed,
}

impl ProposalState {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(ProposalState::Pending),
            1 => Some(ProposalState::Active),
            2 => Some(ProposalState::Canceled),
            3 => Some(ProposalState::Defeated),
            4 => Some(ProposalState::Succeeded),
            5 => Some(ProposalState::Queued),
            6 => Some(ProposalState::Expired),
            7 => Some(ProposalState::Executed),
            _ => None,
        }
    }

    /// Execution status implied by the on-chain state
    pub fn execution_status(self) -> ExecutionStatus {
        match self {
            ProposalState::Queued => ExecutionStatus::Queued,
            ProposalState::Executed => ExecutionStatus::Executed,
            _ => ExecutionStatus::NotQueued,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum VoteChoice {
    Against,
    For,
}

impl VoteChoice {
    /// `support` argument of `castVote`
    pub fn support(self) -> u8 {
        match self {
            VoteChoice::Against => 0,
            VoteChoice::For => 1,
        }
    }
}

impl From<bool> for VoteChoice {
    fn from(support: bool) -> Self {
        if support {
            VoteChoice::For
        } else {
            VoteChoice::Against
        }
    }
}

/// Vote counts as returned by `proposalVotes(id)`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteTally {
    pub against: U256,
    pub for_votes: U256,
    pub abstain: U256,
}

impl VoteTally {
    pub fn total(&self) -> U256 {
        &self.against + &self.for_votes + &self.abstain
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    pub id: U256,
    pub description: String,
    pub proposer: Address,
    pub targets: Vec<Address>,
    pub values: Vec<U256>,
    pub calldatas: Vec<Vec<u8>>,
    pub start_block: u64,
    pub end_block: u64,
    pub tally: VoteTally,
    pub status: ExecutionStatus,
}

impl Proposal {
    /// Keccak-256 of the UTF-8 description, the salt used by queue/execute
    pub fn description_hash(&self) -> [u8; 32] {
        keccak256(self.description.as_bytes())
    }

    /// Voting has ended once the chain head is past the end block
    pub fn is_voting_closed(&self, current_block: u64) -> bool {
        current_block > self.end_block
    }

    pub fn is_voting_in_progress(&self, current_block: u64) -> bool {
        current_block < self.end_block
    }

    /// Raw tuple as the contract reports it (numbers as decimal strings)
    pub fn to_raw(&self) -> RawProposal {
        RawProposal {
            id: self.id.to_string(),
            description: self.description.clone(),
            proposer: self.proposer.to_hex(),
            targets: self.targets.iter().map(Address::to_hex).collect(),
            values: self.values.iter().map(U256::to_string).collect(),
            calldatas: self
                .calldatas
                .iter()
                .map(|c| format!("0x{}", hex::encode(c)))
                .collect(),
            start_block: self.start_block.to_string(),
            end_block: self.end_block.to_string(),
            for_votes: self.tally.for_votes.to_string(),
            against_votes: self.tally.against.to_string(),
            abstain_votes: self.tally.abstain.to_string(),
            status: self.status.to_string(),
        }
    }
}
