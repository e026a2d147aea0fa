//! Proposal display formatting
//!
//! Pure transforms between the raw contract tuple (every number a decimal
//! string, amounts in minor units) and the display record the CLI prints.
//! No network access and no clock: the same input always yields the same
//! output.

use lair_core::{format_units, parse_units, UnitError, ETHER_DECIMALS, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::proposal::ExecutionStatus;

#[derive(Debug, Error, PartialEq)]
pub enum FormatError {
    #[error("Field {field}: {value:?} is not an integer")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Field {field}: {source}")]
    InvalidAmount {
        field: &'static str,
        #[source]
        source: UnitError,
    },

    #[error("Field status: {0}")]
    InvalidStatus(String),
}

/// Proposal tuple as read from the chain
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawProposal {
    pub id: String,
    pub description: String,
    pub proposer: String,
    pub targets: Vec<String>,
    /// Call values in minor units
    pub values: Vec<String>,
    pub calldatas: Vec<String>,
    pub start_block: String,
    pub end_block: String,
    pub for_votes: String,
    pub against_votes: String,
    #[serde(default = "zero")]
    pub abstain_votes: String,
    #[serde(default = "not_queued")]
    pub status: String,
}

fn zero() -> String {
    "0".to_string()
}

fn not_queued() -> String {
    ExecutionStatus::NotQueued.to_string()
}

/// Display-ready proposal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProposalView {
    pub id: String,
    pub description: String,
    pub proposer: String,
    pub targets: Vec<String>,
    /// Call values as decimal token amounts
    pub values: Vec<String>,
    pub calldatas: Vec<String>,
    pub start_block: u64,
    pub end_block: u64,
    #[serde(with = "crate::deployment::decimal")]
    pub upvotes: U256,
    #[serde(with = "crate::deployment::decimal")]
    pub downvotes: U256,
    #[serde(with = "crate::deployment::decimal")]
    pub abstentions: U256,
    pub status: ExecutionStatus,
}

impl ProposalView {
    pub fn total_votes(&self) -> U256 {
        &self.upvotes + &self.downvotes + &self.abstentions
    }

    /// Back to the raw tuple shape (decimal amounts re-expressed in minor units)
    pub fn to_raw(&self) -> Result<RawProposal, FormatError> {
        let values = self
            .values
            .iter()
            .map(|v| {
                parse_units(v, ETHER_DECIMALS)
                    .map(|minor| minor.to_string())
                    .map_err(|source| FormatError::InvalidAmount {
                        field: "values",
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RawProposal {
            id: self.id.clone(),
            description: self.description.clone(),
            proposer: self.proposer.clone(),
            targets: self.targets.clone(),
            values,
            calldatas: self.calldatas.clone(),
            start_block: self.start_block.to_string(),
            end_block: self.end_block.to_string(),
            for_votes: self.upvotes.to_string(),
            against_votes: self.downvotes.to_string(),
            abstain_votes: self.abstentions.to_string(),
            status: self.status.to_string(),
        })
    }
}

fn integer<T: std::str::FromStr>(field: &'static str, value: &str) -> Result<T, FormatError> {
    value.trim().parse().map_err(|_| FormatError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

/// Map a raw tuple to its display record
pub fn format_proposal(raw: &RawProposal) -> Result<ProposalView, FormatError> {
    // Canonical decimal form of the id (strips leading zeros / whitespace)
    let id: U256 = integer("id", &raw.id)?;

    let values = raw
        .values
        .iter()
        .map(|v| integer::<U256>("values", v).map(|minor| format_units(&minor, ETHER_DECIMALS)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ProposalView {
        id: id.to_string(),
        description: raw.description.clone(),
        proposer: raw.proposer.clone(),
        targets: raw.targets.clone(),
        values,
        calldatas: raw.calldatas.clone(),
        start_block: integer("startBlock", &raw.start_block)?,
        end_block: integer("endBlock", &raw.end_block)?,
        upvotes: integer("forVotes", &raw.for_votes)?,
        downvotes: integer("againstVotes", &raw.against_votes)?,
        abstentions: integer("abstainVotes", &raw.abstain_votes)?,
        status: raw.status.parse().map_err(FormatError::InvalidStatus)?,
    })
}
