//! Typed bindings for the governor and voting-token contracts
//!
//! Each binding knows its address and how to encode calls / decode results
//! and events. Nothing here touches the network.

use lair_core::abi::{self, encode_call, ParamType, Token};
use lair_core::{event_topic, selector, AbiError, Address, TxHash, U256};

use crate::provider::Log;
use crate::proposal::{ExecutionStatus, Proposal, ProposalState, VoteChoice, VoteTally};

pub mod signatures {
    pub const PROPOSE: &str = "propose(address[],uint256[],bytes[],string)";
    pub const CAST_VOTE: &str = "castVote(uint256,uint8)";
    pub const QUEUE: &str = "queue(address[],uint256[],bytes[],bytes32)";
    pub const EXECUTE: &str = "execute(address[],uint256[],bytes[],bytes32)";
    pub const STATE: &str = "state(uint256)";
    pub const PROPOSAL_VOTES: &str = "proposalVotes(uint256)";
    pub const GET_VOTES_OF: &str = "getVotesOf(uint256)";
    pub const PAY_BENEFICIARY: &str = "payBeneficiary(uint256)";
    pub const CONTRIBUTE: &str = "contribute()";
    pub const SET_BOOSTED_CONTRACT: &str = "setBoostedContract(address)";

    pub const DELEGATE: &str = "delegate(address)";
    pub const GET_VOTES: &str = "getVotes(address)";
    pub const SAFE_MINT: &str = "safeMint(address)";

    pub const PROPOSAL_CREATED: &str =
        "ProposalCreated(uint256,address,address[],uint256[],string[],bytes[],uint256,uint256,string)";
    pub const ACTION: &str = "Action(address,bytes32,string,address,uint256)";
}

/// Payload of the governor's `Action` event (emitted by `contribute`)
#[derive(Debug, Clone, PartialEq)]
pub struct ActionEvent {
    pub initiator: Address,
    pub role: [u8; 32],
    pub message: String,
    pub beneficiary: Address,
    pub amount: U256,
}

fn proposal_actions(
    targets: &[Address],
    values: &[U256],
    calldatas: &[Vec<u8>],
) -> [Token; 3] {
    [
        Token::Array(targets.iter().copied().map(Token::Address).collect()),
        Token::Array(values.iter().cloned().map(Token::Uint).collect()),
        Token::Array(calldatas.iter().cloned().map(Token::Bytes).collect()),
    ]
}

fn single<T>(
    types: &[ParamType],
    data: &[u8],
    convert: impl FnOnce(Token) -> Result<T, AbiError>,
) -> Result<T, AbiError> {
    let token = abi::decode(types, data)?
        .into_iter()
        .next()
        .ok_or(AbiError::Arity {
            expected: 1,
            actual: 0,
        })?;
    convert(token)
}

/// Address stored in an indexed topic (right-aligned in 32 bytes)
fn topic_address(topic: &TxHash) -> Result<Address, AbiError> {
    single(&[ParamType::Address], topic.as_bytes(), Token::into_address)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GovernorContract {
    address: Address,
}

impl GovernorContract {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn encode_propose(
        targets: &[Address],
        values: &[U256],
        calldatas: &[Vec<u8>],
        description: &str,
    ) -> Vec<u8> {
        let [t, v, c] = proposal_actions(targets, values, calldatas);
        encode_call(
            selector(signatures::PROPOSE),
            &[t, v, c, Token::String(description.to_string())],
        )
    }

    pub fn encode_cast_vote(proposal_id: &U256, choice: VoteChoice) -> Vec<u8> {
        encode_call(
            selector(signatures::CAST_VOTE),
            &[Token::Uint(proposal_id.clone()), Token::uint(choice.support())],
        )
    }

    pub fn encode_queue(proposal: &Proposal) -> Vec<u8> {
        Self::encode_lifecycle(signatures::QUEUE, proposal)
    }

    pub fn encode_execute(proposal: &Proposal) -> Vec<u8> {
        Self::encode_lifecycle(signatures::EXECUTE, proposal)
    }

    fn encode_lifecycle(signature: &str, proposal: &Proposal) -> Vec<u8> {
        let [t, v, c] = proposal_actions(&proposal.targets, &proposal.values, &proposal.calldatas);
        encode_call(
            selector(signature),
            &[t, v, c, Token::FixedBytes(proposal.description_hash().to_vec())],
        )
    }

    pub fn encode_state(proposal_id: &U256) -> Vec<u8> {
        encode_call(selector(signatures::STATE), &[Token::Uint(proposal_id.clone())])
    }

    pub fn decode_state(data: &[u8]) -> Result<ProposalState, AbiError> {
        let raw = single(&[ParamType::Uint(8)], data, Token::into_u64)?;
        ProposalState::from_u8(raw as u8).ok_or_else(|| AbiError::InvalidData {
            kind: "ProposalState",
            reason: format!("unknown state {}", raw),
        })
    }

    pub fn encode_proposal_votes(proposal_id: &U256) -> Vec<u8> {
        encode_call(
            selector(signatures::PROPOSAL_VOTES),
            &[Token::Uint(proposal_id.clone())],
        )
    }

    /// `(againstVotes, forVotes, abstainVotes)`
    pub fn decode_proposal_votes(data: &[u8]) -> Result<VoteTally, AbiError> {
        let mut tokens = abi::decode(
            &[ParamType::Uint(256), ParamType::Uint(256), ParamType::Uint(256)],
            data,
        )?
        .into_iter();
        let mut next = || {
            tokens
                .next()
                .ok_or(AbiError::Arity {
                    expected: 3,
                    actual: 0,
                })?
                .into_uint()
        };
        Ok(VoteTally {
            against: next()?,
            for_votes: next()?,
            abstain: next()?,
        })
    }

    pub fn encode_get_votes_of(proposal_id: &U256) -> Vec<u8> {
        encode_call(
            selector(signatures::GET_VOTES_OF),
            &[Token::Uint(proposal_id.clone())],
        )
    }

    pub fn decode_voters(data: &[u8]) -> Result<Vec<Address>, AbiError> {
        single(&[ParamType::array(ParamType::Address)], data, Token::into_array)?
            .into_iter()
            .map(Token::into_address)
            .collect()
    }

    pub fn encode_pay_beneficiary(proposal_id: &U256) -> Vec<u8> {
        encode_call(
            selector(signatures::PAY_BENEFICIARY),
            &[Token::Uint(proposal_id.clone())],
        )
    }

    pub fn encode_contribute() -> Vec<u8> {
        encode_call(selector(signatures::CONTRIBUTE), &[])
    }

    pub fn encode_set_boosted_contract(token_contract: Address) -> Vec<u8> {
        encode_call(
            selector(signatures::SET_BOOSTED_CONTRACT),
            &[Token::Address(token_contract)],
        )
    }

    pub fn proposal_created_topic() -> TxHash {
        event_topic(signatures::PROPOSAL_CREATED)
    }

    pub fn action_topic() -> TxHash {
        event_topic(signatures::ACTION)
    }

    /// Decode a `ProposalCreated` log into a fresh proposal (zero tallies, not queued)
    pub fn decode_proposal_created(&self, log: &Log) -> Result<Proposal, AbiError> {
        if log.topics.first() != Some(&Self::proposal_created_topic()) {
            return Err(AbiError::InvalidData {
                kind: "ProposalCreated",
                reason: "log is not a ProposalCreated event".to_string(),
            });
        }

        let types = [
            ParamType::Uint(256),
            ParamType::Address,
            ParamType::array(ParamType::Address),
            ParamType::array(ParamType::Uint(256)),
            ParamType::array(ParamType::String),
            ParamType::array(ParamType::Bytes),
            ParamType::Uint(256),
            ParamType::Uint(256),
            ParamType::String,
        ];
        let mut tokens = abi::decode(&types, &log.data)?.into_iter();
        let mut next = || {
            tokens.next().ok_or(AbiError::Arity {
                expected: types.len(),
                actual: 0,
            })
        };

        let id = next()?.into_uint()?;
        let proposer = next()?.into_address()?;
        let targets = next()?
            .into_array()?
            .into_iter()
            .map(Token::into_address)
            .collect::<Result<Vec<_>, _>>()?;
        let values = next()?
            .into_array()?
            .into_iter()
            .map(Token::into_uint)
            .collect::<Result<Vec<_>, _>>()?;
        let _signatures = next()?;
        let calldatas = next()?
            .into_array()?
            .into_iter()
            .map(Token::into_bytes)
            .collect::<Result<Vec<_>, _>>()?;
        let start_block = next()?.into_u64()?;
        let end_block = next()?.into_u64()?;
        let description = next()?.into_string()?;

        if targets.len() != values.len() || targets.len() != calldatas.len() {
            return Err(AbiError::InvalidData {
                kind: "ProposalCreated",
                reason: format!(
                    "mismatched action arrays: {} targets, {} values, {} calldatas",
                    targets.len(),
                    values.len(),
                    calldatas.len()
                ),
            });
        }

        Ok(Proposal {
            id,
            description,
            proposer,
            targets,
            values,
            calldatas,
            start_block,
            end_block,
            tally: VoteTally::default(),
            status: ExecutionStatus::NotQueued,
        })
    }

    /// Find and decode the first `Action` event this governor emitted in `logs`
    pub fn find_action(&self, logs: &[Log]) -> Option<Result<ActionEvent, AbiError>> {
        let topic = Self::action_topic();
        logs.iter()
            .find(|log| log.address == self.address && log.topics.first() == Some(&topic))
            .map(Self::decode_action)
    }

    pub fn decode_action(log: &Log) -> Result<ActionEvent, AbiError> {
        if log.topics.len() != 3 {
            return Err(AbiError::InvalidData {
                kind: "Action",
                reason: format!("expected 3 topics, got {}", log.topics.len()),
            });
        }
        let initiator = topic_address(&log.topics[1])?;
        let beneficiary = topic_address(&log.topics[2])?;

        let mut tokens = abi::decode(
            &[ParamType::FixedBytes(32), ParamType::String, ParamType::Uint(256)],
            &log.data,
        )?
        .into_iter();
        let mut next = || {
            tokens.next().ok_or(AbiError::Arity {
                expected: 3,
                actual: 0,
            })
        };

        let role_bytes = next()?.into_fixed_bytes()?;
        let mut role = [0u8; 32];
        role.copy_from_slice(&role_bytes);

        Ok(ActionEvent {
            initiator,
            role,
            message: next()?.into_string()?,
            beneficiary,
            amount: next()?.into_uint()?,
        })
    }

    /// Id of the proposal created in a `propose` receipt, if the event is present
    pub fn find_created_proposal_id(&self, logs: &[Log]) -> Option<U256> {
        let topic = Self::proposal_created_topic();
        logs.iter()
            .filter(|log| log.address == self.address && log.topics.first() == Some(&topic))
            .find_map(|log| self.decode_proposal_created(log).ok())
            .map(|p| p.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenContract {
    address: Address,
}

impl TokenContract {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn encode_delegate(delegatee: Address) -> Vec<u8> {
        encode_call(selector(signatures::DELEGATE), &[Token::Address(delegatee)])
    }

    pub fn encode_get_votes(account: Address) -> Vec<u8> {
        encode_call(selector(signatures::GET_VOTES), &[Token::Address(account)])
    }

    pub fn decode_votes(data: &[u8]) -> Result<U256, AbiError> {
        single(&[ParamType::Uint(256)], data, Token::into_uint)
    }

    pub fn encode_safe_mint(to: Address) -> Vec<u8> {
        encode_call(selector(signatures::SAFE_MINT), &[Token::Address(to)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lair_core::abi::encode;

    fn governor() -> GovernorContract {
        GovernorContract::new(Address([0xaa; 20]))
    }

    fn created_log(id: u64, description: &str) -> Log {
        let data = encode(&[
            Token::uint(id),
            Token::Address(Address([0x01; 20])),
            Token::Array(vec![Token::Address(Address([0xaa; 20]))]),
            Token::Array(vec![Token::uint(1_500_000_000u64)]),
            Token::Array(vec![Token::String(String::new())]),
            Token::Array(vec![Token::Bytes(vec![1, 2, 3])]),
            Token::uint(10u8),
            Token::uint(50u8),
            Token::String(description.to_string()),
        ]);
        Log {
            address: Address([0xaa; 20]),
            topics: vec![GovernorContract::proposal_created_topic()],
            data,
            block_number: Some(9),
            transaction_hash: None,
            log_index: Some(0),
        }
    }

    #[test]
    fn test_selectors() {
        assert_eq!(hex::encode(selector(signatures::CAST_VOTE)), "56781388");
        assert_eq!(hex::encode(selector(signatures::PROPOSE)), "7d5e81e2");
        assert_eq!(hex::encode(selector(signatures::STATE)), "3e4f49e6");
    }

    #[test]
    fn test_decode_proposal_created() {
        let proposal = governor()
            .decode_proposal_created(&created_log(7, "Fund the marketplace boost"))
            .unwrap();

        assert_eq!(proposal.id, U256::from(7u8));
        assert_eq!(proposal.proposer, Address([0x01; 20]));
        assert_eq!(proposal.targets, vec![Address([0xaa; 20])]);
        assert_eq!(proposal.values, vec![U256::from(1_500_000_000u64)]);
        assert_eq!(proposal.calldatas, vec![vec![1, 2, 3]]);
        assert_eq!((proposal.start_block, proposal.end_block), (10, 50));
        assert_eq!(proposal.description, "Fund the marketplace boost");
        assert_eq!(proposal.tally, VoteTally::default());
        assert_eq!(proposal.status, ExecutionStatus::NotQueued);
    }

    #[test]
    fn test_decode_rejects_wrong_topic_and_truncation() {
        let mut log = created_log(1, "x");
        log.topics = vec![GovernorContract::action_topic()];
        assert!(governor().decode_proposal_created(&log).is_err());

        let mut log = created_log(1, "x");
        log.data.truncate(100);
        assert!(matches!(
            governor().decode_proposal_created(&log),
            Err(AbiError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_decode_proposal_votes_order() {
        let data = encode(&[Token::uint(2u8), Token::uint(5u8), Token::uint(1u8)]);
        let tally = GovernorContract::decode_proposal_votes(&data).unwrap();
        assert_eq!(tally.against, U256::from(2u8));
        assert_eq!(tally.for_votes, U256::from(5u8));
        assert_eq!(tally.abstain, U256::from(1u8));
    }

    #[test]
    fn test_decode_action() {
        let amount = U256::from(1_500_000_000_000_000_000u64);
        let mut initiator = [0u8; 32];
        initiator[12..].copy_from_slice(&[0x33; 20]);
        let log = Log {
            address: Address([0xaa; 20]),
            topics: vec![
                GovernorContract::action_topic(),
                TxHash(initiator),
                TxHash([0u8; 32]),
            ],
            data: encode(&[
                Token::FixedBytes(vec![0x44; 32]),
                Token::String("CONTRIBUTION RECEIVED".to_string()),
                Token::Uint(amount.clone()),
            ]),
            block_number: None,
            transaction_hash: None,
            log_index: None,
        };

        let event = governor().find_action(&[log]).unwrap().unwrap();
        assert_eq!(event.initiator, Address([0x33; 20]));
        assert_eq!(event.beneficiary, Address::ZERO);
        assert_eq!(event.message, "CONTRIBUTION RECEIVED");
        assert_eq!(event.amount, amount);
    }

    #[test]
    fn test_state_and_voters() {
        let data = encode(&[Token::uint(4u8)]);
        assert_eq!(GovernorContract::decode_state(&data).unwrap(), ProposalState::Succeeded);

        let data = encode(&[Token::uint(9u8)]);
        assert!(GovernorContract::decode_state(&data).is_err());

        let data = encode(&[Token::Array(vec![
            Token::Address(Address([1; 20])),
            Token::Address(Address([2; 20])),
        ])]);
        assert_eq!(
            GovernorContract::decode_voters(&data).unwrap(),
            vec![Address([1; 20]), Address([2; 20])]
        );
    }

    #[test]
    fn test_queue_uses_description_hash() {
        let proposal = governor().decode_proposal_created(&created_log(3, "desc")).unwrap();
        let data = GovernorContract::encode_queue(&proposal);
        assert_eq!(&data[..4], &selector(signatures::QUEUE));
        // bytes32 salt is the fourth head word
        assert_eq!(&data[4 + 96..4 + 128], &lair_core::keccak256(b"desc"));
    }
}
