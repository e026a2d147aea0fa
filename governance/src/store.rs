//! Session-scoped proposal cache

use lair_core::U256;

use crate::contracts::GovernorContract;
use crate::error::{GovernanceError, Result};
use crate::proposal::{ExecutionStatus, Proposal};
use crate::provider::{BlockTag, CallRequest, LogFilter, WalletProvider};

/// Proposals known to the session, most recent first
#[derive(Debug, Clone, Default)]
pub struct ProposalStore {
    proposals: Vec<Proposal>,
}

impl ProposalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the cache from every `ProposalCreated` log the governor emitted
    pub async fn load_all(
        &mut self,
        provider: &dyn WalletProvider,
        governor: &GovernorContract,
    ) -> Result<&[Proposal]> {
        let filter = LogFilter {
            address: governor.address(),
            topic0: Some(GovernorContract::proposal_created_topic()),
            from_block: BlockTag::Number(0),
            to_block: BlockTag::Latest,
        };
        let logs = provider.logs(&filter).await.map_err(GovernanceError::read)?;
        log::debug!("→ {} ProposalCreated logs", logs.len());

        let mut snapshot = logs
            .iter()
            .map(|log| governor.decode_proposal_created(log))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        snapshot.reverse();

        self.proposals = snapshot;
        log::info!("📋 Loaded {} proposals", self.proposals.len());
        Ok(&self.proposals)
    }

    /// Re-read `proposalVotes(id)` and merge it into the cached record
    ///
    /// A failed read keeps the previous tally.
    pub async fn refresh_tally(
        &mut self,
        provider: &dyn WalletProvider,
        governor: &GovernorContract,
        id: &U256,
    ) -> Result<&Proposal> {
        let index = self.index_of(id)?;
        let request = CallRequest {
            from: None,
            to: governor.address(),
            data: GovernorContract::encode_proposal_votes(id),
        };

        let tally = match provider.call(&request).await {
            Ok(data) => GovernorContract::decode_proposal_votes(&data).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        match tally {
            Ok(tally) => self.proposals[index].tally = tally,
            Err(e) => log::warn!("⚠️ Could not refresh votes for proposal {}: {}", id, e),
        }
        Ok(&self.proposals[index])
    }

    /// Re-read `state(id)` and fold queued/executed into the cached status
    ///
    /// A failed read keeps the previous status.
    pub async fn refresh_status(
        &mut self,
        provider: &dyn WalletProvider,
        governor: &GovernorContract,
        id: &U256,
    ) -> Result<&Proposal> {
        let index = self.index_of(id)?;
        let request = CallRequest {
            from: None,
            to: governor.address(),
            data: GovernorContract::encode_state(id),
        };

        let state = match provider.call(&request).await {
            Ok(data) => GovernorContract::decode_state(&data).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        match state {
            Ok(state) => self.proposals[index].status = state.execution_status(),
            Err(e) => log::warn!("⚠️ Could not refresh state of proposal {}: {}", id, e),
        }
        Ok(&self.proposals[index])
    }

    pub fn find(&self, id: &U256) -> Option<&Proposal> {
        self.proposals.iter().find(|p| &p.id == id)
    }

    pub fn set_status(&mut self, id: &U256, status: ExecutionStatus) -> Result<()> {
        let index = self.index_of(id)?;
        self.proposals[index].status = status;
        Ok(())
    }

    pub fn proposals(&self) -> &[Proposal] {
        &self.proposals
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    /// Proposals still open for voting at `current_block`
    pub fn open_count(&self, current_block: u64) -> usize {
        self.proposals
            .iter()
            .filter(|p| !p.is_voting_closed(current_block))
            .count()
    }

    pub fn clear(&mut self) {
        self.proposals.clear();
    }

    fn index_of(&self, id: &U256) -> Result<usize> {
        self.proposals
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| GovernanceError::ProposalNotFound(id.to_string()))
    }
}
