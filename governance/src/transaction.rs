//! Transaction submission and confirmation
//!
//! Submission and confirmation are separate steps: [`submit`] returns a
//! [`PendingTransaction`] as soon as the wallet hands back a hash, and the
//! caller decides whether to [`PendingTransaction::confirm`] (bounded wait)
//! or [`PendingTransaction::poll`] on its own schedule.

use lair_core::TxHash;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};

use crate::error::{GovernanceError, Result};
use crate::provider::{TransactionReceipt, TransactionRequest, WalletProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTransaction {
    pub hash: TxHash,
}

/// Sign and broadcast `request`
pub async fn submit(provider: &dyn WalletProvider, request: &TransactionRequest) -> Result<PendingTransaction> {
    log::debug!("→ send {} bytes to {}", request.data.len(), request.to);
    let hash = provider
        .send_transaction(request)
        .await
        .map_err(GovernanceError::submission)?;
    Ok(PendingTransaction { hash })
}

impl PendingTransaction {
    /// One receipt lookup; `None` while the transaction is still pending
    pub async fn poll(&self, provider: &dyn WalletProvider) -> Result<Option<TransactionReceipt>> {
        let receipt = provider
            .transaction_receipt(&self.hash)
            .await
            .map_err(GovernanceError::read)?;
        receipt.map(Self::check).transpose()
    }

    /// Wait for the receipt, polling every `interval`, for at most `limit`
    pub async fn confirm(
        &self,
        provider: &dyn WalletProvider,
        limit: Duration,
        interval: Duration,
    ) -> Result<TransactionReceipt> {
        let started = Instant::now();
        let waited = timeout(limit, async {
            loop {
                match provider.transaction_receipt(&self.hash).await {
                    Ok(Some(receipt)) => return receipt,
                    Ok(None) => {}
                    Err(e) => log::debug!("Receipt lookup for {} failed: {}", self.hash, e),
                }
                sleep(interval).await;
            }
        })
        .await;

        match waited {
            Ok(receipt) => {
                log::debug!(
                    "✅ {} mined in block {} after {:?}",
                    self.hash,
                    receipt.block_number,
                    started.elapsed()
                );
                Self::check(receipt)
            }
            Err(_) => {
                log::warn!("⚠️ No confirmation for {} after {:?}", self.hash, limit);
                Err(GovernanceError::TransactionTimeout {
                    hash: self.hash,
                    waited_secs: limit.as_secs(),
                })
            }
        }
    }

    fn check(receipt: TransactionReceipt) -> Result<TransactionReceipt> {
        if receipt.status {
            Ok(receipt)
        } else {
            log::error!(
                "❌ Transaction {} reverted in block {}",
                receipt.transaction_hash,
                receipt.block_number
            );
            Err(GovernanceError::TransactionReverted(format!(
                "transaction {} reverted in block {}",
                receipt.transaction_hash, receipt.block_number
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{BlockHeader, CallRequest, Log, LogFilter, ProviderError, ProviderResult};
    use async_trait::async_trait;
    use lair_core::{Address, U256};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Receipt appears after `ready_after` lookups
    struct SlowChain {
        ready_after: usize,
        status: bool,
        lookups: AtomicUsize,
        send: ProviderResult<TxHash>,
    }

    impl SlowChain {
        fn new(ready_after: usize, status: bool) -> Self {
            Self {
                ready_after,
                status,
                lookups: AtomicUsize::new(0),
                send: Ok(TxHash([9; 32])),
            }
        }
    }

    #[async_trait]
    impl WalletProvider for SlowChain {
        async fn request_accounts(&self) -> ProviderResult<Vec<Address>> {
            unimplemented!()
        }
        async fn chain_id(&self) -> ProviderResult<u64> {
            unimplemented!()
        }
        async fn switch_chain(&self, _chain_id: u64) -> ProviderResult<()> {
            unimplemented!()
        }
        async fn block_number(&self) -> ProviderResult<u64> {
            unimplemented!()
        }
        async fn block(&self, _number: u64) -> ProviderResult<Option<BlockHeader>> {
            unimplemented!()
        }
        async fn logs(&self, _filter: &LogFilter) -> ProviderResult<Vec<Log>> {
            unimplemented!()
        }
        async fn call(&self, _request: &CallRequest) -> ProviderResult<Vec<u8>> {
            unimplemented!()
        }
        async fn send_transaction(&self, _request: &TransactionRequest) -> ProviderResult<TxHash> {
            self.send.clone()
        }
        async fn transaction_receipt(&self, hash: &TxHash) -> ProviderResult<Option<TransactionReceipt>> {
            let seen = self.lookups.fetch_add(1, Ordering::SeqCst) + 1;
            if seen < self.ready_after {
                return Ok(None);
            }
            Ok(Some(TransactionReceipt {
                transaction_hash: *hash,
                block_number: 12,
                status: self.status,
                gas_used: U256::from(21_000u32),
                logs: vec![],
            }))
        }
    }

    fn request() -> TransactionRequest {
        TransactionRequest {
            from: Address([1; 20]),
            to: Address([2; 20]),
            data: vec![],
            value: U256::default(),
            gas: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirm_after_polling() {
        let chain = SlowChain::new(3, true);
        let pending = submit(&chain, &request()).await.unwrap();

        let receipt = pending
            .confirm(&chain, Duration::from_secs(60), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(receipt.transaction_hash, TxHash([9; 32]));
        assert_eq!(chain.lookups.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirm_times_out() {
        let chain = SlowChain::new(usize::MAX, true);
        let pending = PendingTransaction { hash: TxHash([9; 32]) };

        let err = pending
            .confirm(&chain, Duration::from_secs(5), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, GovernanceError::TransactionTimeout { waited_secs: 5, .. }));
    }

    #[tokio::test]
    async fn test_reverted_receipt() {
        let chain = SlowChain::new(1, false);
        let pending = PendingTransaction { hash: TxHash([9; 32]) };
        assert!(matches!(
            pending.poll(&chain).await,
            Err(GovernanceError::TransactionReverted(_))
        ));
    }

    #[tokio::test]
    async fn test_poll_pending() {
        let chain = SlowChain::new(2, true);
        let pending = PendingTransaction { hash: TxHash([9; 32]) };
        assert!(pending.poll(&chain).await.unwrap().is_none());
        assert!(pending.poll(&chain).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_submit_rejected() {
        let mut chain = SlowChain::new(1, true);
        chain.send = Err(ProviderError::UserRejected("User denied transaction signature".into()));
        assert!(matches!(
            submit(&chain, &request()).await,
            Err(GovernanceError::TransactionRejected(_))
        ));
    }
}
