use crate::{
    BackendError, SettlementBackend, SettlementConfig, SettlementError, SettlementResult,
    TransferRequest,
};
use backoff::future::retry;
use chrono::Utc;
use futures::future::join_all;
use geodrop_claims::{
    AudiencePolicy, ClaimError, ClaimState, ClaimVerifier, DropId, DropProjection, DropStore,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How a settlement attempt ended
#[derive(Debug, Clone, PartialEq)]
pub enum SettlementOutcome {
    /// The transfer went through and its reference is now on the drop
    Settled(DropProjection),
    /// The drop already carried a reference; the backend was not called
    AlreadySettled(DropProjection),
    /// Timed out or ran out of retries. The claim stands and the drop stays
    /// in the unsettled list for a later attempt.
    Unsettled(DropProjection),
}

/// Moves funds for claimed drops and records the result on the drop
pub struct SettlementAdapter<S, A, B> {
    verifier: Arc<ClaimVerifier<S, A>>,
    backend: B,
    config: SettlementConfig,
}

impl<S, A, B> SettlementAdapter<S, A, B>
where
    S: DropStore,
    A: AudiencePolicy,
    B: SettlementBackend,
{
    /// Create a new adapter with default configuration
    pub fn new(verifier: Arc<ClaimVerifier<S, A>>, backend: B) -> Self {
        Self::with_config(verifier, backend, SettlementConfig::default())
    }

    /// Create a new adapter with custom configuration
    pub fn with_config(
        verifier: Arc<ClaimVerifier<S, A>>,
        backend: B,
        config: SettlementConfig,
    ) -> Self {
        Self {
            verifier,
            backend,
            config,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Settle one claimed drop.
    ///
    /// Transient backend failures are retried with backoff; the whole attempt
    /// is bounded by `settlement_timeout`.
    pub async fn settle(&self, drop_id: &DropId) -> SettlementResult<SettlementOutcome> {
        let drop = self
            .verifier
            .store()
            .load(drop_id)
            .map_err(ClaimError::from)?
            .ok_or_else(|| ClaimError::NotFound(drop_id.clone()))?;

        if drop.claim_state != ClaimState::Claimed {
            return Err(ClaimError::NotClaimed.into());
        }
        if drop.settlement_ref.is_some() {
            debug!(drop_id = %drop_id, "drop already settled, skipping transfer");
            return Ok(SettlementOutcome::AlreadySettled(drop.projection(Utc::now())));
        }
        let Some(payee) = drop.claimant.clone() else {
            return Err(ClaimError::NotClaimed.into());
        };

        let request = TransferRequest {
            drop_id: drop_id.clone(),
            payer: drop.creator.clone(),
            payee,
            amount: drop.amount,
        };

        let backend = &self.backend;
        let request = &request;
        let transfer = retry(self.config.retry_backoff.clone(), || async move {
            backend.transfer(request).await.map_err(|e| match e {
                BackendError::Transient(_) => {
                    warn!(drop_id = %request.drop_id, error = %e, "settlement attempt failed, retrying");
                    backoff::Error::transient(e)
                }
                BackendError::Permanent(_) => backoff::Error::permanent(e),
            })
        });

        match tokio::time::timeout(self.config.settlement_timeout, transfer).await {
            Ok(Ok(settlement_ref)) => {
                let projection = self
                    .verifier
                    .attach_settlement(drop_id, &settlement_ref, Utc::now())?;
                info!(drop_id = %drop_id, settlement_ref = %settlement_ref, "drop settled");
                Ok(SettlementOutcome::Settled(projection))
            }
            Ok(Err(BackendError::Permanent(reason))) => Err(SettlementError::Rejected(reason)),
            Ok(Err(BackendError::Transient(reason))) => {
                warn!(drop_id = %drop_id, reason = %reason, "settlement retries exhausted, drop left unsettled");
                Ok(SettlementOutcome::Unsettled(drop.projection(Utc::now())))
            }
            Err(_) => {
                warn!(
                    drop_id = %drop_id,
                    timeout = ?self.config.settlement_timeout,
                    "settlement timed out, drop left unsettled"
                );
                Ok(SettlementOutcome::Unsettled(drop.projection(Utc::now())))
            }
        }
    }

    /// Settle several drops, at most `max_parallel_settlements` at a time
    pub async fn settle_batch(
        &self,
        drop_ids: &[DropId],
    ) -> SettlementResult<Vec<(DropId, SettlementResult<SettlementOutcome>)>> {
        if self.config.max_parallel_settlements == 0 {
            return Err(SettlementError::Config(
                "max_parallel_settlements must be positive".to_string(),
            ));
        }

        let mut results = Vec::with_capacity(drop_ids.len());
        for batch in drop_ids.chunks(self.config.max_parallel_settlements) {
            let outcomes = join_all(batch.iter().map(|id| self.settle(id))).await;
            results.extend(batch.iter().cloned().zip(outcomes));
        }

        info!(
            total = results.len(),
            settled = results
                .iter()
                .filter(|(_, r)| matches!(r, Ok(SettlementOutcome::Settled(_))))
                .count(),
            "settlement batch finished"
        );
        Ok(results)
    }
}
