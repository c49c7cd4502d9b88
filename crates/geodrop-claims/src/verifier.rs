/*!
# Claim Verification

[`ClaimVerifier`] is the only component allowed to move a drop from
`Unclaimed` to `Claimed`. Every claim runs the same pipeline:

1. load the drop,
2. run the gate checks in a fixed order, stopping at the first failure,
3. commit with a compare-and-swap that only succeeds if the stored drop is
   still unclaimed.

A lost compare-and-swap means another claimant won between our read and our
write. Verification is re-run from the load so the caller gets the real reason
(normally `AlreadyClaimed`). Nothing is written on any failure path.
*/

use crate::{
    audience::{AudienceDirectory, AudiencePolicy},
    config::ClaimConfig,
    store::{AttachOutcome, CasOutcome, ClaimTransition, DropStore},
    types::{ClaimAttempt, ClaimState, Drop, DropId, DropProjection, SettlementRef},
    ClaimError, ClaimResult,
};
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

pub struct ClaimVerifier<S, A = AudienceDirectory> {
    store: S,
    audience: A,
    config: ClaimConfig,
}

impl<S: DropStore> ClaimVerifier<S, AudienceDirectory> {
    /// Verifier with an empty audience directory: restricted drops are unclaimable
    pub fn new(store: S, config: ClaimConfig) -> Self {
        Self::with_audience(store, AudienceDirectory::default(), config)
    }
}

impl<S: DropStore, A: AudiencePolicy> ClaimVerifier<S, A> {
    pub fn with_audience(store: S, audience: A, config: ClaimConfig) -> Self {
        Self {
            store,
            audience,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ClaimConfig {
        &self.config
    }

    fn load(&self, drop_id: &DropId) -> ClaimResult<Drop> {
        self.store
            .load(drop_id)?
            .ok_or_else(|| ClaimError::NotFound(drop_id.clone()))
    }

    /// Read-only projection of a drop as of `now`
    pub fn view(&self, drop_id: &DropId, now: DateTime<Utc>) -> ClaimResult<DropProjection> {
        Ok(self.load(drop_id)?.projection(now))
    }

    /// Run the claim gate against `drop` without writing anything.
    ///
    /// Returns the measured distance in meters when every check passes.
    pub fn evaluate(&self, drop: &Drop, attempt: &ClaimAttempt) -> ClaimResult<f64> {
        if drop.claim_state == ClaimState::Claimed {
            return Err(ClaimError::AlreadyClaimed);
        }

        if drop.is_expired_at(attempt.timestamp) {
            return Err(ClaimError::Expired);
        }

        if !self.audience.is_authorized(&drop.audience, &attempt.claimant) {
            return Err(ClaimError::NotEligible);
        }

        let distance_meters = drop.location.distance_to(&attempt.location);
        if distance_meters > self.config.claim_radius_meters {
            return Err(ClaimError::OutOfRange {
                distance_meters,
                radius_meters: self.config.claim_radius_meters,
            });
        }

        if attempt.claimant == drop.creator {
            return Err(ClaimError::SelfClaimNotAllowed);
        }

        Ok(distance_meters)
    }

    /// Claim `drop_id` for the attempt's claimant.
    ///
    /// Exactly one store write on success, none on failure. A pre-confirmed
    /// settlement reference on the attempt is stored in that same write.
    pub fn attempt_claim(
        &self,
        drop_id: &DropId,
        attempt: &ClaimAttempt,
    ) -> ClaimResult<DropProjection> {
        let transition = ClaimTransition {
            claimant: attempt.claimant.clone(),
            claimed_at: attempt.timestamp,
            settlement_ref: attempt.settlement_ref.clone(),
        };

        for round in 0..=self.config.max_cas_retries {
            let drop = self.load(drop_id)?;

            let distance_meters = match self.evaluate(&drop, attempt) {
                Ok(distance_meters) => distance_meters,
                Err(err) => {
                    debug!(
                        drop_id = %drop_id,
                        claimant = %attempt.claimant,
                        kind = %err.kind(),
                        "claim rejected"
                    );
                    return Err(err);
                }
            };

            match self.store.compare_and_swap_claim(drop_id, &transition)? {
                CasOutcome::Swapped(claimed) => {
                    info!(
                        drop_id = %drop_id,
                        claimant = %attempt.claimant,
                        distance_meters,
                        settled = claimed.settlement_ref.is_some(),
                        "drop claimed"
                    );
                    return Ok(claimed.projection(attempt.timestamp));
                }
                CasOutcome::Conflict => {
                    warn!(
                        drop_id = %drop_id,
                        claimant = %attempt.claimant,
                        round,
                        "claim lost compare-and-swap race, re-verifying"
                    );
                }
                CasOutcome::NotFound => return Err(ClaimError::NotFound(drop_id.clone())),
            }
        }

        Err(ClaimError::AlreadyClaimed)
    }

    /// Record the settlement reference for a claimed drop.
    ///
    /// Repeating the call with the same reference is a no-op. A different
    /// reference fails with `SettlementConflict` and leaves the stored one intact.
    /// The returned projection is taken as of `now`.
    pub fn attach_settlement(
        &self,
        drop_id: &DropId,
        settlement_ref: &SettlementRef,
        now: DateTime<Utc>,
    ) -> ClaimResult<DropProjection> {
        match self
            .store
            .attach_settlement_if_absent(drop_id, settlement_ref)?
        {
            AttachOutcome::Attached(drop) => {
                info!(drop_id = %drop_id, settlement_ref = %settlement_ref, "settlement attached");
                Ok(drop.projection(now))
            }
            AttachOutcome::AlreadySet(drop) => match &drop.settlement_ref {
                Some(existing) if existing == settlement_ref => {
                    debug!(drop_id = %drop_id, settlement_ref = %settlement_ref, "settlement already attached");
                    Ok(drop.projection(now))
                }
                Some(existing) => {
                    error!(
                        drop_id = %drop_id,
                        existing = %existing,
                        attempted = %settlement_ref,
                        "refusing to replace a finalized settlement reference"
                    );
                    Err(ClaimError::SettlementConflict {
                        existing: existing.clone(),
                        attempted: settlement_ref.clone(),
                    })
                }
                None => Err(ClaimError::Store(crate::StoreError::Corrupt(format!(
                    "store reported a settlement on {} but returned none",
                    drop_id
                )))),
            },
            AttachOutcome::NotClaimed => Err(ClaimError::NotClaimed),
            AttachOutcome::NotFound => Err(ClaimError::NotFound(drop_id.clone())),
        }
    }
}
