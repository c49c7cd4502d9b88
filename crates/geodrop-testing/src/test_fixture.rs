use crate::{deterministic_account, CountingStore, DropBuilder};
use chrono::{DateTime, Duration, TimeZone, Utc};
use geodrop_claims::{
    AccountId, AudienceDirectory, ClaimAttempt, ClaimConfig, ClaimResult, ClaimVerifier, Drop,
    DropId, DropProjection, DropStore, InMemoryDropStore, SettlementRef,
};
use geodrop_geo::Coordinates;
use std::sync::Arc;

/// A verifier over a store plus a controllable clock
pub struct TestFixture<S = CountingStore<InMemoryDropStore>> {
    pub verifier: Arc<ClaimVerifier<S, AudienceDirectory>>,
    now: DateTime<Utc>,
}

impl TestFixture {
    /// In-memory store wrapped in a [`CountingStore`], default config, no audience groups
    pub fn new() -> Self {
        Self::with_store(CountingStore::new(InMemoryDropStore::new()))
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: DropStore> TestFixture<S> {
    pub fn with_store(store: S) -> Self {
        Self::with_parts(store, AudienceDirectory::new(), ClaimConfig::default())
    }

    pub fn with_parts(store: S, audience: AudienceDirectory, config: ClaimConfig) -> Self {
        Self {
            verifier: Arc::new(ClaimVerifier::with_audience(store, audience, config)),
            // Fixed instant keeps failures reproducible
            now: Utc
                .with_ymd_and_hms(2026, 6, 1, 12, 0, 0)
                .single()
                .unwrap_or_else(Utc::now),
        }
    }

    pub fn store(&self) -> &S {
        self.verifier.store()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn advance_by(&mut self, duration: Duration) {
        self.now += duration;
    }

    /// Build the drop at the fixture clock and insert it
    pub fn create_drop(&self, builder: &DropBuilder) -> Drop {
        let drop = builder.build(self.now);
        self.store()
            .insert(&drop)
            .unwrap_or_else(|e| panic!("Failed to insert drop {}: {e}", drop.id));
        drop
    }

    /// Claim as the named deterministic account, stamped with the fixture clock
    pub fn try_claim(
        &self,
        drop_id: &DropId,
        claimant: &str,
        location: Coordinates,
    ) -> ClaimResult<DropProjection> {
        self.try_claim_as(drop_id, &deterministic_account(claimant), location)
    }

    pub fn try_claim_as(
        &self,
        drop_id: &DropId,
        claimant: &AccountId,
        location: Coordinates,
    ) -> ClaimResult<DropProjection> {
        let attempt = ClaimAttempt::new(claimant.clone(), location, self.now);
        self.verifier.attempt_claim(drop_id, &attempt)
    }

    pub fn try_claim_with_proof(
        &self,
        drop_id: &DropId,
        claimant: &str,
        location: Coordinates,
        proof: &SettlementRef,
    ) -> ClaimResult<DropProjection> {
        let attempt = ClaimAttempt::new(deterministic_account(claimant), location, self.now)
            .with_settlement_ref(proof.clone());
        self.verifier.attempt_claim(drop_id, &attempt)
    }

    pub fn try_attach_settlement(
        &self,
        drop_id: &DropId,
        settlement_ref: &str,
    ) -> ClaimResult<DropProjection> {
        let settlement_ref: SettlementRef = settlement_ref.parse()?;
        self.verifier
            .attach_settlement(drop_id, &settlement_ref, self.now)
    }

    /// The stored record, bypassing the verifier
    pub fn stored(&self, drop_id: &DropId) -> Drop {
        self.store()
            .load(drop_id)
            .unwrap_or_else(|e| panic!("Failed to load drop {drop_id}: {e}"))
            .unwrap_or_else(|| panic!("Drop {drop_id} should exist"))
    }
}
