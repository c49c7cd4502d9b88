use geodrop_claims::{
    AccountId, AttachOutcome, CasOutcome, ClaimTransition, Drop, DropId, DropStore, NearbyDrop,
    SettlementRef, StoreResult,
};
use geodrop_geo::Coordinates;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Store wrapper that lets a rival win the race.
///
/// On the first compare-and-swap it claims the drop for `rival` directly on the
/// inner store, then forwards the caller's swap, which therefore conflicts.
/// This reproduces the window between a verifier's load and its write.
pub struct RacingStore<S> {
    inner: S,
    rival: AccountId,
    fired: AtomicBool,
    cas_calls: AtomicUsize,
}

impl<S: DropStore> RacingStore<S> {
    pub fn new(inner: S, rival: AccountId) -> Self {
        Self {
            inner,
            rival,
            fired: AtomicBool::new(false),
            cas_calls: AtomicUsize::new(0),
        }
    }

    pub fn cas_calls(&self) -> usize {
        self.cas_calls.load(Ordering::SeqCst)
    }
}

impl<S: DropStore> DropStore for RacingStore<S> {
    fn insert(&self, drop: &Drop) -> StoreResult<()> {
        self.inner.insert(drop)
    }

    fn load(&self, id: &DropId) -> StoreResult<Option<Drop>> {
        self.inner.load(id)
    }

    fn compare_and_swap_claim(
        &self,
        id: &DropId,
        transition: &ClaimTransition,
    ) -> StoreResult<CasOutcome> {
        self.cas_calls.fetch_add(1, Ordering::SeqCst);
        if !self.fired.swap(true, Ordering::SeqCst) {
            let rival = ClaimTransition {
                claimant: self.rival.clone(),
                claimed_at: transition.claimed_at,
                settlement_ref: None,
            };
            self.inner.compare_and_swap_claim(id, &rival)?;
        }
        self.inner.compare_and_swap_claim(id, transition)
    }

    fn attach_settlement_if_absent(
        &self,
        id: &DropId,
        settlement_ref: &SettlementRef,
    ) -> StoreResult<AttachOutcome> {
        self.inner.attach_settlement_if_absent(id, settlement_ref)
    }

    fn find_nearby(
        &self,
        center: &Coordinates,
        radius_meters: f64,
        limit: usize,
    ) -> StoreResult<Vec<NearbyDrop>> {
        self.inner.find_nearby(center, radius_meters, limit)
    }

    fn list_recent(&self, limit: usize) -> StoreResult<Vec<Drop>> {
        self.inner.list_recent(limit)
    }

    fn list_unsettled(&self, limit: usize) -> StoreResult<Vec<Drop>> {
        self.inner.list_unsettled(limit)
    }
}
