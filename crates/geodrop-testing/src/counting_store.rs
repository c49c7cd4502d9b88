use geodrop_claims::{
    AttachOutcome, CasOutcome, ClaimTransition, Drop, DropId, DropStore, NearbyDrop,
    SettlementRef, StoreResult,
};
use geodrop_geo::Coordinates;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Store wrapper that counts mutation calls and committed writes
#[derive(Debug, Default)]
pub struct CountingStore<S> {
    inner: S,
    mutation_calls: AtomicUsize,
    writes: AtomicUsize,
}

impl<S: DropStore> CountingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            mutation_calls: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Calls to the claim compare-and-swap or settlement attach, successful or not
    pub fn mutation_calls(&self) -> usize {
        self.mutation_calls.load(Ordering::SeqCst)
    }

    /// Mutations that actually changed a stored drop (inserts excluded)
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.mutation_calls.store(0, Ordering::SeqCst);
        self.writes.store(0, Ordering::SeqCst);
    }
}

impl<S: DropStore> DropStore for CountingStore<S> {
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
        self.mutation_calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self.inner.compare_and_swap_claim(id, transition)?;
        if matches!(outcome, CasOutcome::Swapped(_)) {
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(outcome)
    }

    fn attach_settlement_if_absent(
        &self,
        id: &DropId,
        settlement_ref: &SettlementRef,
    ) -> StoreResult<AttachOutcome> {
        self.mutation_calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self.inner.attach_settlement_if_absent(id, settlement_ref)?;
        if matches!(outcome, AttachOutcome::Attached(_)) {
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(outcome)
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
