/*!
# Drop Store Contract

The persistence seam consumed by the claim verifier. A store owns the drop
records; the only mutations it exposes are the claim compare-and-swap and the
write-once settlement attachment.
*/

use crate::{
    types::{AccountId, Drop, DropId, SettlementRef},
    StoreResult,
};
use chrono::{DateTime, Utc};
use geodrop_geo::Coordinates;
use std::sync::Arc;

/// The `Unclaimed -> Claimed` write requested by the verifier
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimTransition {
    pub claimant: AccountId,
    pub claimed_at: DateTime<Utc>,
    /// Pre-confirmed settlement, written in the same atomic update
    pub settlement_ref: Option<SettlementRef>,
}

/// Result of [`DropStore::compare_and_swap_claim`]
#[derive(Debug, Clone, PartialEq)]
pub enum CasOutcome {
    /// The stored drop was unclaimed and is now claimed
    Swapped(Drop),
    /// The stored drop was no longer unclaimed; nothing was written
    Conflict,
    NotFound,
}

/// Result of [`DropStore::attach_settlement_if_absent`]
#[derive(Debug, Clone, PartialEq)]
pub enum AttachOutcome {
    Attached(Drop),
    /// A reference was already recorded; the stored drop is returned unchanged
    AlreadySet(Drop),
    NotClaimed,
    NotFound,
}

/// A drop returned by a proximity search
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyDrop {
    pub drop: Drop,
    pub distance_meters: f64,
}

pub trait DropStore: Send + Sync {
    /// Persist a newly created drop. Fails with `Duplicate` if the id exists.
    fn insert(&self, drop: &Drop) -> StoreResult<()>;

    fn load(&self, id: &DropId) -> StoreResult<Option<Drop>>;

    /// Atomically claim the drop if, and only if, it is still unclaimed
    fn compare_and_swap_claim(
        &self,
        id: &DropId,
        transition: &ClaimTransition,
    ) -> StoreResult<CasOutcome>;

    /// Record the settlement reference of a claimed drop unless one exists
    fn attach_settlement_if_absent(
        &self,
        id: &DropId,
        settlement_ref: &SettlementRef,
    ) -> StoreResult<AttachOutcome>;

    /// Drops within `radius_meters` of `center`, nearest first
    fn find_nearby(
        &self,
        center: &Coordinates,
        radius_meters: f64,
        limit: usize,
    ) -> StoreResult<Vec<NearbyDrop>>;

    /// Most recently created drops first
    fn list_recent(&self, limit: usize) -> StoreResult<Vec<Drop>>;

    /// Claimed drops with no settlement reference, oldest claim first
    fn list_unsettled(&self, limit: usize) -> StoreResult<Vec<Drop>>;
}

impl<S: DropStore + ?Sized> DropStore for Arc<S> {
    fn insert(&self, drop: &Drop) -> StoreResult<()> {
        (**self).insert(drop)
    }

    fn load(&self, id: &DropId) -> StoreResult<Option<Drop>> {
        (**self).load(id)
    }

    fn compare_and_swap_claim(
        &self,
        id: &DropId,
        transition: &ClaimTransition,
    ) -> StoreResult<CasOutcome> {
        (**self).compare_and_swap_claim(id, transition)
    }

    fn attach_settlement_if_absent(
        &self,
        id: &DropId,
        settlement_ref: &SettlementRef,
    ) -> StoreResult<AttachOutcome> {
        (**self).attach_settlement_if_absent(id, settlement_ref)
    }

    fn find_nearby(
        &self,
        center: &Coordinates,
        radius_meters: f64,
        limit: usize,
    ) -> StoreResult<Vec<NearbyDrop>> {
        (**self).find_nearby(center, radius_meters, limit)
    }

    fn list_recent(&self, limit: usize) -> StoreResult<Vec<Drop>> {
        (**self).list_recent(limit)
    }

    fn list_unsettled(&self, limit: usize) -> StoreResult<Vec<Drop>> {
        (**self).list_unsettled(limit)
    }
}

/// Shared by store implementations: keep drops within the radius, nearest first
pub fn rank_nearby<I>(drops: I, center: &Coordinates, radius_meters: f64, limit: usize) -> Vec<NearbyDrop>
where
    I: IntoIterator<Item = Drop>,
{
    let mut nearby: Vec<NearbyDrop> = drops
        .into_iter()
        .filter_map(|drop| {
            let distance_meters = center.distance_to(&drop.location);
            (distance_meters <= radius_meters).then_some(NearbyDrop {
                drop,
                distance_meters,
            })
        })
        .collect();

    nearby.sort_by(|a, b| a.distance_meters.total_cmp(&b.distance_meters));
    nearby.truncate(limit);
    nearby
}
