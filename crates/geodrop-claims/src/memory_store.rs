use crate::{
    store::{rank_nearby, AttachOutcome, CasOutcome, ClaimTransition, DropStore, NearbyDrop},
    types::{ClaimState, Drop, DropId, SettlementRef},
    StoreError, StoreResult,
};
use geodrop_geo::Coordinates;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Process-local drop store.
///
/// Each drop sits behind its own mutex; the map lock is only taken for writing
/// on insert, so claims against different drops never wait on each other.
#[derive(Debug, Default)]
pub struct InMemoryDropStore {
    drops: RwLock<HashMap<DropId, Arc<Mutex<Drop>>>>,
}

fn poisoned<T>(_: PoisonError<T>) -> StoreError {
    StoreError::backend("in-memory store lock poisoned")
}

impl InMemoryDropStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.drops.read().map_err(poisoned)?.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    fn entry(&self, id: &DropId) -> StoreResult<Option<Arc<Mutex<Drop>>>> {
        Ok(self.drops.read().map_err(poisoned)?.get(id).cloned())
    }

    fn snapshot(&self) -> StoreResult<Vec<Drop>> {
        let entries: Vec<Arc<Mutex<Drop>>> =
            self.drops.read().map_err(poisoned)?.values().cloned().collect();

        entries
            .iter()
            .map(|entry| entry.lock().map(|drop| drop.clone()).map_err(poisoned))
            .collect()
    }
}

impl DropStore for InMemoryDropStore {
    fn insert(&self, drop: &Drop) -> StoreResult<()> {
        let mut drops = self.drops.write().map_err(poisoned)?;
        if drops.contains_key(&drop.id) {
            return Err(StoreError::Duplicate(drop.id.clone()));
        }
        drops.insert(drop.id.clone(), Arc::new(Mutex::new(drop.clone())));
        Ok(())
    }

    fn load(&self, id: &DropId) -> StoreResult<Option<Drop>> {
        let Some(entry) = self.entry(id)? else {
            return Ok(None);
        };
        let drop = entry.lock().map_err(poisoned)?.clone();
        Ok(Some(drop))
    }

    fn compare_and_swap_claim(
        &self,
        id: &DropId,
        transition: &ClaimTransition,
    ) -> StoreResult<CasOutcome> {
        let Some(entry) = self.entry(id)? else {
            return Ok(CasOutcome::NotFound);
        };

        let mut drop = entry.lock().map_err(poisoned)?;
        if drop.claim_state != ClaimState::Unclaimed {
            return Ok(CasOutcome::Conflict);
        }

        drop.apply_claim(
            transition.claimant.clone(),
            transition.claimed_at,
            transition.settlement_ref.clone(),
        );
        Ok(CasOutcome::Swapped(drop.clone()))
    }

    fn attach_settlement_if_absent(
        &self,
        id: &DropId,
        settlement_ref: &SettlementRef,
    ) -> StoreResult<AttachOutcome> {
        let Some(entry) = self.entry(id)? else {
            return Ok(AttachOutcome::NotFound);
        };

        let mut drop = entry.lock().map_err(poisoned)?;
        if drop.claim_state != ClaimState::Claimed {
            return Ok(AttachOutcome::NotClaimed);
        }
        if drop.settlement_ref.is_some() {
            return Ok(AttachOutcome::AlreadySet(drop.clone()));
        }

        drop.settlement_ref = Some(settlement_ref.clone());
        Ok(AttachOutcome::Attached(drop.clone()))
    }

    fn find_nearby(
        &self,
        center: &Coordinates,
        radius_meters: f64,
        limit: usize,
    ) -> StoreResult<Vec<NearbyDrop>> {
        Ok(rank_nearby(self.snapshot()?, center, radius_meters, limit))
    }

    fn list_recent(&self, limit: usize) -> StoreResult<Vec<Drop>> {
        let mut drops = self.snapshot()?;
        drops.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        drops.truncate(limit);
        Ok(drops)
    }

    fn list_unsettled(&self, limit: usize) -> StoreResult<Vec<Drop>> {
        let mut drops: Vec<Drop> = self
            .snapshot()?
            .into_iter()
            .filter(Drop::is_unsettled)
            .collect();
        drops.sort_by(|a, b| a.claimed_at.cmp(&b.claimed_at));
        drops.truncate(limit);
        Ok(drops)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccountId, AudienceScope, NewDrop};
    use chrono::{Duration, Utc};
    use rust_decimal::dec;

    fn drop_at(latitude: f64, longitude: f64) -> Drop {
        Drop::create(
            NewDrop {
                location: Coordinates::new(latitude, longitude).unwrap(),
                amount: dec!(2),
                message: "hello".to_string(),
                creator: "GCREATOR".parse().unwrap(),
                audience: AudienceScope::Public,
                expires_at: None,
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn transition(claimant: &str) -> ClaimTransition {
        ClaimTransition {
            claimant: claimant.parse::<AccountId>().unwrap(),
            claimed_at: Utc::now(),
            settlement_ref: None,
        }
    }

    #[test]
    fn test_insert_rejects_duplicate() {
        let store = InMemoryDropStore::new();
        let drop = drop_at(41.0, 29.0);
        store.insert(&drop).unwrap();
        assert!(matches!(store.insert(&drop), Err(StoreError::Duplicate(_))));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_compare_and_swap_only_once() {
        let store = InMemoryDropStore::new();
        let drop = drop_at(41.0, 29.0);
        store.insert(&drop).unwrap();

        let first = store.compare_and_swap_claim(&drop.id, &transition("GALICE")).unwrap();
        let CasOutcome::Swapped(claimed) = first else {
            panic!("first swap should succeed");
        };
        assert_eq!(claimed.claimant.unwrap().as_str(), "GALICE");

        let second = store.compare_and_swap_claim(&drop.id, &transition("GBOB")).unwrap();
        assert_eq!(second, CasOutcome::Conflict);

        let stored = store.load(&drop.id).unwrap().unwrap();
        assert_eq!(stored.claimant.unwrap().as_str(), "GALICE");
    }

    #[test]
    fn test_compare_and_swap_missing_drop() {
        let store = InMemoryDropStore::new();
        let outcome = store
            .compare_and_swap_claim(&DropId::generate(), &transition("GALICE"))
            .unwrap();
        assert_eq!(outcome, CasOutcome::NotFound);
    }

    #[test]
    fn test_attach_requires_claim_and_is_write_once() {
        let store = InMemoryDropStore::new();
        let drop = drop_at(41.0, 29.0);
        store.insert(&drop).unwrap();
        let tx: SettlementRef = "tx-1".parse().unwrap();

        assert_eq!(
            store.attach_settlement_if_absent(&drop.id, &tx).unwrap(),
            AttachOutcome::NotClaimed
        );

        store.compare_and_swap_claim(&drop.id, &transition("GALICE")).unwrap();
        assert!(matches!(
            store.attach_settlement_if_absent(&drop.id, &tx).unwrap(),
            AttachOutcome::Attached(_)
        ));

        let other: SettlementRef = "tx-2".parse().unwrap();
        let AttachOutcome::AlreadySet(existing) =
            store.attach_settlement_if_absent(&drop.id, &other).unwrap()
        else {
            panic!("second attach should report the existing reference");
        };
        assert_eq!(existing.settlement_ref, Some(tx));
    }

    #[test]
    fn test_find_nearby_orders_by_distance() {
        let store = InMemoryDropStore::new();
        let center = Coordinates::new(41.0082, 28.9784).unwrap();
        let far = drop_at(center.offset(0.0, 900.0).latitude(), center.longitude());
        let near = drop_at(center.offset(0.0, 100.0).latitude(), center.longitude());
        let outside = drop_at(center.offset(0.0, 6_000.0).latitude(), center.longitude());
        for drop in [&far, &near, &outside] {
            store.insert(drop).unwrap();
        }

        let found = store.find_nearby(&center, 5_000.0, 10).unwrap();
        let ids: Vec<&DropId> = found.iter().map(|n| &n.drop.id).collect();
        assert_eq!(ids, vec![&near.id, &far.id]);
        assert!((found[0].distance_meters - 100.0).abs() < 0.5);

        assert_eq!(store.find_nearby(&center, 5_000.0, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_list_recent_and_unsettled() {
        let store = InMemoryDropStore::new();
        let mut older = drop_at(41.0, 29.0);
        older.created_at = Utc::now() - Duration::hours(1);
        let newer = drop_at(41.0, 29.0);
        store.insert(&older).unwrap();
        store.insert(&newer).unwrap();

        let recent = store.list_recent(10).unwrap();
        assert_eq!(recent[0].id, newer.id);
        assert_eq!(recent[1].id, older.id);

        assert!(store.list_unsettled(10).unwrap().is_empty());
        store.compare_and_swap_claim(&older.id, &transition("GALICE")).unwrap();
        let unsettled = store.list_unsettled(10).unwrap();
        assert_eq!(unsettled.len(), 1);
        assert_eq!(unsettled[0].id, older.id);
    }
}
