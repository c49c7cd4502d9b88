/*!
# GeoDrop Claims

Claim verification for location-pinned drops. A drop can be claimed exactly
once, by an eligible account standing within the claim radius, before it
expires.

## Components

- [`ClaimVerifier`]: the gate checks plus the compare-and-swap commit
- [`DropStore`]: persistence contract; [`InMemoryDropStore`] ships here, the
  SQLite store lives in `geodrop-db`
- [`AudienceDirectory`]: group membership for restricted drops
- [`api`]: request/response shapes and [`ClaimService`]

```rust
use chrono::Utc;
use geodrop_claims::{
    AudienceScope, ClaimAttempt, ClaimConfig, ClaimResult, ClaimVerifier, Drop, DropStore,
    InMemoryDropStore, NewDrop,
};
use geodrop_geo::Coordinates;
use rust_decimal::dec;

fn example() -> ClaimResult<()> {
    let now = Utc::now();
    let pin = Coordinates::new(41.0082, 28.9784)?;
    let drop = Drop::create(
        NewDrop {
            location: pin,
            amount: dec!(1),
            message: "first one here wins".to_string(),
            creator: "GCREATOR".parse()?,
            audience: AudienceScope::Public,
            expires_at: None,
        },
        now,
    )?;

    let store = InMemoryDropStore::new();
    store.insert(&drop)?;

    let verifier = ClaimVerifier::new(store, ClaimConfig::default());
    let attempt = ClaimAttempt::new("GFINDER".parse()?, pin.offset(0.0, 10.0), now);
    verifier.attempt_claim(&drop.id, &attempt)?;
    Ok(())
}
```
*/

pub mod api;
pub mod audience;
pub mod config;
pub mod errors;
pub mod memory_store;
pub mod store;
pub mod types;
pub mod verifier;

pub use api::{AttachSettlementRequest, ClaimRequest, ClaimService, ErrorResponse};
pub use audience::{AudienceDirectory, AudiencePolicy};
pub use config::ClaimConfig;
pub use errors::{ClaimError, ClaimErrorKind, ClaimResult, StoreError, StoreResult};
pub use memory_store::InMemoryDropStore;
pub use store::{AttachOutcome, CasOutcome, ClaimTransition, DropStore, NearbyDrop};
pub use types::{
    AccountId, AudienceScope, ClaimAttempt, ClaimState, Drop, DropId, DropProjection,
    DropStatus, NewDrop, SettlementRef, MIN_DROP_AMOUNT, MAX_MESSAGE_CHARS,
};
pub use verifier::ClaimVerifier;
