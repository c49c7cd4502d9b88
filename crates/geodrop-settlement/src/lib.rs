/*!
# GeoDrop Settlement

Follow-up transfer for claimed drops. A claim is final the moment the claim
gate commits it; settlement moves the funds afterwards and records the ledger
reference on the drop, once.

## Quick Start

```rust,no_run
use geodrop_claims::{ClaimConfig, ClaimVerifier, DropId, InMemoryDropStore, SettlementRef};
use geodrop_settlement::{
    BackendError, SettlementAdapter, SettlementBackend, SettlementOutcome, TransferRequest,
};
use std::sync::Arc;

struct Ledger;

impl SettlementBackend for Ledger {
    async fn transfer(&self, request: &TransferRequest) -> Result<SettlementRef, BackendError> {
        format!("tx-{}", request.drop_id)
            .parse()
            .map_err(|e| BackendError::Permanent(format!("{}", e)))
    }
}

# async fn example(drop_id: DropId) -> Result<(), Box<dyn std::error::Error>> {
let verifier = Arc::new(ClaimVerifier::new(InMemoryDropStore::new(), ClaimConfig::default()));
let adapter = SettlementAdapter::new(verifier, Ledger);

match adapter.settle(&drop_id).await? {
    SettlementOutcome::Settled(drop) => println!("settled: {:?}", drop.settlement_ref),
    SettlementOutcome::AlreadySettled(_) => println!("nothing to do"),
    SettlementOutcome::Unsettled(_) => println!("will retry later"),
}
# Ok(())
# }
```
*/

mod adapter;
mod backend;
mod config;
mod error;

pub use adapter::{SettlementAdapter, SettlementOutcome};
pub use backend::{SettlementBackend, TransferRequest};
pub use config::SettlementConfig;
pub use error::{BackendError, SettlementError, SettlementResult};
