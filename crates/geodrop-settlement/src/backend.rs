use crate::BackendError;
use geodrop_claims::{AccountId, DropId, SettlementRef};
use rust_decimal::Decimal;
use std::future::Future;

/// One transfer from a drop's creator to its claimant
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRequest {
    /// Idempotency key: a backend must never move funds twice for one drop
    pub drop_id: DropId,
    pub payer: AccountId,
    pub payee: AccountId,
    pub amount: Decimal,
}

/// The ledger that actually moves funds
pub trait SettlementBackend: Send + Sync {
    fn transfer(
        &self,
        request: &TransferRequest,
    ) -> impl Future<Output = Result<SettlementRef, BackendError>> + Send;
}
