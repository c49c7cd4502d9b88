use geodrop_claims::{ClaimError, ClaimErrorKind, DropStore, SettlementRef};
use geodrop_db::DropDatabase;
use geodrop_settlement::{
    BackendError, SettlementAdapter, SettlementBackend, SettlementOutcome, TransferRequest,
};
use geodrop_testing::{deterministic_account, istanbul, DropBuilder, TestFixture};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Test that attaching the same settlement reference twice is a no-op
///
/// **Test flow:**
/// 1. Claim a drop
/// 2. Attach "tx-1" twice
/// 3. Verify both calls return the same projection and only one write happened
#[test]
fn test_attach_same_reference_is_idempotent() {
    let test = TestFixture::new();
    let drop = test.create_drop(&DropBuilder::new());
    test.try_claim(&drop.id, "finder", istanbul()).unwrap();
    test.store().reset();

    let first = test.try_attach_settlement(&drop.id, "tx-1").unwrap();
    let second = test.try_attach_settlement(&drop.id, "tx-1").unwrap();

    assert!(first.settled);
    assert_eq!(first.settlement_ref, second.settlement_ref);
    assert_eq!(test.store().writes(), 1);

    println!("✅ Repeated settlement attach was a no-op");
}

/// Test that a second, different reference is refused and the first is kept
#[test]
fn test_attach_different_reference_conflicts() {
    let test = TestFixture::new();
    let drop = test.create_drop(&DropBuilder::new());
    test.try_claim(&drop.id, "finder", istanbul()).unwrap();
    test.try_attach_settlement(&drop.id, "tx-1").unwrap();

    let err = test
        .try_attach_settlement(&drop.id, "tx-2")
        .expect_err("different reference must conflict");

    match &err {
        ClaimError::SettlementConflict { existing, attempted } => {
            assert_eq!(existing.as_str(), "tx-1");
            assert_eq!(attempted.as_str(), "tx-2");
        }
        other => panic!("expected SettlementConflict, got {other:?}"),
    }
    assert_eq!(
        test.stored(&drop.id).settlement_ref,
        Some("tx-1".parse().unwrap())
    );
}

/// Test that a pre-confirmed transfer is stored with the claim in one write
#[test]
fn test_claim_with_settlement_proof_is_one_write() {
    let test = TestFixture::new();
    let drop = test.create_drop(&DropBuilder::new());
    let proof: SettlementRef = "tx-confirmed".parse().unwrap();

    let projection = test
        .try_claim_with_proof(&drop.id, "finder", istanbul(), &proof)
        .unwrap();

    assert!(projection.settled);
    assert_eq!(test.store().mutation_calls(), 1);
    assert_eq!(test.store().writes(), 1);
    assert!(test.store().list_unsettled(10).unwrap().is_empty());
}

/// Settling before the claim is refused
#[test]
fn test_attach_before_claim_is_refused() {
    let test = TestFixture::new();
    let drop = test.create_drop(&DropBuilder::new());

    let err = test.try_attach_settlement(&drop.id, "tx-early").unwrap_err();
    assert_eq!(err.kind(), ClaimErrorKind::NotClaimed);
}

/// Ledger double that derives its reference from the idempotency key
#[derive(Default)]
struct Ledger {
    transfers: AtomicUsize,
}

impl SettlementBackend for Ledger {
    async fn transfer(&self, request: &TransferRequest) -> Result<SettlementRef, BackendError> {
        self.transfers.fetch_add(1, Ordering::SeqCst);
        assert_eq!(request.payer, deterministic_account("creator"));
        assert_eq!(request.payee, deterministic_account("finder"));
        format!("tx-{}", request.drop_id)
            .parse()
            .map_err(|e| BackendError::Permanent(format!("{e}")))
    }
}

/// Test claim then settlement end to end on SQLite
///
/// **Test flow:**
/// 1. Claim a drop stored in SQLite; it shows up as unsettled
/// 2. Settle it through the adapter
/// 3. Settle again: `AlreadySettled`, backend not called a second time
#[tokio::test]
async fn test_settlement_adapter_end_to_end() {
    let test = TestFixture::with_store(DropDatabase::create_in_memory().unwrap());
    let drop = test.create_drop(&DropBuilder::new());

    // 1. Claim
    test.try_claim(&drop.id, "finder", istanbul()).unwrap();
    let unsettled = test.store().list_unsettled(10).unwrap();
    assert_eq!(unsettled.len(), 1);
    assert_eq!(unsettled[0].id, drop.id);

    // 2. Settle
    let adapter = SettlementAdapter::new(test.verifier.clone(), Ledger::default());
    let outcome = adapter.settle(&drop.id).await.unwrap();
    let projection = match outcome {
        SettlementOutcome::Settled(projection) => projection,
        other => panic!("expected Settled, got {other:?}"),
    };
    let expected = format!("tx-{}", drop.id);
    assert_eq!(projection.settlement_ref.unwrap().as_str(), expected);
    assert!(test.store().list_unsettled(10).unwrap().is_empty());

    // 3. Settle again
    let again = adapter.settle(&drop.id).await.unwrap();
    assert!(matches!(again, SettlementOutcome::AlreadySettled(_)));
    assert_eq!(adapter.backend().transfers.load(Ordering::SeqCst), 1);

    println!("✅ Drop claimed and settled exactly once");
}
