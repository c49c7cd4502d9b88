use geodrop_claims::{ClaimConfig, ClaimErrorKind, ClaimVerifier, ClaimAttempt, InMemoryDropStore, DropStore};
use geodrop_testing::{deterministic_account, istanbul, DropBuilder, RacingStore, TestFixture};

/// Test the window between load and write
///
/// A rival claims the drop after our verifier has loaded it and passed every
/// check. The compare-and-swap must lose, verification must re-run, and the
/// caller must see `AlreadyClaimed`, never a success.
///
/// **Test flow:**
/// 1. Wrap an in-memory store so a rival wins right before our first swap
/// 2. Attempt a claim that passes every check
/// 3. Verify `AlreadyClaimed` and that the rival owns the drop
/// 4. Verify the swap was attempted exactly once (the retry stopped at the check)
#[test]
fn test_lost_swap_reverifies_and_reports_already_claimed() {
    let rival = deterministic_account("rival");
    let test = TestFixture::with_store(RacingStore::new(InMemoryDropStore::new(), rival.clone()));
    let drop = test.create_drop(&DropBuilder::new());

    let err = test
        .try_claim(&drop.id, "early_finder_1", istanbul())
        .expect_err("the rival should win");

    assert_eq!(err.kind(), ClaimErrorKind::AlreadyClaimed);
    assert_eq!(test.stored(&drop.id).claimant, Some(rival));
    assert_eq!(test.store().cas_calls(), 1);

    println!("✅ Lost compare-and-swap re-verified into AlreadyClaimed");
}

/// With retries disabled the conflict maps straight to `AlreadyClaimed`
#[test]
fn test_no_retry_budget_still_reports_already_claimed() {
    let rival = deterministic_account("rival");
    let store = RacingStore::new(InMemoryDropStore::new(), rival);
    let drop = DropBuilder::new().build(chrono::Utc::now());
    store.insert(&drop).unwrap();

    let config = ClaimConfig {
        max_cas_retries: 0,
        ..Default::default()
    };
    let verifier = ClaimVerifier::new(store, config);
    let attempt = ClaimAttempt::new(deterministic_account("finder"), istanbul(), chrono::Utc::now());

    let err = verifier.attempt_claim(&drop.id, &attempt).unwrap_err();
    assert_eq!(err.kind(), ClaimErrorKind::AlreadyClaimed);
    assert_eq!(verifier.store().cas_calls(), 1);
}
