use geodrop_claims::{ClaimState, DropStatus};
use geodrop_testing::{deterministic_account, istanbul, DropBuilder, TestFixture};

/// Test a claim from inside the radius by an eligible, non-creator account
///
/// **Test flow:**
/// 1. Create a public drop at the Istanbul pin
/// 2. Claim it from 25 meters away
/// 3. Verify the returned projection and the stored record agree
/// 4. Verify exactly one write reached the store
#[test]
fn test_claim_happy_path() {
    let test = TestFixture::new();

    // 1. Create drop
    let drop = test.create_drop(&DropBuilder::new());
    assert_eq!(test.stored(&drop.id).claim_state, ClaimState::Unclaimed);

    // 2. Claim from 25 m north-east
    let projection = test
        .try_claim(&drop.id, "early_finder_1", istanbul().offset(45.0, 25.0))
        .expect("claim within radius should succeed");

    println!("✅ Claim succeeded: {:?}", projection.status);

    // 3. Projection and store agree
    assert_eq!(projection.status, DropStatus::Claimed);
    assert_eq!(projection.claimant, Some(deterministic_account("early_finder_1")));
    assert_eq!(projection.claimed_at, Some(test.now()));
    assert!(!projection.settled);

    let stored = test.stored(&drop.id);
    assert_eq!(stored.claim_state, ClaimState::Claimed);
    assert_eq!(stored.claimant, projection.claimant);
    assert_eq!(stored.claimed_at, Some(test.now()));
    assert_eq!(stored.amount, drop.amount);

    // 4. Exactly one write
    assert_eq!(test.store().writes(), 1);
    assert_eq!(test.store().mutation_calls(), 1);

    println!("✅ Stored record reflects the claim");
}
