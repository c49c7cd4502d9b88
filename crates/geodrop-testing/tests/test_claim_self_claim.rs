use geodrop_claims::{ClaimErrorKind, ClaimState};
use geodrop_testing::{deterministic_account, istanbul, DropBuilder, TestFixture};

/// Test that a creator cannot claim their own drop
///
/// **Test flow:**
/// 1. Create an unclaimed, unexpired drop as "creator"
/// 2. Claim it as "creator" from the exact pin
/// 3. Verify `SelfClaimNotAllowed` and that the drop is still claimable by others
#[test]
fn test_creator_cannot_claim_own_drop() {
    let test = TestFixture::new();
    let drop = test.create_drop(&DropBuilder::new().creator(deterministic_account("creator")));

    let err = test
        .try_claim(&drop.id, "creator", istanbul())
        .expect_err("self claim must fail");
    assert_eq!(err.kind(), ClaimErrorKind::SelfClaimNotAllowed);
    assert_eq!(test.store().mutation_calls(), 0);
    assert_eq!(test.stored(&drop.id).claim_state, ClaimState::Unclaimed);

    test.try_claim(&drop.id, "friend", istanbul())
        .expect("someone else can still claim it");

    println!("✅ Self claim rejected, drop stayed available");
}
