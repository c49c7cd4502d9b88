mod counting_store;
mod drop_builder;
mod racing_store;
mod test_fixture;

pub use counting_store::*;
pub use drop_builder::*;
pub use racing_store::*;
pub use test_fixture::*;

use geodrop_claims::AccountId;
use geodrop_geo::Coordinates;
use sha2::{Digest, Sha256};

/// Sultanahmet, Istanbul
pub const ISTANBUL_LATITUDE: f64 = 41.0082;
pub const ISTANBUL_LONGITUDE: f64 = 28.9784;

pub fn istanbul() -> Coordinates {
    Coordinates::new(ISTANBUL_LATITUDE, ISTANBUL_LONGITUDE)
        .unwrap_or_else(|e| panic!("fixture coordinates must be valid: {e}"))
}

/// Stable account id derived from a human-readable name.
///
/// The same name always yields the same account, so tests can refer to
/// "creator" or "early_finder_1" across fixtures.
pub fn deterministic_account(identifier: &str) -> AccountId {
    let digest = Sha256::digest(identifier.as_bytes());
    let encoded = hex::encode_upper(digest);
    format!("G{}", &encoded[..55])
        .parse()
        .unwrap_or_else(|e| panic!("deterministic account for {identifier}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_account_is_stable() {
        let first = deterministic_account("early_finder_1");
        assert_eq!(first, deterministic_account("early_finder_1"));
        assert_ne!(first, deterministic_account("early_finder_2"));
        assert_eq!(first.as_str().len(), 56);
        assert!(first.as_str().starts_with('G'));
    }
}
