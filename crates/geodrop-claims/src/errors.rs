use crate::types::{DropId, SettlementRef};
use geodrop_geo::GeoError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub type ClaimResult<T> = Result<T, ClaimError>;
pub type StoreResult<T> = Result<T, StoreError>;

/// Every way a claim or settlement request can fail.
///
/// Messages are user-facing; `OutOfRange` carries the measured distance so a
/// client can show how far away the claimant is.
#[derive(Error, Debug)]
pub enum ClaimError {
    #[error("Drop not found: {0}")]
    NotFound(DropId),

    #[error("Drop has already been claimed")]
    AlreadyClaimed,

    #[error("Drop has expired")]
    Expired,

    #[error("You are not eligible to claim this drop")]
    NotEligible,

    #[error(
        "You are {distance_meters:.0} meters away; move within {radius_meters:.0} meters to claim this drop"
    )]
    OutOfRange {
        distance_meters: f64,
        radius_meters: f64,
    },

    #[error("You cannot claim your own drop")]
    SelfClaimNotAllowed,

    #[error("Drop has not been claimed yet")]
    NotClaimed,

    #[error("Drop is already settled by {existing}; refusing to replace it with {attempted}")]
    SettlementConflict {
        existing: SettlementRef,
        attempted: SettlementRef,
    },

    #[error("Invalid location: {0}")]
    InvalidLocation(#[from] GeoError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid drop: {0}")]
    InvalidDrop(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Stable, wire-friendly classification of a [`ClaimError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimErrorKind {
    NotFound,
    AlreadyClaimed,
    Expired,
    NotEligible,
    OutOfRange,
    SelfClaimNotAllowed,
    NotClaimed,
    SettlementConflict,
    InvalidRequest,
    InvalidDrop,
    Internal,
}

impl ClaimErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimErrorKind::NotFound => "not_found",
            ClaimErrorKind::AlreadyClaimed => "already_claimed",
            ClaimErrorKind::Expired => "expired",
            ClaimErrorKind::NotEligible => "not_eligible",
            ClaimErrorKind::OutOfRange => "out_of_range",
            ClaimErrorKind::SelfClaimNotAllowed => "self_claim_not_allowed",
            ClaimErrorKind::NotClaimed => "not_claimed",
            ClaimErrorKind::SettlementConflict => "settlement_conflict",
            ClaimErrorKind::InvalidRequest => "invalid_request",
            ClaimErrorKind::InvalidDrop => "invalid_drop",
            ClaimErrorKind::Internal => "internal",
        }
    }

    /// Terminal kinds will fail again if the same request is repeated
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ClaimErrorKind::OutOfRange | ClaimErrorKind::Internal)
    }
}

impl std::fmt::Display for ClaimErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ClaimError {
    pub fn kind(&self) -> ClaimErrorKind {
        match self {
            ClaimError::NotFound(_) => ClaimErrorKind::NotFound,
            ClaimError::AlreadyClaimed => ClaimErrorKind::AlreadyClaimed,
            ClaimError::Expired => ClaimErrorKind::Expired,
            ClaimError::NotEligible => ClaimErrorKind::NotEligible,
            ClaimError::OutOfRange { .. } => ClaimErrorKind::OutOfRange,
            ClaimError::SelfClaimNotAllowed => ClaimErrorKind::SelfClaimNotAllowed,
            ClaimError::NotClaimed => ClaimErrorKind::NotClaimed,
            ClaimError::SettlementConflict { .. } => ClaimErrorKind::SettlementConflict,
            ClaimError::InvalidLocation(_) | ClaimError::InvalidRequest(_) => {
                ClaimErrorKind::InvalidRequest
            }
            ClaimError::InvalidDrop(_) => ClaimErrorKind::InvalidDrop,
            ClaimError::Store(_) => ClaimErrorKind::Internal,
        }
    }
}

/// Failures reported by a [`crate::DropStore`] implementation
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Corrupt drop record: {0}")]
    Corrupt(String),

    #[error("Store did not respond within {0:?}")]
    Timeout(Duration),

    #[error("Drop already exists: {0}")]
    Duplicate(DropId),
}

impl StoreError {
    pub fn backend(message: impl Into<String>) -> Self {
        StoreError::Backend(message.into().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_message_reports_distance() {
        let err = ClaimError::OutOfRange {
            distance_meters: 60.4,
            radius_meters: 50.0,
        };
        assert_eq!(
            err.to_string(),
            "You are 60 meters away; move within 50 meters to claim this drop"
        );
        assert_eq!(err.kind(), ClaimErrorKind::OutOfRange);
        assert!(!err.kind().is_terminal());
    }

    #[test]
    fn test_kinds_serialize_snake_case() {
        let json = serde_json::to_string(&ClaimErrorKind::SelfClaimNotAllowed).unwrap();
        assert_eq!(json, "\"self_claim_not_allowed\"");
        assert_eq!(
            ClaimErrorKind::SettlementConflict.to_string(),
            "settlement_conflict"
        );
    }

    #[test]
    fn test_store_errors_are_internal() {
        let err = ClaimError::from(StoreError::backend("disk full"));
        assert_eq!(err.kind(), ClaimErrorKind::Internal);
        assert!(err.to_string().contains("disk full"));
    }
}
