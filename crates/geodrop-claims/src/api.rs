/*!
# Caller-Facing Surface

Request and response shapes for whatever transport sits in front of the
verifier. Raw request fields are validated here; the claim instant is always
taken from the server clock, never from the caller.
*/

use crate::{
    audience::{AudienceDirectory, AudiencePolicy},
    store::DropStore,
    types::{AccountId, ClaimAttempt, DropId, DropProjection, SettlementRef},
    verifier::ClaimVerifier,
    ClaimError, ClaimErrorKind, ClaimResult,
};
use chrono::{DateTime, Utc};
use geodrop_geo::Coordinates;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRequest {
    pub drop_id: String,
    pub claimant_id: String,
    pub claimant_latitude: f64,
    pub claimant_longitude: f64,
    /// Proof of an already confirmed transfer, stored together with the claim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settlement_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachSettlementRequest {
    pub drop_id: String,
    pub settlement_ref: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub kind: ClaimErrorKind,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_meters: Option<f64>,
}

impl From<&ClaimError> for ErrorResponse {
    fn from(err: &ClaimError) -> Self {
        let distance_meters = match err {
            ClaimError::OutOfRange {
                distance_meters, ..
            } => Some(distance_meters.round()),
            _ => None,
        };

        Self {
            kind: err.kind(),
            detail: err.to_string(),
            distance_meters,
        }
    }
}

impl From<ClaimError> for ErrorResponse {
    fn from(err: ClaimError) -> Self {
        Self::from(&err)
    }
}

pub type ApiResult<T> = Result<T, ErrorResponse>;

pub struct ClaimService<S, A = AudienceDirectory> {
    verifier: ClaimVerifier<S, A>,
    clock: fn() -> DateTime<Utc>,
}

impl<S: DropStore, A: AudiencePolicy> ClaimService<S, A> {
    pub fn new(verifier: ClaimVerifier<S, A>) -> Self {
        Self {
            verifier,
            clock: Utc::now,
        }
    }

    /// Replace the server clock (tests, replay tooling)
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn verifier(&self) -> &ClaimVerifier<S, A> {
        &self.verifier
    }

    pub fn claim(&self, request: &ClaimRequest) -> ApiResult<DropProjection> {
        self.try_claim(request).map_err(ErrorResponse::from)
    }

    pub fn attach_settlement(&self, request: &AttachSettlementRequest) -> ApiResult<DropProjection> {
        self.try_attach_settlement(request)
            .map_err(ErrorResponse::from)
    }

    pub fn view(&self, drop_id: &str) -> ApiResult<DropProjection> {
        let drop_id: DropId = drop_id.parse().map_err(ErrorResponse::from)?;
        self.verifier
            .view(&drop_id, (self.clock)())
            .map_err(ErrorResponse::from)
    }

    fn try_claim(&self, request: &ClaimRequest) -> ClaimResult<DropProjection> {
        let drop_id: DropId = request.drop_id.parse()?;
        let claimant: AccountId = request.claimant_id.parse()?;
        let location = Coordinates::new(request.claimant_latitude, request.claimant_longitude)?;

        let mut attempt = ClaimAttempt::new(claimant, location, (self.clock)());
        if let Some(raw) = &request.settlement_ref {
            attempt = attempt.with_settlement_ref(raw.parse::<SettlementRef>()?);
        }

        self.verifier.attempt_claim(&drop_id, &attempt)
    }

    fn try_attach_settlement(
        &self,
        request: &AttachSettlementRequest,
    ) -> ClaimResult<DropProjection> {
        let drop_id: DropId = request.drop_id.parse()?;
        let settlement_ref: SettlementRef = request.settlement_ref.parse()?;
        self.verifier
            .attach_settlement(&drop_id, &settlement_ref, (self.clock)())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::ClaimConfig,
        memory_store::InMemoryDropStore,
        types::{AudienceScope, Drop, DropStatus, NewDrop},
    };
    use chrono::TimeZone;
    use rust_decimal::dec;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn service_with_drop(expires_at: Option<DateTime<Utc>>) -> (ClaimService<InMemoryDropStore>, Drop) {
        let drop = Drop::create(
            NewDrop {
                location: Coordinates::new(41.0082, 28.9784).unwrap(),
                amount: dec!(3),
                message: "under the bridge".to_string(),
                creator: "GCREATOR".parse().unwrap(),
                audience: AudienceScope::Public,
                expires_at,
            },
            fixed_now() - chrono::Duration::hours(1),
        )
        .unwrap();

        let store = InMemoryDropStore::new();
        store.insert(&drop).unwrap();
        let service = ClaimService::new(ClaimVerifier::new(store, ClaimConfig::default()))
            .with_clock(fixed_now);
        (service, drop)
    }

    fn request(drop: &Drop, latitude: f64, longitude: f64) -> ClaimRequest {
        ClaimRequest {
            drop_id: drop.id.to_string(),
            claimant_id: "GCLAIMANT".to_string(),
            claimant_latitude: latitude,
            claimant_longitude: longitude,
            settlement_ref: None,
        }
    }

    #[test]
    fn test_claim_stamps_server_clock() {
        let (service, drop) = service_with_drop(None);
        let projection = service.claim(&request(&drop, 41.0082, 28.9784)).unwrap();
        assert_eq!(projection.status, DropStatus::Claimed);
        assert_eq!(projection.claimed_at, Some(fixed_now()));
    }

    #[test]
    fn test_expiry_uses_server_clock() {
        let (service, drop) = service_with_drop(Some(fixed_now()));
        let err = service.claim(&request(&drop, 41.0082, 28.9784)).unwrap_err();
        assert_eq!(err.kind, ClaimErrorKind::Expired);
    }

    #[test]
    fn test_invalid_coordinates_rejected() {
        let (service, drop) = service_with_drop(None);
        let err = service.claim(&request(&drop, 91.0, 28.9784)).unwrap_err();
        assert_eq!(err.kind, ClaimErrorKind::InvalidRequest);

        let mut blank = request(&drop, 41.0, 29.0);
        blank.claimant_id = "  ".to_string();
        assert_eq!(
            service.claim(&blank).unwrap_err().kind,
            ClaimErrorKind::InvalidRequest
        );
    }

    #[test]
    fn test_out_of_range_response_carries_distance() {
        let (service, drop) = service_with_drop(None);
        let away = drop.location.offset(90.0, 60.0);
        let err = service
            .claim(&request(&drop, away.latitude(), away.longitude()))
            .unwrap_err();

        assert_eq!(err.kind, ClaimErrorKind::OutOfRange);
        assert_eq!(err.distance_meters, Some(60.0));
        assert!(err.detail.contains("60 meters away"));

        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "out_of_range");
        assert_eq!(json["distanceMeters"], 60.0);
    }

    #[test]
    fn test_request_deserializes_camel_case() {
        let request: ClaimRequest = serde_json::from_str(
            r#"{"dropId":"abc","claimantId":"GX","claimantLatitude":1.0,"claimantLongitude":2.0}"#,
        )
        .unwrap();
        assert_eq!(request.drop_id, "abc");
        assert_eq!(request.settlement_ref, None);
    }

    #[test]
    fn test_attach_settlement_roundtrip() {
        let (service, drop) = service_with_drop(None);
        service.claim(&request(&drop, 41.0082, 28.9784)).unwrap();

        let attach = AttachSettlementRequest {
            drop_id: drop.id.to_string(),
            settlement_ref: "tx-abc".to_string(),
        };
        let projection = service.attach_settlement(&attach).unwrap();
        assert!(projection.settled);
        assert_eq!(service.attach_settlement(&attach).unwrap(), projection);
    }

    #[test]
    fn test_attach_settlement_uses_service_clock() {
        let (service, drop) = service_with_drop(Some(fixed_now() + chrono::Duration::minutes(1)));
        service.claim(&request(&drop, 41.0082, 28.9784)).unwrap();

        let projection = service
            .attach_settlement(&AttachSettlementRequest {
                drop_id: drop.id.to_string(),
                settlement_ref: "tx-clock".to_string(),
            })
            .unwrap();

        assert_eq!(projection.claimed_at, Some(fixed_now()));
        assert_eq!(
            projection,
            service.verifier().view(&drop.id, fixed_now()).unwrap()
        );
    }
}
