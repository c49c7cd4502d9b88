/*!
# Drop Domain Types

The drop record, its claim state, and the ephemeral claim attempt.
*/

use crate::{ClaimError, ClaimResult};
use chrono::{DateTime, Utc};
use geodrop_geo::Coordinates;
use rust_decimal::{dec, Decimal};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Smallest amount a drop may carry
pub const MIN_DROP_AMOUNT: Decimal = dec!(0.1);

/// Longest message a drop may carry, in characters
pub const MAX_MESSAGE_CHARS: usize = 200;

fn non_empty(field: &str, value: String) -> ClaimResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ClaimError::InvalidRequest(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

// ================================================================================================
// Identifiers
// ================================================================================================

/// Opaque drop identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DropId(String);

impl DropId {
    /// Fresh random id: 24 lowercase hex characters
    pub fn generate() -> Self {
        let bytes: [u8; 12] = rand::random();
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Account identity (wallet public key)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// External settlement reference, e.g. a ledger transaction hash
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SettlementRef(String);

impl SettlementRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! string_newtype {
    ($name:ident, $field:literal) => {
        impl TryFrom<String> for $name {
            type Error = ClaimError;

            fn try_from(value: String) -> ClaimResult<Self> {
                non_empty($field, value).map(Self)
            }
        }

        impl FromStr for $name {
            type Err = ClaimError;

            fn from_str(s: &str) -> ClaimResult<Self> {
                Self::try_from(s.to_string())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> String {
                value.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_newtype!(DropId, "drop id");
string_newtype!(AccountId, "account id");
string_newtype!(SettlementRef, "settlement reference");

// ================================================================================================
// States
// ================================================================================================

/// Stored claim state. The only transition is `Unclaimed -> Claimed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimState {
    Unclaimed,
    Claimed,
}

impl ClaimState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimState::Unclaimed => "unclaimed",
            ClaimState::Claimed => "claimed",
        }
    }
}

impl FromStr for ClaimState {
    type Err = ClaimError;

    fn from_str(s: &str) -> ClaimResult<Self> {
        match s {
            "unclaimed" => Ok(ClaimState::Unclaimed),
            "claimed" => Ok(ClaimState::Claimed),
            other => Err(ClaimError::InvalidRequest(format!(
                "unknown claim state '{}'",
                other
            ))),
        }
    }
}

/// Read-only status projection. `Expired` is never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropStatus {
    Unclaimed,
    Claimed,
    Expired,
}

/// Who may claim a drop
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum AudienceScope {
    #[default]
    Public,
    Restricted {
        group: String,
    },
}

impl AudienceScope {
    pub fn restricted(group: impl Into<String>) -> Self {
        AudienceScope::Restricted {
            group: group.into(),
        }
    }
}

impl std::fmt::Display for AudienceScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudienceScope::Public => f.write_str("public"),
            AudienceScope::Restricted { group } => write!(f, "restricted:{}", group),
        }
    }
}

// ================================================================================================
// Drop
// ================================================================================================

/// Input for creating a drop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDrop {
    pub location: Coordinates,
    pub amount: Decimal,
    pub message: String,
    pub creator: AccountId,
    #[serde(default)]
    pub audience: AudienceScope,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// A funded value pinned in space and time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drop {
    pub id: DropId,
    pub location: Coordinates,
    pub amount: Decimal,
    pub message: String,
    pub creator: AccountId,
    pub audience: AudienceScope,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub claim_state: ClaimState,
    pub claimant: Option<AccountId>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub settlement_ref: Option<SettlementRef>,
}

impl Drop {
    /// Validate `new` and build an unclaimed drop with a fresh id
    pub fn create(new: NewDrop, now: DateTime<Utc>) -> ClaimResult<Drop> {
        if new.amount < MIN_DROP_AMOUNT {
            return Err(ClaimError::InvalidDrop(format!(
                "amount must be at least {}",
                MIN_DROP_AMOUNT
            )));
        }

        let message = new.message.trim().to_string();
        if message.is_empty() {
            return Err(ClaimError::InvalidDrop("message must not be empty".to_string()));
        }
        if message.chars().count() > MAX_MESSAGE_CHARS {
            return Err(ClaimError::InvalidDrop(format!(
                "message must be at most {} characters",
                MAX_MESSAGE_CHARS
            )));
        }

        if let AudienceScope::Restricted { group } = &new.audience {
            if group.trim().is_empty() {
                return Err(ClaimError::InvalidDrop(
                    "restricted audience needs a group name".to_string(),
                ));
            }
        }

        if let Some(expires_at) = new.expires_at {
            if expires_at <= now {
                return Err(ClaimError::InvalidDrop(
                    "expiry must be in the future".to_string(),
                ));
            }
        }

        Ok(Drop {
            id: DropId::generate(),
            location: new.location,
            amount: new.amount,
            message,
            creator: new.creator,
            audience: new.audience,
            expires_at: new.expires_at,
            created_at: now,
            claim_state: ClaimState::Unclaimed,
            claimant: None,
            claimed_at: None,
            settlement_ref: None,
        })
    }

    /// True once the expiry instant has been reached
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }

    pub fn status(&self, now: DateTime<Utc>) -> DropStatus {
        match self.claim_state {
            ClaimState::Claimed => DropStatus::Claimed,
            ClaimState::Unclaimed if self.is_expired_at(now) => DropStatus::Expired,
            ClaimState::Unclaimed => DropStatus::Unclaimed,
        }
    }

    /// Claimed, but the transfer has not been recorded yet
    pub fn is_unsettled(&self) -> bool {
        self.claim_state == ClaimState::Claimed && self.settlement_ref.is_none()
    }

    /// Apply the single permitted transition.
    ///
    /// Stores call this only inside their compare-and-swap, after confirming
    /// the drop is still unclaimed.
    pub fn apply_claim(
        &mut self,
        claimant: AccountId,
        claimed_at: DateTime<Utc>,
        settlement_ref: Option<SettlementRef>,
    ) {
        debug_assert_eq!(self.claim_state, ClaimState::Unclaimed);
        self.claim_state = ClaimState::Claimed;
        self.claimant = Some(claimant);
        self.claimed_at = Some(claimed_at);
        if settlement_ref.is_some() {
            self.settlement_ref = settlement_ref;
        }
    }

    pub fn projection(&self, now: DateTime<Utc>) -> DropProjection {
        DropProjection {
            id: self.id.clone(),
            status: self.status(now),
            claim_state: self.claim_state,
            claimant: self.claimant.clone(),
            claimed_at: self.claimed_at,
            settlement_ref: self.settlement_ref.clone(),
            settled: self.settlement_ref.is_some(),
            location: self.location,
            amount: self.amount,
            message: self.message.clone(),
            expires_at: self.expires_at,
        }
    }
}

/// What callers see of a drop after a read, claim, or settlement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropProjection {
    pub id: DropId,
    pub status: DropStatus,
    pub claim_state: ClaimState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claimant: Option<AccountId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claimed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settlement_ref: Option<SettlementRef>,
    pub settled: bool,
    pub location: Coordinates,
    pub amount: Decimal,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

// ================================================================================================
// Claim attempt
// ================================================================================================

/// Ephemeral input to claim verification; never persisted
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimAttempt {
    pub claimant: AccountId,
    pub location: Coordinates,
    /// Claim instant: checked against expiry and recorded as `claimed_at`
    pub timestamp: DateTime<Utc>,
    pub settlement_ref: Option<SettlementRef>,
}

impl ClaimAttempt {
    pub fn new(claimant: AccountId, location: Coordinates, timestamp: DateTime<Utc>) -> Self {
        Self {
            claimant,
            location,
            timestamp,
            settlement_ref: None,
        }
    }

    pub fn with_settlement_ref(mut self, settlement_ref: SettlementRef) -> Self {
        self.settlement_ref = Some(settlement_ref);
        self
    }
}
