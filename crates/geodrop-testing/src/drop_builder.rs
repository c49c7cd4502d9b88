use crate::{deterministic_account, istanbul};
use chrono::{DateTime, Duration, Utc};
use geodrop_claims::{AccountId, AudienceScope, Drop, NewDrop};
use geodrop_geo::Coordinates;
use rust_decimal::{dec, Decimal};

/// Builds valid drops with overridable fields.
///
/// Defaults: pinned at [`istanbul`], 5 units, public, created by "creator",
/// expiring one day after creation.
#[derive(Debug, Clone)]
pub struct DropBuilder {
    location: Coordinates,
    amount: Decimal,
    message: String,
    creator: AccountId,
    audience: AudienceScope,
    expires_in: Option<Duration>,
}

impl Default for DropBuilder {
    fn default() -> Self {
        Self {
            location: istanbul(),
            amount: dec!(5),
            message: "a little something for whoever gets here first".to_string(),
            creator: deterministic_account("creator"),
            audience: AudienceScope::Public,
            expires_in: Some(Duration::days(1)),
        }
    }
}

impl DropBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, location: Coordinates) -> Self {
        self.location = location;
        self
    }

    pub fn amount(mut self, amount: Decimal) -> Self {
        self.amount = amount;
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn creator(mut self, creator: AccountId) -> Self {
        self.creator = creator;
        self
    }

    pub fn restricted_to(mut self, group: impl Into<String>) -> Self {
        self.audience = AudienceScope::restricted(group);
        self
    }

    pub fn expires_in(mut self, expires_in: Duration) -> Self {
        self.expires_in = Some(expires_in);
        self
    }

    pub fn never_expires(mut self) -> Self {
        self.expires_in = None;
        self
    }

    pub fn new_drop(&self, now: DateTime<Utc>) -> NewDrop {
        NewDrop {
            location: self.location,
            amount: self.amount,
            message: self.message.clone(),
            creator: self.creator.clone(),
            audience: self.audience.clone(),
            expires_at: self.expires_in.map(|d| now + d),
        }
    }

    pub fn build(&self, now: DateTime<Utc>) -> Drop {
        Drop::create(self.new_drop(now), now)
            .unwrap_or_else(|e| panic!("fixture drop must be valid: {e}"))
    }
}
