use crate::{ClaimError, ClaimResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for claim verification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimConfig {
    /// Maximum claimant distance from the pin, in meters (inclusive)
    pub claim_radius_meters: f64,

    /// Deadline for a single store round trip, in milliseconds
    pub store_timeout_ms: u64,

    /// How many times a lost compare-and-swap re-runs verification
    pub max_cas_retries: u32,

    /// Default search radius for nearby-drop queries, in meters
    pub nearby_radius_meters: f64,

    /// Default result cap for listing and nearby queries
    pub nearby_limit: usize,
}

impl Default for ClaimConfig {
    fn default() -> Self {
        Self {
            claim_radius_meters: 50.0,
            store_timeout_ms: 2_000,
            max_cas_retries: 1,
            nearby_radius_meters: 5_000.0,
            nearby_limit: 100,
        }
    }
}

impl ClaimConfig {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn validate(&self) -> ClaimResult<()> {
        if !self.claim_radius_meters.is_finite() || self.claim_radius_meters < 0.0 {
            return Err(ClaimError::InvalidRequest(format!(
                "claim_radius_meters must be a non-negative number, got {}",
                self.claim_radius_meters
            )));
        }
        if !self.nearby_radius_meters.is_finite() || self.nearby_radius_meters <= 0.0 {
            return Err(ClaimError::InvalidRequest(format!(
                "nearby_radius_meters must be positive, got {}",
                self.nearby_radius_meters
            )));
        }
        if self.store_timeout_ms == 0 {
            return Err(ClaimError::InvalidRequest(
                "store_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
