use backoff::ExponentialBackoff;
use std::time::Duration;

/// Configuration for settlement follow-ups
#[derive(Debug, Clone)]
pub struct SettlementConfig {
    /// Upper bound for one drop's transfer, retries included
    pub settlement_timeout: Duration,

    /// Backoff strategy for transient backend failures
    pub retry_backoff: ExponentialBackoff,

    /// Maximum number of drops settled concurrently by `settle_batch`
    pub max_parallel_settlements: usize,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            settlement_timeout: Duration::from_secs(300),
            retry_backoff: ExponentialBackoff {
                initial_interval: Duration::from_millis(500),
                max_interval: Duration::from_secs(30),
                max_elapsed_time: Some(Duration::from_secs(300)), // 5 minutes total
                multiplier: 2.0,
                ..Default::default()
            },
            max_parallel_settlements: 4,
        }
    }
}

impl SettlementConfig {
    pub fn with_timeout(mut self, settlement_timeout: Duration) -> Self {
        self.settlement_timeout = settlement_timeout;
        self
    }
}
