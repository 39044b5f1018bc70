use crate::domain::models::ConnId;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Sliding minimum-interval limiter keyed by connection.
///
/// Every call stamps the attempt time, allowed or not, so hammering the
/// gate keeps it closed rather than eventually slipping through.
pub struct RateGate {
    min_interval: Duration,
    last_attempt: DashMap<ConnId, Instant>,
}

impl RateGate {
    pub fn new(min_interval: Duration) -> Self {
        RateGate {
            min_interval,
            last_attempt: DashMap::new(),
        }
    }

    /// Records an attempt and says whether it is allowed.
    pub fn check(&self, key: ConnId) -> bool {
        let now = Instant::now();
        let allowed = match self.last_attempt.get(&key) {
            Some(previous) => now.duration_since(*previous) >= self.min_interval,
            None => true,
        };
        self.last_attempt.insert(key, now);
        allowed
    }

    /// Drops the state for a connection that went away.
    pub fn forget(&self, key: ConnId) {
        self.last_attempt.remove(&key);
    }
}
