use std::num::NonZeroU32;
use std::sync::Arc;
use governor::{Quota, RateLimiter};
use governor::state::{NotKeyed, InMemoryState};
use governor::clock::DefaultClock;

pub type Limiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Limiter for address lookups; Nominatim asks for at most one per second.
pub fn geocode_limiter(per_second: NonZeroU32) -> Limiter {
    Arc::new(RateLimiter::direct(Quota::per_second(per_second)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limiter_admits_one_burst_per_quota() {
        let limiter = geocode_limiter(NonZeroU32::MIN);
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_err());
    }
}
