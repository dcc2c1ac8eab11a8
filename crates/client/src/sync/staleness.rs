use chrono::{DateTime, Duration, Utc};

/// Whether a cache last synced at `last_sync` is stale at `now`.
///
/// A cache that was never synced is always stale. A stamp in the future
/// (clock skew) counts as fresh.
pub fn is_stale_at(last_sync: Option<DateTime<Utc>>, now: DateTime<Utc>, threshold: Duration) -> bool {
    match last_sync {
        Some(at) => now.signed_duration_since(at) > threshold,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_synced_is_stale() {
        assert!(is_stale_at(None, Utc::now(), Duration::hours(24)));
    }

    #[test]
    fn test_older_than_threshold_is_stale() {
        let now = Utc::now();
        assert!(is_stale_at(Some(now - Duration::hours(25)), now, Duration::hours(24)));
    }

    #[test]
    fn test_recent_sync_is_fresh() {
        let now = Utc::now();
        assert!(!is_stale_at(Some(now - Duration::hours(1)), now, Duration::hours(24)));
        assert!(!is_stale_at(Some(now - Duration::hours(24)), now, Duration::hours(24)));
    }

    #[test]
    fn test_future_stamp_is_fresh() {
        let now = Utc::now();
        assert!(!is_stale_at(Some(now + Duration::minutes(5)), now, Duration::hours(24)));
    }
}
