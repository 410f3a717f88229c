use chrono::{DateTime, Utc};

/// Whole minutes elapsed between `since` and `now` (zero when `since` is in the future)
pub fn minutes_since(since: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - since).num_minutes().max(0)
}
