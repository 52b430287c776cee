// src/utils/timestamp.rs

use std::time::{SystemTime, UNIX_EPOCH};

/// Unix epoch seconds.
pub fn get_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Unix epoch milliseconds.
pub fn get_timestamp_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_are_monotonic_enough() {
        let a = get_timestamp_millis();
        let b = get_timestamp_millis();
        assert!(b >= a);
    }

    #[test]
    fn seconds_and_millis_agree() {
        let secs = get_timestamp();
        let millis = get_timestamp_millis();
        assert!((millis / 1000 - secs).abs() <= 1);
    }
}
