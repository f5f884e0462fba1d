//! Time utilities for node and broker timestamps
//!
//! Both bitcoind (`"time"` on blocks) and the broker (`timestamp` message
//! property) report whole unix seconds.

use chrono::{DateTime, TimeZone, Utc};

/// Convert a unix timestamp in seconds to a UTC datetime
///
/// Returns `None` for values chrono cannot represent.
///
/// # Examples
/// ```
/// use bitcoind_adapter::utils::time::timestamp_to_datetime;
/// let dt = timestamp_to_datetime(1704067200).unwrap();
/// assert_eq!(dt.to_rfc3339(), "2024-01-01T00:00:00+00:00");
/// ```
pub fn timestamp_to_datetime(timestamp: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(timestamp, 0).single()
}
