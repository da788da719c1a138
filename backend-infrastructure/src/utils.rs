use chrono::{DateTime, TimeZone, Utc};
use time::OffsetDateTime;

/// `None` when `ms` falls outside the range `OffsetDateTime` can represent.
pub fn millis_to_utc(ms: i64) -> Option<OffsetDateTime> {
    let nanos = i128::from(ms).checked_mul(1_000_000)?;
    OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()
}

/// Clamps to the epoch for years `time` cannot hold; store-stamped values never get there.
pub fn chrono_to_offset(ts: DateTime<Utc>) -> OffsetDateTime {
    millis_to_utc(ts.timestamp_millis()).unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

pub fn offset_to_chrono(ts: OffsetDateTime) -> DateTime<Utc> {
    let millis = (ts.unix_timestamp_nanos() / 1_000_000) as i64;
    Utc.timestamp_millis_opt(millis).single().unwrap_or_default()
}
