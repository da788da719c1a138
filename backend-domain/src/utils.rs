use chrono::{DateTime, Duration, DurationRound, TimeZone, Utc};
use serde_json::Value;

/// Timestamps are stored with millisecond precision.
pub fn truncate_to_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.duration_trunc(Duration::milliseconds(1)).unwrap_or(ts)
}

pub fn now_millis() -> DateTime<Utc> {
    truncate_to_millis(Utc::now())
}

pub fn millis_to_utc(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

pub fn parse_rfc3339(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// Client clocks arrive as RFC3339 strings or epoch milliseconds.
pub fn parse_client_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(raw) => parse_rfc3339(raw).map(truncate_to_millis),
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
            .and_then(millis_to_utc),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_timestamp_accepts_rfc3339_and_millis() {
        let from_text = parse_client_timestamp(&json!("2026-02-01T10:00:00.123456+02:00"))
            .expect("rfc3339");
        assert_eq!(from_text.timestamp_millis(), 1_769_932_800_123);
        let from_millis = parse_client_timestamp(&json!(1_769_932_800_123_i64)).expect("millis");
        assert_eq!(from_millis, from_text);
    }

    #[test]
    fn client_timestamp_rejects_other_shapes() {
        assert!(parse_client_timestamp(&json!("yesterday")).is_none());
        assert!(parse_client_timestamp(&json!(true)).is_none());
        assert!(parse_client_timestamp(&json!({"t": 1})).is_none());
    }

    #[test]
    fn truncation_drops_sub_millisecond_precision() {
        let ts = parse_rfc3339("2026-02-01T08:00:00.999999Z").expect("parse");
        assert_eq!(truncate_to_millis(ts).timestamp_subsec_nanos(), 999_000_000);
    }
}
