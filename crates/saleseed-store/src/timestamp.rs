use chrono::{DateTime, SecondsFormat, Utc};

/// Text form used for timestamp columns: RFC 3339 with microseconds and an
/// explicit `+00:00` offset, so lexical order matches time order.
pub fn encode_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, false)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn encodes_with_fixed_width() {
        let value = Utc.with_ymd_and_hms(2024, 5, 1, 10, 20, 30).single().expect("valid");
        assert_eq!(encode_timestamp(&value), "2024-05-01T10:20:30.000000+00:00");
    }

    #[test]
    fn text_order_matches_time_order() {
        let earlier = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 0).single().expect("valid");
        let later = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().expect("valid");
        assert!(encode_timestamp(&earlier) < encode_timestamp(&later));
    }
}
