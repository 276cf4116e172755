//! Conversion between on-disk timestamp tokens, epoch seconds and display strings.

use chrono::{DateTime, Local, NaiveDate, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ManageError;

/// Converts between timestamp tokens and epoch seconds.
pub trait TimeCodec {
    /// Decode an on-disk timestamp token into epoch seconds.
    fn decode(&self, token: &str) -> Result<i64, ManageError>;

    /// Encode epoch seconds as an on-disk timestamp token.
    fn encode(&self, secs: i64) -> String;

    /// Render epoch seconds for people.
    fn pretty(&self, secs: i64) -> String;
}

/// Zone used when rendering times.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeZoneMode {
    /// The host's local zone.
    #[default]
    Local,
    /// Coordinated universal time.
    Utc,
}

/// W3C datetime codec (`2002-03-05T12:00:00-07:00`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct W3Time {
    zone: TimeZoneMode,
}

const PRETTY_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

impl W3Time {
    /// Create a codec rendering in the given zone.
    pub fn new(zone: TimeZoneMode) -> Self {
        Self { zone }
    }

    /// Codec rendering in the host's local zone.
    pub fn local() -> Self {
        Self::new(TimeZoneMode::Local)
    }

    /// Codec rendering in UTC.
    pub fn utc() -> Self {
        Self::new(TimeZoneMode::Utc)
    }

    /// The zone this codec renders in.
    pub fn zone(&self) -> TimeZoneMode {
        self.zone
    }

    /// Midnight of a calendar date in this codec's zone.
    fn midnight(&self, date: NaiveDate) -> Option<i64> {
        let naive = date.and_hms_opt(0, 0, 0)?;
        match self.zone {
            TimeZoneMode::Utc => Some(naive.and_utc().timestamp()),
            TimeZoneMode::Local => Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.timestamp()),
        }
    }
}

impl TimeCodec for W3Time {
    fn decode(&self, token: &str) -> Result<i64, ManageError> {
        DateTime::parse_from_rfc3339(token)
            .map(|dt| dt.timestamp())
            .map_err(|e| ManageError::timestamp(token, e))
    }

    fn encode(&self, secs: i64) -> String {
        let Some(utc) = DateTime::<Utc>::from_timestamp(secs, 0) else {
            return secs.to_string();
        };
        match self.zone {
            TimeZoneMode::Utc => utc.to_rfc3339_opts(SecondsFormat::Secs, true),
            TimeZoneMode::Local => utc
                .with_timezone(&Local)
                .to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    fn pretty(&self, secs: i64) -> String {
        let Some(utc) = DateTime::<Utc>::from_timestamp(secs, 0) else {
            return secs.to_string();
        };
        match self.zone {
            TimeZoneMode::Utc => utc.format(PRETTY_FORMAT).to_string(),
            TimeZoneMode::Local => utc.with_timezone(&Local).format(PRETTY_FORMAT).to_string(),
        }
    }
}

/// Check whether a token has the shape of a W3 datetime.
///
/// Only the shape is checked; [`TimeCodec::decode`] decides validity.
pub fn looks_like_time_token(token: &str) -> bool {
    let bytes = token.as_bytes();
    bytes.len() >= 10
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[4] == b'-'
        && token.contains('T')
}

/// Resolve a user-supplied time into epoch seconds.
///
/// Accepts `now`, raw epoch seconds, intervals such as `3D` or `1W2D12h`
/// (counted back from `now`), full W3 datetimes and `YYYY-MM-DD` dates.
pub fn parse_time_spec(spec: &str, now: i64, codec: &W3Time) -> Result<i64, ManageError> {
    let spec = spec.trim();
    let invalid = || ManageError::InvalidTimeSpec {
        spec: spec.to_string(),
    };

    if spec.is_empty() {
        return Err(invalid());
    }
    if spec == "now" {
        return Ok(now);
    }
    if spec.bytes().all(|b| b.is_ascii_digit()) {
        return spec.parse().map_err(|_| invalid());
    }
    if let Some(interval) = parse_interval(spec) {
        return now.checked_sub(interval).ok_or_else(invalid);
    }
    if let Ok(date) = NaiveDate::parse_from_str(spec, "%Y-%m-%d") {
        return codec.midnight(date).ok_or_else(invalid);
    }
    codec.decode(spec).map_err(|_| invalid())
}

/// Parse `<n><unit>` groups into seconds.
fn parse_interval(spec: &str) -> Option<i64> {
    let mut total: i64 = 0;
    let mut digits = String::new();

    for c in spec.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let unit: i64 = match c {
            's' => 1,
            'm' => 60,
            'h' => 60 * 60,
            'D' => 24 * 60 * 60,
            'W' => 7 * 24 * 60 * 60,
            'M' => 30 * 24 * 60 * 60,
            'Y' => 365 * 24 * 60 * 60,
            _ => return None,
        };
        if digits.is_empty() {
            return None;
        }
        let count: i64 = digits.parse().ok()?;
        total = total.checked_add(count.checked_mul(unit)?)?;
        digits.clear();
    }

    // trailing number without a unit
    if !digits.is_empty() {
        return None;
    }
    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_with_offset() {
        let codec = W3Time::utc();
        assert_eq!(codec.decode("2002-03-05T12:00:00-07:00").unwrap(), 1015354800);
        assert_eq!(codec.decode("1970-01-01T02:46:40Z").unwrap(), 10000);
    }

    #[test]
    fn test_decode_failure() {
        let codec = W3Time::utc();
        let err = codec.decode("2002-13-45T99:00:00Z").unwrap_err();
        assert!(matches!(err, ManageError::TimestampDecode { .. }));
    }

    #[test]
    fn test_encode_utc() {
        let codec = W3Time::utc();
        assert_eq!(codec.encode(10000), "1970-01-01T02:46:40Z");
        assert_eq!(codec.decode(&codec.encode(1015354800)).unwrap(), 1015354800);
    }

    #[test]
    fn test_encode_local_decodes_back() {
        let codec = W3Time::local();
        assert_eq!(codec.decode(&codec.encode(1_700_000_000)).unwrap(), 1_700_000_000);
    }

    #[test]
    fn test_pretty_utc() {
        let codec = W3Time::utc();
        assert_eq!(codec.pretty(1015329600), "Tue Mar  5 12:00:00 2002");
    }

    #[test]
    fn test_looks_like_time_token() {
        assert!(looks_like_time_token("2002-03-05T12:00:00-07:00"));
        assert!(looks_like_time_token("1970-01-01T00:00:00Z"));
        assert!(!looks_like_time_token("tar"));
        assert!(!looks_like_time_token("backup-2002"));
        assert!(!looks_like_time_token("2002-03-05"));
    }

    #[test]
    fn test_time_spec_now_and_epoch() {
        let codec = W3Time::utc();
        assert_eq!(parse_time_spec("now", 5000, &codec).unwrap(), 5000);
        assert_eq!(parse_time_spec("12345", 5000, &codec).unwrap(), 12345);
    }

    #[test]
    fn test_time_spec_interval() {
        let codec = W3Time::utc();
        let now = 10_000_000;
        assert_eq!(parse_time_spec("3D", now, &codec).unwrap(), now - 3 * 86400);
        assert_eq!(
            parse_time_spec("1W2D12h", now, &codec).unwrap(),
            now - (9 * 86400 + 12 * 3600)
        );
        assert_eq!(parse_time_spec("30m", now, &codec).unwrap(), now - 1800);
        assert_eq!(parse_time_spec("1M", now, &codec).unwrap(), now - 30 * 86400);
    }

    #[test]
    fn test_time_spec_dates() {
        let codec = W3Time::utc();
        assert_eq!(parse_time_spec("2002-03-05", 0, &codec).unwrap(), 1015286400);
        assert_eq!(
            parse_time_spec("2002-03-05T12:00:00-07:00", 0, &codec).unwrap(),
            1015354800
        );
    }

    #[test]
    fn test_time_spec_invalid() {
        let codec = W3Time::utc();
        for spec in ["", "D", "3X", "2D4", "yesterday", "2002-03"] {
            assert!(
                matches!(
                    parse_time_spec(spec, 0, &codec),
                    Err(ManageError::InvalidTimeSpec { .. })
                ),
                "spec {spec:?} should be rejected"
            );
        }
    }
}
