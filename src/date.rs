//! Due-date normalisation.
//!
//! Task records carry their due dates in whatever shape the data layer handed
//! over: plain text, a timestamp record with epoch `seconds`, a record that can
//! convert itself into a date/time, or something else entirely. [`RawDue`] is the
//! tagged form of that value and [`normalize_in`] turns it into a single UTC
//! instant, or `None` when the value cannot be represented.
//!
//! Nothing in this module panics or returns an error to the classifiers; a bad
//! value is logged at debug level and treated as "no due date".

use std::fmt;
use std::sync::Arc;

use chrono::{
    DateTime, FixedOffset, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta,
    TimeZone, Utc,
};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::debug;

use crate::error::DateError;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Date/time formats that carry their own UTC offset.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

/// Date/time formats read as wall-clock time in the reference timezone.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Date-only formats; these resolve to the start of the calendar day.
///
/// `%B` accepts both full and abbreviated month names, in any case.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %B, %Y",
];

/// A timestamp value that knows how to turn itself into a concrete date/time.
pub trait ToDateTime: fmt::Debug + Send + Sync {
    fn to_date_time(&self) -> Result<DateTime<FixedOffset>, DateError>;
}

/// Timestamp as the store's admin SDK writes it: `{"_seconds": .., "_nanoseconds": ..}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireTimestamp {
    pub seconds: i64,
    pub nanoseconds: u32,
}

impl ToDateTime for WireTimestamp {
    fn to_date_time(&self) -> Result<DateTime<FixedOffset>, DateError> {
        DateTime::from_timestamp(self.seconds, self.nanoseconds)
            .map(|dt| dt.fixed_offset())
            .ok_or(DateError::OutOfRange(self.seconds))
    }
}

/// A due-date value, classified by shape.
#[derive(Debug, Clone)]
pub enum RawDue {
    /// ISO-like date or date/time text.
    Text(String),
    /// Record exposing integer epoch `seconds`.
    EpochSeconds(i64),
    /// Record offering its own conversion to a date/time.
    Convertible(Arc<dyn ToDateTime>),
    /// Anything else; resolved on a best-effort basis.
    Other(Value),
}

impl RawDue {
    /// Classify an arbitrary JSON value by the fields it exposes.
    ///
    /// Text wins first, then an integer `seconds` field, then the `_seconds`
    /// wire shape. Everything else is kept verbatim as [`RawDue::Other`].
    pub fn classify(value: Value) -> RawDue {
        if let Value::Object(map) = &value {
            if let Some(seconds) = map.get("seconds").and_then(Value::as_i64) {
                return RawDue::EpochSeconds(seconds);
            }
            if let Some(seconds) = map.get("_seconds").and_then(Value::as_i64) {
                let nanoseconds = map
                    .get("_nanoseconds")
                    .and_then(Value::as_u64)
                    .and_then(|n| u32::try_from(n).ok())
                    .unwrap_or(0);
                return RawDue::Convertible(Arc::new(WireTimestamp { seconds, nanoseconds }));
            }
        }
        match value {
            Value::String(s) => RawDue::Text(s),
            other => RawDue::Other(other),
        }
    }

    /// Like [`RawDue::classify`], but `null` means there is no due date at all.
    pub fn from_value(value: Value) -> Option<RawDue> {
        if value.is_null() {
            None
        } else {
            Some(RawDue::classify(value))
        }
    }

    pub fn text(s: impl Into<String>) -> RawDue {
        RawDue::Text(s.into())
    }

    pub fn convertible(source: impl ToDateTime + 'static) -> RawDue {
        RawDue::Convertible(Arc::new(source))
    }
}

impl fmt::Display for RawDue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawDue::Text(s) => write!(f, "{s:?}"),
            RawDue::EpochSeconds(secs) => write!(f, "{{seconds: {secs}}}"),
            RawDue::Convertible(source) => write!(f, "{source:?}"),
            RawDue::Other(value) => write!(f, "{value}"),
        }
    }
}

impl<'de> Deserialize<'de> for RawDue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(RawDue::classify)
    }
}

impl Serialize for RawDue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RawDue::Text(s) => serializer.serialize_str(s),
            RawDue::EpochSeconds(secs) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("seconds", secs)?;
                map.end()
            }
            RawDue::Convertible(source) => match source.to_date_time() {
                Ok(dt) => serializer.serialize_str(&dt.to_rfc3339()),
                Err(_) => serializer.serialize_none(),
            },
            RawDue::Other(value) => value.serialize(serializer),
        }
    }
}

/// Normalise a due-date value against the machine's local timezone.
pub fn normalize(raw: &RawDue) -> Option<DateTime<Utc>> {
    normalize_in(raw, &Local)
}

/// Normalise a due-date value; naive text is read as wall-clock time in `tz`.
///
/// Returns `None` for anything unrepresentable. Non-empty values that fail are
/// reported through a debug-level diagnostic and never interrupt the caller.
pub fn normalize_in<Tz: TimeZone>(raw: &RawDue, tz: &Tz) -> Option<DateTime<Utc>> {
    match resolve(raw, tz) {
        Ok(instant) => Some(instant),
        Err(DateError::Empty) => None,
        Err(err) => {
            debug!(due = %raw, error = %err, "unrepresentable due date, treating as absent");
            None
        }
    }
}

/// Resolve a due-date value, keeping the reason when it fails.
pub fn resolve<Tz: TimeZone>(raw: &RawDue, tz: &Tz) -> Result<DateTime<Utc>, DateError> {
    match raw {
        RawDue::Text(text) => parse_text(text, tz),
        RawDue::EpochSeconds(secs) => secs
            .checked_mul(1000)
            .and_then(DateTime::from_timestamp_millis)
            .ok_or(DateError::OutOfRange(*secs)),
        RawDue::Convertible(source) => source.to_date_time().map(|dt| dt.with_timezone(&Utc)),
        RawDue::Other(value) => from_other(value),
    }
}

fn parse_text<Tz: TimeZone>(text: &str, tz: &Tz) -> Result<DateTime<Utc>, DateError> {
    let s = text.trim();
    if s.is_empty() {
        return Err(DateError::Empty);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Ok(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return localize(naive, tz);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return localize(date.and_time(NaiveTime::MIN), tz);
        }
    }

    Err(DateError::Unparseable(s.to_string()))
}

/// Pin wall-clock time to `tz`. Ambiguous times take the earlier instant; times
/// inside a DST gap move forward by an hour.
fn localize<Tz: TimeZone>(naive: NaiveDateTime, tz: &Tz) -> Result<DateTime<Utc>, DateError> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| {
            naive
                .checked_add_signed(TimeDelta::hours(1))
                .and_then(|shifted| tz.from_local_datetime(&shifted).earliest())
        })
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| DateError::NonexistentLocalTime(naive.to_string()))
}

/// Numbers are millisecond epochs; every other shape is unsupported.
fn from_other(value: &Value) -> Result<DateTime<Utc>, DateError> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .and_then(DateTime::from_timestamp_millis)
            .ok_or_else(|| DateError::Unsupported(n.to_string())),
        other => Err(DateError::Unsupported(other.to_string())),
    }
}

fn last_millisecond(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
        .checked_add_signed(TimeDelta::milliseconds(MILLIS_PER_DAY - 1))
        .unwrap_or(NaiveDateTime::MAX)
}

/// 23:59:59.999 on `date`, in `tz`.
///
/// When that wall-clock time falls in a DST gap, the result is the last
/// existing instant before the gap, which still lies on `date`.
pub fn end_of_day_on<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Tz> {
    let last = last_millisecond(date);
    match tz.from_local_datetime(&last) {
        LocalResult::Single(t) => t,
        LocalResult::Ambiguous(_, later) => later,
        LocalResult::None => before_gap(last, tz).unwrap_or_else(|| tz.from_utc_datetime(&last)),
    }
}

/// Walk back a minute at a time (at most two days) to the last local time
/// that exists in `tz`.
fn before_gap<Tz: TimeZone>(local: NaiveDateTime, tz: &Tz) -> Option<DateTime<Tz>> {
    (1..=2 * 24 * 60).find_map(|minutes| {
        let earlier = local.checked_sub_signed(TimeDelta::minutes(minutes))?;
        tz.from_local_datetime(&earlier).latest()
    })
}

/// The last millisecond of `at`'s calendar day, in `at`'s own timezone.
pub fn end_of_day<Tz: TimeZone>(at: &DateTime<Tz>) -> DateTime<Tz> {
    end_of_day_on(at.date_naive(), &at.timezone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use serde_json::json;
    use tracing_test::traced_test;

    fn tz() -> FixedOffset {
        FixedOffset::east_opt(2 * 3600).unwrap()
    }

    #[derive(Debug)]
    struct Broken;

    impl ToDateTime for Broken {
        fn to_date_time(&self) -> Result<DateTime<FixedOffset>, DateError> {
            Err(DateError::Conversion("corrupt record".into()))
        }
    }

    #[test]
    fn test_classify_shapes() {
        assert!(matches!(RawDue::classify(json!("2024-01-01")), RawDue::Text(_)));
        assert!(matches!(
            RawDue::classify(json!({"seconds": 1700000000, "nanoseconds": 0})),
            RawDue::EpochSeconds(1_700_000_000)
        ));
        assert!(matches!(
            RawDue::classify(json!({"_seconds": 1700000000, "_nanoseconds": 0})),
            RawDue::Convertible(_)
        ));
        // A fractional `seconds` is not an epoch-seconds record.
        assert!(matches!(RawDue::classify(json!({"seconds": 1.5})), RawDue::Other(_)));
        assert!(matches!(RawDue::classify(json!(42)), RawDue::Other(_)));
        assert!(RawDue::from_value(Value::Null).is_none());
    }

    #[test]
    fn test_epoch_seconds_scale_to_millis() {
        let raw = RawDue::classify(json!({"seconds": 1700000000}));
        let instant = normalize_in(&raw, &Utc).unwrap();
        assert_eq!(instant.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_epoch_seconds_match_equivalent_text() {
        let from_seconds = normalize_in(&RawDue::EpochSeconds(1_700_000_000), &tz());
        let from_text = normalize_in(&RawDue::text("2023-11-14T22:13:20Z"), &tz());
        assert_eq!(from_seconds, from_text);
    }

    #[test]
    fn test_date_only_text_is_start_of_local_day() {
        let instant = normalize_in(&RawDue::text("2024-01-01"), &tz()).unwrap();
        let local = instant.with_timezone(&tz());
        assert_eq!(local.date_naive(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(local.time(), NaiveTime::MIN);
    }

    #[test]
    fn test_text_variants() {
        let expected = tz().with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap();
        for text in ["2024-03-05T14:30:00", "2024-03-05 14:30", "2024-03-05T12:30:00Z", "2024-03-05T14:30:00+02:00"] {
            assert_eq!(normalize_in(&RawDue::text(text), &tz()), Some(expected.with_timezone(&Utc)), "{text}");
        }
        assert!(normalize_in(&RawDue::text("03/05/2024"), &tz()).is_some());
        assert!(normalize_in(&RawDue::text("Tue, 5 Mar 2024 14:30:00 +0200"), &tz()).is_some());
    }

    #[test]
    fn test_convertible_records() {
        let raw = RawDue::classify(json!({"_seconds": 1700000000, "_nanoseconds": 500000000}));
        let instant = normalize_in(&raw, &Utc).unwrap();
        assert_eq!(instant.timestamp_millis(), 1_700_000_000_500);

        assert!(normalize_in(&RawDue::convertible(Broken), &Utc).is_none());
    }

    #[test]
    fn test_other_values() {
        let ms = RawDue::Other(json!(1_700_000_000_000_i64));
        assert_eq!(normalize_in(&ms, &Utc).unwrap().timestamp(), 1_700_000_000);
        assert!(normalize_in(&RawDue::Other(json!(true)), &Utc).is_none());
        assert!(normalize_in(&RawDue::Other(json!([1, 2])), &Utc).is_none());
        assert!(normalize_in(&RawDue::Other(json!({"when": "soon"})), &Utc).is_none());
    }

    #[test]
    fn test_out_of_range_seconds() {
        assert!(normalize_in(&RawDue::EpochSeconds(i64::MAX), &Utc).is_none());
        assert_eq!(
            resolve(&RawDue::EpochSeconds(i64::MAX), &Utc),
            Err(DateError::OutOfRange(i64::MAX))
        );
    }

    #[traced_test]
    #[test]
    fn test_unparseable_text_logs_and_returns_none() {
        assert!(normalize_in(&RawDue::text("not-a-date"), &tz()).is_none());
        assert!(logs_contain("unrepresentable due date"));
    }

    #[traced_test]
    #[test]
    fn test_empty_text_is_silent() {
        assert!(normalize_in(&RawDue::text("   "), &tz()).is_none());
        assert!(!logs_contain("unrepresentable due date"));
    }

    #[test]
    fn test_end_of_day() {
        let at = tz().with_ymd_and_hms(2024, 6, 10, 8, 15, 0).unwrap();
        let eod = end_of_day(&at);
        assert_eq!(eod.date_naive(), at.date_naive());
        assert_eq!((eod.hour(), eod.minute(), eod.second()), (23, 59, 59));
        assert_eq!(eod.timestamp_subsec_millis(), 999);
        assert_eq!(eod.offset(), at.offset());
    }

    /// +01:00 until 2024-03-30 22:30 UTC, +02:00 afterwards. Local wall-clock
    /// time jumps from 23:30 on the 30th to 00:30 on the 31st.
    #[derive(Debug, Clone, Copy)]
    struct GapZone;

    impl GapZone {
        fn switch() -> NaiveDateTime {
            NaiveDate::from_ymd_opt(2024, 3, 30).unwrap().and_hms_opt(22, 30, 0).unwrap()
        }

        fn before() -> FixedOffset {
            FixedOffset::east_opt(3600).unwrap()
        }

        fn after() -> FixedOffset {
            FixedOffset::east_opt(2 * 3600).unwrap()
        }
    }

    impl TimeZone for GapZone {
        type Offset = FixedOffset;

        fn from_offset(_: &FixedOffset) -> Self {
            GapZone
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
            self.offset_from_local_datetime(&local.and_time(NaiveTime::MIN))
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            let early = *local - TimeDelta::hours(1) < Self::switch();
            let late = *local - TimeDelta::hours(2) >= Self::switch();
            match (early, late) {
                (true, true) => LocalResult::Ambiguous(Self::before(), Self::after()),
                (true, false) => LocalResult::Single(Self::before()),
                (false, true) => LocalResult::Single(Self::after()),
                (false, false) => LocalResult::None,
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            self.offset_from_utc_datetime(&utc.and_time(NaiveTime::MIN))
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            if *utc < Self::switch() {
                Self::before()
            } else {
                Self::after()
            }
        }
    }

    #[test]
    fn test_end_of_day_inside_dst_gap() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 30).unwrap();
        assert!(GapZone.from_local_datetime(&last_millisecond(day)).single().is_none());

        let eod = end_of_day_on(day, &GapZone);
        assert_eq!(eod.date_naive(), day);
        assert_eq!(
            eod.naive_utc(),
            NaiveDate::from_ymd_opt(2024, 3, 30).unwrap().and_hms_milli_opt(22, 29, 59, 999).unwrap()
        );
        assert_eq!(eod.offset(), &GapZone::before());

        // Days outside the gap are unaffected.
        let next = end_of_day_on(day.succ_opt().unwrap(), &GapZone);
        assert_eq!((next.hour(), next.minute(), next.second()), (23, 59, 59));
    }

    #[test]
    fn test_month_name_dates() {
        let start = |y, m, d| tz().with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap().with_timezone(&Utc);
        assert_eq!(normalize_in(&RawDue::text("Jan 5, 2024"), &tz()), Some(start(2024, 1, 5)));
        assert_eq!(normalize_in(&RawDue::text("June 10 2024"), &tz()), Some(start(2024, 6, 10)));
        assert_eq!(normalize_in(&RawDue::text("10 june 2024"), &tz()), Some(start(2024, 6, 10)));
        assert_eq!(normalize_in(&RawDue::text("Smarch 3, 2024"), &tz()), None);
    }

    #[test]
    fn test_serialise_round_trips_shape() {
        assert_eq!(serde_json::to_value(RawDue::text("2024-01-01")).unwrap(), json!("2024-01-01"));
        assert_eq!(
            serde_json::to_value(RawDue::EpochSeconds(5)).unwrap(),
            json!({"seconds": 5})
        );
        assert_eq!(serde_json::to_value(RawDue::convertible(Broken)).unwrap(), Value::Null);
    }
}
