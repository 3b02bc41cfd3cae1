use chrono::{Duration, TimeZone, Utc};

use crate::period::{buckets_for_range, infer_bucket, Access, DateRange, Period, TimeBucket};

#[test]
fn test_period_codes_roundtrip() {
    for period in Period::ALL {
        assert_eq!(Period::parse(period.code()), Some(period));
    }
    assert_eq!(Period::parse("30d"), None);
    assert_eq!(Period::parse("3m"), None, "codes are case sensitive");
}

#[test]
fn test_default_period() {
    assert_eq!(Period::default(), Period::Last7Days);
    let parsed: Period = serde_json::from_str("\"7d\"").unwrap();
    assert_eq!(parsed, Period::default());
}

#[test]
fn test_paid_periods() {
    let paid: Vec<_> = Period::ALL
        .into_iter()
        .filter(|p| p.access() == Access::Paid)
        .collect();
    assert_eq!(paid, vec![Period::Last12Months, Period::Last24Months]);
}

#[test]
fn test_default_buckets() {
    assert_eq!(Period::Today.default_bucket(), TimeBucket::Hour);
    assert_eq!(Period::Last7Days.default_bucket(), TimeBucket::Hour);
    assert_eq!(Period::Last4Weeks.default_bucket(), TimeBucket::Day);
    assert_eq!(Period::Last3Months.default_bucket(), TimeBucket::Week);
    assert_eq!(Period::Last24Months.default_bucket(), TimeBucket::Month);
    assert!(Period::Last7Days.allows(TimeBucket::Day));
    assert!(!Period::Last7Days.allows(TimeBucket::Month));
}

#[test]
fn test_range_days_rounds_up() {
    let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    assert_eq!(DateRange::new(from, from).days(), 0);
    assert_eq!(DateRange::new(from, from + Duration::hours(1)).days(), 1);
    assert_eq!(DateRange::new(from, from + Duration::days(7)).days(), 7);
    assert_eq!(
        DateRange::new(from, from + Duration::days(7) + Duration::seconds(1)).days(),
        8
    );
    // reversed ranges measure the same
    assert_eq!(DateRange::new(from + Duration::days(3), from).days(), 3);
}

#[test]
fn test_buckets_for_range_table() {
    let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let range = |days| DateRange::new(from, from + Duration::days(days));

    assert_eq!(buckets_for_range(&range(1)), &[TimeBucket::Hour]);
    assert_eq!(buckets_for_range(&range(5)), &[TimeBucket::Hour, TimeBucket::Day]);
    assert_eq!(buckets_for_range(&range(8)), &[TimeBucket::Day, TimeBucket::Week]);
    assert_eq!(buckets_for_range(&range(28)), &[TimeBucket::Day, TimeBucket::Week]);
    assert_eq!(buckets_for_range(&range(200)), &[TimeBucket::Week, TimeBucket::Month]);
    assert_eq!(buckets_for_range(&range(700)), &[TimeBucket::Month]);
    assert_eq!(buckets_for_range(&range(2000)), &[TimeBucket::Month]);
}

#[test]
fn test_infer_bucket_keeps_or_switches() {
    let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let month = DateRange::new(from, from + Duration::days(20));

    assert_eq!(infer_bucket(&month, TimeBucket::Week), TimeBucket::Week);
    assert_eq!(infer_bucket(&month, TimeBucket::Hour), TimeBucket::Day);
}

#[test]
fn test_time_range_relative_periods() {
    let now = Utc.with_ymd_and_hms(2024, 6, 15, 13, 30, 0).unwrap();

    let today = Period::Today.time_range(now).unwrap();
    assert_eq!(today.from, Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap());
    assert_eq!(today.to, now);

    let yesterday = Period::Yesterday.time_range(now).unwrap();
    assert_eq!(yesterday.from, Utc.with_ymd_and_hms(2024, 6, 14, 0, 0, 0).unwrap());
    assert_eq!(yesterday.to, Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap());

    let quarter = Period::Last3Months.time_range(now).unwrap();
    assert_eq!(quarter.from, Utc.with_ymd_and_hms(2024, 3, 15, 13, 30, 0).unwrap());

    assert!(Period::Custom.time_range(now).is_none());
}

#[test]
fn test_bucket_steps() {
    let jan31 = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
    assert_eq!(
        TimeBucket::Month.step(jan31),
        Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap()
    );
    assert_eq!(TimeBucket::Week.step(jan31), jan31 + Duration::days(7));

    let range = DateRange::new(jan31, jan31 + Duration::days(2));
    assert_eq!(range.buckets(TimeBucket::Day).len(), 3);
}

#[test]
fn test_forecast_caps() {
    assert_eq!(TimeBucket::Hour.forecast_max(), 72);
    assert_eq!(TimeBucket::Month.forecast_max(), 3);
}
