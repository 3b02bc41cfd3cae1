use chrono::{TimeZone, Utc};

use crate::dimension::Dimension;
use crate::filter::{Filter, FilterSet};
use crate::period::{DateRange, Period, TimeBucket};
use crate::query::{DecodeOutcome, Entitlement, PeriodCodec, ViewQuery};

const DEMO: &str = "STEzHcB1rALV";

fn codec() -> PeriodCodec {
    PeriodCodec::new(DEMO)
}

fn free_user() -> Entitlement {
    Entitlement {
        project_id: "aaaaaaaaaaaa".to_string(),
        ..Entitlement::default()
    }
}

fn applied(outcome: DecodeOutcome) -> ViewQuery {
    match outcome {
        DecodeOutcome::Applied { query } => query,
        other => panic!("expected applied query, got {:?}", other),
    }
}

#[test]
fn test_roundtrip_relative_with_filter() {
    let mut query = ViewQuery::relative(Period::Last7Days);
    query.time_bucket = TimeBucket::Day;
    query.filters.apply(Filter::include(Dimension::Country, "US"));

    let encoded = codec().encode(&query);
    assert_eq!(encoded, "period=7d&timeBucket=day&cc=US");

    let decoded = applied(codec().decode(&encoded, &free_user()));
    assert_eq!(decoded.period, Period::Last7Days);
    assert_eq!(decoded.time_bucket, TimeBucket::Day);
    assert_eq!(decoded.filters.len(), 1);
    assert_eq!(
        decoded.filters.get(Dimension::Country),
        Some(&Filter::include(Dimension::Country, "US"))
    );
}

#[test]
fn test_default_bucket_is_not_encoded() {
    let query = ViewQuery::relative(Period::Last4Weeks);
    assert_eq!(codec().encode(&query), "period=4w");
}

#[test]
fn test_exclusive_filter_encoding() {
    let query = ViewQuery::relative(Period::Today).with_filters(
        vec![
            Filter::exclude(Dimension::Page, "/blog post"),
            Filter::include(Dimension::Referrer, "news.ycombinator.com"),
        ]
        .into_iter()
        .collect::<FilterSet>(),
    );

    let encoded = codec().encode(&query);
    assert_eq!(
        encoded,
        "period=today&pg=%21%2Fblog+post&ref=news.ycombinator.com"
    );

    let decoded = applied(codec().decode(&encoded, &free_user()));
    assert_eq!(decoded, query);
}

#[test]
fn test_custom_range_roundtrip() {
    let range = DateRange::new(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2024, 1, 20, 0, 0, 0).unwrap(),
    );
    let query = ViewQuery::custom(range, Some(TimeBucket::Week));
    let encoded = codec().encode(&query);
    assert_eq!(
        encoded,
        "period=custom&from=2024-01-01&to=2024-01-20&timeBucket=week"
    );

    let decoded = applied(codec().decode(&encoded, &free_user()));
    assert_eq!(decoded, query);
}

#[test]
fn test_custom_range_infers_bucket() {
    let decoded = applied(codec().decode(
        "period=custom&from=2024-01-01&to=2024-03-01&timeBucket=hour",
        &free_user(),
    ));
    assert_eq!(decoded.period, Period::Custom);
    assert_eq!(decoded.time_bucket, TimeBucket::Week);
}

#[test]
fn test_custom_without_range_falls_back() {
    let decoded = applied(codec().decode("period=custom&from=garbage", &free_user()));
    assert_eq!(decoded, ViewQuery::default());
}

#[test]
fn test_unknown_values_are_ignored() {
    let decoded = applied(codec().decode(
        "?period=5y&timeBucket=minute&zz=1&cc=&br=Safari",
        &free_user(),
    ));
    assert_eq!(decoded.period, Period::Last7Days);
    assert_eq!(decoded.time_bucket, TimeBucket::Hour);
    assert_eq!(decoded.filters.len(), 1);
    assert_eq!(
        decoded.filters.get(Dimension::Browser),
        Some(&Filter::include(Dimension::Browser, "Safari"))
    );
}

#[test]
fn test_illegal_bucket_for_period() {
    let decoded = applied(codec().decode("period=today&timeBucket=month", &free_user()));
    assert_eq!(decoded.period, Period::Today);
    assert_eq!(decoded.time_bucket, TimeBucket::Hour);
}

#[test]
fn test_encode_replaces_illegal_bucket() {
    let mut query = ViewQuery::relative(Period::Today);
    query.time_bucket = TimeBucket::Month;

    let encoded = codec().encode(&query);
    assert_eq!(encoded, "period=today");
    assert_eq!(applied(codec().decode(&encoded, &free_user())), query.normalized());
}

#[test]
fn test_encode_custom_without_range() {
    let mut query = ViewQuery::default();
    query.period = Period::Custom;
    query.time_bucket = TimeBucket::Month;
    query.filters.apply(Filter::include(Dimension::Country, "US"));

    let encoded = codec().encode(&query);
    assert_eq!(encoded, "period=7d&cc=US");

    let decoded = applied(codec().decode(&encoded, &free_user()));
    assert_eq!(decoded.period, Period::Last7Days);
    assert_eq!(decoded.filters.len(), 1);
}

#[test]
fn test_encode_narrows_custom_bucket() {
    let mut query = ViewQuery::custom(
        DateRange::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
        ),
        None,
    );
    query.time_bucket = TimeBucket::Hour;

    let encoded = codec().encode(&query);
    let decoded = applied(codec().decode(&encoded, &free_user()));
    assert_eq!(decoded, query.normalized());
    assert_ne!(decoded.time_bucket, TimeBucket::Hour);
}

#[test]
fn test_normalized_drops_stray_range() {
    let mut query = ViewQuery::relative(Period::Last4Weeks);
    query.range = Some(DateRange::new(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
    ));
    assert_eq!(query.normalized(), ViewQuery::relative(Period::Last4Weeks));
}

#[test]
fn test_repeated_column_last_wins() {
    let decoded = applied(codec().decode("period=7d&cc=US&cc=!DE", &free_user()));
    assert_eq!(decoded.filters.len(), 1);
    assert_eq!(
        decoded.filters.get(Dimension::Country),
        Some(&Filter::exclude(Dimension::Country, "DE"))
    );
}

#[test]
fn test_paid_period_denied_for_free_user() {
    let outcome = codec().decode("period=12M&cc=US", &free_user());
    assert!(outcome.is_upgrade_required());
    match outcome {
        DecodeOutcome::UpgradeRequired {
            requested,
            fallback,
        } => {
            assert_eq!(requested, Period::Last12Months);
            assert_eq!(fallback.period, Period::Last7Days);
            assert_eq!(fallback.filters.len(), 1);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[test]
fn test_paid_period_allowed_for_entitled_callers() {
    let paid = Entitlement {
        paid: true,
        ..free_user()
    };
    let shared = Entitlement {
        shared: true,
        ..free_user()
    };
    let demo = Entitlement {
        project_id: DEMO.to_string(),
        ..Entitlement::default()
    };

    for who in [paid, shared, demo] {
        let query = applied(codec().decode("period=24M", &who));
        assert_eq!(query.period, Period::Last24Months);
        assert_eq!(query.time_bucket, TimeBucket::Month);
    }
}

#[test]
fn test_cache_key() {
    let mut query = ViewQuery::relative(Period::Last3Months);
    assert_eq!(query.cache_key(), "3Mweek");

    query.filters.apply(Filter::include(Dimension::Country, "UA"));
    assert_eq!(
        query.cache_key(),
        r#"3Mweek[{"column":"cc","filter":"UA","isExclusive":false}]"#
    );

    let range = DateRange::new(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
    );
    assert_eq!(
        ViewQuery::custom(range, None).cache_key(),
        "2024-01-01-2024-01-02-hour"
    );
}
