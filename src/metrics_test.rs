use chrono::{TimeZone, Utc};

use crate::error::Error;
use crate::metrics::{
    parse_timestamp, ActiveMetricFlags, ChartMetric, ChartPayload, MetricsBundle, StatsPayload,
};

#[test]
fn test_bundle_rejects_length_mismatch() {
    let x = vec![Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()];
    let err = MetricsBundle::new(x, vec![1.0], vec![1.0, 2.0], vec![0.0]).unwrap_err();
    assert!(matches!(
        err,
        Error::LengthMismatch {
            field: "visits",
            expected: 1,
            actual: 2
        }
    ));
}

#[test]
fn test_parse_timestamp_formats() {
    let expected = Utc.with_ymd_and_hms(2024, 3, 5, 14, 0, 0).unwrap();
    assert_eq!(parse_timestamp("2024-03-05 14:00:00").unwrap(), expected);
    assert_eq!(parse_timestamp("2024-03-05T14:00:00Z").unwrap(), expected);
    assert_eq!(parse_timestamp("2024-03-05T16:00:00+02:00").unwrap(), expected);
    assert_eq!(
        parse_timestamp("2024-03-05").unwrap(),
        Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap()
    );
    assert!(parse_timestamp("yesterday-ish").is_err());
}

#[test]
fn test_chart_payload_missing_sdur_reads_as_zero() {
    let payload = ChartPayload {
        x: vec!["2024-01-01".into(), "2024-01-02".into()],
        uniques: vec![1.0, 2.0],
        visits: vec![3.0, 4.0],
        sdur: Vec::new(),
    };
    let bundle = payload.to_bundle().unwrap();
    assert_eq!(bundle.sdur(), &[0.0, 0.0]);
    assert_eq!(bundle.len(), 2);
}

#[test]
fn test_stats_payload_deserialize() {
    let raw = r#"{
        "chart": {"x": ["2024-01-01 00:00:00"], "uniques": [4], "visits": [9], "sdur": [30]},
        "params": {"cc": {"US": 3, "GB": 1}},
        "customs": {"signup": 2},
        "appliedFilters": "[{\"column\":\"cc\",\"filter\":\"US\",\"isExclusive\":false}]"
    }"#;
    let payload: StatsPayload = serde_json::from_str(raw).unwrap();
    assert_eq!(payload.params["cc"]["US"], 3.0);
    assert_eq!(payload.customs["signup"], 2.0);
    assert_eq!(payload.applied_filters().len(), 1);
    assert_eq!(payload.chart.to_bundle().unwrap().visits(), &[9.0]);
}

#[test]
fn test_extended_caps_tail() {
    let day = |d| Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap();
    let base = MetricsBundle::new(vec![day(1)], vec![1.0], vec![2.0], vec![3.0]).unwrap();
    let tail = MetricsBundle::new(
        vec![day(2), day(3), day(4)],
        vec![4.0, 5.0, 6.0],
        vec![7.0, 8.0, 9.0],
        vec![0.0, 0.0, 0.0],
    )
    .unwrap();

    let out = base.extended(&tail, 2);
    assert_eq!(out.x(), &[day(1), day(2), day(3)]);
    assert_eq!(out.uniques(), &[1.0, 4.0, 5.0]);
    // the original is untouched
    assert_eq!(base.len(), 1);
}

#[test]
fn test_flags_toggle_and_default() {
    let mut flags = ActiveMetricFlags::default();
    assert!(flags.unique && flags.views);
    assert!(!flags.uses_secondary_axis());

    flags.toggle(ChartMetric::Bounce);
    assert!(flags.is_active(ChartMetric::Bounce));
    assert!(flags.uses_secondary_axis());

    flags.toggle(ChartMetric::Bounce);
    assert!(!flags.bounce);
}

#[test]
fn test_flags_deserialize_partial() {
    let flags: ActiveMetricFlags =
        serde_json::from_str(r#"{"unique": false, "sessionDuration": true}"#).unwrap();
    assert!(!flags.unique);
    assert!(flags.views);
    assert!(flags.session_duration);
}
