use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::io::{Cursor, Read};

use crate::export::{archive_filename, build_archive, country_name, BreakdownBundle, ExportAssembler, ExportFile};

fn counts(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn perc_column(csv: &str) -> Vec<f64> {
    csv.lines()
        .skip(1)
        .map(|line| line.rsplit(',').next().unwrap().parse::<f64>().unwrap())
        .collect()
}

#[test]
fn test_country_percentages() {
    let assembler = ExportAssembler::new("STEzHcB1rALV");
    let csv = assembler
        .csv("cc", &counts(&[("US", 3.0), ("GB", 1.0)]))
        .unwrap();

    assert_eq!(
        csv,
        "name,value,perc\nUnited States of America,3,75\nUnited Kingdom,1,25\n"
    );

    let sum: f64 = perc_column(&csv).iter().sum();
    assert!((sum - 100.0).abs() <= 0.1);
}

#[test]
fn test_percentages_are_rounded() {
    let assembler = ExportAssembler::new("p");
    let csv = assembler
        .csv("br", &counts(&[("Chrome", 1.0), ("Firefox", 1.0), ("Safari", 1.0)]))
        .unwrap();

    assert_eq!(perc_column(&csv), vec![33.33, 33.33, 33.33]);
    let sum: f64 = perc_column(&csv).iter().sum();
    assert!((sum - 100.0).abs() <= 0.1);
}

#[test]
fn test_rows_sorted_by_count_then_key() {
    let assembler = ExportAssembler::new("p");
    let csv = assembler
        .csv("pg", &counts(&[("/b", 2.0), ("/a", 2.0), ("/", 5.0)]))
        .unwrap();

    let names: Vec<&str> = csv
        .lines()
        .skip(1)
        .map(|l| l.split(',').next().unwrap())
        .collect();
    assert_eq!(names, vec!["/", "/a", "/b"]);
}

#[test]
fn test_unknown_country_keeps_code() {
    let assembler = ExportAssembler::new("p");
    let csv = assembler.csv("cc", &counts(&[("ZZ", 1.0)])).unwrap();
    assert_eq!(csv, "name,value,perc\nZZ,1,100\n");
}

#[test]
fn test_localized_country_names() {
    let assembler = ExportAssembler::new("p").with_language("de");
    let csv = assembler.csv("cc", &counts(&[("DE", 1.0)])).unwrap();
    assert!(csv.contains("Deutschland,1,100"));

    assert_eq!(country_name("gb", "uk-UA"), Some("Велика Британія"));
    assert_eq!(country_name("MX", "de"), None);
    assert_eq!(country_name("US", "xx"), None);
}

#[test]
fn test_fields_are_quoted() {
    let assembler = ExportAssembler::new("p");
    let csv = assembler
        .csv("ev", &counts(&[("signup, \"pro\"", 1.0)]))
        .unwrap();
    assert_eq!(csv, "name,value,perc\n\"signup, \"\"pro\"\"\",1,100\n");
}

#[test]
fn test_zero_total() {
    let assembler = ExportAssembler::new("p");
    let csv = assembler.csv("os", &counts(&[("Linux", 0.0)])).unwrap();
    assert_eq!(csv, "name,value,perc\nLinux,0,0\n");
}

#[test]
fn test_empty_dimensions_are_skipped() {
    let mut data = BTreeMap::new();
    data.insert("cc".to_string(), counts(&[("US", 1.0)]));
    data.insert("br".to_string(), BTreeMap::new());
    data.insert("so".to_string(), counts(&[("newsletter", 4.0)]));

    let bundle = BreakdownBundle {
        data,
        types: vec!["so".into(), "br".into(), "cc".into(), "dv".into()],
    };

    let mut names = BTreeMap::new();
    names.insert("so".to_string(), "Sources".to_string());

    let files = ExportAssembler::new("p")
        .with_display_names(names)
        .files(&bundle);
    let file_names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(file_names, vec!["Sources.csv", "Country.csv"]);
}

#[test]
fn test_display_name_fallbacks() {
    let mut data = BTreeMap::new();
    data.insert("custom/dim".to_string(), counts(&[("a", 1.0)]));
    data.insert("dv".to_string(), counts(&[("mobile", 1.0)]));

    let files = ExportAssembler::new("p").files(&BreakdownBundle::new(data));
    let file_names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(file_names, vec!["custom-dim.csv", "Device category.csv"]);
}

#[test]
fn test_repeated_types_export_once() {
    let mut data = BTreeMap::new();
    data.insert("cc".to_string(), counts(&[("US", 1.0)]));

    let bundle = BreakdownBundle {
        data,
        types: vec!["cc".into(), "cc".into()],
    };

    let files = ExportAssembler::new("p").files(&bundle);
    let file_names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(file_names, vec!["Country.csv"]);
    assert!(build_archive(&files).is_ok());
}

#[test]
fn test_shared_display_names_get_distinct_files() {
    let mut data = BTreeMap::new();
    data.insert("so".to_string(), counts(&[("newsletter", 2.0)]));
    data.insert("me".to_string(), counts(&[("email", 1.0)]));

    let bundle = BreakdownBundle {
        data,
        types: vec!["so".into(), "me".into()],
    };

    let mut names = BTreeMap::new();
    names.insert("so".to_string(), "UTM".to_string());
    names.insert("me".to_string(), "UTM".to_string());

    let files = ExportAssembler::new("p")
        .with_display_names(names)
        .files(&bundle);
    let file_names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(file_names, vec!["UTM.csv", "UTM (me).csv"]);

    let bytes = build_archive(&files).unwrap();
    let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    assert_eq!(archive.len(), 2);
}

#[tokio::test]
async fn test_export_with_clashing_names_succeeds() {
    let mut data = BTreeMap::new();
    data.insert("cc".to_string(), counts(&[("US", 1.0)]));
    data.insert("custom".to_string(), counts(&[("a", 1.0)]));

    let bundle = BreakdownBundle {
        data,
        types: vec!["cc".into(), "custom".into(), "cc".into()],
    };
    let mut names = BTreeMap::new();
    names.insert("custom".to_string(), "Country".to_string());

    let archive = ExportAssembler::new("p")
        .with_display_names(names)
        .export(&bundle, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())
        .await
        .unwrap();
    let archive = zip::ZipArchive::new(Cursor::new(archive.bytes)).unwrap();
    assert_eq!(archive.len(), 2);
}

#[test]
fn test_archive_filename() {
    let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
    assert_eq!(
        archive_filename("STEzHcB1rALV", date),
        "swetrix-STEzHcB1rALV-2024-03-09.zip"
    );
}

#[test]
fn test_build_archive_contains_files() {
    let files = vec![
        ExportFile {
            name: "Country.csv".to_string(),
            contents: "name,value,perc\nUS,1,100\n".to_string(),
        },
        ExportFile {
            name: "Page.csv".to_string(),
            contents: "name,value,perc\n/,1,100\n".to_string(),
        },
    ];

    let bytes = build_archive(&files).unwrap();
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    assert_eq!(archive.len(), 2);

    let mut contents = String::new();
    archive
        .by_name("Country.csv")
        .unwrap()
        .read_to_string(&mut contents)
        .unwrap();
    assert_eq!(contents, files[0].contents);
}

#[tokio::test]
async fn test_export_runs_on_blocking_pool() {
    let mut data = BTreeMap::new();
    data.insert("cc".to_string(), counts(&[("US", 3.0), ("GB", 1.0)]));

    let archive = ExportAssembler::new("STEzHcB1rALV")
        .export(
            &BreakdownBundle::new(data),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(archive.filename, "swetrix-STEzHcB1rALV-2024-01-02.zip");
    let archive = zip::ZipArchive::new(Cursor::new(archive.bytes)).unwrap();
    assert_eq!(archive.len(), 1);
}

#[tokio::test]
async fn test_export_rejects_negative_counts() {
    let mut data = BTreeMap::new();
    data.insert("br".to_string(), counts(&[("Chrome", -1.0)]));

    let result = ExportAssembler::new("p")
        .export(
            &BreakdownBundle::new(data),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        )
        .await;
    assert!(matches!(result, Err(crate::error::Error::InvalidPayload(_))));
}
