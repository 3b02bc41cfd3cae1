use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::io::{Cursor, Write};
use tracing::{debug, error, info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::dimension::Dimension;
use crate::error::{Error, Result};
use crate::trendline::round_to;

pub mod countries;
mod csv;

#[cfg(test)]
mod export_test;

pub use countries::country_name;
use csv::{CsvWriter, HEADER};

pub const DEFAULT_LANGUAGE: &str = "en";

/// Per-dimension counts as returned by the backend `params` object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BreakdownBundle {
    pub data: BTreeMap<String, BTreeMap<String, f64>>,
    /// Dimension codes in export order; when empty every key of `data` is exported.
    #[serde(default)]
    pub types: Vec<String>,
}

impl BreakdownBundle {
    pub fn new(data: BTreeMap<String, BTreeMap<String, f64>>) -> Self {
        Self {
            data,
            types: Vec::new(),
        }
    }

    /// Counts must be finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        for (code, counts) in &self.data {
            if let Some((key, value)) = counts.iter().find(|(_, v)| !v.is_finite() || **v < 0.0) {
                return Err(Error::InvalidPayload(format!(
                    "{} count for '{}' is {}",
                    code, key, value
                )));
            }
        }
        Ok(())
    }

    /// Export order with repeated codes dropped.
    fn ordered_types(&self) -> Vec<&str> {
        if self.types.is_empty() {
            return self.data.keys().map(String::as_str).collect();
        }
        let mut seen = HashSet::new();
        self.types
            .iter()
            .map(String::as_str)
            .filter(|code| seen.insert(*code))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub name: String,
    pub contents: String,
}

#[derive(Debug, Clone)]
pub struct ExportArchive {
    pub filename: String,
    pub bytes: Vec<u8>,
}

pub struct ExportAssembler {
    prefix: String,
    display_names: BTreeMap<String, String>,
    language: String,
}

impl ExportAssembler {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            display_names: BTreeMap::new(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    pub fn with_display_names(mut self, names: BTreeMap<String, String>) -> Self {
        self.display_names = names;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    fn display_name(&self, code: &str) -> String {
        if let Some(name) = self.display_names.get(code) {
            return name.clone();
        }
        Dimension::parse(code)
            .map(|d| d.display_name().to_string())
            .unwrap_or_else(|| code.to_string())
    }

    fn row_label(&self, dimension: Option<Dimension>, key: &str) -> String {
        match dimension {
            Some(Dimension::Country) => country_name(key, &self.language)
                .map(str::to_string)
                .unwrap_or_else(|| key.to_string()),
            _ => key.to_string(),
        }
    }

    /// CSV for one dimension, `None` when the breakdown is empty.
    pub fn csv(&self, code: &str, counts: &BTreeMap<String, f64>) -> Option<String> {
        if counts.is_empty() {
            return None;
        }

        let dimension = Dimension::parse(code);
        let total: f64 = counts.values().sum();

        let mut rows: Vec<(&String, f64)> = counts.iter().map(|(k, v)| (k, *v)).collect();
        rows.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let mut writer = CsvWriter::new();
        writer.write_record(HEADER);
        for (key, count) in rows {
            let perc = if total > 0.0 {
                round_to(count / total * 100.0, 2)
            } else {
                0.0
            };
            writer.write_record([
                self.row_label(dimension, key),
                format_number(count),
                format_number(perc),
            ]);
        }

        Some(writer.into_string())
    }

    /// One file per non-empty dimension, in `types` order.
    ///
    /// File names are unique within the archive: a label already taken by an
    /// earlier dimension gets the dimension code appended, e.g. `UTM (me).csv`.
    pub fn files(&self, bundle: &BreakdownBundle) -> Vec<ExportFile> {
        let mut used: HashSet<String> = HashSet::new();
        let mut files = Vec::new();

        for code in bundle.ordered_types() {
            let Some(counts) = bundle.data.get(code) else {
                debug!("No breakdown for '{}', skipping", code);
                continue;
            };
            let Some(contents) = self.csv(code, counts) else {
                continue;
            };

            let label = self.display_name(code);
            let mut name = format!("{}.csv", sanitize_file_name(&label));
            if used.contains(&name) {
                name = format!("{} ({}).csv", sanitize_file_name(&label), sanitize_file_name(code));
                let mut n = 2;
                while used.contains(&name) {
                    name = format!(
                        "{} ({}) {}.csv",
                        sanitize_file_name(&label),
                        sanitize_file_name(code),
                        n
                    );
                    n += 1;
                }
                warn!("Export label '{}' is shared, writing '{}' as {}", label, code, name);
            }
            used.insert(name.clone());
            files.push(ExportFile { name, contents });
        }
        files
    }

    pub fn archive_filename(&self, today: NaiveDate) -> String {
        archive_filename(&self.prefix, today)
    }

    /// Builds the archive on a blocking worker thread.
    pub async fn export(&self, bundle: &BreakdownBundle, today: NaiveDate) -> Result<ExportArchive> {
        bundle.validate()?;
        let files = self.files(bundle);
        let filename = self.archive_filename(today);

        let bytes = tokio::task::spawn_blocking(move || build_archive(&files))
            .await
            .map_err(|e| {
                error!("Export task failed: {}", e);
                Error::Export(e.to_string())
            })??;

        info!("Exported {} ({} bytes)", filename, bytes.len());
        Ok(ExportArchive { filename, bytes })
    }
}

pub fn archive_filename(prefix: &str, today: NaiveDate) -> String {
    format!("swetrix-{}-{}.zip", prefix, today.format("%Y-%m-%d"))
}

pub fn build_archive(files: &[ExportFile]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for file in files {
        zip.start_file(file.name.as_str(), options)?;
        zip.write_all(file.contents.as_bytes())?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '-',
            c => c,
        })
        .collect()
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
