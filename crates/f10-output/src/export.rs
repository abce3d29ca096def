//! Export of extraction results.

use f10_extract::{ExtractionResult, TableTag};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    /// One comma-separated line per record.
    #[default]
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "pretty-json" | "pretty" => Ok(Self::PrettyJson),
            other => Err(ExportError::InvalidFormat(other.to_string())),
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

impl Exporter for ExtractionResult {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        export(std::slice::from_ref(self), self, format)
    }
}

impl Exporter for [ExtractionResult] {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        export(self, self, format)
    }
}

impl Exporter for Vec<ExtractionResult> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        self.as_slice().export_to_string(format)
    }
}

fn export<T: Serialize + ?Sized>(
    results: &[ExtractionResult],
    whole: &T,
    format: ExportFormat,
) -> Result<String, ExportError> {
    match format {
        ExportFormat::Csv => to_csv(results),
        ExportFormat::Json => Ok(serde_json::to_string(whole)?),
        ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(whole)?),
    }
}

/// Rows of different tags have different widths, so the writer is flexible
/// and no header line is written.
fn to_csv(results: &[ExtractionResult]) -> Result<String, ExportError> {
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(vec![]);

    for result in results {
        for record in result {
            let values = record.to_values();
            let row = std::iter::once(result.tag.as_str().to_string())
                .chain(values.iter().map(ToString::to_string));
            wtr.write_record(row)?;
        }
    }

    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
}

/// Number of records per storage tag, in tag order.
pub fn record_counts(results: &[ExtractionResult]) -> Vec<(TableTag, usize)> {
    let mut counts: Vec<(TableTag, usize)> = Vec::new();
    for result in results {
        match counts.iter_mut().find(|(tag, _)| *tag == result.tag) {
            Some((_, n)) => *n += result.len(),
            None => counts.push((result.tag, result.len())),
        }
    }
    counts.sort_by_key(|(tag, _)| *tag);
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use f10_extract::{ExtractOptions, StatementKind, extract, extract_kinds};

    const CSV: &str = "报告日期,2023-03-31,2022-12-31,\n货币资金(万元),100,--,\n存货(万元),\"1,000.5\",2,\n";

    #[test]
    fn test_export_format_parsing() {
        assert_eq!("csv".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("pretty-json".parse::<ExportFormat>().unwrap(), ExportFormat::PrettyJson);
        assert!("xml".parse::<ExportFormat>().is_err());
        assert_eq!(ExportFormat::PrettyJson.extension(), "json");
    }

    #[test]
    fn test_statement_csv() {
        let result = extract("1", "600000", CSV).unwrap();
        let text = result.export_to_string(ExportFormat::Csv).unwrap();
        assert_eq!(
            text,
            "BS,600000,2023-03-31,BS-货币资金,100.00\n\
             BS,600000,2023-03-31,BS-存货,1000.50\n\
             BS,600000,2022-12-31,BS-存货,2.00\n"
        );
    }

    #[test]
    fn test_statement_json() {
        let result = extract("1", "600000", CSV).unwrap();
        let json = result.export_to_string(ExportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["tag"], "BS");
        assert_eq!(value["kind"], "BalanceSheet");
        assert_eq!(value["records"][0]["subject"], "BS-货币资金");
        assert_eq!(value["records"][0]["value"], "100.00");
        assert_eq!(value["records"][0]["report_date"], "2023-03-31");
    }

    #[test]
    fn test_missing_fields_in_json_and_csv() {
        let page = r#"<table class="table_bg001 border_box limit_sale table_details">
            <tr><td>成立日期</td><td>--</td></tr>
        </table>"#;
        let kinds = [StatementKind::IssuanceProfile];
        let layout_rows = f10_extract::profile::FieldLayout::for_kind(kinds[0])
            .unwrap()
            .fields()
            .len();
        let mut html = page.replace("</table>", "");
        for _ in 1..layout_rows {
            html.push_str("<tr><td>x</td><td></td></tr>");
        }
        html.push_str("</table>");

        let results = extract_kinds(&kinds, "600000", &html, &ExtractOptions::default()).unwrap();
        let json = results.export_to_string(ExportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value[0]["records"][0]["value"].is_null());

        let csv = results.export_to_string(ExportFormat::Csv).unwrap();
        assert!(csv.starts_with("II,600000,成立日期,--\n"));
    }

    #[test]
    fn test_record_counts() {
        let bs = extract("1", "600000", CSV).unwrap();
        let pl = extract("2", "600000", CSV).unwrap();
        let counts = record_counts(&[pl, bs.clone(), bs]);
        assert_eq!(counts, vec![(TableTag::BS, 6), (TableTag::PL, 3)]);
    }

    #[test]
    fn test_export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bs.json");
        let result = extract("1", "600000", CSV).unwrap();
        result.export_to_file(&path, ExportFormat::PrettyJson).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"tag\": \"BS\""));
    }
}
