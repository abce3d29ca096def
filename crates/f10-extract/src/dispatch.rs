//! Kind dispatch: from a kind code and raw page text to a tagged batch.

use crate::document::Document;
use crate::error::{ExtractError, Result};
use crate::kind::StatementKind;
use crate::locate::{DateStamp, Signature, locate, locate_date};
use crate::profile::{FieldLayout, RowLayout, reshape_fields, reshape_rows};
use crate::record::ExtractionResult;
use crate::statement::{ElisionPolicy, UnitSuffix, reshape_statement};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Options for an extraction call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractOptions {
    /// Zero/missing handling for statement cells
    pub elision: ElisionPolicy,
    /// Unit suffix removal for statement row labels
    pub suffix: UnitSuffix,
}

impl ExtractOptions {
    /// Emit every statement cell, including zero and missing ones.
    pub const fn keep_all(mut self) -> Self {
        self.elision = ElisionPolicy::KeepAll;
        self
    }
}

/// Extract one kind from raw page text with default options.
///
/// The kind code is resolved before the page is parsed, so an unknown code
/// fails with [`ExtractError::UnsupportedKind`] whatever the input.
pub fn extract(kind_code: &str, company_code: &str, raw: &str) -> Result<ExtractionResult> {
    let kind = StatementKind::from_code(kind_code)?;
    let document = Document::parse(raw)?;
    extract_with(kind, company_code, &document, &ExtractOptions::default())
}

/// Extract several kinds that share one page, parsing it once.
pub fn extract_kinds(
    kinds: &[StatementKind],
    company_code: &str,
    raw: &str,
    options: &ExtractOptions,
) -> Result<Vec<ExtractionResult>> {
    let document = Document::parse(raw)?;
    kinds
        .iter()
        .map(|&kind| extract_with(kind, company_code, &document, options))
        .collect()
}

/// Extract one kind from an already parsed document.
pub fn extract_with(
    kind: StatementKind,
    company_code: &str,
    document: &Document,
    options: &ExtractOptions,
) -> Result<ExtractionResult> {
    let tables = locate(document, &Signature::for_kind(kind));
    let tag = kind.tag();

    let records = if kind.is_statement() {
        let table = tables
            .first()
            .ok_or_else(|| ExtractError::unavailable(tag.as_str(), "no statement table found"))?;
        reshape_statement(company_code, kind, table, options.elision, options.suffix)?
    } else if let Some(layout) = FieldLayout::for_kind(kind) {
        let table = tables
            .first()
            .ok_or_else(|| ExtractError::unavailable(tag.as_str(), "no detail table found"))?;
        reshape_fields(company_code, kind, &layout, table)?
    } else if let Some(layout) = RowLayout::for_kind(kind) {
        if tables.is_empty() {
            debug!(company = company_code, kind = %kind, "no breakdown tables on page");
            Vec::new()
        } else {
            let stamp = DateStamp::for_kind(kind)
                .ok_or_else(|| ExtractError::unavailable(tag.as_str(), "no date stamp configured"))?;
            let reference_date = locate_date(document, &stamp)?.ok_or_else(|| {
                ExtractError::unavailable(tag.as_str(), format!("no {} stamp", stamp.container))
            })?;
            reshape_rows(company_code, reference_date, &layout, &tables)?
        }
    } else {
        return Err(ExtractError::UnsupportedKind(kind.code().to_string()));
    };

    debug!(
        company = company_code,
        tag = %tag,
        tables = tables.len(),
        records = records.len(),
        "extracted"
    );
    Ok(ExtractionResult::new(kind, records))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "报告日期,2023-03-31,2022-12-31,\n货币资金(万元),100.00,--,\n应收账款(万元),0,5,\n";

    #[test]
    fn test_unsupported_kind_checked_first() {
        assert!(matches!(
            extract("9", "600000", ""),
            Err(ExtractError::UnsupportedKind(code)) if code == "9"
        ));
        assert!(matches!(
            extract("BS", "600000", "not even close"),
            Err(ExtractError::UnsupportedKind(_))
        ));
    }

    #[test]
    fn test_statement_csv() {
        let result = extract("1", "600000", CSV).unwrap();
        assert_eq!(result.tag.as_str(), "BS");
        assert_eq!(result.len(), 2);
        assert!(result.is_homogeneous());
    }

    #[test]
    fn test_keep_all_option() {
        let document = Document::parse(CSV).unwrap();
        let options = ExtractOptions::default().keep_all();
        let result =
            extract_with(StatementKind::BalanceSheet, "600000", &document, &options).unwrap();
        assert_eq!(result.len(), 4);
    }

    #[test]
    fn test_missing_statement_table() {
        let result = extract("2", "600000", "<html><body><p>维护中</p></body></html>");
        assert!(matches!(result, Err(ExtractError::SourceUnavailable { kind, .. }) if kind == "PL"));
    }

    #[test]
    fn test_missing_profile_table() {
        let result = extract("4", "600000", "<html><body></body></html>");
        assert!(matches!(result, Err(ExtractError::SourceUnavailable { .. })));
    }

    #[test]
    fn test_breakdown_absent_is_empty() {
        let result = extract("7", "600000", "<html><body></body></html>").unwrap();
        assert!(result.is_empty());
        assert_eq!(result.tag.as_str(), "RD");
    }

    #[test]
    fn test_breakdown_without_stamp() {
        let page = r#"<table class="table_bg001 border_box limit_sale">
            <tr><th>按专业</th><th>人数</th><th>占比</th></tr>
            <tr><td>技术</td><td>10</td><td>100%</td></tr>
        </table>"#;
        assert!(matches!(
            extract("8", "600000", page),
            Err(ExtractError::SourceUnavailable { .. })
        ));
    }
}
