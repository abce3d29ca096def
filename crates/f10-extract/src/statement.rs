//! Wide statement tables to long records.
//!
//! A statement export has report period end-dates across its first row and
//! one subject per following row. Each (subject, period) cell becomes one
//! [`StatementRecord`], unless the elision policy drops it.

use crate::coerce::{DECIMAL_SCALE, Value, ValueType, coerce, parse_date};
use crate::document::Table;
use crate::error::{ExtractError, Result};
use crate::kind::StatementKind;
use crate::record::{CanonicalRecord, StatementRecord};
use crate::sanitize::{is_missing, sanitize, sanitize_value};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Canonical names for subjects the source layout truncates or abbreviates.
pub const SUBJECT_OVERRIDES: &[(&str, &str)] = &[
    ("PL-基本", "PL-基本每股收益"),
    ("PL-稀释", "PL-稀释每股收益"),
    ("BS-向中央银行借款净增加", "BS-向中央银行借款净增加额"),
];

/// Length of the accounting-unit suffix on statement row labels, e.g. `(万元)`.
pub const UNIT_SUFFIX_LEN: usize = 4;

/// What to do with zero-valued and unreported cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElisionPolicy {
    /// Drop cells whose value is zero or missing
    #[default]
    ElideZeroAndMissing,
    /// Emit every cell; missing cells are stored as zero
    KeepAll,
}

/// How the unit suffix is removed from a row label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitSuffix {
    /// Drop a fixed number of trailing characters
    Fixed(usize),
    /// Drop a trailing parenthesized unit, if present
    Bracketed,
}

impl Default for UnitSuffix {
    fn default() -> Self {
        Self::Fixed(UNIT_SUFFIX_LEN)
    }
}

impl UnitSuffix {
    /// Strip the suffix from a sanitized label.
    pub fn strip<'a>(&self, label: &'a str) -> &'a str {
        match *self {
            Self::Fixed(n) => {
                let keep = label.chars().count().saturating_sub(n);
                let end = label
                    .char_indices()
                    .nth(keep)
                    .map_or(label.len(), |(i, _)| i);
                &label[..end]
            }
            Self::Bracketed => {
                let Some(open) = label
                    .strip_suffix(')')
                    .and_then(|rest| rest.rfind('('))
                    .or_else(|| label.strip_suffix('）').and_then(|rest| rest.rfind('（')))
                else {
                    return label;
                };
                &label[..open]
            }
        }
    }
}

/// Build the canonical subject name for a stripped row label.
///
/// # Example
/// ```
/// use f10_extract::statement::subject_name;
///
/// assert_eq!(subject_name("PL-", "基本"), "PL-基本每股收益");
/// assert_eq!(subject_name("BS-", " 货币资金 "), "BS-货币资金");
/// ```
pub fn subject_name(prefix: &str, label: &str) -> String {
    let name = format!("{prefix}{}", label.trim());
    SUBJECT_OVERRIDES
        .iter()
        .find(|(from, _)| *from == name)
        .map_or(name, |(_, to)| (*to).to_string())
}

/// Reshape a located statement table into long records.
///
/// Row 0 holds the period end-dates; columns whose header cell is blank (the
/// trailing delimiter column) are skipped, as are rows with a blank label.
pub fn reshape_statement(
    company_code: &str,
    kind: StatementKind,
    table: &Table,
    policy: ElisionPolicy,
    suffix: UnitSuffix,
) -> Result<Vec<CanonicalRecord>> {
    let prefix = kind.subject_prefix().ok_or_else(|| {
        ExtractError::unavailable(kind.tag().as_str(), "not a wide statement kind")
    })?;

    let Some(header) = table.rows().first() else {
        return Ok(Vec::new());
    };
    let periods = report_periods(header)?;

    let mut records = Vec::new();
    for row in table.rows().iter().skip(1) {
        let label = sanitize_value(row.first());
        if is_missing(&label) {
            continue;
        }
        let stripped = suffix.strip(&label);
        if stripped.trim().is_empty() {
            debug!(label = %label, "statement row label is only a unit suffix, skipping");
            continue;
        }
        let subject = subject_name(prefix, stripped);

        for &(col, report_date) in &periods {
            let text = sanitize_value(row.get(col));
            let value = match (coerce(ValueType::Decimal, &text)?, policy) {
                (Value::Decimal(v), ElisionPolicy::ElideZeroAndMissing) if v.is_zero() => continue,
                (Value::Missing, ElisionPolicy::ElideZeroAndMissing) => continue,
                (Value::Missing, ElisionPolicy::KeepAll) => Decimal::new(0, DECIMAL_SCALE),
                (Value::Decimal(v), _) => v,
                (other, _) => {
                    return Err(ExtractError::format(&other.to_string(), "decimal"));
                }
            };

            records.push(CanonicalRecord::Statement(StatementRecord {
                company_code: company_code.to_string(),
                report_date,
                subject: subject.clone(),
                value,
            }));
        }
    }

    debug!(
        company = company_code,
        kind = %kind,
        periods = periods.len(),
        records = records.len(),
        "reshaped statement table"
    );
    Ok(records)
}

/// Column index and end-date of every non-blank period column.
fn report_periods(header: &[String]) -> Result<Vec<(usize, NaiveDate)>> {
    let mut periods = Vec::new();
    for (col, cell) in header.iter().enumerate().skip(1) {
        let text = sanitize(cell);
        if is_missing(&text) {
            continue;
        }
        periods.push((col, parse_date(&text)?));
    }
    Ok(periods)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;

    fn grid(rows: &[&[&str]]) -> Table {
        Table::new(
            rows.iter()
                .map(|r| r.iter().map(|c| (*c).to_string()).collect())
                .collect(),
        )
        .with_header_rows(1)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn unpack(records: &[CanonicalRecord]) -> Vec<(String, NaiveDate, String)> {
        records
            .iter()
            .map(|r| match r {
                CanonicalRecord::Statement(s) => {
                    (s.subject.clone(), s.report_date, s.value.to_string())
                }
                other => panic!("unexpected record {other:?}"),
            })
            .collect()
    }

    #[test]
    fn test_three_periods_two_subjects() {
        let table = grid(&[
            &["报告日期", "2023-03-31", "2022-12-31", "2022-09-30", ""],
            &["科目甲(万元)", "100.00", "0", "--", ""],
            &["科目乙(万元)", "50.00", "75.00", "0", ""],
        ]);

        let records = reshape_statement(
            "600000",
            StatementKind::BalanceSheet,
            &table,
            ElisionPolicy::default(),
            UnitSuffix::default(),
        )
        .unwrap();

        assert_eq!(
            unpack(&records),
            vec![
                ("BS-科目甲".to_string(), date(2023, 3, 31), "100.00".to_string()),
                ("BS-科目乙".to_string(), date(2023, 3, 31), "50.00".to_string()),
                ("BS-科目乙".to_string(), date(2022, 12, 31), "75.00".to_string()),
            ]
        );
        assert!(records.iter().all(|r| r.company_code() == "600000"));
    }

    #[test]
    fn test_keep_all_policy() {
        let table = grid(&[
            &["报告日期", "20230331", "20221231"],
            &["净利润(万元)", "0", "--"],
        ]);
        let records = reshape_statement(
            "600000",
            StatementKind::IncomeStatement,
            &table,
            ElisionPolicy::KeepAll,
            UnitSuffix::default(),
        )
        .unwrap();
        let values: Vec<String> = unpack(&records).into_iter().map(|r| r.2).collect();
        assert_eq!(values, vec!["0.00", "0.00"]);
    }

    #[test]
    fn test_overrides_apply_after_suffix_strip() {
        let table = grid(&[
            &["报告日期", "2023-03-31"],
            &["基本(元/股)", "0.35"],
            &["向中央银行借款净增加(万元)", "12"],
        ]);
        let records = reshape_statement(
            "600000",
            StatementKind::IncomeStatement,
            &table,
            ElisionPolicy::default(),
            UnitSuffix::Bracketed,
        )
        .unwrap();
        let subjects: Vec<String> = unpack(&records).into_iter().map(|r| r.0).collect();
        assert_eq!(subjects, vec!["PL-基本每股收益", "PL-向中央银行借款净增加"]);

        let records = reshape_statement(
            "600000",
            StatementKind::BalanceSheet,
            &table,
            ElisionPolicy::default(),
            UnitSuffix::Bracketed,
        )
        .unwrap();
        assert_eq!(unpack(&records)[1].0, "BS-向中央银行借款净增加额");
    }

    #[rstest]
    #[case("PL-", "基本", "PL-基本每股收益")]
    #[case("PL-", "稀释", "PL-稀释每股收益")]
    #[case("BS-", "向中央银行借款净增加", "BS-向中央银行借款净增加额")]
    #[case("BS-", "基本", "BS-基本")]
    #[case("CF-", "现金净增加额", "CF-现金净增加额")]
    fn test_subject_name(#[case] prefix: &str, #[case] label: &str, #[case] expected: &str) {
        assert_eq!(subject_name(prefix, label), expected);
    }

    #[rstest]
    #[case(UnitSuffix::Fixed(4), "货币资金(万元)", "货币资金")]
    #[case(UnitSuffix::Fixed(4), "(万元)", "")]
    #[case(UnitSuffix::Fixed(4), "abc", "")]
    #[case(UnitSuffix::Bracketed, "基本每股收益(元/股)", "基本每股收益")]
    #[case(UnitSuffix::Bracketed, "营业收入（万元）", "营业收入")]
    #[case(UnitSuffix::Bracketed, "营业收入", "营业收入")]
    fn test_unit_suffix(#[case] suffix: UnitSuffix, #[case] label: &str, #[case] expected: &str) {
        assert_eq!(suffix.strip(label), expected);
    }

    #[test]
    fn test_bad_value_is_format_error() {
        let table = grid(&[&["报告日期", "2023-03-31"], &["货币资金(万元)", "abc"]]);
        let result = reshape_statement(
            "600000",
            StatementKind::BalanceSheet,
            &table,
            ElisionPolicy::default(),
            UnitSuffix::default(),
        );
        assert!(matches!(result, Err(ExtractError::Format { .. })));
    }

    #[test]
    fn test_bad_period_is_format_error() {
        let table = grid(&[&["报告日期", "2023/03/31"], &["货币资金(万元)", "1"]]);
        let result = reshape_statement(
            "600000",
            StatementKind::BalanceSheet,
            &table,
            ElisionPolicy::default(),
            UnitSuffix::default(),
        );
        assert!(matches!(result, Err(ExtractError::Format { expected: "date", .. })));
    }

    #[test]
    fn test_blank_rows_and_short_rows() {
        let table = grid(&[
            &["报告日期", "2023-03-31", "2022-12-31"],
            &["", "", ""],
            &["货币资金(万元)", "8"],
        ]);
        let records = reshape_statement(
            "600000",
            StatementKind::CashFlow,
            &table,
            ElisionPolicy::default(),
            UnitSuffix::default(),
        )
        .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0],
            CanonicalRecord::Statement(StatementRecord {
                company_code: "600000".to_string(),
                report_date: date(2023, 3, 31),
                subject: "CF-货币资金".to_string(),
                value: Decimal::from_str("8.00").unwrap(),
            })
        );
    }

    #[test]
    fn test_profile_kind_is_rejected() {
        let table = grid(&[&["报告日期"]]);
        assert!(
            reshape_statement(
                "600000",
                StatementKind::BoardMembers,
                &table,
                ElisionPolicy::default(),
                UnitSuffix::default(),
            )
            .is_err()
        );
    }
}
