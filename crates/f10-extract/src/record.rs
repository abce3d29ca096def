//! Canonical records and extraction results.

use crate::coerce::Value;
use crate::kind::{StatementKind, TableTag};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// One (subject, period) value of a wide statement table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementRecord {
    /// Six-digit company code
    pub company_code: String,
    /// Period end date of the column
    pub report_date: NaiveDate,
    /// Prefixed, canonicalized subject name
    pub subject: String,
    /// Value at two fractional digits
    pub value: Decimal,
}

/// One named field of a profile block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldRecord {
    /// Six-digit company code
    pub company_code: String,
    /// Configured field name
    pub field_name: String,
    /// Coerced field value
    pub value: Value,
}

/// One row of a row-homogeneous breakdown table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowRecord {
    /// Six-digit company code
    pub company_code: String,
    /// Date the page stamps on the table
    pub reference_date: NaiveDate,
    /// Category label of the table the row came from
    pub category: String,
    /// Typed row cells, in column order
    pub cells: Vec<Value>,
}

/// A normalized flat record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CanonicalRecord {
    /// Wide statement value
    Statement(StatementRecord),
    /// Profile field
    Field(FieldRecord),
    /// Breakdown row
    Row(RowRecord),
}

impl CanonicalRecord {
    /// Company the record belongs to.
    pub fn company_code(&self) -> &str {
        match self {
            Self::Statement(r) => &r.company_code,
            Self::Field(r) => &r.company_code,
            Self::Row(r) => &r.company_code,
        }
    }

    /// Number of fields of the flattened tuple.
    pub fn arity(&self) -> usize {
        match self {
            Self::Statement(_) => 4,
            Self::Field(_) => 3,
            Self::Row(r) => 3 + r.cells.len(),
        }
    }

    /// The record as a flat tuple, in storage column order.
    pub fn to_values(&self) -> Vec<Value> {
        match self {
            Self::Statement(r) => vec![
                Value::Text(r.company_code.clone()),
                Value::Date(r.report_date),
                Value::Text(r.subject.clone()),
                Value::Decimal(r.value),
            ],
            Self::Field(r) => vec![
                Value::Text(r.company_code.clone()),
                Value::Text(r.field_name.clone()),
                r.value.clone(),
            ],
            Self::Row(r) => {
                let mut values = Vec::with_capacity(3 + r.cells.len());
                values.push(Value::Text(r.company_code.clone()));
                values.push(Value::Date(r.reference_date));
                values.push(Value::Text(r.category.clone()));
                values.extend(r.cells.iter().cloned());
                values
            }
        }
    }

    const fn variant(&self) -> u8 {
        match self {
            Self::Statement(_) => 0,
            Self::Field(_) => 1,
            Self::Row(_) => 2,
        }
    }
}

/// The output of one extraction call: a tagged, homogeneous batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    /// Storage tag selecting the target table
    pub tag: TableTag,
    /// Kind that produced the batch
    pub kind: StatementKind,
    /// Records in source order
    pub records: Vec<CanonicalRecord>,
}

impl ExtractionResult {
    /// Create a result for a kind.
    pub const fn new(kind: StatementKind, records: Vec<CanonicalRecord>) -> Self {
        Self {
            tag: kind.tag(),
            kind,
            records,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the batch holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over the records.
    pub fn iter(&self) -> std::slice::Iter<'_, CanonicalRecord> {
        self.records.iter()
    }

    /// Returns true if every record has the same variant and arity.
    pub fn is_homogeneous(&self) -> bool {
        let mut shapes = self.records.iter().map(|r| (r.variant(), r.arity()));
        shapes
            .next()
            .is_none_or(|first| shapes.all(|shape| shape == first))
    }
}

impl<'a> IntoIterator for &'a ExtractionResult {
    type Item = &'a CanonicalRecord;
    type IntoIter = std::slice::Iter<'a, CanonicalRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn statement(subject: &str, value: &str) -> CanonicalRecord {
        CanonicalRecord::Statement(StatementRecord {
            company_code: "600000".to_string(),
            report_date: NaiveDate::from_ymd_opt(2023, 3, 31).unwrap(),
            subject: subject.to_string(),
            value: Decimal::from_str(value).unwrap(),
        })
    }

    #[test]
    fn test_flat_values() {
        let record = statement("BS-货币资金", "100.00");
        let values = record.to_values();
        assert_eq!(values.len(), record.arity());
        assert_eq!(values[0].as_text(), Some("600000"));
        assert_eq!(values[1].to_string(), "2023-03-31");
        assert_eq!(values[3].to_string(), "100.00");

        let row = CanonicalRecord::Row(RowRecord {
            company_code: "600000".to_string(),
            reference_date: NaiveDate::from_ymd_opt(2022, 12, 31).unwrap(),
            category: "按行业".to_string(),
            cells: vec![Value::Text("银行业".to_string()), Value::Missing],
        });
        assert_eq!(row.arity(), 5);
        assert_eq!(row.to_values()[4], Value::Missing);
    }

    #[test]
    fn test_homogeneity() {
        let mut result = ExtractionResult::new(
            StatementKind::BalanceSheet,
            vec![statement("BS-a", "1.00"), statement("BS-b", "2.00")],
        );
        assert_eq!(result.tag, TableTag::BS);
        assert!(result.is_homogeneous());

        result.records.push(CanonicalRecord::Field(FieldRecord {
            company_code: "600000".to_string(),
            field_name: "地域".to_string(),
            value: Value::Text("上海".to_string()),
        }));
        assert!(!result.is_homogeneous());

        assert!(ExtractionResult::new(StatementKind::CashFlow, vec![]).is_homogeneous());
    }
}
