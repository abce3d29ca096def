//! Narrow profile tables to named fields and breakdown rows.
//!
//! The detail blocks of the profile page are read at fixed (row, column)
//! offsets: the site's layout for a given table role is stable, so each field
//! is configured with its position and declared type. Breakdown tables are
//! row-homogeneous and are reshaped by plain row iteration.

use crate::coerce::{ValueType, coerce};
use crate::document::Table;
use crate::error::{ExtractError, Result};
use crate::kind::StatementKind;
use crate::record::{CanonicalRecord, FieldRecord, RowRecord};
use crate::sanitize::{MISSING, sanitize, sanitize_value};
use chrono::NaiveDate;
use tracing::debug;

/// Corporate profile fields, label order of the two-column detail block.
const CORPORATE_FIELDS: &[(&str, ValueType)] = &[
    ("组织形式", ValueType::Text),
    ("地域", ValueType::Text),
    ("中文简称", ValueType::Text),
    ("办公地址", ValueType::Text),
    ("公司全称", ValueType::Text),
    ("公司电话", ValueType::Text),
    ("英文名称", ValueType::Text),
    ("公司电子邮箱", ValueType::Text),
    ("注册资本", ValueType::Text),
    ("董事长", ValueType::Text),
    ("员工人数", ValueType::Text),
    ("董事会秘书", ValueType::Text),
    ("法人代表", ValueType::Text),
    ("董秘电话", ValueType::Text),
    ("总经理", ValueType::Text),
    ("董秘传真", ValueType::Text),
    ("公司网址", ValueType::Text),
    ("董秘邮箱", ValueType::Text),
    ("信息披露网址", ValueType::Text),
    ("信息披露报纸名称", ValueType::Text),
    ("主营业务", ValueType::Text),
    ("经营范围", ValueType::Text),
    ("公司沿革", ValueType::Text),
];

/// Rows of the corporate block that carry two label/value pairs.
const CORPORATE_PAIRED_ROWS: usize = 10;

/// Issuance profile fields, one per row.
const ISSUANCE_FIELDS: &[(&str, ValueType)] = &[
    ("成立日期", ValueType::Date),
    ("上市日期", ValueType::Date),
    ("发行方式", ValueType::Text),
    ("面值", ValueType::Decimal),
    ("发行数量", ValueType::Decimal),
    ("发行价格", ValueType::Decimal),
    ("募资资金总额", ValueType::Decimal),
    ("发行费用", ValueType::Decimal),
    ("发行中签率", ValueType::Percent),
    ("发行市盈率", ValueType::Decimal),
    ("发行后每股收益", ValueType::Decimal),
    ("发行后每股净资产", ValueType::Decimal),
    ("上市首日开盘价", ValueType::Decimal),
    ("上市首日收盘价", ValueType::Decimal),
    ("上市首日换手率", ValueType::Percent),
    ("主承销商", ValueType::Text),
    ("上市保荐人", ValueType::Text),
    ("会计师事务所", ValueType::Text),
];

/// Board table columns.
const BOARD_COLUMNS: &[(&str, ValueType)] = &[
    ("姓名", ValueType::Text),
    ("职务", ValueType::Text),
    ("起止时间", ValueType::Text),
    ("持股数_万股", ValueType::Decimal),
    ("报酬_元", ValueType::Decimal),
];

/// Revenue breakdown columns.
const REVENUE_COLUMNS: &[(&str, ValueType)] = &[
    ("分类名称", ValueType::Text),
    ("收入_万元", ValueType::Decimal),
    ("成本_万元", ValueType::Decimal),
    ("利润_万元", ValueType::Decimal),
    ("毛利率", ValueType::Percent),
    ("利润占比", ValueType::Percent),
];

/// Headcount breakdown columns.
const HEADCOUNT_COLUMNS: &[(&str, ValueType)] = &[
    ("分类名称", ValueType::Text),
    ("员工人数", ValueType::Decimal),
    ("员工占比", ValueType::Percent),
];

/// One configured field of a detail block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Output slot name
    pub name: &'static str,
    /// Body row of the value cell
    pub row: usize,
    /// Column of the value cell
    pub col: usize,
    /// Declared value type
    pub ty: ValueType,
}

/// Positional field layout of a detail block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLayout {
    fields: Vec<FieldSpec>,
}

impl FieldLayout {
    /// One value per row, at column 1.
    pub fn single_column(fields: &[(&'static str, ValueType)]) -> Self {
        Self::paired_then_single(fields, 0)
    }

    /// Two values per row (columns 1 and 3) for the first `paired_rows` rows,
    /// then one value per row at column 1.
    pub fn paired_then_single(fields: &[(&'static str, ValueType)], paired_rows: usize) -> Self {
        let paired = fields.len().min(paired_rows * 2);
        let mut specs = Vec::with_capacity(fields.len());

        for (i, &(name, ty)) in fields.iter().enumerate() {
            let (row, col) = if i < paired {
                (i / 2, if i % 2 == 0 { 1 } else { 3 })
            } else {
                (paired.div_ceil(2) + (i - paired), 1)
            };
            specs.push(FieldSpec { name, row, col, ty });
        }

        Self { fields: specs }
    }

    /// Layout of the detail block read by a kind, if it has one.
    pub fn for_kind(kind: StatementKind) -> Option<Self> {
        match kind {
            StatementKind::CorporateProfile => Some(Self::paired_then_single(
                CORPORATE_FIELDS,
                CORPORATE_PAIRED_ROWS,
            )),
            StatementKind::IssuanceProfile => Some(Self::single_column(ISSUANCE_FIELDS)),
            _ => None,
        }
    }

    /// The configured fields, in output order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }
}

/// Where a breakdown row's category label comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// First cell of the table's header row
    HeaderLead,
    /// A fixed label
    Fixed(&'static str),
}

/// Column layout of a row-homogeneous breakdown table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowLayout {
    /// Column names and declared types, in cell order
    pub columns: &'static [(&'static str, ValueType)],
    /// Source of the category label
    pub category: Category,
}

impl RowLayout {
    /// Layout of the breakdown tables read by a kind, if it has one.
    pub const fn for_kind(kind: StatementKind) -> Option<Self> {
        match kind {
            StatementKind::BoardMembers => Some(Self {
                columns: BOARD_COLUMNS,
                category: Category::Fixed("董事会"),
            }),
            StatementKind::RevenueBreakdown => Some(Self {
                columns: REVENUE_COLUMNS,
                category: Category::HeaderLead,
            }),
            StatementKind::HeadcountBreakdown => Some(Self {
                columns: HEADCOUNT_COLUMNS,
                category: Category::HeaderLead,
            }),
            _ => None,
        }
    }
}

/// Read every configured field of a detail block.
///
/// A field whose offset falls outside the table means the layout no longer
/// matches the page and is reported as [`ExtractError::SourceUnavailable`].
pub fn reshape_fields(
    company_code: &str,
    kind: StatementKind,
    layout: &FieldLayout,
    table: &Table,
) -> Result<Vec<CanonicalRecord>> {
    layout
        .fields()
        .iter()
        .map(|field| {
            let raw = table.body_cell(field.row, field.col).ok_or_else(|| {
                ExtractError::unavailable(
                    kind.tag().as_str(),
                    format!(
                        "field {} expected at row {} column {}",
                        field.name, field.row, field.col
                    ),
                )
            })?;
            let value = coerce(field.ty, &sanitize(raw))?;
            Ok(CanonicalRecord::Field(FieldRecord {
                company_code: company_code.to_string(),
                field_name: field.name.to_string(),
                value,
            }))
        })
        .collect()
}

/// Reshape breakdown tables, prefixing each body row with the company, the
/// reference date and the table's category label.
///
/// Rows are cut or padded to the layout's column count so every record of the
/// batch has the same arity.
pub fn reshape_rows(
    company_code: &str,
    reference_date: NaiveDate,
    layout: &RowLayout,
    tables: &[Table],
) -> Result<Vec<CanonicalRecord>> {
    let mut records = Vec::new();

    for table in tables {
        let (header, body) = split_header(table);
        let category = match layout.category {
            Category::Fixed(label) => label.to_string(),
            Category::HeaderLead => sanitize_value(header.and_then(|h| h.first())),
        };

        for row in body {
            if row.iter().all(|c| sanitize(c) == MISSING) {
                continue;
            }
            let cells = layout
                .columns
                .iter()
                .enumerate()
                .map(|(col, &(_, ty))| {
                    coerce(ty, &sanitize_value(row.get(col)))
                })
                .collect::<Result<Vec<_>>>()?;

            records.push(CanonicalRecord::Row(RowRecord {
                company_code: company_code.to_string(),
                reference_date,
                category: category.clone(),
                cells,
            }));
        }

        debug!(category = %category, rows = body.len(), "reshaped breakdown table");
    }

    Ok(records)
}

/// Header row and body of a table; the first row stands in for a missing `<th>` header.
fn split_header(table: &Table) -> (Option<&[String]>, &[Vec<String>]) {
    match table.header() {
        Some(header) => (Some(header), table.body()),
        None => match table.rows().split_first() {
            Some((first, rest)) => (Some(first.as_slice()), rest),
            None => (None, &[]),
        },
    }
}
