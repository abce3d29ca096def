//! SQLite persistence for extraction results.
//!
//! Each storage tag selects one table with a fixed column list. Statement and
//! breakdown records map one-to-one onto rows. Profile field records of one
//! company are pivoted into a single wide row, one column per configured field.

use crate::error::{DataError, Result};
use chrono::Utc;
use f10_extract::profile::{FieldLayout, RowLayout};
use f10_extract::{CanonicalRecord, ExtractionResult, StatementKind, TableTag, Value};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OptionalExtension, Transaction, params_from_iter};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Leading columns of the row-per-record tables.
const STATEMENT_COLUMNS: &[&str] = &["公司代码", "报告日期", "科目名称", "值"];
const BOARD_PREFIX: &[&str] = &["公司代码", "更新日期", "分类维度"];
const BREAKDOWN_PREFIX: &[&str] = &["公司代码", "报告日期", "分类维度"];

/// Bookkeeping column added to every table.
const STORED_AT: &str = "入库时间";

/// Accepts batches of records for durable storage.
pub trait RecordSink {
    /// Store every batch, or none of them.
    fn persist(&self, results: &[ExtractionResult]) -> Result<()>;
}

/// How records of a tag map onto table rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// One flat record per row
    Flat,
    /// All field records of a company in one row
    Pivot,
}

/// Target table of one storage tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    /// Storage tag
    pub tag: TableTag,
    /// Table name
    pub table: &'static str,
    /// Column names, in record order
    pub columns: Vec<&'static str>,
    /// Natural key columns
    pub key: Vec<&'static str>,
    /// Record to row mapping
    pub layout: Layout,
}

impl TableSpec {
    /// Table spec of a storage tag.
    pub fn for_tag(tag: TableTag) -> Result<Self> {
        let spec = match tag {
            TableTag::BS | TableTag::PL | TableTag::CF => Self {
                tag,
                table: "financial_data",
                columns: STATEMENT_COLUMNS.to_vec(),
                key: STATEMENT_COLUMNS[..3].to_vec(),
                layout: Layout::Flat,
            },
            TableTag::CI => Self::pivot(tag, "company_information", StatementKind::CorporateProfile)?,
            TableTag::II => Self::pivot(tag, "ipo_information", StatementKind::IssuanceProfile)?,
            TableTag::BD => Self::rows(
                tag,
                "board_of_directors",
                BOARD_PREFIX,
                StatementKind::BoardMembers,
                2,
            )?,
            TableTag::RD => Self::rows(
                tag,
                "revenue_data",
                BREAKDOWN_PREFIX,
                StatementKind::RevenueBreakdown,
                1,
            )?,
            TableTag::ED => Self::rows(
                tag,
                "employees_data",
                BREAKDOWN_PREFIX,
                StatementKind::HeadcountBreakdown,
                1,
            )?,
        };
        spec.validate()?;
        Ok(spec)
    }

    fn pivot(tag: TableTag, table: &'static str, kind: StatementKind) -> Result<Self> {
        let layout = FieldLayout::for_kind(kind)
            .ok_or_else(|| DataError::schema(table, "no field layout"))?;
        let mut columns = vec![STATEMENT_COLUMNS[0]];
        columns.extend(layout.fields().iter().map(|f| f.name));
        Ok(Self {
            tag,
            table,
            columns,
            key: vec![STATEMENT_COLUMNS[0]],
            layout: Layout::Pivot,
        })
    }

    /// Row table keyed on the prefix plus the first `key_cells` typed cells.
    fn rows(
        tag: TableTag,
        table: &'static str,
        prefix: &[&'static str],
        kind: StatementKind,
        key_cells: usize,
    ) -> Result<Self> {
        let layout =
            RowLayout::for_kind(kind).ok_or_else(|| DataError::schema(table, "no row layout"))?;
        let mut columns = prefix.to_vec();
        columns.extend(layout.columns.iter().map(|(name, _)| *name));
        let key = columns[..prefix.len() + key_cells].to_vec();
        Ok(Self {
            tag,
            table,
            columns,
            key,
            layout: Layout::Flat,
        })
    }

    /// Subject name prefix of a statement tag, `None` for tags with a table
    /// of their own.
    pub fn subject_prefix(&self) -> Option<String> {
        matches!(self.tag, TableTag::BS | TableTag::PL | TableTag::CF)
            .then(|| format!("{}-", self.tag.as_str()))
    }

    fn validate(&self) -> Result<()> {
        if self.columns.is_empty() || self.key.is_empty() {
            return Err(DataError::schema(self.table, "empty column or key list"));
        }
        if let Some(missing) = self.key.iter().find(|k| !self.columns.contains(*k)) {
            return Err(DataError::schema(self.table, format!("key column {missing} not in table")));
        }
        for (i, column) in self.columns.iter().enumerate() {
            if self.columns[..i].contains(column) {
                return Err(DataError::schema(self.table, format!("duplicate column {column}")));
            }
        }
        Ok(())
    }

    fn create_sql(&self) -> String {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("{} TEXT", quote(c)))
            .chain(std::iter::once(format!("{} TEXT NOT NULL", quote(STORED_AT))))
            .collect();
        let key: Vec<String> = self.key.iter().map(|k| quote(k)).collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({}, PRIMARY KEY ({}))",
            quote(self.table),
            columns.join(", "),
            key.join(", ")
        )
    }

    fn insert_sql(&self) -> String {
        let names: Vec<String> = self
            .columns
            .iter()
            .chain(std::iter::once(&STORED_AT))
            .map(|c| quote(c))
            .collect();
        let slots: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();
        format!(
            "INSERT OR REPLACE INTO {} ({}) VALUES ({})",
            quote(self.table),
            names.join(", "),
            slots.join(", ")
        )
    }

    /// Rows to insert for one batch, without the bookkeeping column.
    fn rows_of(&self, result: &ExtractionResult) -> Result<Vec<Vec<SqlValue>>> {
        match self.layout {
            Layout::Flat => result
                .iter()
                .map(|record| {
                    if record.arity() != self.columns.len() {
                        return Err(DataError::schema(
                            self.table,
                            format!(
                                "record has {} fields, table has {} columns",
                                record.arity(),
                                self.columns.len()
                            ),
                        ));
                    }
                    Ok(record.to_values().iter().map(to_sql).collect())
                })
                .collect(),
            Layout::Pivot => {
                let mut companies: BTreeMap<&str, Vec<SqlValue>> = BTreeMap::new();
                for record in result {
                    let CanonicalRecord::Field(field) = record else {
                        return Err(DataError::schema(self.table, "expected field records"));
                    };
                    let col = self
                        .columns
                        .iter()
                        .position(|c| *c == field.field_name)
                        .ok_or_else(|| {
                            DataError::schema(self.table, format!("unknown field {}", field.field_name))
                        })?;
                    let row = companies.entry(&field.company_code).or_insert_with(|| {
                        let mut row = vec![SqlValue::Null; self.columns.len()];
                        row[0] = SqlValue::Text(field.company_code.clone());
                        row
                    });
                    row[col] = to_sql(&field.value);
                }
                Ok(companies.into_values().collect())
            }
        }
    }
}

/// SQLite-backed record sink.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    specs: BTreeMap<TableTag, TableSpec>,
}

impl SqliteStore {
    /// Open (or create) a database file.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_connection(Connection::open(path)?)
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let specs = TableTag::ALL
            .into_iter()
            .map(|tag| TableSpec::for_tag(tag).map(|spec| (tag, spec)))
            .collect::<Result<BTreeMap<_, _>>>()?;
        let store = Self { conn, specs };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<()> {
        let mut created = Vec::new();
        for spec in self.specs.values() {
            if created.contains(&spec.table) {
                continue;
            }
            self.conn.execute(&spec.create_sql(), [])?;
            created.push(spec.table);
        }
        debug!(tables = created.len(), "schema ready");
        Ok(())
    }

    /// Table spec of a storage tag.
    pub fn spec(&self, tag: TableTag) -> Result<&TableSpec> {
        self.specs
            .get(&tag)
            .ok_or_else(|| DataError::schema(tag.as_str(), "no table for tag"))
    }

    /// Number of stored rows of a tag.
    ///
    /// The statement tags share one table and are told apart by the tag
    /// prefix of the subject name.
    pub fn count_rows(&self, tag: TableTag) -> Result<usize> {
        let spec = self.spec(tag)?;
        let table = quote(spec.table);
        let count: i64 = match spec.subject_prefix() {
            Some(prefix) => self.conn.query_row(
                &format!(
                    "SELECT COUNT(*) FROM {table} WHERE {} LIKE ?1",
                    quote(STATEMENT_COLUMNS[2])
                ),
                [format!("{prefix}%")],
                |row| row.get(0),
            )?,
            None => self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?,
        };
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Stored text of one column for a company, first matching row.
    pub fn lookup(&self, tag: TableTag, company_code: &str, column: &str) -> Result<Option<String>> {
        let spec = self.spec(tag)?;
        if !spec.columns.contains(&column) {
            return Err(DataError::schema(spec.table, format!("unknown column {column}")));
        }
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1 LIMIT 1",
            quote(column),
            quote(spec.table),
            quote(spec.columns[0])
        );
        let value = self
            .conn
            .query_row(&sql, [company_code], |row| row.get::<_, Option<String>>(0))
            .optional()?;
        Ok(value.flatten())
    }

    fn insert(&self, tx: &Transaction<'_>, result: &ExtractionResult, stored_at: &str) -> Result<usize> {
        let spec = self.spec(result.tag)?;
        let rows = spec.rows_of(result)?;
        let mut stmt = tx.prepare_cached(&spec.insert_sql())?;
        for row in &rows {
            let values = row
                .iter()
                .cloned()
                .chain(std::iter::once(SqlValue::Text(stored_at.to_string())));
            stmt.execute(params_from_iter(values))?;
        }
        Ok(rows.len())
    }
}

impl RecordSink for SqliteStore {
    fn persist(&self, results: &[ExtractionResult]) -> Result<()> {
        let stored_at = Utc::now().to_rfc3339();
        let tx = self.conn.unchecked_transaction()?;
        for result in results {
            let rows = self.insert(&tx, result, &stored_at)?;
            info!(tag = %result.tag, records = result.len(), rows, "stored batch");
        }
        tx.commit()?;
        Ok(())
    }
}

/// Storage form of a value: NULL for missing, text otherwise.
fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Missing => SqlValue::Null,
        other => SqlValue::Text(other.to_string()),
    }
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}
