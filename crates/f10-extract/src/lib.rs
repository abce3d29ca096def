#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/f10/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod coerce;
pub mod dispatch;
pub mod document;
pub mod error;
pub mod kind;
pub mod locate;
pub mod profile;
pub mod record;
pub mod sanitize;
pub mod statement;

pub use coerce::{Value, ValueType, coerce};
pub use dispatch::{ExtractOptions, extract, extract_kinds, extract_with};
pub use document::{Document, Table};
pub use error::{ExtractError, Result};
pub use kind::{Report, Source, StatementKind, TableTag};
pub use record::{CanonicalRecord, ExtractionResult, FieldRecord, RowRecord, StatementRecord};
pub use sanitize::{MISSING, sanitize};
pub use statement::{ElisionPolicy, UnitSuffix};

pub use rust_decimal::Decimal;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
