//! Table location by structural signature.
//!
//! Tables are matched by what they are (their class attribute set and the
//! marker text of their first row), never by their ordinal position among all
//! tables on the page. An extra or missing table elsewhere in a document
//! therefore cannot shift which table a kind reads.

use crate::coerce::parse_date;
use crate::document::{Document, Table};
use crate::error::Result;
use crate::kind::StatementKind;
use crate::sanitize::{is_missing, sanitize};
use chrono::NaiveDate;

/// Class set of the two-column detail blocks (profile and issuance).
const DETAIL_CLASSES: &[&str] = &["table_bg001", "border_box", "limit_sale", "table_details"];

/// Class set of the row-list tables (board, revenue, headcount).
const LIST_CLASSES: &[&str] = &["table_bg001", "border_box", "limit_sale"];

/// Number of trailing characters of a stamp that hold the date.
const STAMP_DATE_LEN: usize = 10;

/// The structural signature of one table role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    /// Exact class attribute set the table must carry, if any
    pub classes: Option<&'static [&'static str]>,
    /// Text the first cell of the first row must start with, if any
    pub lead: Option<&'static str>,
    /// Texts that must each appear in some cell of the first row
    pub first_row: &'static [&'static str],
}

impl Signature {
    /// Signature of the tables the given kind reads.
    pub const fn for_kind(kind: StatementKind) -> Self {
        match kind {
            StatementKind::BalanceSheet
            | StatementKind::IncomeStatement
            | StatementKind::CashFlow => Self {
                classes: None,
                lead: Some("报告日期"),
                first_row: &[],
            },
            StatementKind::CorporateProfile => Self {
                classes: Some(DETAIL_CLASSES),
                lead: Some("组织形式"),
                first_row: &[],
            },
            StatementKind::IssuanceProfile => Self {
                classes: Some(DETAIL_CLASSES),
                lead: Some("成立日期"),
                first_row: &[],
            },
            StatementKind::BoardMembers => Self {
                classes: Some(LIST_CLASSES),
                lead: None,
                first_row: &["姓名", "职务"],
            },
            StatementKind::RevenueBreakdown => Self {
                classes: Some(LIST_CLASSES),
                lead: None,
                first_row: &["收入", "成本"],
            },
            StatementKind::HeadcountBreakdown => Self {
                classes: Some(LIST_CLASSES),
                lead: None,
                first_row: &["人数"],
            },
        }
    }

    /// Returns true if the table carries this signature.
    pub fn matches(&self, table: &Table) -> bool {
        if let Some(classes) = self.classes {
            if !table.has_class_set(classes) {
                return false;
            }
        }

        let Some(first) = table.rows().first() else {
            return false;
        };

        if let Some(lead) = self.lead {
            let cell = first.first().map(|c| sanitize(c)).unwrap_or_default();
            if !cell.starts_with(lead) {
                return false;
            }
        }

        self.first_row
            .iter()
            .all(|marker| first.iter().any(|cell| sanitize(cell).contains(marker)))
    }
}

/// Select, in document order, every table carrying the signature.
///
/// Returns an empty vector when nothing matches; whether that is fatal is the
/// caller's decision.
pub fn locate(document: &Document, signature: &Signature) -> Vec<Table> {
    document
        .tables()
        .into_iter()
        .filter(|t| signature.matches(t))
        .collect()
}

/// Which match of a stamp selector to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pick {
    /// The first matching element
    First,
    /// The last matching element
    Last,
}

/// A page element whose text ends in a reference date.
///
/// The stamp is the first `item` inside a `container`; `pick` chooses among
/// the containers that hold one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateStamp {
    /// CSS selector of the enclosing element
    pub container: &'static str,
    /// CSS selector of the stamp inside the container
    pub item: &'static str,
    /// Which container to read
    pub pick: Pick,
}

impl DateStamp {
    /// "Last updated" stamp in the section titles, dating the board table.
    pub const UPDATED: Self = Self {
        container: "h2.title_01",
        item: "li",
        pick: Pick::Last,
    };

    /// Report-period stamp above the breakdown tables.
    pub const REPORTED: Self = Self {
        container: "div.report_date",
        item: "span",
        pick: Pick::First,
    };

    /// Stamp dating the rows of a breakdown kind.
    pub const fn for_kind(kind: StatementKind) -> Option<Self> {
        match kind {
            StatementKind::BoardMembers => Some(Self::UPDATED),
            StatementKind::RevenueBreakdown | StatementKind::HeadcountBreakdown => {
                Some(Self::REPORTED)
            }
            _ => None,
        }
    }
}

/// Read the reference date carried by a stamp element.
///
/// Returns `Ok(None)` when the page has no such element, and a format error
/// when the element exists but does not end in a date.
pub fn locate_date(document: &Document, stamp: &DateStamp) -> Result<Option<NaiveDate>> {
    let texts = document.select_text(stamp.container, stamp.item)?;
    let text = match stamp.pick {
        Pick::First => texts.into_iter().next(),
        Pick::Last => texts.into_iter().last(),
    };
    let Some(text) = text else {
        return Ok(None);
    };

    let text = sanitize(&text);
    if is_missing(&text) {
        return Ok(None);
    }
    let chars: Vec<char> = text.chars().collect();
    let tail: String = chars[chars.len().saturating_sub(STAMP_DATE_LEN)..]
        .iter()
        .collect();
    parse_date(&tail).map(Some)
}
