//! Statement kinds, their codes and storage tags.

use crate::error::{ExtractError, Result};
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// The report types that can be extracted.
///
/// Codes `1`–`5` are the primary kinds. Codes `6`–`8` address the
/// row-homogeneous breakdown tables that share the company profile page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum StatementKind {
    /// Balance sheet (资产负债表)
    #[display("balance sheet")]
    BalanceSheet,
    /// Income statement (利润表)
    #[display("income statement")]
    IncomeStatement,
    /// Cash-flow statement (现金流量表)
    #[display("cash-flow statement")]
    CashFlow,
    /// Corporate profile block (公司资料)
    #[display("corporate profile")]
    CorporateProfile,
    /// IPO issuance block (发行相关)
    #[display("issuance profile")]
    IssuanceProfile,
    /// Board of directors table
    #[display("board members")]
    BoardMembers,
    /// Revenue breakdown tables (by industry, product, region)
    #[display("revenue breakdown")]
    RevenueBreakdown,
    /// Headcount breakdown tables
    #[display("headcount breakdown")]
    HeadcountBreakdown,
}

impl StatementKind {
    /// Every supported kind, ordered by code.
    pub const ALL: [Self; 8] = [
        Self::BalanceSheet,
        Self::IncomeStatement,
        Self::CashFlow,
        Self::CorporateProfile,
        Self::IssuanceProfile,
        Self::BoardMembers,
        Self::RevenueBreakdown,
        Self::HeadcountBreakdown,
    ];

    /// Look up a kind by its code.
    pub fn from_code(code: &str) -> Result<Self> {
        let code = code.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.code() == code)
            .ok_or_else(|| ExtractError::UnsupportedKind(code.to_string()))
    }

    /// Kind code used in download lists and on the command line.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::BalanceSheet => "1",
            Self::IncomeStatement => "2",
            Self::CashFlow => "3",
            Self::CorporateProfile => "4",
            Self::IssuanceProfile => "5",
            Self::BoardMembers => "6",
            Self::RevenueBreakdown => "7",
            Self::HeadcountBreakdown => "8",
        }
    }

    /// Short storage tag of the records this kind produces.
    pub const fn tag(&self) -> TableTag {
        match self {
            Self::BalanceSheet => TableTag::BS,
            Self::IncomeStatement => TableTag::PL,
            Self::CashFlow => TableTag::CF,
            Self::CorporateProfile => TableTag::CI,
            Self::IssuanceProfile => TableTag::II,
            Self::BoardMembers => TableTag::BD,
            Self::RevenueBreakdown => TableTag::RD,
            Self::HeadcountBreakdown => TableTag::ED,
        }
    }

    /// Which upstream document carries this kind.
    pub const fn source(&self) -> Source {
        match self {
            Self::BalanceSheet => Source::Statement(Report::BalanceSheet),
            Self::IncomeStatement => Source::Statement(Report::Income),
            Self::CashFlow => Source::Statement(Report::CashFlow),
            _ => Source::ProfilePage,
        }
    }

    /// Subject prefix for the wide statement kinds.
    pub const fn subject_prefix(&self) -> Option<&'static str> {
        match self {
            Self::BalanceSheet => Some("BS-"),
            Self::IncomeStatement => Some("PL-"),
            Self::CashFlow => Some("CF-"),
            _ => None,
        }
    }

    /// Returns true for the wide, period-column statement kinds.
    pub const fn is_statement(&self) -> bool {
        self.subject_prefix().is_some()
    }

    /// All kinds extracted from the same document as this one, in code order.
    pub fn siblings(&self) -> Vec<Self> {
        let source = self.source();
        Self::ALL
            .into_iter()
            .filter(|k| k.source() == source)
            .collect()
    }
}

/// Storage tag selecting the target table of a batch of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize)]
#[allow(clippy::upper_case_acronyms)]
pub enum TableTag {
    /// Balance-sheet statement records
    BS,
    /// Income-statement records
    PL,
    /// Cash-flow statement records
    CF,
    /// Corporate profile fields
    CI,
    /// Issuance (IPO) profile fields
    II,
    /// Board member rows
    BD,
    /// Revenue breakdown rows
    RD,
    /// Headcount breakdown rows
    ED,
}

impl TableTag {
    /// Every tag, in storage order.
    pub const ALL: [Self; 8] = [
        Self::BS,
        Self::PL,
        Self::CF,
        Self::CI,
        Self::II,
        Self::BD,
        Self::RD,
        Self::ED,
    ];

    /// The tag as a string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BS => "BS",
            Self::PL => "PL",
            Self::CF => "CF",
            Self::CI => "CI",
            Self::II => "II",
            Self::BD => "BD",
            Self::RD => "RD",
            Self::ED => "ED",
        }
    }
}

/// Upstream document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// Delimited statement export, one per report
    Statement(Report),
    /// The HTML company profile page
    ProfilePage,
}

/// Statement report published as a delimited export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Report {
    /// zcfzb
    BalanceSheet,
    /// lrb
    Income,
    /// xjllb
    CashFlow,
}

impl Report {
    /// Path slug the upstream site uses for this report.
    pub const fn slug(&self) -> &'static str {
        match self {
            Self::BalanceSheet => "zcfzb",
            Self::Income => "lrb",
            Self::CashFlow => "xjllb",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_round_trip() {
        for kind in StatementKind::ALL {
            assert_eq!(StatementKind::from_code(kind.code()).unwrap(), kind);
        }
        assert_eq!(
            StatementKind::from_code(" 2 ").unwrap(),
            StatementKind::IncomeStatement
        );
    }

    #[test]
    fn test_unknown_code() {
        assert!(matches!(
            StatementKind::from_code("9"),
            Err(ExtractError::UnsupportedKind(code)) if code == "9"
        ));
        assert!(StatementKind::from_code("").is_err());
    }

    #[test]
    fn test_tags_are_distinct() {
        let mut tags: Vec<TableTag> = StatementKind::ALL.iter().map(|k| k.tag()).collect();
        tags.sort();
        tags.dedup();
        assert_eq!(tags.len(), StatementKind::ALL.len());
    }

    #[test]
    fn test_siblings() {
        assert_eq!(
            StatementKind::CashFlow.siblings(),
            vec![StatementKind::CashFlow]
        );
        let page = StatementKind::CorporateProfile.siblings();
        assert_eq!(page.len(), 5);
        assert!(page.iter().all(|k| k.source() == Source::ProfilePage));
    }

    #[test]
    fn test_prefixes() {
        assert_eq!(StatementKind::BalanceSheet.subject_prefix(), Some("BS-"));
        assert!(StatementKind::IncomeStatement.is_statement());
        assert!(!StatementKind::BoardMembers.is_statement());
        assert_eq!(TableTag::RD.as_str(), "RD");
        assert_eq!(TableTag::CF.to_string(), "CF");
    }
}
