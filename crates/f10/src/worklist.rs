//! Download-list lines to fetch units.

use f10_data::ListEntry;
use f10_extract::{Result, Source, StatementKind};

/// One fetch and the kinds extracted from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkUnit {
    /// The list line this unit came from
    pub entry: ListEntry,
    /// Document to fetch
    pub source: Source,
    /// Kinds extracted from the document, in code order
    pub kinds: Vec<StatementKind>,
}

impl WorkUnit {
    /// Resolve a list line.
    ///
    /// Kind `4` stands for the whole company profile page, so it expands to
    /// every kind that page carries. Other codes address a single kind.
    pub fn from_entry(entry: &ListEntry) -> Result<Self> {
        let kind = StatementKind::from_code(&entry.kind_code)?;
        let kinds = match kind {
            StatementKind::CorporateProfile => kind.siblings(),
            _ => vec![kind],
        };
        Ok(Self {
            entry: entry.clone(),
            source: kind.source(),
            kinds,
        })
    }

    /// Company the unit fetches for.
    pub fn company_code(&self) -> &str {
        &self.entry.company_code
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use f10_extract::{ExtractError, Report};
    use rstest::rstest;

    #[test]
    fn test_profile_page_expands() {
        let unit = WorkUnit::from_entry(&ListEntry::new("600000", "4")).unwrap();
        assert_eq!(unit.source, Source::ProfilePage);
        assert_eq!(unit.kinds.len(), 5);
        assert_eq!(unit.kinds[0], StatementKind::CorporateProfile);
        assert_eq!(unit.company_code(), "600000");
    }

    #[rstest]
    #[case("1", Source::Statement(Report::BalanceSheet))]
    #[case("3", Source::Statement(Report::CashFlow))]
    #[case("7", Source::ProfilePage)]
    fn test_single_kind(#[case] code: &str, #[case] source: Source) {
        let unit = WorkUnit::from_entry(&ListEntry::new("600000", code)).unwrap();
        assert_eq!(unit.source, source);
        assert_eq!(unit.kinds.len(), 1);
    }

    #[test]
    fn test_unknown_code() {
        let err = WorkUnit::from_entry(&ListEntry::new("600000", "x")).unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedKind(_)));
    }
}
