//! Plain-text work and bookkeeping lists.
//!
//! - download list: `<company_code> <kind_code>` per line
//! - known-nonexistent list: one company code per line
//! - problem list: `<company_code> <kind_code>` per line, one per failed unit
//!
//! Blank lines are ignored everywhere.

use crate::error::{DataError, Result};
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::info;

/// Default file names, relative to the data directory.
pub const DOWNLOAD_LIST: &str = "download_list.txt";
/// Known-nonexistent company codes.
pub const NOT_EXIST_LIST: &str = "not_exist_list.txt";
/// Failed units of the last run.
pub const PROBLEM_LIST: &str = "problem_list.txt";
/// Failed units not explained by a nonexistent company.
pub const NEW_PROBLEM_LIST: &str = "new_problem_list.txt";

/// One `<company_code> <kind_code>` line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListEntry {
    /// Six-digit company code
    pub company_code: String,
    /// Kind code as written in the file
    pub kind_code: String,
}

impl ListEntry {
    /// Create an entry.
    pub fn new(company_code: impl Into<String>, kind_code: impl Into<String>) -> Self {
        Self {
            company_code: company_code.into(),
            kind_code: kind_code.into(),
        }
    }
}

impl fmt::Display for ListEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.company_code, self.kind_code)
    }
}

/// Parse `<company_code> <kind_code>` lines.
pub fn parse_entries(text: &str, origin: &str) -> Result<Vec<ListEntry>> {
    let mut entries = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(company), Some(kind), None) => entries.push(ListEntry::new(company, kind)),
            _ => {
                return Err(DataError::ListLine {
                    path: origin.to_string(),
                    line: i + 1,
                    content: line.to_string(),
                });
            }
        }
    }
    Ok(entries)
}

/// Read a download list.
pub fn read_download_list(path: impl AsRef<Path>) -> Result<Vec<ListEntry>> {
    read_entries(path.as_ref())
}

/// Read a problem list.
pub fn read_problem_list(path: impl AsRef<Path>) -> Result<Vec<ListEntry>> {
    read_entries(path.as_ref())
}

/// Read the known-nonexistent company codes.
pub fn read_not_exist_list(path: impl AsRef<Path>) -> Result<BTreeSet<String>> {
    let text = fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// Write entries one per line, replacing the file.
pub fn write_problem_list(path: impl AsRef<Path>, entries: &[ListEntry]) -> Result<()> {
    let text: String = entries.iter().map(|e| format!("{e}\n")).collect();
    fs::write(path, text)?;
    Ok(())
}

/// Problem entries whose company is not known to be nonexistent.
pub fn new_problems(problems: &[ListEntry], not_exist: &BTreeSet<String>) -> Vec<ListEntry> {
    problems
        .iter()
        .filter(|p| !not_exist.contains(&p.company_code))
        .cloned()
        .collect()
}

/// Filter a problem list file against the known-nonexistent list and write
/// what remains to `out`. Returns the number of entries written.
pub fn check_problem_list(
    not_exist_path: impl AsRef<Path>,
    problem_path: impl AsRef<Path>,
    out: impl AsRef<Path>,
) -> Result<usize> {
    let not_exist = read_not_exist_list(not_exist_path)?;
    let problems = read_problem_list(problem_path)?;
    let remaining = new_problems(&problems, &not_exist);
    write_problem_list(out.as_ref(), &remaining)?;
    info!(
        problems = problems.len(),
        remaining = remaining.len(),
        out = %out.as_ref().display(),
        "checked problem list"
    );
    Ok(remaining.len())
}

fn read_entries(path: &Path) -> Result<Vec<ListEntry>> {
    let text = fs::read_to_string(path)?;
    parse_entries(&text, &path.display().to_string())
}
