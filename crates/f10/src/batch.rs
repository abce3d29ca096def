//! Batch runs over a download list.

use crate::error::Result;
use crate::worklist::WorkUnit;
use f10_data::{Fetcher, ListEntry, RecordSink};
use f10_extract::{ExtractOptions, TableTag, extract_kinds};
use f10_output::record_counts;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

/// Default pause between fetched units
pub const DEFAULT_DELAY: Duration = Duration::from_secs(5);

/// Batch run configuration.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Pause after each fetched unit
    pub delay: Duration,
    /// Skip units whose company is on the known-nonexistent list
    pub skip_known_missing: bool,
    /// Draw a progress bar on stderr
    pub show_progress: bool,
    /// Extraction options applied to every unit
    pub options: ExtractOptions,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            delay: DEFAULT_DELAY,
            skip_known_missing: true,
            show_progress: false,
            options: ExtractOptions::default(),
        }
    }
}

/// What happened to one list line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOutcome {
    /// Every batch of the unit was stored
    Stored {
        /// The list line
        entry: ListEntry,
        /// Records stored per tag
        records: Vec<(TableTag, usize)>,
    },
    /// The unit was not attempted
    Skipped {
        /// The list line
        entry: ListEntry,
        /// Why it was skipped
        reason: String,
    },
    /// The unit failed and nothing of it was stored
    Failed {
        /// The list line
        entry: ListEntry,
        /// Rendered error
        error: String,
    },
}

impl UnitOutcome {
    /// The list line of the outcome.
    pub const fn entry(&self) -> &ListEntry {
        match self {
            Self::Stored { entry, .. } | Self::Skipped { entry, .. } | Self::Failed { entry, .. } => {
                entry
            }
        }
    }
}

/// Outcomes of a batch run, in list order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// One outcome per list line
    pub outcomes: Vec<UnitOutcome>,
}

impl BatchReport {
    /// Number of stored units.
    pub fn stored(&self) -> usize {
        self.count(|o| matches!(o, UnitOutcome::Stored { .. }))
    }

    /// Number of skipped units.
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, UnitOutcome::Skipped { .. }))
    }

    /// Number of failed units.
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, UnitOutcome::Failed { .. }))
    }

    /// Failed list lines, for the problem list.
    pub fn problems(&self) -> Vec<ListEntry> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, UnitOutcome::Failed { .. }))
            .map(|o| o.entry().clone())
            .collect()
    }

    /// Total records stored per tag.
    pub fn records_by_tag(&self) -> Vec<(TableTag, usize)> {
        let mut totals: Vec<(TableTag, usize)> = Vec::new();
        for outcome in &self.outcomes {
            let UnitOutcome::Stored { records, .. } = outcome else {
                continue;
            };
            for &(tag, n) in records {
                match totals.iter_mut().find(|(t, _)| *t == tag) {
                    Some((_, total)) => *total += n,
                    None => totals.push((tag, n)),
                }
            }
        }
        totals.sort_by_key(|(tag, _)| *tag);
        totals
    }

    fn count(&self, pred: impl Fn(&UnitOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} units: {} stored, {} skipped, {} failed",
            self.outcomes.len(),
            self.stored(),
            self.skipped(),
            self.failed()
        )?;
        for (tag, n) in self.records_by_tag() {
            writeln!(f, "  {tag:<4}{n:>10} records")?;
        }
        for outcome in &self.outcomes {
            if let UnitOutcome::Failed { entry, error } = outcome {
                writeln!(f, "  failed {entry}: {error}")?;
            }
        }
        Ok(())
    }
}

/// Run every list line: fetch, extract, store.
///
/// A failing unit is recorded in the report and the run moves on; nothing of
/// a failed unit is stored.
pub async fn run_batch<F, S>(
    entries: &[ListEntry],
    not_exist: &BTreeSet<String>,
    fetcher: &F,
    sink: &S,
    config: &BatchConfig,
) -> BatchReport
where
    F: Fetcher,
    S: RecordSink,
{
    let progress = if config.show_progress {
        let pb = ProgressBar::new(entries.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut report = BatchReport::default();
    for (i, entry) in entries.iter().enumerate() {
        progress.set_message(entry.to_string());

        if config.skip_known_missing && not_exist.contains(&entry.company_code) {
            info!(entry = %entry, "skipping known-nonexistent company");
            report.outcomes.push(UnitOutcome::Skipped {
                entry: entry.clone(),
                reason: "company does not exist".to_string(),
            });
            progress.inc(1);
            continue;
        }

        let outcome = match run_unit(entry, fetcher, sink, &config.options).await {
            Ok(records) => {
                info!(entry = %entry, batches = records.len(), "stored unit");
                UnitOutcome::Stored {
                    entry: entry.clone(),
                    records,
                }
            }
            Err(e) => {
                warn!(entry = %entry, error = %e, "unit failed");
                UnitOutcome::Failed {
                    entry: entry.clone(),
                    error: e.to_string(),
                }
            }
        };
        report.outcomes.push(outcome);
        progress.inc(1);

        if i + 1 < entries.len() && !config.delay.is_zero() {
            tokio::time::sleep(config.delay).await;
        }
    }

    progress.finish_with_message("done");
    info!(
        stored = report.stored(),
        skipped = report.skipped(),
        failed = report.failed(),
        "batch complete"
    );
    report
}

async fn run_unit<F, S>(
    entry: &ListEntry,
    fetcher: &F,
    sink: &S,
    options: &ExtractOptions,
) -> Result<Vec<(TableTag, usize)>>
where
    F: Fetcher,
    S: RecordSink,
{
    let unit = WorkUnit::from_entry(entry)?;
    let raw = fetcher.fetch(unit.source, unit.company_code()).await?;
    let results = extract_kinds(&unit.kinds, unit.company_code(), &raw, options)?;
    sink.persist(&results)?;
    Ok(record_counts(&results))
}
