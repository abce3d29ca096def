//! F10 CLI binary.
//!
//! Extracts financial statements and company profiles from saved pages, or
//! runs a download list against the upstream site into a SQLite database.

mod logging;
mod paths;

use clap::{Parser, Subcommand};
use encoding_rs::GBK;
use f10::{BatchConfig, WorkUnit, run_batch};
use f10_data::client::decode;
use f10_data::lists::{
    self, NEW_PROBLEM_LIST, NOT_EXIST_LIST, PROBLEM_LIST, check_problem_list, read_download_list,
    read_not_exist_list, write_problem_list,
};
use f10_data::{F10Client, ListEntry};
use f10_extract::{ExtractOptions, StatementKind, extract_kinds};
use f10_output::{ExportFormat, Exporter};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "f10")]
#[command(about = "F10: financial statement extraction for listed companies", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding the database and list files
    #[arg(long, global = true, env = "F10_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract records from a saved page
    Extract {
        /// Kind code (see `f10 kinds`)
        #[arg(long)]
        kind: String,

        /// Six-digit company code
        #[arg(long)]
        company: String,

        /// Saved CSV export or HTML page (UTF-8 or GBK)
        #[arg(long)]
        input: PathBuf,

        /// Output format: csv, json or pretty-json
        #[arg(long, default_value = "csv")]
        format: ExportFormat,

        /// Keep zero and missing statement cells
        #[arg(long)]
        keep_zero: bool,

        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Fetch, extract and store every line of a download list
    Run {
        /// Download list, `<company_code> <kind_code>` per line
        #[arg(long)]
        list: Option<PathBuf>,

        /// Known-nonexistent company codes, one per line
        #[arg(long)]
        not_exist: Option<PathBuf>,

        /// Where failed lines are written
        #[arg(long)]
        problems: Option<PathBuf>,

        /// SQLite database file
        #[arg(long, env = "F10_DB")]
        db: Option<PathBuf>,

        /// Seconds to wait between fetches
        #[arg(long, default_value = "5")]
        delay: u64,

        /// Keep zero and missing statement cells
        #[arg(long)]
        keep_zero: bool,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Drop problem-list lines whose company is known not to exist
    Check {
        /// Known-nonexistent company codes
        #[arg(long)]
        not_exist: Option<PathBuf>,

        /// Problem list of the last run
        #[arg(long)]
        problems: Option<PathBuf>,

        /// Where the remaining lines are written
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// List the supported kind codes
    Kinds,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = cli.data_dir.unwrap_or_else(paths::default_data_dir);
    let in_data_dir = |arg: Option<PathBuf>, name: &str| arg.unwrap_or_else(|| data_dir.join(name));

    match cli.command {
        Commands::Extract {
            kind,
            company,
            input,
            format,
            keep_zero,
            output,
        } => {
            extract_file(&kind, &company, &input, format, options(keep_zero), output.as_deref())?;
        }
        Commands::Run {
            list,
            not_exist,
            problems,
            db,
            delay,
            keep_zero,
            no_progress,
        } => {
            let list = in_data_dir(list, lists::DOWNLOAD_LIST);
            let not_exist = in_data_dir(not_exist, NOT_EXIST_LIST);
            let problems = in_data_dir(problems, PROBLEM_LIST);
            let db = db.unwrap_or_else(|| paths::default_db_path(&data_dir));
            let config = BatchConfig {
                delay: Duration::from_secs(delay),
                show_progress: !no_progress,
                options: options(keep_zero),
                ..BatchConfig::default()
            };
            run_list(&list, &not_exist, &problems, &db, &config).await?;
        }
        Commands::Check {
            not_exist,
            problems,
            out,
        } => {
            let not_exist = in_data_dir(not_exist, NOT_EXIST_LIST);
            let problems = in_data_dir(problems, PROBLEM_LIST);
            let out = in_data_dir(out, NEW_PROBLEM_LIST);
            let remaining = check_problem_list(&not_exist, &problems, &out)?;
            println!("{remaining} problem line(s) written to {}", out.display());
        }
        Commands::Kinds => list_kinds(),
    }

    Ok(())
}

fn options(keep_zero: bool) -> ExtractOptions {
    let options = ExtractOptions::default();
    if keep_zero { options.keep_all() } else { options }
}

fn extract_file(
    kind: &str,
    company: &str,
    input: &Path,
    format: ExportFormat,
    options: ExtractOptions,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let unit = WorkUnit::from_entry(&ListEntry::new(company, kind))?;
    let bytes = std::fs::read(input)?;
    let raw = String::from_utf8(bytes).unwrap_or_else(|e| decode(e.as_bytes(), GBK));

    let results = extract_kinds(&unit.kinds, company, &raw, &options)?;
    for result in &results {
        info!(tag = %result.tag, records = result.len(), "extracted");
    }

    match output {
        Some(path) => results.export_to_file(path, format)?,
        None => print!("{}", results.export_to_string(format)?),
    }
    Ok(())
}

async fn run_list(
    list: &Path,
    not_exist: &Path,
    problems: &Path,
    db: &Path,
    config: &BatchConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let entries = read_download_list(list)?;
    let not_exist: BTreeSet<String> = if not_exist.exists() {
        read_not_exist_list(not_exist)?
    } else {
        BTreeSet::new()
    };
    info!(
        entries = entries.len(),
        known_missing = not_exist.len(),
        db = %db.display(),
        "starting batch"
    );

    let store = paths::open_store(db)?;
    let client = F10Client::new()?;
    let report = run_batch(&entries, &not_exist, &client, &store, config).await;

    write_problem_list(problems, &report.problems())?;
    print!("{report}");
    println!("problem list: {}", problems.display());
    Ok(())
}

fn list_kinds() {
    println!("{:<6}{:<6}{:<22}source", "code", "tag", "kind");
    for kind in StatementKind::ALL {
        let source = match kind.source() {
            f10_extract::Source::Statement(report) => format!("{}_<code>.html", report.slug()),
            f10_extract::Source::ProfilePage => "gszl_<code>.html".to_string(),
        };
        println!("{:<6}{:<6}{:<22}{source}", kind.code(), kind.tag().as_str(), kind.to_string());
    }
}
