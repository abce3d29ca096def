#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/f10/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod batch;
pub mod error;
pub mod worklist;

// Re-export main types from sub-crates
pub use f10_data as data;
pub use f10_extract as extraction;
pub use f10_output as output;

pub use batch::{BatchConfig, BatchReport, UnitOutcome, run_batch};
pub use error::{BatchError, Result};
pub use worklist::WorkUnit;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
