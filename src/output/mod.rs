//! Output module for persisting harvested entries
//!
//! This module handles:
//! - Formatting entries as bullet text
//! - Naming and writing the result file
//! - Summarising a finished run

pub mod stats;
mod writer;

pub use stats::RunSummary;
pub use writer::{
    format_entries, output_file_name, prepare_output_dir, write_entries, OutputError,
    OutputResult, BOM,
};
