//! Result-table normalization
//!
//! Turns the collector's raw, partially-malformed CSV export into an
//! analysis-ready table: read header-keyed, repair each record through
//! the ordered fix pipeline, write back in declared schema order with
//! derived metrics computed at write time.
//!
//! Processing is strictly sequential and single-threaded; output row
//! order matches input row order.

mod fixes;
mod reader;
mod writer;

pub use fixes::apply_fixes;
pub use reader::{read_table, RowError};
pub use writer::write_table;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

/// A row that could not be parsed and was skipped
#[derive(Debug, Clone)]
pub struct RowDiagnostic {
    /// 1-based line number in the input file (header is line 1)
    pub line: u64,
    pub message: String,
}

/// What a normalization run did
#[derive(Debug)]
pub struct CleanReport {
    pub rows_read: usize,
    pub rows_written: usize,
    pub diagnostics: Vec<RowDiagnostic>,
}

/// Normalize `input` into `output`.
///
/// Malformed rows are skipped and reported in the returned
/// [`CleanReport`], they do not abort the run. Table-level problems
/// (unreadable file, missing required columns) do.
pub fn clean(input: &Path, output: &Path) -> Result<CleanReport> {
    info!(input = %input.display(), "Reading raw result table");
    let (mut records, diagnostics) = read_table(input)
        .with_context(|| format!("failed to read result table {}", input.display()))?;

    let rows_read = records.len() + diagnostics.len();
    for diagnostic in &diagnostics {
        warn!(line = diagnostic.line, message = %diagnostic.message, "Skipping malformed row");
    }

    for record in &mut records {
        apply_fixes(record);
    }

    write_table(output, &records)
        .with_context(|| format!("failed to write normalized table {}", output.display()))?;

    info!(
        output = %output.display(),
        rows_read,
        rows_written = records.len(),
        skipped = diagnostics.len(),
        "Normalized result table written"
    );

    Ok(CleanReport {
        rows_read,
        rows_written: records.len(),
        diagnostics,
    })
}
