//! Header-keyed reading of the raw result table
//!
//! The header row defines the column positions, so input column order is
//! irrelevant. Every stored schema field must resolve to a column (by
//! name, by declared alias, or by carrying a default) before any row is
//! parsed; a value that fails its field's parse function skips only that
//! row.

use std::fs::File;
use std::path::Path;

use anyhow::{bail, Context, Result};
use thiserror::Error;

use super::RowDiagnostic;
use xfer_bench_common::defaults::TABLE_DELIMITER;
use xfer_bench_common::schema::ValueError;
use xfer_bench_common::{ResultRecord, ResultSchema};

/// A row whose values do not conform to the schema
#[derive(Debug, Error)]
pub enum RowError {
    #[error("row has {got} columns, header has {expected}")]
    ColumnCount { expected: usize, got: usize },

    #[error("field '{field}': {source}")]
    Value {
        field: &'static str,
        #[source]
        source: ValueError,
    },
}

/// How a stored field is materialized for each row.
enum Source {
    Column(usize),
    Default(&'static str),
}

/// Read the table, isolating per-row failures.
///
/// Returns the parsed records in file order plus one diagnostic per
/// skipped row. Fails outright when the file is unreadable or the
/// header lacks a required column.
pub fn read_table(path: &Path) -> Result<(Vec<ResultRecord>, Vec<RowDiagnostic>)> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(TABLE_DELIMITER as u8)
        .flexible(true)
        .from_reader(file);

    let headers = csv_reader
        .headers()
        .context("cannot read header row")?
        .clone();
    let column_count = headers.len();

    // Resolve every stored field to a column up front. A column missing
    // from the header would fail every row identically, so it is a
    // table-level error.
    let mut sources = Vec::new();
    let mut missing = Vec::new();
    for field in ResultSchema::stored_fields() {
        let position = headers
            .iter()
            .position(|h| h == field.name)
            .or_else(|| field.alias.and_then(|a| headers.iter().position(|h| h == a)));
        match (position, field.default) {
            (Some(index), _) => sources.push((field, Source::Column(index))),
            (None, Some(default)) => sources.push((field, Source::Default(default))),
            (None, None) => missing.push(field.name),
        }
    }
    if !missing.is_empty() {
        bail!("input table is missing required columns: {}", missing.join(", "));
    }

    let mut records = Vec::new();
    let mut diagnostics = Vec::new();

    for row in csv_reader.records() {
        let row = row.context("cannot read row")?;
        // csv position is 0-based byte-record index; report 1-based file lines
        let line = row.position().map(|p| p.line()).unwrap_or(0);

        match parse_row(&row, column_count, &sources) {
            Ok(record) => records.push(record),
            Err(e) => diagnostics.push(RowDiagnostic {
                line,
                message: e.to_string(),
            }),
        }
    }

    Ok((records, diagnostics))
}

fn parse_row(
    row: &csv::StringRecord,
    column_count: usize,
    sources: &[(&'static xfer_bench_common::FieldDescriptor, Source)],
) -> Result<ResultRecord, RowError> {
    if row.len() != column_count {
        return Err(RowError::ColumnCount {
            expected: column_count,
            got: row.len(),
        });
    }

    let mut record = ResultRecord::default();
    for (field, source) in sources {
        let value = match source {
            Source::Column(index) => row.get(*index).unwrap_or(""),
            Source::Default(default) => default,
        };
        // stored fields always carry a parse function
        if let Some(parse) = field.parse {
            parse(&mut record, value).map_err(|source| RowError::Value {
                field: field.name,
                source,
            })?;
        }
    }
    Ok(record)
}
