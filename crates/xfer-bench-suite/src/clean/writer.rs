//! Writing the normalized table
//!
//! Output columns follow the schema's declaration order regardless of
//! input order; derived metrics are computed here, at write time, from
//! the stored fields. The quoting rule is the table format's own, not
//! general CSV: a value containing the delimiter is wrapped in double
//! quotes, embedded quotes are not escaped.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use xfer_bench_common::defaults::TABLE_DELIMITER;
use xfer_bench_common::{ResultRecord, ResultSchema};

/// Quote a value when it would otherwise break the column layout.
fn escape(value: String) -> String {
    if value.contains(TABLE_DELIMITER) {
        format!("\"{value}\"")
    } else {
        value
    }
}

/// Format one record in schema declaration order.
pub(crate) fn format_row(record: &ResultRecord) -> String {
    ResultSchema::fields()
        .iter()
        .map(|field| escape((field.format)(record)))
        .collect::<Vec<_>>()
        .join(&TABLE_DELIMITER.to_string())
}

/// Write the normalized table: header row, then one row per record in
/// the order given.
pub fn write_table(path: &Path, records: &[ResultRecord]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    let mut out = BufWriter::new(file);

    writeln!(out, "{}", ResultSchema::header().join(&TABLE_DELIMITER.to_string()))?;
    for record in records {
        writeln!(out, "{}", format_row(record))?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn cleaned_record() -> ResultRecord {
        ResultRecord {
            id: 7,
            protocol: "http3".to_string(),
            environment: "remote".to_string(),
            time_slot: "morning".to_string(),
            test_begin: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
            test_end: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 30).unwrap(),
            client_id: 1,
            parallel_clients: 1,
            transfer_start: 1000,
            transfer_end: 1010,
            bytes_payload: 100_000,
            bytes_sent_total: 100_420,
            normalized: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_row_follows_schema_order() {
        let row = format_row(&cleaned_record());
        let values: Vec<&str> = row.split(';').collect();
        let header = ResultSchema::header();
        assert_eq!(values.len(), header.len());

        let at = |name: &str| values[header.iter().position(|h| *h == name).unwrap()];
        assert_eq!(at("id"), "7");
        assert_eq!(at("test_begin"), "2025-03-01T12:00:00Z");
        assert_eq!(at("bytes_sent_total"), "100420");
        assert_eq!(at("normalized"), "true");
    }

    #[test]
    fn test_derived_fields_are_computed_at_write_time() {
        let row = format_row(&cleaned_record());
        let values: Vec<&str> = row.split(';').collect();
        let header = ResultSchema::header();
        let at = |name: &str| values[header.iter().position(|h| *h == name).unwrap()];

        assert_eq!(at("throughput_mbps"), "0.08");
        assert_eq!(at("connection_duration"), "30");
        assert_eq!(at("transfer_duration"), "10");
        // 100000 / 100420
        assert!(at("bandwidth_efficiency").starts_with("0.99"));
    }

    #[test]
    fn test_value_containing_delimiter_is_quoted() {
        let mut record = cleaned_record();
        record.error = "first; second".to_string();
        let row = format_row(&record);
        assert!(row.contains("\"first; second\""));
    }

    #[test]
    fn test_write_table_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_table(&path, &[cleaned_record()]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            ResultSchema::header().join(";")
        );
        assert_eq!(lines.clone().count(), 1);
        assert!(lines.next().unwrap().starts_with("7;http3;remote;morning;"));
    }
}
