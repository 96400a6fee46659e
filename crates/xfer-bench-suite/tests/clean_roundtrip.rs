//! End-to-end normalization tests over real files
//!
//! Exercises the full read -> repair -> write path on tables shaped like
//! the live collector export, including the ran-once behavior when a
//! cleaned table is cleaned again.

use std::io::Write;
use std::path::PathBuf;

use xfer_bench_suite::clean::clean;

const RAW_HEADER: &str = "id;protocol;enviroment;time_slot;test_begin;test_end;client_id;parallel_clients;transfer_start_unix;transfer_end_unix;latency_ms;throughput_mbps;bytes_sent_total;bytes_payload;bandwidth_efficiency;cpu_client_percent_before;cpu_client_percent_after;cpu_client_percent_while;cpu_server_percent_before;cpu_server_percent_after;cpu_server_percent_while;ram_client_bytes_before;ram_client_bytes_after;ram_client_bytes_while;ram_server_bytes_before;ram_server_bytes_after;ram_server_bytes_while;lost_packets;retransmissions;connection_duration;stream_duration;error";

/// A raw export row with the metric columns the tests care about.
struct RawRow {
    id: u32,
    protocol: &'static str,
    test_begin: &'static str,
    test_end: &'static str,
    transfer_start: i64,
    transfer_end: i64,
    bytes_payload: i64,
    error: &'static str,
}

impl RawRow {
    fn to_line(&self) -> String {
        format!(
            "{};{};remote;morning;{};{};1;1;{};{};0;0.0;0;{};0.0;1.0;2.0;3.0;1.0;2.0;3.0;100;200;300;400;500;600;2;0;0;0;{}",
            self.id,
            self.protocol,
            self.test_begin,
            self.test_end,
            self.transfer_start,
            self.transfer_end,
            self.bytes_payload,
            self.error,
        )
    }
}

fn write_raw_table(dir: &std::path::Path, rows: &[RawRow]) -> PathBuf {
    let path = dir.join("results.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "{RAW_HEADER}").unwrap();
    for row in rows {
        writeln!(file, "{}", row.to_line()).unwrap();
    }
    path
}

fn column<'a>(header: &'a str, row: &'a str, name: &str) -> &'a str {
    let index = header.split(';').position(|h| h == name).unwrap();
    row.split(';').nth(index).unwrap()
}

#[test]
fn sentinel_row_is_voided_and_normal_row_is_repaired() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_raw_table(
        dir.path(),
        &[
            // row A: test end never collected
            RawRow {
                id: 1,
                protocol: "websockets",
                test_begin: "0001-01-01T00:00:00Z",
                test_end: "0001-01-01T00:00:00Z",
                transfer_start: 1234,
                transfer_end: 5678,
                bytes_payload: 999,
                error: "",
            },
            // row B: healthy http3 transfer
            RawRow {
                id: 2,
                protocol: "http3",
                test_begin: "2025-03-01T12:00:00Z",
                test_end: "2025-03-01T12:00:30Z",
                transfer_start: 1000,
                transfer_end: 1010,
                bytes_payload: 100_000,
                error: "",
            },
        ],
    );
    let output = dir.path().join("results_clean.csv");

    let report = clean(&input, &output).unwrap();
    assert_eq!(report.rows_read, 2);
    assert_eq!(report.rows_written, 2);
    assert!(report.diagnostics.is_empty());

    let content = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    let header = lines[0];

    // row A: everything numeric zeroed, sentinel error, order preserved
    let row_a = lines[1];
    assert_eq!(column(header, row_a, "id"), "1");
    assert_eq!(column(header, row_a, "transfer_start_unix"), "0");
    assert_eq!(column(header, row_a, "transfer_end_unix"), "0");
    assert_eq!(column(header, row_a, "bytes_payload"), "0");
    assert_eq!(column(header, row_a, "bytes_sent_total"), "0");
    assert_eq!(column(header, row_a, "lost_packets"), "0");
    assert_eq!(column(header, row_a, "ram_server_bytes_while"), "0");
    assert_eq!(column(header, row_a, "error"), "ENDTIME NOT SET/COLLECTED");

    // row B: repaired and derived fields computed
    let row_b = lines[2];
    assert_eq!(column(header, row_b, "id"), "2");
    assert_eq!(column(header, row_b, "bytes_payload"), "100000");
    assert_eq!(column(header, row_b, "bytes_sent_total"), "100420");
    assert_eq!(column(header, row_b, "throughput_mbps"), "0.08");
    assert_eq!(column(header, row_b, "transfer_duration"), "10");
    assert_eq!(column(header, row_b, "connection_duration"), "30");
    assert_eq!(column(header, row_b, "error"), "");
    assert_eq!(column(header, row_b, "normalized"), "true");
}

#[test]
fn recleaning_a_cleaned_table_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_raw_table(
        dir.path(),
        &[
            // webrtc: both the millisecond fix and the estimation are
            // non-idempotent, so this row would corrupt on a second pass
            // without the marker
            RawRow {
                id: 1,
                protocol: "webrtc",
                test_begin: "2025-03-01T12:00:00Z",
                test_end: "2025-03-01T12:01:00Z",
                transfer_start: 64_000,
                transfer_end: 90,
                bytes_payload: 70_000,
                error: "",
            },
        ],
    );
    let first = dir.path().join("clean_once.csv");
    let second = dir.path().join("clean_twice.csv");

    clean(&input, &first).unwrap();
    clean(&first, &second).unwrap();

    let once = std::fs::read_to_string(&first).unwrap();
    let twice = std::fs::read_to_string(&second).unwrap();

    // single application of the unit fix and the wire estimation
    let header = once.lines().next().unwrap();
    let row = once.lines().nth(1).unwrap();
    assert_eq!(column(header, row, "transfer_start_unix"), "64");
    assert_eq!(column(header, row, "bytes_sent_total"), "70480");

    // and the second pass is byte-identical
    assert_eq!(once, twice);
}

#[test]
fn backfilled_timestamps_note_the_repair() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_raw_table(
        dir.path(),
        &[RawRow {
            id: 1,
            protocol: "websockets",
            test_begin: "2025-03-01T12:00:00Z",
            test_end: "2025-03-01T12:00:30Z",
            transfer_start: 0,
            transfer_end: 0,
            bytes_payload: 70_000,
            error: "",
        }],
    );
    let output = dir.path().join("results_clean.csv");
    clean(&input, &output).unwrap();

    let content = std::fs::read_to_string(&output).unwrap();
    let header = content.lines().next().unwrap();
    let row = content.lines().nth(1).unwrap();

    // 2025-03-01T12:00:00Z / 12:00:30Z as unix seconds
    assert_eq!(column(header, row, "transfer_start_unix"), "1740830400");
    assert_eq!(column(header, row, "transfer_end_unix"), "1740830430");
    assert_eq!(
        column(header, row, "error"),
        "TRANSFERSTART NOT SET/COLLECTED / TRANSFEREND NOT SET/COLLECTED"
    );
    assert_eq!(column(header, row, "bytes_sent_total"), "70016");
}

#[test]
fn malformed_rows_are_skipped_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "{RAW_HEADER}").unwrap();
    writeln!(
        file,
        "{}",
        RawRow {
            id: 1,
            protocol: "http3",
            test_begin: "2025-03-01T12:00:00Z",
            test_end: "2025-03-01T12:00:30Z",
            transfer_start: 1000,
            transfer_end: 1010,
            bytes_payload: 100_000,
            error: "",
        }
        .to_line()
    )
    .unwrap();
    writeln!(file, "garbage row that parses as nothing").unwrap();
    drop(file);

    let output = dir.path().join("results_clean.csv");
    let report = clean(&path, &output).unwrap();

    assert_eq!(report.rows_read, 2);
    assert_eq!(report.rows_written, 1);
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].line, 3);
}
