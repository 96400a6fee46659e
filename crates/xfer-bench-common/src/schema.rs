//! Declared field descriptors for the result table
//!
//! The table layout is a single explicit list of descriptors, iterated
//! in declaration order when writing. Each descriptor knows how to parse
//! its column into a [`ResultRecord`] and how to format it back out.
//! Reading is keyed by column name (plus an optional legacy alias), so
//! input column order is irrelevant; derived fields carry no parse
//! function and are always recomputed on write.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::record::ResultRecord;

/// A single column of the result table.
pub struct FieldDescriptor {
    /// Column name, used for the output header and input lookup
    pub name: &'static str,
    /// Legacy input spelling accepted in addition to `name`
    pub alias: Option<&'static str>,
    /// Literal assumed when the input column is missing entirely
    pub default: Option<&'static str>,
    /// Parse the raw value into the record. `None` marks a derived field.
    pub parse: Option<fn(&mut ResultRecord, &str) -> Result<(), ValueError>>,
    /// Format the (possibly derived) value for output
    pub format: fn(&ResultRecord) -> String,
}

impl FieldDescriptor {
    pub fn is_stored(&self) -> bool {
        self.parse.is_some()
    }
}

/// A value that does not conform to its column's declared type.
#[derive(Debug, Clone, Error)]
#[error("'{value}' is not a valid {expected}")]
pub struct ValueError {
    pub value: String,
    pub expected: &'static str,
}

fn value_error(value: &str, expected: &'static str) -> ValueError {
    ValueError {
        value: value.to_string(),
        expected,
    }
}

fn parse_i64(value: &str) -> Result<i64, ValueError> {
    value.trim().parse().map_err(|_| value_error(value, "integer"))
}

fn parse_f64(value: &str) -> Result<f64, ValueError> {
    value.trim().parse().map_err(|_| value_error(value, "number"))
}

fn parse_datetime(value: &str) -> Result<DateTime<Utc>, ValueError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| value_error(value, "RFC 3339 datetime"))
}

fn parse_bool(value: &str) -> Result<bool, ValueError> {
    match value.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" | "" => Ok(false),
        _ => Err(value_error(value, "boolean")),
    }
}

/// The declared result-table layout.
pub struct ResultSchema;

macro_rules! stored {
    ($name:literal, $field:ident, $parser:ident) => {
        FieldDescriptor {
            name: $name,
            alias: None,
            default: None,
            parse: Some(|r, v| {
                r.$field = $parser(v)?;
                Ok(())
            }),
            format: |r| r.$field.to_string(),
        }
    };
}

macro_rules! derived {
    ($name:literal, $method:ident) => {
        FieldDescriptor {
            name: $name,
            alias: None,
            default: None,
            parse: None,
            format: |r| r.$method().to_string(),
        }
    };
}

static FIELDS: &[FieldDescriptor] = &[
    stored!("id", id, parse_i64),
    FieldDescriptor {
        name: "protocol",
        alias: None,
        default: None,
        parse: Some(|r, v| {
            r.protocol = v.to_string();
            Ok(())
        }),
        format: |r| r.protocol.clone(),
    },
    FieldDescriptor {
        name: "environment",
        // the live collector export misspells this column
        alias: Some("enviroment"),
        default: None,
        parse: Some(|r, v| {
            r.environment = v.to_string();
            Ok(())
        }),
        format: |r| r.environment.clone(),
    },
    FieldDescriptor {
        name: "time_slot",
        alias: None,
        default: None,
        parse: Some(|r, v| {
            r.time_slot = v.to_string();
            Ok(())
        }),
        format: |r| r.time_slot.clone(),
    },
    FieldDescriptor {
        name: "test_begin",
        alias: None,
        default: None,
        parse: Some(|r, v| {
            r.test_begin = parse_datetime(v)?;
            Ok(())
        }),
        format: |r| ResultRecord::format_datetime(&r.test_begin),
    },
    FieldDescriptor {
        name: "test_end",
        alias: None,
        default: None,
        parse: Some(|r, v| {
            r.test_end = parse_datetime(v)?;
            Ok(())
        }),
        format: |r| ResultRecord::format_datetime(&r.test_end),
    },
    stored!("client_id", client_id, parse_i64),
    stored!("parallel_clients", parallel_clients, parse_i64),
    stored!("transfer_start_unix", transfer_start, parse_i64),
    stored!("transfer_end_unix", transfer_end, parse_i64),
    stored!("bytes_payload", bytes_payload, parse_i64),
    stored!("cpu_client_percent_before", cpu_client_before, parse_f64),
    stored!("cpu_client_percent_after", cpu_client_after, parse_f64),
    stored!("cpu_client_percent_while", cpu_client_while, parse_f64),
    stored!("cpu_server_percent_before", cpu_server_before, parse_f64),
    stored!("cpu_server_percent_after", cpu_server_after, parse_f64),
    stored!("cpu_server_percent_while", cpu_server_while, parse_f64),
    stored!("ram_client_bytes_before", ram_client_before, parse_i64),
    stored!("ram_client_bytes_after", ram_client_after, parse_i64),
    stored!("ram_client_bytes_while", ram_client_while, parse_i64),
    stored!("ram_server_bytes_before", ram_server_before, parse_i64),
    stored!("ram_server_bytes_after", ram_server_after, parse_i64),
    stored!("ram_server_bytes_while", ram_server_while, parse_i64),
    stored!("lost_packets", lost_packets, parse_i64),
    FieldDescriptor {
        name: "error",
        alias: None,
        default: None,
        parse: Some(|r, v| {
            r.error = v.to_string();
            Ok(())
        }),
        format: |r| r.error.clone(),
    },
    stored!("bytes_sent_total", bytes_sent_total, parse_i64),
    derived!("throughput_mbps", throughput_mbps),
    derived!("bandwidth_efficiency", bandwidth_efficiency),
    derived!("connection_duration", connection_duration),
    derived!("transfer_duration", transfer_duration),
    FieldDescriptor {
        name: "normalized",
        alias: None,
        // absent in raw collector exports
        default: Some("false"),
        parse: Some(|r, v| {
            r.normalized = parse_bool(v)?;
            Ok(())
        }),
        format: |r| r.normalized.to_string(),
    },
];

impl ResultSchema {
    /// All declared fields, in output order.
    pub fn fields() -> &'static [FieldDescriptor] {
        FIELDS
    }

    /// Stored fields only (those parsed from input).
    pub fn stored_fields() -> impl Iterator<Item = &'static FieldDescriptor> {
        FIELDS.iter().filter(|f| f.is_stored())
    }

    /// The output header row, in declaration order.
    pub fn header() -> Vec<&'static str> {
        FIELDS.iter().map(|f| f.name).collect()
    }
}
