//! Newline-delimited JSON encoding of record chunks.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    level::{EntryType, Level},
    log_record::LogRecord,
};

/// The JSON object placed on the wire for one record.
#[derive(Serialize)]
pub struct Envelope<'a> {
    id: &'a str,
    message: &'a str,
    source: &'a str,
    entry_type: EntryType,
    level: Level,
    timestamp: DateTime<Utc>,
    labels: &'a BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    auth: Option<&'a str>,
}

impl<'a> Envelope<'a> {
    /// Project `record`, attaching `auth` when present.
    pub fn new(record: &'a LogRecord, auth: Option<&'a str>) -> Self {
        Self {
            id: record.id(),
            message: record.message(),
            source: record.source(),
            entry_type: record.entry_type(),
            level: record.level(),
            timestamp: record.timestamp(),
            labels: record.labels(),
            auth,
        }
    }
}

/// Encode a chunk as one JSON line per record.
///
/// Every line ends with `\n`, so the returned buffer can be written to the
/// socket in a single operation.
pub fn encode_chunk(records: &[LogRecord], auth: Option<&str>) -> serde_json::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(records.len() * 192);
    for record in records {
        serde_json::to_writer(&mut buf, &Envelope::new(record, auth))?;
        buf.push(b'\n');
    }
    Ok(buf)
}
