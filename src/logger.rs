//! Convenience front end over [`CollectorClient`].
//!
//! A [`Logger`] stamps every record with its source and default labels and
//! offers one method per syslog level. It is an ordinary value: build as many
//! as needed and pass them where they are used.

use std::collections::BTreeMap;

use delegate::delegate;

use crate::{
    client::CollectorClient,
    error::ClientError,
    level::{EntryType, Level},
    log_record::{LogRecord, LogRecordBuilder},
};

macro_rules! level_methods {
    ($($(#[$meta:meta])* $name:ident => $level:expr;)+) => {
        $(
            $(#[$meta])*
            pub fn $name(&mut self, message: impl Into<String>) -> Result<(), ClientError> {
                self.log($level, message)
            }
        )+
    };
}

/// Records sent through a logger share its source and labels.
#[derive(Debug)]
pub struct Logger {
    client: CollectorClient,
    source: String,
    labels: BTreeMap<String, String>,
}

impl Logger {
    pub fn new(client: CollectorClient, source: impl Into<String>) -> Self {
        Self {
            client,
            source: source.into(),
            labels: BTreeMap::new(),
        }
    }

    /// Attach a label to every record this logger sends.
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Send a log entry at `level`.
    pub fn log(&mut self, level: Level, message: impl Into<String>) -> Result<(), ClientError> {
        self.emit(EntryType::Log, level, message.into())
    }

    level_methods! {
        emergency => Level::Emergency;
        alert => Level::Alert;
        critical => Level::Critical;
        error => Level::Error;
        warning => Level::Warning;
        notice => Level::Notice;
        info => Level::Info;
        debug => Level::Debug;
    }

    /// Send a metric sample as `name=value`, labelled with the metric name.
    pub fn metric(&mut self, name: &str, value: f64) -> Result<(), ClientError> {
        let record = self
            .record(EntryType::Metric, Level::Info, format!("{name}={value}"))
            .label("metric", name)
            .build();
        self.client.send(record)
    }

    /// Send a trace entry at debug level.
    pub fn trace(&mut self, message: impl Into<String>) -> Result<(), ClientError> {
        self.emit(EntryType::Trace, Level::Debug, message.into())
    }

    /// Send an event entry at notice level.
    pub fn event(&mut self, message: impl Into<String>) -> Result<(), ClientError> {
        self.emit(EntryType::Event, Level::Notice, message.into())
    }

    /// Send an audit entry at notice level.
    pub fn audit(&mut self, message: impl Into<String>) -> Result<(), ClientError> {
        self.emit(EntryType::Audit, Level::Notice, message.into())
    }

    delegate! {
        to self.client {
            /// Connect eagerly.
            pub fn connect(&mut self) -> Result<(), ClientError>;
            pub fn is_connected(&mut self) -> bool;
            /// Close the connection. Idempotent.
            pub fn close(&mut self);
        }
    }

    /// Release the underlying client.
    pub fn into_client(self) -> CollectorClient {
        self.client
    }

    fn emit(
        &mut self,
        entry_type: EntryType,
        level: Level,
        message: String,
    ) -> Result<(), ClientError> {
        let record = self.record(entry_type, level, message).build();
        self.client.send(record)
    }

    fn record(&self, entry_type: EntryType, level: Level, message: String) -> LogRecordBuilder {
        LogRecord::builder()
            .message(message)
            .source(self.source.as_str())
            .entry_type(entry_type)
            .level(level)
            .labels(self.labels.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }
}
