//! Log record representation shipped to the collector.
//!
//! A [`LogRecord`] is an immutable value: construct it with
//! [`LogRecord::new`] or [`LogRecord::builder`] and read it through the
//! accessors. Its serde projection is the body of the wire envelope.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::level::{EntryType, Level};

/// Source tag applied when the caller does not name one.
pub const DEFAULT_SOURCE: &str = "logship";

/// A single structured record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    id: String,
    message: String,
    source: String,
    entry_type: EntryType,
    level: Level,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    labels: BTreeMap<String, String>,
}

impl LogRecord {
    /// Construct an info-level log entry carrying `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            message: message.into(),
            source: DEFAULT_SOURCE.to_owned(),
            entry_type: EntryType::default(),
            level: Level::default(),
            timestamp: Utc::now(),
            labels: BTreeMap::new(),
        }
    }

    /// Start building a record with an empty message.
    pub fn builder() -> LogRecordBuilder {
        LogRecordBuilder::default()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    /// Convert back into a builder seeded with this record's fields.
    pub fn into_builder(self) -> LogRecordBuilder {
        LogRecordBuilder { record: self }
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} - {}", self.source, self.level, self.message)
    }
}

/// Builder for [`LogRecord`].
///
/// Every setter consumes the builder and returns it, so a configured
/// builder is never observed half-way through a chain. A fresh id and the
/// creation timestamp are captured when the builder is created.
#[derive(Clone, Debug)]
pub struct LogRecordBuilder {
    record: LogRecord,
}

impl Default for LogRecordBuilder {
    fn default() -> Self {
        Self {
            record: LogRecord::new(String::new()),
        }
    }
}

macro_rules! record_setter {
    ($(#[$meta:meta])* $fn_name:ident, $field:ident, $ty:ty) => {
        $(#[$meta])*
        pub fn $fn_name(mut self, value: $ty) -> Self {
            self.record.$field = value;
            self
        }
    };
}

impl LogRecordBuilder {
    /// Set the message body.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.record.message = message.into();
        self
    }

    /// Set the originator tag.
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.record.source = source.into();
        self
    }

    /// Replace the generated identifier.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.record.id = id.into();
        self
    }

    record_setter!(level, level, Level);
    record_setter!(entry_type, entry_type, EntryType);
    record_setter!(
        #[doc = "Override the creation timestamp."]
        timestamp,
        timestamp,
        DateTime<Utc>
    );

    /// Attach one label, replacing any previous value for `key`.
    pub fn label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.record.labels.insert(key.into(), value.into());
        self
    }

    /// Attach several labels; later keys replace earlier ones.
    pub fn labels<K, V>(mut self, labels: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.record
            .labels
            .extend(labels.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn build(self) -> LogRecord {
        self.record
    }
}
