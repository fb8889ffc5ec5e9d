//! Input normalisation.
//!
//! Callers hand the client a [`Payload`]: a structured [`LogRecord`], raw
//! text, or an arbitrary JSON object. Normalisation turns each case into the
//! canonical record that is projected onto the wire.

use serde_json::{Map, Value};

use crate::{error::ClientError, log_record::LogRecord};

/// Anything the client can send.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    /// A fully structured record, sent as-is.
    Record(LogRecord),
    /// Plain text, sent as an info-level log entry.
    Text(String),
    /// An object encoded as JSON text and sent as the message body.
    Fields(Map<String, Value>),
}

impl Payload {
    /// Produce the canonical record for this payload.
    ///
    /// Text and objects receive the library defaults: source
    /// [`DEFAULT_SOURCE`](crate::DEFAULT_SOURCE), info level, log entry type,
    /// and no labels. Object fields are never merged into the envelope.
    pub fn into_record(self) -> Result<LogRecord, ClientError> {
        match self {
            Payload::Record(record) => Ok(record),
            Payload::Text(text) => Ok(LogRecord::new(text)),
            Payload::Fields(fields) => Ok(LogRecord::new(serde_json::to_string(&fields)?)),
        }
    }
}

impl From<LogRecord> for Payload {
    fn from(record: LogRecord) -> Self {
        Payload::Record(record)
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_owned())
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(fields: Map<String, Value>) -> Self {
        Payload::Fields(fields)
    }
}

/// Interpret an untyped JSON value.
///
/// `null` is rejected as missing input; strings and objects map onto
/// [`Payload::Text`] and [`Payload::Fields`]; every other shape is
/// unsupported.
impl TryFrom<Value> for Payload {
    type Error = ClientError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Err(ClientError::InvalidInput("cannot send nil".into())),
            Value::String(text) => Ok(Payload::Text(text)),
            Value::Object(fields) => Ok(Payload::Fields(fields)),
            other => Err(ClientError::UnsupportedInputType(format!(
                "unsupported log type: {}",
                value_kind(&other)
            ))),
        }
    }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
