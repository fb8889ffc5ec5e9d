//! Errors surfaced by the collector client.
//!
//! Argument and configuration problems are reported immediately. Transport
//! faults are retried first and only reach the caller as
//! [`ClientError::Connection`] once the retry budget is spent, classified by
//! [`FaultKind`].

use std::{fmt, io};

use thiserror::Error;

/// Errors returned by the client and its builder.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Construction parameters were missing, conflicting, or out of range.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// The caller supplied an absent value.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The caller supplied a value that is not a record, text, or object.
    #[error("unsupported input type: {0}")]
    UnsupportedInputType(String),
    /// The batch argument was empty or not a sequence.
    #[error("invalid batch: {0}")]
    InvalidBatch(String),
    /// A record could not be encoded as JSON.
    #[error("failed to encode record: {0}")]
    Serialisation(#[from] serde_json::Error),
    /// The transport kept failing after every permitted attempt.
    #[error("{kind}: {source} ({target})")]
    Connection {
        /// Classification of the last fault.
        kind: FaultKind,
        /// Socket path or `host:port` of the collector.
        target: String,
        /// The last underlying fault.
        #[source]
        source: io::Error,
    },
}

impl ClientError {
    /// Classify `source` and wrap it as a connection error for `target`.
    pub fn connection(target: impl Into<String>, source: io::Error) -> Self {
        Self::Connection {
            kind: FaultKind::classify(&source),
            target: target.into(),
            source,
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Return the fault class when this is a connection error.
    pub fn fault_kind(&self) -> Option<FaultKind> {
        match self {
            Self::Connection { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Coarse classification of transport faults.
///
/// Every class is treated as transient; the classification only shapes the
/// message reported once retries run out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// The collector actively refused the connection.
    Refused,
    /// The address could not be resolved or bound.
    Socket,
    /// A connect or write deadline elapsed.
    Timeout,
    /// The stream broke while in use.
    Io,
    /// Any other operating-system failure.
    System,
}

impl FaultKind {
    /// Map a low-level I/O error onto a fault class.
    pub fn classify(err: &io::Error) -> Self {
        use io::ErrorKind::*;
        match err.kind() {
            ConnectionRefused => Self::Refused,
            AddrNotAvailable | AddrInUse | HostUnreachable | NetworkUnreachable | InvalidInput => {
                Self::Socket
            }
            TimedOut | WouldBlock => Self::Timeout,
            BrokenPipe | ConnectionReset | ConnectionAborted | NotConnected | UnexpectedEof
            | WriteZero | Interrupted | InvalidData => Self::Io,
            _ => Self::System,
        }
    }

    /// Prefix used when reporting the fault.
    pub fn description(self) -> &'static str {
        match self {
            Self::Refused => "Connection refused",
            Self::Socket => "Socket error",
            Self::Timeout => "Connection timeout",
            Self::Io => "IO error",
            Self::System => "System error",
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(io::ErrorKind::ConnectionRefused, FaultKind::Refused)]
    #[case(io::ErrorKind::AddrNotAvailable, FaultKind::Socket)]
    #[case(io::ErrorKind::HostUnreachable, FaultKind::Socket)]
    #[case(io::ErrorKind::TimedOut, FaultKind::Timeout)]
    #[case(io::ErrorKind::WouldBlock, FaultKind::Timeout)]
    #[case(io::ErrorKind::BrokenPipe, FaultKind::Io)]
    #[case(io::ErrorKind::ConnectionReset, FaultKind::Io)]
    #[case(io::ErrorKind::UnexpectedEof, FaultKind::Io)]
    #[case(io::ErrorKind::NotFound, FaultKind::System)]
    #[case(io::ErrorKind::PermissionDenied, FaultKind::System)]
    fn classifies_io_error_kinds(#[case] kind: io::ErrorKind, #[case] expected: FaultKind) {
        assert_eq!(FaultKind::classify(&io::Error::from(kind)), expected);
    }

    #[test]
    fn uncategorised_errors_are_system_faults() {
        let other = io::Error::other("mystery");
        assert_eq!(FaultKind::classify(&other), FaultKind::System);
    }

    #[test]
    fn connection_message_names_cause_and_target() {
        let err = ClientError::connection(
            "127.0.0.1:9000",
            io::Error::new(io::ErrorKind::ConnectionRefused, "refused by peer"),
        );
        assert_eq!(err.fault_kind(), Some(FaultKind::Refused));
        assert_eq!(
            err.to_string(),
            "Connection refused: refused by peer (127.0.0.1:9000)"
        );
    }

    #[test]
    fn non_connection_errors_have_no_fault_kind() {
        assert_eq!(ClientError::InvalidBatch("empty batch".into()).fault_kind(), None);
    }
}
