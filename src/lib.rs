//! Blocking client for shipping log records to a collector.
//!
//! Records travel as newline-delimited JSON over a Unix domain socket or a
//! TCP connection. A [`CollectorClient`] is configured through
//! [`ClientBuilder`] (directly, from `key = value` options, or from an INI
//! file), connects lazily, retries failed deliveries with a fixed delay, and
//! reports failures as [`ClientError`] values carrying a [`FaultKind`].
//!
//! ```no_run
//! use logship::{ClientBuilder, Level, LogRecord};
//!
//! let mut client = ClientBuilder::new()
//!     .with_tcp("logs.internal", 5140)
//!     .with_shared_secret("changeme")
//!     .build()?;
//! client.send("service started")?;
//! client.send(
//!     LogRecord::builder()
//!         .message("disk almost full")
//!         .level(Level::Warning)
//!         .label("mount", "/var")
//!         .build(),
//! )?;
//! # Ok::<(), logship::ClientError>(())
//! ```

mod client;
mod error;
mod file_config;
mod level;
mod log_record;
mod logger;

#[cfg(any(test, feature = "test-util"))]
pub mod test_utils;

#[cfg(unix)]
pub use client::UnixTransport;
pub use client::{
    ClientBuilder, ClientConfig, CollectorClient, DEFAULT_BUFFER_SIZE, DEFAULT_MAX_RETRIES,
    DEFAULT_RETRY_DELAY, DEFAULT_TIMEOUT, Endpoint, Envelope, Payload, RetryPolicy, SocketOptions,
    TcpTransport, Transport, chunks, encode_chunk, transport_for,
};
pub use error::{ClientError, FaultKind};
pub use level::{EntryType, Level};
pub use log_record::{DEFAULT_SOURCE, LogRecord, LogRecordBuilder};
pub use logger::Logger;
