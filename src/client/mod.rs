//! Collector client.
//!
//! [`CollectorClient`] normalises caller input into records, splits batches
//! into chunks, encodes each chunk as newline-delimited JSON, and writes it
//! through a [`Transport`] wrapped in a [`RetryPolicy`]. Every call blocks the
//! calling thread; there is no background worker or queue.

mod batch;
mod builder;
mod config;
mod payload;
mod retry;
mod serialise;
mod transport;

#[cfg(test)]
mod tests;

use std::{fmt, slice};

use serde_json::Value;

use crate::{error::ClientError, log_record::LogRecord};

pub use batch::chunks;
pub use builder::ClientBuilder;
pub use config::{
    ClientConfig, DEFAULT_BUFFER_SIZE, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY, DEFAULT_TIMEOUT,
    Endpoint,
};
pub use payload::Payload;
pub use retry::RetryPolicy;
pub use serialise::{Envelope, encode_chunk};
#[cfg(unix)]
pub use transport::UnixTransport;
pub use transport::{SocketOptions, TcpTransport, Transport, transport_for};

/// Blocking client delivering records to a collector.
///
/// The client owns its connection exclusively. It connects lazily on the
/// first send (or on [`connect`](Self::connect)), reuses the connection
/// across calls, and closes it on [`close`](Self::close), on drop, and after
/// a send exhausts its retries.
pub struct CollectorClient {
    config: ClientConfig,
    transport: Box<dyn Transport>,
    retry: RetryPolicy,
}

impl CollectorClient {
    /// Start configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Construct a disconnected client for a validated configuration.
    pub fn new(config: ClientConfig) -> Self {
        let transport = transport_for(&config);
        Self::from_parts(config, transport)
    }

    /// Construct a client that writes through a caller-supplied transport.
    ///
    /// The configuration still governs retries, chunking, and
    /// authentication; only the socket handling is replaced.
    pub fn with_transport(config: ClientConfig, transport: impl Transport + 'static) -> Self {
        Self::from_parts(config, Box::new(transport))
    }

    fn from_parts(config: ClientConfig, transport: Box<dyn Transport>) -> Self {
        Self {
            retry: RetryPolicy::from(&config),
            transport,
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Connect eagerly, retrying per the configured policy.
    pub fn connect(&mut self) -> Result<(), ClientError> {
        let target = self.transport.target().to_owned();
        let transport = &mut self.transport;
        let result = self.retry.run(&target, |_| transport.connect());
        if result.is_err() {
            self.transport.close();
        }
        result
    }

    /// Whether the underlying socket is open and the peer still attached.
    pub fn is_connected(&mut self) -> bool {
        self.transport.is_connected()
    }

    /// Send a single record, text message, or object.
    pub fn send(&mut self, payload: impl Into<Payload>) -> Result<(), ClientError> {
        let record = payload.into().into_record()?;
        self.deliver(slice::from_ref(&record))
    }

    /// Send an untyped JSON value.
    ///
    /// Strings are sent as text and objects as encoded messages. `null` fails
    /// with [`ClientError::InvalidInput`]; numbers, booleans, and arrays fail
    /// with [`ClientError::UnsupportedInputType`].
    pub fn send_value(&mut self, value: Value) -> Result<(), ClientError> {
        self.send(Payload::try_from(value)?)
    }

    /// Send a batch, chunked by the configured batch size.
    ///
    /// Every element is normalised before anything is written, so invalid
    /// input never results in a partial send. Chunks are written in order,
    /// each as one transport write. If a chunk fails after its retries, the
    /// error is returned and later chunks are not attempted; chunks written
    /// before it are not reported.
    pub fn send_batch<I>(&mut self, batch: I) -> Result<(), ClientError>
    where
        I: IntoIterator,
        I::Item: Into<Payload>,
    {
        let records = batch
            .into_iter()
            .map(|item| item.into().into_record())
            .collect::<Result<Vec<_>, _>>()?;
        for chunk in chunks(&records, self.config.batch_size())? {
            self.deliver(chunk)?;
        }
        Ok(())
    }

    /// Send an untyped JSON array as a batch.
    ///
    /// Anything other than an array fails with [`ClientError::InvalidBatch`].
    pub fn send_batch_value(&mut self, value: Value) -> Result<(), ClientError> {
        self.send_batch(batch::payloads_from_value(value)?)
    }

    /// Close the connection. Idempotent.
    pub fn close(&mut self) {
        self.transport.close();
    }

    fn deliver(&mut self, records: &[LogRecord]) -> Result<(), ClientError> {
        let frame = encode_chunk(records, self.config.auth_token())?;
        let target = self.transport.target().to_owned();
        let transport = &mut self.transport;
        let result = self.retry.run(&target, |_| {
            transport.connect()?;
            transport.write(&frame)
        });
        if result.is_err() {
            self.transport.close();
        }
        result
    }
}

impl Drop for CollectorClient {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for CollectorClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectorClient")
            .field("target", &self.transport.target())
            .field("config", &self.config)
            .finish()
    }
}
