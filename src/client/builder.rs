//! Builder for [`CollectorClient`](super::CollectorClient).
//!
//! Collects the destination and tuning options, validates them in one pass,
//! and produces an immutable [`ClientConfig`]. Options can be set through the
//! typed setters or by name via [`ClientBuilder::with_option`], which is what
//! the INI loader uses.

use std::{
    num::NonZeroUsize,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::error::ClientError;

use super::{
    CollectorClient,
    config::{ClientConfig, Endpoint},
};

macro_rules! ensure_positive {
    ($value:expr, $field:expr) => {{
        NonZeroUsize::new($value).ok_or_else(|| {
            ClientError::config(format!("{} must be greater than zero", $field))
        })
    }};
}

macro_rules! option_setter {
    ($(#[$meta:meta])* $fn_name:ident, $field:ident, $ty:ty) => {
        $(#[$meta])*
        pub fn $fn_name(mut self, value: $ty) -> Self {
            self.$field = Some(value);
            self
        }
    };
}

/// Builder for constructing a validated [`ClientConfig`].
#[derive(Clone, Default)]
pub struct ClientBuilder {
    unix_path: Option<PathBuf>,
    host: Option<String>,
    port: Option<u32>,
    timeout: Option<Duration>,
    max_retries: Option<u32>,
    retry_delay: Option<Duration>,
    batch_size: Option<usize>,
    buffer_size: Option<usize>,
    shared_secret: Option<String>,
}

impl ClientBuilder {
    /// Create a builder with no destination configured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Send to the Unix domain socket at `path`.
    pub fn with_unix_socket(mut self, path: impl Into<PathBuf>) -> Self {
        self.unix_path = Some(path.into());
        self
    }

    /// Send to a TCP collector.
    pub fn with_tcp(self, host: impl Into<String>, port: u16) -> Self {
        self.with_host(host).with_port(u32::from(port))
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the TCP port. Values outside `1..=65535` are rejected by
    /// [`build`](Self::build).
    pub fn with_port(mut self, port: u32) -> Self {
        self.port = Some(port);
        self
    }

    /// Share a secret with the collector; only TCP envelopes carry it.
    pub fn with_shared_secret(mut self, secret: impl Into<String>) -> Self {
        self.shared_secret = Some(secret.into());
        self
    }

    option_setter!(
        #[doc = "Set the per-attempt connect and write deadline."]
        with_timeout,
        timeout,
        Duration
    );
    option_setter!(
        #[doc = "Set how many times a failed send is retried."]
        with_max_retries,
        max_retries,
        u32
    );
    option_setter!(
        #[doc = "Set the fixed pause between attempts."]
        with_retry_delay,
        retry_delay,
        Duration
    );
    option_setter!(
        #[doc = "Cap the number of records written per transport write."]
        with_batch_size,
        batch_size,
        usize
    );
    option_setter!(
        #[doc = "Set the socket send-buffer hint in bytes."]
        with_buffer_size,
        buffer_size,
        usize
    );

    /// Apply an option by name.
    ///
    /// Recognised keys are `unix_socket`, `host`, `port`, `timeout`,
    /// `max_retries`, `retry_delay`, `batch_size`, `buffer_size`, and
    /// `shared_secret`. Durations are given in (fractional) seconds.
    pub fn with_option(self, key: &str, value: &str) -> Result<Self, ClientError> {
        let value = value.trim();
        Ok(match key.trim() {
            "unix_socket" => self.with_unix_socket(value),
            "host" => self.with_host(value),
            "port" => self.with_port(
                value
                    .parse()
                    .map_err(|_| ClientError::config("invalid port"))?,
            ),
            "timeout" => self.with_timeout(parse_seconds("timeout", value)?),
            "max_retries" => self.with_max_retries(parse_count("max_retries", value)?),
            "retry_delay" => self.with_retry_delay(parse_seconds("retry_delay", value)?),
            "batch_size" => self.with_batch_size(parse_count("batch_size", value)?),
            "buffer_size" => self.with_buffer_size(parse_count("buffer_size", value)?),
            "shared_secret" => self.with_shared_secret(value),
            other => return Err(ClientError::config(format!("unknown option: {other}"))),
        })
    }

    /// Validate the collected options.
    pub fn build_config(&self) -> Result<ClientConfig, ClientError> {
        let mut config = ClientConfig::new(self.build_endpoint()?);
        if let Some(timeout) = self.timeout {
            if timeout.is_zero() {
                return Err(ClientError::config("timeout must be greater than zero"));
            }
            config.timeout = timeout;
        }
        if let Some(retries) = self.max_retries {
            config.max_retries = retries;
        }
        if let Some(delay) = self.retry_delay {
            config.retry_delay = delay;
        }
        if let Some(size) = self.batch_size {
            config.batch_size = Some(ensure_positive!(size, "batch_size")?);
        }
        if let Some(size) = self.buffer_size {
            config.buffer_size = ensure_positive!(size, "buffer_size")?;
        }
        config.shared_secret = self.shared_secret.clone();
        Ok(config)
    }

    /// Validate the options and construct a disconnected client.
    pub fn build(&self) -> Result<CollectorClient, ClientError> {
        Ok(CollectorClient::new(self.build_config()?))
    }

    fn build_endpoint(&self) -> Result<Endpoint, ClientError> {
        let tcp_given = self.host.is_some() || self.port.is_some();
        match (&self.unix_path, &self.host, self.port) {
            (Some(_), _, _) if tcp_given => Err(ClientError::config(
                "cannot specify both Unix socket and TCP",
            )),
            (Some(path), None, None) => build_unix_endpoint(path),
            (None, Some(host), Some(port)) => build_tcp_endpoint(host, port),
            (None, Some(_), None) => Err(ClientError::config("TCP host requires port")),
            _ => Err(ClientError::config("missing connection type")),
        }
    }
}

#[cfg(unix)]
fn build_unix_endpoint(path: &Path) -> Result<Endpoint, ClientError> {
    if path.as_os_str().is_empty() {
        return Err(ClientError::config("invalid socket path"));
    }
    Ok(Endpoint::Unix {
        path: path.to_path_buf(),
    })
}

#[cfg(not(unix))]
fn build_unix_endpoint(_path: &Path) -> Result<Endpoint, ClientError> {
    Err(ClientError::config(
        "unix domain sockets are not supported on this platform",
    ))
}

fn build_tcp_endpoint(host: &str, port: u32) -> Result<Endpoint, ClientError> {
    if host.trim().is_empty() {
        return Err(ClientError::config("invalid host"));
    }
    let port = u16::try_from(port)
        .ok()
        .filter(|port| *port != 0)
        .ok_or_else(|| ClientError::config("invalid port"))?;
    Ok(Endpoint::Tcp {
        host: host.to_owned(),
        port,
    })
}

fn parse_seconds(field: &str, value: &str) -> Result<Duration, ClientError> {
    value
        .parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .ok_or_else(|| ClientError::config(format!("{field} must be a non-negative number")))
}

fn parse_count<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, ClientError> {
    value
        .parse()
        .map_err(|_| ClientError::config(format!("{field} must be a non-negative integer")))
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("unix_path", &self.unix_path)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .field("batch_size", &self.batch_size)
            .field("buffer_size", &self.buffer_size)
            .field("shared_secret", &self.shared_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
