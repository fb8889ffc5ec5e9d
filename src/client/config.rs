//! Configuration structures consumed by the client lifecycle.
//!
//! [`ClientBuilder`](super::ClientBuilder) validates user input and produces
//! a [`ClientConfig`], which stays immutable for the lifetime of the
//! [`CollectorClient`](super::CollectorClient).

use std::{fmt, num::NonZeroUsize, path::PathBuf, time::Duration};

/// Default per-attempt I/O deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default number of retries after the first failed attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default pause between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);
/// Default socket send-buffer hint in bytes.
pub const DEFAULT_BUFFER_SIZE: NonZeroUsize = NonZeroUsize::new(4096).unwrap();

/// Collector destination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Endpoint {
    /// Unix domain socket at `path`.
    Unix { path: PathBuf },
    /// TCP stream to `host:port`.
    Tcp { host: String, port: u16 },
}

impl Endpoint {
    pub fn is_tcp(&self) -> bool {
        matches!(self, Endpoint::Tcp { .. })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Unix { path } => write!(f, "{}", path.display()),
            Endpoint::Tcp { host, port } => write!(f, "{host}:{port}"),
        }
    }
}

/// Validated client configuration.
#[derive(Clone)]
pub struct ClientConfig {
    pub(crate) endpoint: Endpoint,
    pub(crate) timeout: Duration,
    pub(crate) max_retries: u32,
    pub(crate) retry_delay: Duration,
    pub(crate) batch_size: Option<NonZeroUsize>,
    pub(crate) buffer_size: NonZeroUsize,
    pub(crate) shared_secret: Option<String>,
}

impl ClientConfig {
    pub(crate) fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            batch_size: None,
            buffer_size: DEFAULT_BUFFER_SIZE,
            shared_secret: None,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    /// Maximum records per transport write; `None` sends each batch whole.
    pub fn batch_size(&self) -> Option<NonZeroUsize> {
        self.batch_size
    }

    pub fn buffer_size(&self) -> NonZeroUsize {
        self.buffer_size
    }

    pub fn shared_secret(&self) -> Option<&str> {
        self.shared_secret.as_deref()
    }

    /// Whether envelopes carry the shared secret.
    ///
    /// Only TCP connections authenticate; a secret configured for a Unix
    /// socket is ignored.
    pub fn auth_required(&self) -> bool {
        self.endpoint.is_tcp() && self.shared_secret.is_some()
    }

    /// The secret to inject into envelopes, if any.
    pub(crate) fn auth_token(&self) -> Option<&str> {
        if self.auth_required() {
            self.shared_secret()
        } else {
            None
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .field("batch_size", &self.batch_size)
            .field("buffer_size", &self.buffer_size)
            .field("shared_secret", &self.shared_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
