//! Transport primitives for the collector client.
//!
//! A [`Transport`] owns at most one socket. Both socket kinds share the same
//! connection bookkeeping: the handle lives in an `Option`, is dropped (and so
//! closed) on `close`, on any write failure, and whenever a liveness probe
//! finds the peer gone.

use std::{
    fmt,
    io::{self, Write},
    mem::MaybeUninit,
    net::{TcpStream, ToSocketAddrs},
    num::NonZeroUsize,
    time::Duration,
};

#[cfg(unix)]
use std::{
    os::unix::net::UnixStream,
    path::{Path, PathBuf},
    thread,
    time::Instant,
};

use log::debug;
use socket2::SockRef;
#[cfg(unix)]
use socket2::{Domain, SockAddr, Socket, Type};

use super::config::{ClientConfig, Endpoint};

/// Capability set shared by every socket transport.
pub trait Transport: Send {
    /// Open the socket unless a live connection already exists.
    fn connect(&mut self) -> io::Result<()>;
    /// Write `payload` in one operation. A failure leaves the transport
    /// disconnected.
    fn write(&mut self, payload: &[u8]) -> io::Result<()>;
    /// Report whether the socket is still usable, detecting peers that have
    /// hung up since the last write.
    fn is_connected(&mut self) -> bool;
    /// Release the socket. Safe to call repeatedly or before `connect`.
    fn close(&mut self);
    /// Human-readable destination used in errors and diagnostics.
    fn target(&self) -> &str;
}

/// Socket tuning applied to every new connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SocketOptions {
    /// Connect, read, and write deadline.
    pub timeout: Duration,
    /// Send-buffer hint in bytes.
    pub buffer_size: NonZeroUsize,
}

impl From<&ClientConfig> for SocketOptions {
    fn from(config: &ClientConfig) -> Self {
        Self {
            timeout: config.timeout(),
            buffer_size: config.buffer_size(),
        }
    }
}

/// Build the transport matching the configured endpoint.
pub fn transport_for(config: &ClientConfig) -> Box<dyn Transport> {
    let options = SocketOptions::from(config);
    match config.endpoint() {
        Endpoint::Tcp { host, port } => Box::new(TcpTransport::new(host.clone(), *port, options)),
        #[cfg(unix)]
        Endpoint::Unix { path } => Box::new(UnixTransport::new(path.clone(), options)),
        #[cfg(not(unix))]
        Endpoint::Unix { .. } => unreachable!("unix endpoints are rejected at build time"),
    }
}

struct Connection<S> {
    stream: Option<S>,
}

impl<S> Default for Connection<S> {
    fn default() -> Self {
        Self { stream: None }
    }
}

impl<S> Connection<S>
where
    S: Write,
    for<'s> SockRef<'s>: From<&'s S>,
{
    fn install(&mut self, stream: S, options: &SocketOptions) -> io::Result<()> {
        let sock = SockRef::from(&stream);
        sock.set_read_timeout(Some(options.timeout))?;
        sock.set_write_timeout(Some(options.timeout))?;
        sock.set_send_buffer_size(options.buffer_size.get())?;
        self.stream = Some(stream);
        Ok(())
    }

    fn write(&mut self, payload: &[u8]) -> io::Result<()> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "transport is not connected",
            ));
        };
        let result = stream.write_all(payload).and_then(|()| stream.flush());
        if result.is_err() {
            self.stream = None;
        }
        result
    }

    fn probe(&mut self) -> bool {
        let alive = self.stream.as_ref().is_some_and(peer_alive);
        if !alive {
            self.stream = None;
        }
        alive
    }

    fn close(&mut self) -> bool {
        self.stream.take().is_some()
    }
}

/// Peek without blocking: end-of-stream or a pending socket error means the
/// peer is gone, while `WouldBlock` means the connection is idle but open.
fn peer_alive<S>(stream: &S) -> bool
where
    for<'s> SockRef<'s>: From<&'s S>,
{
    let sock = SockRef::from(stream);
    if !matches!(sock.take_error(), Ok(None)) {
        return false;
    }
    if sock.set_nonblocking(true).is_err() {
        return false;
    }
    let mut buf = [MaybeUninit::<u8>::uninit(); 1];
    let alive = match sock.peek(&mut buf) {
        Ok(0) => false,
        Ok(_) => true,
        Err(err) => matches!(
            err.kind(),
            io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
        ),
    };
    sock.set_nonblocking(false).is_ok() && alive
}

/// TCP stream transport.
pub struct TcpTransport {
    host: String,
    port: u16,
    options: SocketOptions,
    target: String,
    connection: Connection<TcpStream>,
}

impl TcpTransport {
    pub fn new(host: impl Into<String>, port: u16, options: SocketOptions) -> Self {
        let host = host.into();
        Self {
            target: format!("{host}:{port}"),
            host,
            port,
            options,
            connection: Connection::default(),
        }
    }

    /// Try each resolved address in turn, keeping the last failure.
    fn open(&self) -> io::Result<TcpStream> {
        let addrs = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|err| {
                io::Error::new(
                    io::ErrorKind::AddrNotAvailable,
                    format!("failed to resolve {}: {err}", self.target),
                )
            })?;
        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.options.timeout) {
                Ok(stream) => return Ok(stream),
                Err(err) => last_err = Some(err),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("no addresses found for {}", self.target),
            )
        }))
    }
}

impl Transport for TcpTransport {
    fn connect(&mut self) -> io::Result<()> {
        if self.connection.probe() {
            return Ok(());
        }
        let stream = self.open()?;
        self.connection.install(stream, &self.options)?;
        debug!("logship connected to tcp collector at {}", self.target);
        Ok(())
    }

    fn write(&mut self, payload: &[u8]) -> io::Result<()> {
        self.connection.write(payload)
    }

    fn is_connected(&mut self) -> bool {
        self.connection.probe()
    }

    fn close(&mut self) {
        if self.connection.close() {
            debug!("logship closed connection to {}", self.target);
        }
    }

    fn target(&self) -> &str {
        &self.target
    }
}

impl fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TcpTransport")
            .field("target", &self.target)
            .field("options", &self.options)
            .field("connected", &self.connection.stream.is_some())
            .finish()
    }
}

/// Pause between connect attempts while the listener's backlog is full.
#[cfg(unix)]
const BACKLOG_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Connect to a Unix listener, giving up once `timeout` has elapsed.
///
/// A non-blocking Unix connect completes immediately or fails with
/// `WouldBlock` while the listener's accept queue is full, so the attempt is
/// repeated until the queue drains or the deadline passes.
#[cfg(unix)]
fn connect_unix(path: &Path, timeout: Duration) -> io::Result<UnixStream> {
    let addr = SockAddr::unix(path)?;
    let socket = Socket::new(Domain::UNIX, Type::STREAM, None)?;
    socket.set_nonblocking(true)?;
    let deadline = Instant::now() + timeout;
    loop {
        match socket.connect(&addr) {
            Ok(()) => break,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return Err(io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!("connect to {} timed out after {timeout:?}", path.display()),
                    ));
                }
                thread::sleep(remaining.min(BACKLOG_POLL_INTERVAL));
            }
            Err(err) => return Err(err),
        }
    }
    socket.set_nonblocking(false)?;
    Ok(UnixStream::from(socket))
}

/// Unix domain socket transport.
#[cfg(unix)]
pub struct UnixTransport {
    path: PathBuf,
    options: SocketOptions,
    target: String,
    connection: Connection<UnixStream>,
}

#[cfg(unix)]
impl UnixTransport {
    pub fn new(path: impl Into<PathBuf>, options: SocketOptions) -> Self {
        let path = path.into();
        Self {
            target: path.display().to_string(),
            path,
            options,
            connection: Connection::default(),
        }
    }
}

#[cfg(unix)]
impl Transport for UnixTransport {
    fn connect(&mut self) -> io::Result<()> {
        if self.connection.probe() {
            return Ok(());
        }
        let stream = connect_unix(&self.path, self.options.timeout)?;
        self.connection.install(stream, &self.options)?;
        debug!("logship connected to unix collector at {}", self.target);
        Ok(())
    }

    fn write(&mut self, payload: &[u8]) -> io::Result<()> {
        self.connection.write(payload)
    }

    fn is_connected(&mut self) -> bool {
        self.connection.probe()
    }

    fn close(&mut self) {
        if self.connection.close() {
            debug!("logship closed connection to {}", self.target);
        }
    }

    fn target(&self) -> &str {
        &self.target
    }
}

#[cfg(unix)]
impl fmt::Debug for UnixTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnixTransport")
            .field("target", &self.target)
            .field("options", &self.options)
            .field("connected", &self.connection.stream.is_some())
            .finish()
    }
}
