//! Socket-level tests for the collector client.

use std::{
    io::{self, BufRead, BufReader, Read},
    net::{SocketAddr, TcpListener},
    sync::mpsc,
    thread,
    time::{Duration, Instant},
};

use rstest::{fixture, rstest};
use serde_json::{Value, json};
use socket2::SockRef;

use crate::{
    error::{ClientError, FaultKind},
    level::Level,
    log_record::LogRecord,
};

use super::{ClientBuilder, CollectorClient, SocketOptions, TcpTransport, Transport};

#[fixture]
fn tcp_listener() -> TcpListener {
    TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral listener")
}

fn read_lines(stream: impl Read, count: usize) -> Vec<Value> {
    BufReader::new(stream)
        .lines()
        .take(count)
        .map(|line| serde_json::from_str(&line.expect("read line")).expect("line is json"))
        .collect()
}

/// Accept one connection and report the first `count` lines it carries.
fn spawn_line_server(
    listener: TcpListener,
    count: usize,
) -> (SocketAddr, mpsc::Receiver<Vec<Value>>) {
    let addr = listener.local_addr().expect("listener has address");
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept connection");
        tx.send(read_lines(stream, count)).expect("report lines");
    });
    (addr, rx)
}

fn tcp_client(addr: SocketAddr, builder: ClientBuilder) -> CollectorClient {
    builder
        .with_tcp(addr.ip().to_string(), addr.port())
        .with_retry_delay(Duration::ZERO)
        .build()
        .expect("build client")
}

fn recv(rx: &mpsc::Receiver<Vec<Value>>) -> Vec<Value> {
    rx.recv_timeout(Duration::from_secs(5))
        .expect("server received lines")
}

#[rstest]
fn sends_newline_delimited_json_over_tcp(tcp_listener: TcpListener) {
    let (addr, rx) = spawn_line_server(tcp_listener, 3);
    let mut client = tcp_client(addr, ClientBuilder::new());

    let record = LogRecord::builder()
        .message("structured")
        .source("api")
        .level(Level::Warning)
        .label("route", "/login")
        .build();
    client.send(record).expect("send record");
    client.send("plain").expect("send text");
    client
        .send_value(json!({"user": "ana"}))
        .expect("send object");

    let lines = recv(&rx);
    assert_eq!(lines[0]["message"], "structured");
    assert_eq!(lines[0]["source"], "api");
    assert_eq!(lines[0]["level"], 4);
    assert_eq!(lines[0]["labels"]["route"], "/login");
    assert_eq!(lines[1]["message"], "plain");
    assert_eq!(lines[1]["entry_type"], 1);
    let embedded: Value =
        serde_json::from_str(lines[2]["message"].as_str().expect("message is text"))
            .expect("object encoded as json text");
    assert_eq!(embedded, json!({"user": "ana"}));
    assert!(lines.iter().all(|line| line.get("auth").is_none()));
}

#[rstest]
fn tcp_envelopes_carry_shared_secret(tcp_listener: TcpListener) {
    let (addr, rx) = spawn_line_server(tcp_listener, 4);
    let mut client = tcp_client(
        addr,
        ClientBuilder::new()
            .with_shared_secret("s3cret")
            .with_batch_size(2),
    );

    client.send("single").expect("send single");
    client
        .send_batch(["a", "b", "c"])
        .expect("send batch");

    let lines = recv(&rx);
    assert_eq!(lines.len(), 4);
    assert!(lines.iter().all(|line| line["auth"] == "s3cret"));
    let messages: Vec<&str> = lines
        .iter()
        .map(|line| line["message"].as_str().expect("message"))
        .collect();
    assert_eq!(messages, ["single", "a", "b", "c"]);
}

#[cfg(unix)]
#[rstest]
fn unix_envelopes_never_carry_secret() {
    use std::os::unix::net::UnixListener;

    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("collector.sock");
    let listener = UnixListener::bind(&path).expect("bind unix listener");
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept connection");
        tx.send(read_lines(stream, 2)).expect("report lines");
    });

    let mut client = ClientBuilder::new()
        .with_unix_socket(&path)
        .with_shared_secret("s3cret")
        .build()
        .expect("build client");
    client.send_batch(["one", "two"]).expect("send batch");

    let lines = recv(&rx);
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().all(|line| line.get("auth").is_none()));
}

#[rstest]
fn refused_connection_names_target(tcp_listener: TcpListener) {
    let addr = tcp_listener.local_addr().expect("listener has address");
    drop(tcp_listener);

    let mut client = tcp_client(addr, ClientBuilder::new().with_max_retries(1));
    let err = client.send("nobody home").expect_err("nothing is listening");

    assert_eq!(err.fault_kind(), Some(FaultKind::Refused));
    let message = err.to_string();
    assert!(message.starts_with("Connection refused"), "{message}");
    assert!(message.contains(&addr.to_string()), "{message}");
    assert!(!client.is_connected());
}

#[cfg(unix)]
#[rstest]
fn missing_unix_socket_is_reported() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("absent.sock");
    let mut client = ClientBuilder::new()
        .with_unix_socket(&path)
        .with_max_retries(0)
        .build()
        .expect("build client");

    let err = client.connect().expect_err("socket file does not exist");
    assert!(matches!(
        err,
        ClientError::Connection { ref target, .. } if target.ends_with("absent.sock")
    ));
    assert_eq!(err.fault_kind(), Some(FaultKind::System));
}

#[rstest]
fn is_connected_notices_peer_hangup(tcp_listener: TcpListener) {
    let addr = tcp_listener.local_addr().expect("listener has address");
    let (closed_tx, closed_rx) = mpsc::channel();
    thread::spawn(move || {
        let (stream, _) = tcp_listener.accept().expect("accept connection");
        drop(stream);
        closed_tx.send(()).expect("signal close");
    });

    let mut client = tcp_client(addr, ClientBuilder::new());
    assert!(!client.is_connected());
    client.connect().expect("connect");
    closed_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("server closed connection");

    wait_for_hangup(&mut client);
}

#[rstest]
fn reconnects_after_peer_hangup(tcp_listener: TcpListener) {
    let addr = tcp_listener.local_addr().expect("listener has address");
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for _ in 0..2 {
            let (stream, _) = tcp_listener.accept().expect("accept connection");
            tx.send(read_lines(stream, 1)).expect("report lines");
        }
    });

    let mut client = tcp_client(addr, ClientBuilder::new());
    client.send("first").expect("first send");
    assert_eq!(recv(&rx)[0]["message"], "first");

    wait_for_hangup(&mut client);

    client.send("second").expect("second send");
    assert_eq!(recv(&rx)[0]["message"], "second");
}

#[rstest]
fn close_is_idempotent(tcp_listener: TcpListener) {
    let addr = tcp_listener.local_addr().expect("listener has address");
    let mut never_connected = tcp_client(addr, ClientBuilder::new());
    never_connected.close();
    never_connected.close();

    let _keep = thread::spawn(move || tcp_listener.accept().map(|(stream, _)| stream));
    let mut client = tcp_client(addr, ClientBuilder::new());
    client.connect().expect("connect");
    client.connect().expect("second connect is a no-op");
    client.close();
    assert!(!client.is_connected());
    client.close();
}

fn wait_for_hangup(client: &mut CollectorClient) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while client.is_connected() {
        assert!(Instant::now() < deadline, "hangup was never detected");
        thread::sleep(Duration::from_millis(10));
    }
}

/// Accept `connections` in turn. Each one reports its first line and is then
/// reset rather than closed cleanly.
fn spawn_resetting_server(
    listener: TcpListener,
    connections: usize,
) -> mpsc::Receiver<Vec<Value>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for _ in 0..connections {
            let (stream, _) = listener.accept().expect("accept connection");
            let mut reader = BufReader::new(stream);
            let mut line = String::new();
            reader.read_line(&mut line).expect("read line");
            let stream = reader.into_inner();
            SockRef::from(&stream)
                .set_linger(Some(Duration::ZERO))
                .expect("enable abortive close");
            drop(stream);
            let value = serde_json::from_str(&line).expect("line is json");
            if tx.send(vec![value]).is_err() {
                return;
            }
        }
    });
    rx
}

#[rstest]
fn tcp_write_to_reset_peer_drops_connection(tcp_listener: TcpListener) {
    let addr = tcp_listener.local_addr().expect("listener has address");
    let rx = spawn_resetting_server(tcp_listener, 2);
    let options = SocketOptions {
        timeout: Duration::from_secs(2),
        buffer_size: crate::client::DEFAULT_BUFFER_SIZE,
    };
    let mut transport = TcpTransport::new(addr.ip().to_string(), addr.port(), options);

    transport.connect().expect("connect");
    transport.write(b"{\"n\":1}\n").expect("first write");
    assert_eq!(recv(&rx)[0]["n"], 1);

    let deadline = Instant::now() + Duration::from_secs(5);
    let failure = loop {
        match transport.write(b"{\"n\":0}\n") {
            Ok(()) => {
                assert!(Instant::now() < deadline, "reset was never observed");
                thread::sleep(Duration::from_millis(10));
            }
            Err(err) => break err,
        }
    };
    assert_ne!(failure.kind(), io::ErrorKind::NotConnected);

    let err = transport
        .write(b"{\"n\":0}\n")
        .expect_err("failed write released the socket");
    assert_eq!(err.kind(), io::ErrorKind::NotConnected);

    transport.connect().expect("reconnect");
    transport.write(b"{\"n\":2}\n").expect("write on new connection");
    assert_eq!(recv(&rx)[0]["n"], 2);
}

#[rstest]
fn send_after_peer_reset_uses_new_connection(tcp_listener: TcpListener) {
    let addr = tcp_listener.local_addr().expect("listener has address");
    let rx = spawn_resetting_server(tcp_listener, 2);
    let mut client = tcp_client(addr, ClientBuilder::new().with_max_retries(3));

    client.send("first").expect("first send");
    assert_eq!(recv(&rx)[0]["message"], "first");
    wait_for_hangup(&mut client);

    client.send("second").expect("second send reconnects");
    assert_eq!(recv(&rx)[0]["message"], "second");
}

#[cfg(unix)]
#[rstest]
fn unix_is_connected_notices_peer_hangup() {
    use std::os::unix::net::UnixListener;

    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("collector.sock");
    let listener = UnixListener::bind(&path).expect("bind unix listener");
    let (closed_tx, closed_rx) = mpsc::channel();
    thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept connection");
        drop(stream);
        closed_tx.send(()).expect("signal close");
    });

    let mut client = ClientBuilder::new()
        .with_unix_socket(&path)
        .build()
        .expect("build client");
    assert!(!client.is_connected());
    client.connect().expect("connect");
    closed_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("server closed connection");

    wait_for_hangup(&mut client);
}

#[cfg(target_os = "linux")]
#[rstest]
fn unix_connect_gives_up_when_backlog_stays_full() {
    use socket2::{Domain, SockAddr, Socket, Type};

    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("busy.sock");
    let addr = SockAddr::unix(&path).expect("socket address");
    let listener = Socket::new(Domain::UNIX, Type::STREAM, None).expect("create listener");
    listener.bind(&addr).expect("bind listener");
    listener.listen(0).expect("listen");

    let mut queued = Vec::new();
    for _ in 0..64 {
        let filler = Socket::new(Domain::UNIX, Type::STREAM, None).expect("create filler");
        filler.set_nonblocking(true).expect("non-blocking filler");
        match filler.connect(&addr) {
            Ok(()) => queued.push(filler),
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => break,
            Err(err) => panic!("unexpected filler error: {err}"),
        }
    }

    let mut client = ClientBuilder::new()
        .with_unix_socket(&path)
        .with_timeout(Duration::from_millis(200))
        .with_max_retries(0)
        .build()
        .expect("build client");

    let started = Instant::now();
    let err = client.connect().expect_err("listener never accepts");
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_millis(200), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(2), "{elapsed:?}");
    assert_eq!(err.fault_kind(), Some(FaultKind::Timeout));
    drop(queued);
}
