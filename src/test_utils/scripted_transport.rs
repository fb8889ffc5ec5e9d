//! An in-memory transport that records writes and fails on demand.
//!
//! Clones share state, so a test can keep one handle for inspection while
//! the client owns another.

use std::{io, sync::Arc};

use parking_lot::Mutex;
use serde_json::Value;

use crate::client::Transport;

#[derive(Debug)]
struct Script {
    connected: bool,
    connect_failures: usize,
    write_failures: usize,
    failure_kind: io::ErrorKind,
    connects: usize,
    write_attempts: usize,
    closes: usize,
    writes: Vec<Vec<u8>>,
}

/// Transport double driven by a failure script.
#[derive(Clone, Debug)]
pub struct ScriptedTransport {
    target: String,
    script: Arc<Mutex<Script>>,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedTransport {
    /// A transport whose connects and writes always succeed.
    pub fn new() -> Self {
        Self {
            target: "scripted".into(),
            script: Arc::new(Mutex::new(Script {
                connected: false,
                connect_failures: 0,
                write_failures: 0,
                failure_kind: io::ErrorKind::BrokenPipe,
                connects: 0,
                write_attempts: 0,
                closes: 0,
                writes: Vec::new(),
            })),
        }
    }

    /// Fail the next `count` writes with `kind`.
    pub fn failing_writes(self, count: usize, kind: io::ErrorKind) -> Self {
        {
            let mut script = self.script.lock();
            script.write_failures = count;
            script.failure_kind = kind;
        }
        self
    }

    /// Fail the next `count` connects with `kind`.
    pub fn failing_connects(self, count: usize, kind: io::ErrorKind) -> Self {
        {
            let mut script = self.script.lock();
            script.connect_failures = count;
            script.failure_kind = kind;
        }
        self
    }

    /// Fail every connect with `kind`.
    pub fn unreachable(self, kind: io::ErrorKind) -> Self {
        self.failing_connects(usize::MAX, kind)
    }

    /// Payloads of every successful write, in order.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.script.lock().writes.clone()
    }

    /// Successful writes decoded into one JSON value per line.
    pub fn written_lines(&self) -> Vec<Vec<Value>> {
        self.writes()
            .iter()
            .map(|payload| {
                String::from_utf8_lossy(payload)
                    .lines()
                    .map(|line| serde_json::from_str(line).expect("written line is json"))
                    .collect()
            })
            .collect()
    }

    pub fn write_attempts(&self) -> usize {
        self.script.lock().write_attempts
    }

    pub fn connect_count(&self) -> usize {
        self.script.lock().connects
    }

    pub fn close_count(&self) -> usize {
        self.script.lock().closes
    }

    /// Simulate the collector hanging up.
    pub fn hang_up(&self) {
        self.script.lock().connected = false;
    }
}

impl Transport for ScriptedTransport {
    fn connect(&mut self) -> io::Result<()> {
        let mut script = self.script.lock();
        if script.connected {
            return Ok(());
        }
        script.connects += 1;
        if script.connect_failures > 0 {
            script.connect_failures -= 1;
            return Err(io::Error::new(script.failure_kind, "scripted connect failure"));
        }
        script.connected = true;
        Ok(())
    }

    fn write(&mut self, payload: &[u8]) -> io::Result<()> {
        let mut script = self.script.lock();
        script.write_attempts += 1;
        if !script.connected {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "not connected"));
        }
        if script.write_failures > 0 {
            script.write_failures -= 1;
            script.connected = false;
            return Err(io::Error::new(script.failure_kind, "scripted write failure"));
        }
        script.writes.push(payload.to_vec());
        Ok(())
    }

    fn is_connected(&mut self) -> bool {
        self.script.lock().connected
    }

    fn close(&mut self) {
        let mut script = self.script.lock();
        if script.connected {
            script.connected = false;
            script.closes += 1;
        }
    }

    fn target(&self) -> &str {
        &self.target
    }
}
