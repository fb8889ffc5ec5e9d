//! Bounded retry with a fixed pause between attempts.

use std::{io, thread, time::Duration};

use log::warn;

use crate::error::ClientError;

use super::config::ClientConfig;

/// How often, and how patiently, a transport operation is retried.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Upper bound on the number of times an operation runs.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Run `op` until it succeeds or the budget is spent.
    ///
    /// `op` receives the 1-based attempt number. Every failure is treated as
    /// transient; once no attempts remain, the last failure is classified and
    /// returned as [`ClientError::Connection`] naming `target`.
    pub fn run<T>(
        &self,
        target: &str,
        mut op: impl FnMut(u32) -> io::Result<T>,
    ) -> Result<T, ClientError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(err) if attempt <= self.max_retries => {
                    warn!(
                        "logship attempt {attempt}/{} to {target} failed: {err}; retrying in {:?}",
                        self.max_attempts(),
                        self.delay
                    );
                    if !self.delay.is_zero() {
                        thread::sleep(self.delay);
                    }
                }
                Err(err) => {
                    warn!("logship giving up on {target} after {attempt} attempts: {err}");
                    return Err(ClientError::connection(target, err));
                }
            }
        }
    }
}

impl From<&ClientConfig> for RetryPolicy {
    fn from(config: &ClientConfig) -> Self {
        Self::new(config.max_retries(), config.retry_delay())
    }
}
