//! Operation Executor
//!
//! Runs one logical request against the connection with timing, operation
//! counting, connection rotation and (optionally) a bounded retry loop.
//!
//! ## Retry Discipline
//! - Up to `max_attempts` attempts per operation
//! - Attempt N that fails sleeps `N * backoff_step`, then reconnects
//! - Transport and protocol errors are retried identically
//! - The last error is returned once the attempts run out

use std::time::{Duration, Instant};

use crate::config::Config;
use crate::error::{Result, RioritaError};
use crate::protocol::OperationType;
use super::connection::{Connection, Transport};

/// Operations a single socket may carry before it is rotated
pub const MAX_OPERATIONS_PER_CONNECTION: u32 = 1000;

/// Operations slower than this are logged at warn level
pub const SLOW_OPERATION_THRESHOLD: Duration = Duration::from_millis(100);

/// Metadata describing one operation, used for logging only
#[derive(Debug, Clone, Copy)]
pub struct OperationInfo {
    pub op_type: OperationType,
    pub request_id: i64,

    /// Request payload size in bytes
    pub size: usize,
}

/// Byte size of an operation result, added to the request size in timing logs
pub trait ResultSize {
    fn result_size(&self) -> usize;
}

impl ResultSize for bool {
    fn result_size(&self) -> usize {
        0
    }
}

impl ResultSize for Option<Vec<u8>> {
    fn result_size(&self) -> usize {
        self.as_ref().map_or(0, Vec::len)
    }
}

/// Sleeps between retry attempts
pub type Sleeper = Box<dyn FnMut(Duration) + Send>;

/// Delay slept after failed attempt number `attempt` (1-based)
pub fn backoff_delay(step: Duration, attempt: u32) -> Duration {
    step.saturating_mul(attempt)
}

/// Executes operations over a single owned connection
///
/// Not safe for concurrent use: every method takes `&mut self` and the
/// request/response correlation relies on strictly sequential use.
pub struct Executor {
    /// Configuration this executor was built from
    config: Config,

    connection: Connection,

    /// Reconnect and retry on failure
    reconnect: bool,

    max_attempts: u32,
    backoff_step: Duration,
    sleeper: Sleeper,
}

impl Executor {
    /// Create an executor for the endpoint in `config`
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            connection: Connection::new(config.host.clone(), config.port),
            reconnect: config.reconnect,
            max_attempts: config.max_attempts.max(1),
            backoff_step: config.backoff_step(),
            sleeper: Box::new(std::thread::sleep),
        }
    }

    /// Replace the function used to sleep between attempts
    pub fn with_sleeper(mut self, sleeper: impl FnMut(Duration) + Send + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    /// Configuration this executor was built from
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The underlying connection
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Run one operation
    ///
    /// `run` performs exactly one write-then-read cycle on the transport. It
    /// may be called several times in retrying mode, once per attempt.
    pub fn execute<T, F>(&mut self, info: OperationInfo, mut run: F) -> Result<T>
    where
        T: ResultSize,
        F: FnMut(&mut Transport) -> Result<T>,
    {
        let started = Instant::now();

        let result = if self.reconnect {
            self.run_with_retries(&info, &mut run)
        } else {
            self.run_once(&info, &mut run)
        };

        let size = info.size + result.as_ref().map_or(0, ResultSize::result_size);
        log_timing(&info, size, started.elapsed(), self.connection.endpoint());

        result
    }

    /// Non-retrying mode: one attempt, errors propagate unchanged
    fn run_once<T, F>(&mut self, info: &OperationInfo, run: &mut F) -> Result<T>
    where
        F: FnMut(&mut Transport) -> Result<T>,
    {
        self.prepare_connection();

        if !self.connection.is_healthy() {
            return Err(RioritaError::CannotConnect(self.connection.endpoint().to_string()));
        }

        self.record_operation(info);

        let outcome = match self.connection.transport_mut() {
            Some(transport) => run(transport),
            None => Err(RioritaError::CannotConnect(self.connection.endpoint().to_string())),
        };

        if outcome.is_err() {
            // A failed exchange may leave the stream desynchronized
            self.connection.disconnect();
        }

        outcome
    }

    /// Retrying mode: bounded attempts with linear backoff
    fn run_with_retries<T, F>(&mut self, info: &OperationInfo, run: &mut F) -> Result<T>
    where
        F: FnMut(&mut Transport) -> Result<T>,
    {
        let mut last_error: Option<RioritaError> = None;

        for attempt in 1..=self.max_attempts {
            self.prepare_connection();

            if !self.connection.is_healthy() {
                self.backoff(attempt);
                continue;
            }

            self.record_operation(info);

            let outcome = match self.connection.transport_mut() {
                Some(transport) => run(transport),
                None => Err(RioritaError::CannotConnect(self.connection.endpoint().to_string())),
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(e) => {
                    tracing::warn!(
                        op = %info.op_type,
                        request_id = info.request_id,
                        attempt,
                        class = ?e.class(),
                        "Can't process operation: {}",
                        e
                    );
                    last_error = Some(e);
                    self.backoff(attempt);
                    self.connection.reconnect_quietly();
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| RioritaError::CannotConnect(self.connection.endpoint().to_string())))
    }

    /// Rotate a worn-out socket or reopen a missing one
    fn prepare_connection(&mut self) {
        if self.connection.operation_count() >= MAX_OPERATIONS_PER_CONNECTION {
            tracing::warn!(
                "Reconnect expected because of connectionOperationCount={} >= {} [{}]",
                self.connection.operation_count(),
                MAX_OPERATIONS_PER_CONNECTION,
                self.connection.endpoint()
            );
            self.connection.reconnect_quietly();
        } else if !self.connection.is_healthy() {
            tracing::warn!("Socket is not connected [{}]", self.connection.endpoint());
            self.connection.reconnect_quietly();
        }
    }

    fn record_operation(&mut self, info: &OperationInfo) {
        let count = self.connection.record_operation();
        if count % 100 == 0 {
            tracing::debug!(
                request_id = info.request_id,
                "connectionOperationCount: {} [{}]",
                count,
                self.connection.endpoint()
            );
        }
    }

    fn backoff(&mut self, attempt: u32) {
        let delay = backoff_delay(self.backoff_step, attempt);
        (self.sleeper)(delay);
    }
}

fn log_timing(info: &OperationInfo, size: usize, elapsed: Duration, endpoint: &str) {
    let millis = elapsed.as_millis();

    if elapsed > SLOW_OPERATION_THRESHOLD {
        tracing::warn!(
            "Operation {} takes {} ms, id={} [size={} bytes, {}]",
            info.op_type,
            millis,
            info.request_id,
            size,
            endpoint
        );
    } else {
        tracing::info!(
            "Operation {} takes {} ms, id={} [size={} bytes, {}]",
            info.op_type,
            millis,
            info.request_id,
            size,
            endpoint
        );
    }
}
