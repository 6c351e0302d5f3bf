//! Riorita Client
//!
//! The public operations. Every key is namespaced with the configured prefix,
//! encoded into a request frame and run through the executor.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::Config;
use crate::error::Result;
use crate::network::{Executor, OperationInfo};
use crate::protocol::{read_get_response, read_verdict_response, Request};

/// Request ids are drawn from `1..REQUEST_ID_BOUND`
pub const REQUEST_ID_BOUND: i64 = 1_000_000_000_000_000_000;

/// Blocking client for a Riorita server
///
/// Owns exactly one connection. All operations take `&mut self`; share a
/// client across threads only behind external synchronization, or give each
/// thread its own client.
pub struct Client {
    executor: Executor,
    key_prefix: String,
    rng: StdRng,
}

impl Client {
    /// Create a retrying client with an empty key prefix
    ///
    /// No connection is opened until the first operation.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        let config = Config::builder().host(host).port(port).build();
        Self::from_executor(Executor::new(&config))
    }

    /// Create a client from a full configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_executor(Executor::new(&config)))
    }

    /// Create a client around a prepared executor
    ///
    /// Key prefix and request id seed come from the executor's own config.
    pub fn with_executor(executor: Executor) -> Result<Self> {
        executor.config().validate()?;
        Ok(Self::from_executor(executor))
    }

    fn from_executor(executor: Executor) -> Self {
        let config = executor.config();
        let rng = match config.request_id_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let key_prefix = config.key_prefix.clone();

        Self {
            executor,
            key_prefix,
            rng,
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Set the prefix prepended to every key
    pub fn set_key_prefix(&mut self, prefix: impl Into<String>) {
        self.key_prefix = prefix.into();
    }

    /// Current key prefix
    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    /// `host:port` of the server
    pub fn endpoint(&self) -> &str {
        self.executor.connection().endpoint()
    }

    /// True if a socket is currently open
    pub fn is_connected(&self) -> bool {
        self.executor.connection().is_healthy()
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Check that the server answers
    pub fn ping(&mut self) -> Result<bool> {
        let request = Request::ping(self.next_request_id());
        self.run_verdict(request)
    }

    /// Check whether `key` exists
    pub fn has(&mut self, key: &str) -> Result<bool> {
        let request = Request::has(self.next_request_id(), self.apply_key_prefix(key));
        self.run_verdict(request)
    }

    /// Delete `key`; true if something was deleted
    pub fn delete(&mut self, key: &str) -> Result<bool> {
        let request = Request::delete(self.next_request_id(), self.apply_key_prefix(key));
        self.run_verdict(request)
    }

    /// Store `value` under `key`; true if the write was accepted
    pub fn put(&mut self, key: &str, value: &[u8]) -> Result<bool> {
        let request = Request::put(self.next_request_id(), self.apply_key_prefix(key), value);
        self.run_verdict(request)
    }

    /// Fetch the value under `key`
    ///
    /// A missing key is `Ok(None)`, not an error.
    pub fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>> {
        let request = Request::get(self.next_request_id(), self.apply_key_prefix(key));
        let frame = request.encode()?;
        let request_id = request.request_id;

        self.executor.execute(Self::info(&request), |transport| {
            transport.send(&frame)?;
            read_get_response(transport.reader(), request_id)
        })
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn run_verdict(&mut self, request: Request) -> Result<bool> {
        let frame = request.encode()?;
        let request_id = request.request_id;

        self.executor.execute(Self::info(&request), |transport| {
            transport.send(&frame)?;
            read_verdict_response(transport.reader(), request_id)
        })
    }

    fn info(request: &Request) -> OperationInfo {
        OperationInfo {
            op_type: request.op_type,
            request_id: request.request_id,
            size: request.payload_size(),
        }
    }

    fn apply_key_prefix(&self, key: &str) -> Vec<u8> {
        let mut namespaced = Vec::with_capacity(self.key_prefix.len() + key.len());
        namespaced.extend_from_slice(self.key_prefix.as_bytes());
        namespaced.extend_from_slice(key.as_bytes());
        namespaced
    }

    fn next_request_id(&mut self) -> i64 {
        self.rng.gen_range(1..REQUEST_ID_BOUND)
    }
}
