//! Network Module
//!
//! Connection management and operation execution.
//!
//! ## Architecture
//! - One socket per client, reopened quietly after failures
//! - Sockets rotated after a fixed number of operations
//! - Operations retried with linear backoff when reconnect is enabled

mod connection;
mod executor;

pub use connection::{Connection, Transport, RECEIVE_BUFFER_SIZE, SEND_BUFFER_SIZE};
pub use executor::{
    backoff_delay, Executor, OperationInfo, ResultSize, Sleeper,
    MAX_OPERATIONS_PER_CONNECTION, SLOW_OPERATION_THRESHOLD,
};
