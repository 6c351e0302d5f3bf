//! Tests for the Operation Executor
//!
//! These tests verify:
//! - Linear backoff schedule
//! - Retry exhaustion against a refused endpoint
//! - Retrying through protocol errors with reconnects
//! - Single-attempt behaviour with reconnect disabled

#[path = "../common/mod.rs"]
mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{refused_port, Fault, MockServer};
use riorita::network::{backoff_delay, Executor, OperationInfo, ResultSize};
use riorita::protocol::{read_verdict_response, OperationType, Request};
use riorita::{Config, RioritaError};

// =============================================================================
// Helper Functions
// =============================================================================

fn recording_executor(config: &Config) -> (Executor, Arc<Mutex<Vec<Duration>>>) {
    let delays = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&delays);
    let executor = Executor::new(config).with_sleeper(move |d| recorded.lock().unwrap().push(d));
    (executor, delays)
}

fn ping_info(request_id: i64) -> OperationInfo {
    OperationInfo {
        op_type: OperationType::Ping,
        request_id,
        size: 0,
    }
}

/// Run a PING through the executor, counting how often the unit is invoked
fn ping(executor: &mut Executor, request_id: i64, calls: &mut u32) -> riorita::Result<bool> {
    let frame = Request::ping(request_id).encode().unwrap();
    executor.execute(ping_info(request_id), |transport| {
        *calls += 1;
        transport.send(&frame)?;
        read_verdict_response(transport.reader(), request_id)
    })
}

// =============================================================================
// Backoff Tests
// =============================================================================

#[test]
fn test_backoff_delay_is_linear() {
    let step = Duration::from_millis(100);

    assert_eq!(backoff_delay(step, 1), Duration::from_millis(100));
    assert_eq!(backoff_delay(step, 2), Duration::from_millis(200));
    assert_eq!(backoff_delay(step, 100), Duration::from_millis(10_000));
}

#[test]
fn test_result_size() {
    assert_eq!(true.result_size(), 0);
    assert_eq!(Some(vec![0u8; 12]).result_size(), 12);
    assert_eq!(None::<Vec<u8>>.result_size(), 0);
}

// =============================================================================
// Retrying Mode Tests
// =============================================================================

#[test]
fn test_retry_exhaustion_against_refused_port() {
    let config = Config::builder()
        .host("127.0.0.1")
        .port(refused_port())
        .build();
    let (mut executor, delays) = recording_executor(&config);

    let mut calls = 0;
    let err = ping(&mut executor, 1, &mut calls).unwrap_err();

    assert!(matches!(err, RioritaError::CannotConnect(_)));
    assert_eq!(calls, 0);

    let delays = delays.lock().unwrap();
    assert_eq!(delays.len(), 100);
    assert!(delays.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(delays[0], Duration::from_millis(100));
    assert_eq!(delays[99], Duration::from_millis(10_000));
}

#[test]
fn test_retry_exhaustion_returns_last_error() {
    let server = MockServer::start();
    server.inject(Fault::WrongRequestId, usize::MAX);
    let config = Config::builder()
        .host("127.0.0.1")
        .port(server.port())
        .max_attempts(5)
        .build();
    let (mut executor, delays) = recording_executor(&config);

    let mut calls = 0;
    let err = ping(&mut executor, 9, &mut calls).unwrap_err();

    assert!(err.is_protocol());
    assert!(matches!(err, RioritaError::Protocol(ref m) if m.contains("request id")));
    assert_eq!(calls, 5);
    assert_eq!(delays.lock().unwrap().len(), 5);
    // One socket per attempt plus the reconnect after the final failure
    assert_eq!(server.wait_for_connections(6), 6);
}

#[test]
fn test_retry_recovers_after_protocol_error() {
    let server = MockServer::start();
    server.inject(Fault::WrongRequestId, 1);
    let (mut executor, delays) = recording_executor(&server.config());

    let mut calls = 0;
    assert!(ping(&mut executor, 3, &mut calls).unwrap());

    assert_eq!(calls, 2);
    assert_eq!(*delays.lock().unwrap(), vec![Duration::from_millis(1)]);
    assert_eq!(server.connections(), 2);
}

#[test]
fn test_retry_recovers_after_dropped_connection() {
    let server = MockServer::start();
    server.inject(Fault::CloseConnection, 2);
    let (mut executor, delays) = recording_executor(&server.config());

    let mut calls = 0;
    assert!(ping(&mut executor, 4, &mut calls).unwrap());

    assert_eq!(calls, 3);
    assert_eq!(
        *delays.lock().unwrap(),
        vec![Duration::from_millis(1), Duration::from_millis(2)]
    );
}

#[test]
fn test_success_needs_no_sleep() {
    let server = MockServer::start();
    let (mut executor, delays) = recording_executor(&server.config());

    let mut calls = 0;
    for id in 1..=10 {
        assert!(ping(&mut executor, id, &mut calls).unwrap());
    }

    assert_eq!(calls, 10);
    assert!(delays.lock().unwrap().is_empty());
    assert_eq!(executor.connection().operation_count(), 10);
    assert_eq!(server.connections(), 1);
}

// =============================================================================
// Non-retrying Mode Tests
// =============================================================================

#[test]
fn test_no_reconnect_runs_once_and_propagates() {
    let server = MockServer::start();
    let config = Config::builder()
        .host("127.0.0.1")
        .port(server.port())
        .reconnect(false)
        .build();
    let (mut executor, delays) = recording_executor(&config);

    let mut calls = 0;
    let err = executor
        .execute(ping_info(1), |_transport| -> riorita::Result<bool> {
            calls += 1;
            Err(RioritaError::Protocol("boom".to_string()))
        })
        .unwrap_err();

    assert!(matches!(err, RioritaError::Protocol(ref m) if m == "boom"));
    assert_eq!(calls, 1);
    assert!(delays.lock().unwrap().is_empty());
    assert!(!executor.connection().is_healthy());
}

#[test]
fn test_no_reconnect_refused_port() {
    let config = Config::builder()
        .host("127.0.0.1")
        .port(refused_port())
        .reconnect(false)
        .build();
    let (mut executor, delays) = recording_executor(&config);

    let mut calls = 0;
    let err = ping(&mut executor, 1, &mut calls).unwrap_err();

    assert!(matches!(err, RioritaError::CannotConnect(_)));
    assert!(err.is_transport());
    assert_eq!(calls, 0);
    assert!(delays.lock().unwrap().is_empty());
}

#[test]
fn test_no_reconnect_next_call_uses_fresh_socket() {
    let server = MockServer::start();
    server.inject(Fault::BadMagic, 1);
    let config = Config::builder()
        .host("127.0.0.1")
        .port(server.port())
        .reconnect(false)
        .build();
    let mut executor = Executor::new(&config);

    let mut calls = 0;
    assert!(ping(&mut executor, 1, &mut calls).unwrap_err().is_protocol());
    assert!(ping(&mut executor, 2, &mut calls).unwrap());

    assert_eq!(calls, 2);
    assert_eq!(server.connections(), 2);
}
