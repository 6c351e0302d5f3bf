//! In-process mock Riorita server shared by the integration tests
//!
//! Serves PING/HAS/GET/PUT/DELETE from a HashMap, records every request and
//! counts accepted connections. Faults can be injected for the next N
//! requests to exercise the client's validation and retry paths.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{BufReader, BufWriter, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use riorita::protocol::{
    encode_response, read_request, OperationType, Request, Response, MAGIC_BYTE,
    PROTOCOL_VERSION,
};
use riorita::Config;

// =============================================================================
// Faults
// =============================================================================

/// A misbehaviour applied to a response instead of the correct answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Echo a request id different from the one received
    WrongRequestId,

    /// Verdict-only response declaring 20 bytes (and sending 4 extra)
    OversizedVerdictResponse,

    /// Success byte 0
    NotSuccessful,

    /// Success byte outside {0, 1}
    IllegalSuccess,

    /// Verdict byte outside {0, 1}
    IllegalVerdict,

    /// Magic byte mismatch
    BadMagic,

    /// Protocol version mismatch
    BadVersion,

    /// GET hit whose declared length exceeds the value it carries
    GetLengthMismatch,

    /// GET hit declaring only the 16-byte header, socket left open
    HitWithoutValue,

    /// Close the socket without answering
    CloseConnection,
}

#[derive(Default)]
struct ServerState {
    store: HashMap<Vec<u8>, Vec<u8>>,
    requests: Vec<Request>,
    fault: Option<(Fault, usize)>,
}

impl ServerState {
    fn take_fault(&mut self) -> Option<Fault> {
        match self.fault.take() {
            Some((fault, remaining)) if remaining > 0 => {
                if remaining > 1 {
                    self.fault = Some((fault, remaining - 1));
                }
                Some(fault)
            }
            _ => None,
        }
    }
}

// =============================================================================
// Mock Server
// =============================================================================

pub struct MockServer {
    addr: SocketAddr,
    connections: Arc<AtomicUsize>,
    state: Arc<Mutex<ServerState>>,
}

impl MockServer {
    /// Bind to an ephemeral port and start accepting in the background
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let connections = Arc::new(AtomicUsize::new(0));
        let state = Arc::new(Mutex::new(ServerState::default()));

        let accept_connections = Arc::clone(&connections);
        let accept_state = Arc::clone(&state);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let stream = match stream {
                    Ok(s) => s,
                    Err(_) => continue,
                };
                accept_connections.fetch_add(1, Ordering::SeqCst);
                let conn_state = Arc::clone(&accept_state);
                thread::spawn(move || serve(stream, conn_state));
            }
        });

        Self {
            addr,
            connections,
            state,
        }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Config pointing at this server
    pub fn config(&self) -> Config {
        Config::builder()
            .host("127.0.0.1")
            .port(self.port())
            .backoff_step_ms(1)
            .build()
    }

    /// Connections accepted so far
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Wait until at least `n` connections have been accepted
    pub fn wait_for_connections(&self, n: usize) -> usize {
        let deadline = Instant::now() + Duration::from_secs(5);
        while self.connections() < n && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        self.connections()
    }

    /// Apply `fault` to the next `times` requests
    pub fn inject(&self, fault: Fault, times: usize) {
        self.state.lock().unwrap().fault = Some((fault, times));
    }

    /// Every request received so far, in order
    pub fn requests(&self) -> Vec<Request> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Raw stored value for an already-namespaced key
    pub fn stored(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.state.lock().unwrap().store.get(key).cloned()
    }
}

/// A port with nothing listening on it
pub fn refused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn serve(stream: TcpStream, state: Arc<Mutex<ServerState>>) {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut writer = BufWriter::new(stream);

    loop {
        let request = match read_request(&mut reader) {
            Ok(r) => r,
            Err(_) => return,
        };

        let (frame, fault) = {
            let mut state = state.lock().unwrap();
            state.requests.push(request.clone());
            let fault = state.take_fault();
            (answer(&mut state.store, &request), fault)
        };

        let bytes = match fault {
            None => frame,
            Some(Fault::CloseConnection) => return,
            Some(fault) => faulty_frame(fault, &request),
        };

        if writer.write_all(&bytes).and_then(|_| writer.flush()).is_err() {
            return;
        }
    }
}

fn answer(store: &mut HashMap<Vec<u8>, Vec<u8>>, request: &Request) -> Vec<u8> {
    let id = request.request_id;
    let response = match request.op_type {
        OperationType::Ping => Response::verdict(id, true),
        OperationType::Has => Response::verdict(id, store.contains_key(&request.key)),
        OperationType::Get => match store.get(&request.key) {
            Some(value) => Response::found(id, value.clone()),
            None => Response::not_found(id),
        },
        OperationType::Put => {
            let value = request.value.clone().unwrap_or_default();
            store.insert(request.key.clone(), value);
            Response::verdict(id, true)
        }
        OperationType::Delete => Response::verdict(id, store.remove(&request.key).is_some()),
    };
    encode_response(&response).to_vec()
}

/// Build a 16-byte verdict-only response with arbitrary field values
pub fn raw_response(declared_len: u32, magic: u8, version: u8, id: i64, success: u8, verdict: u8) -> Vec<u8> {
    let mut frame = Vec::with_capacity(16);
    frame.extend_from_slice(&declared_len.to_le_bytes());
    frame.push(magic);
    frame.push(version);
    frame.extend_from_slice(&id.to_le_bytes());
    frame.push(success);
    frame.push(verdict);
    frame
}

fn faulty_frame(fault: Fault, request: &Request) -> Vec<u8> {
    let id = request.request_id;
    match fault {
        Fault::WrongRequestId => raw_response(16, MAGIC_BYTE, PROTOCOL_VERSION, id.wrapping_add(1), 1, 1),
        Fault::OversizedVerdictResponse => {
            let mut frame = raw_response(20, MAGIC_BYTE, PROTOCOL_VERSION, id, 1, 0);
            frame.extend_from_slice(&[0, 0, 0, 0]);
            frame
        }
        Fault::NotSuccessful => raw_response(16, MAGIC_BYTE, PROTOCOL_VERSION, id, 0, 0),
        Fault::IllegalSuccess => raw_response(16, MAGIC_BYTE, PROTOCOL_VERSION, id, 7, 0),
        Fault::IllegalVerdict => raw_response(16, MAGIC_BYTE, PROTOCOL_VERSION, id, 1, 2),
        Fault::BadMagic => raw_response(16, MAGIC_BYTE.wrapping_add(1), PROTOCOL_VERSION, id, 1, 1),
        Fault::BadVersion => raw_response(16, MAGIC_BYTE, PROTOCOL_VERSION + 1, id, 1, 1),
        Fault::GetLengthMismatch => {
            let value = b"abc";
            let mut frame = raw_response(16 + 4 + value.len() as u32 + 8, MAGIC_BYTE, PROTOCOL_VERSION, id, 1, 1);
            frame.extend_from_slice(&(value.len() as i32).to_le_bytes());
            frame.extend_from_slice(value);
            frame
        }
        Fault::HitWithoutValue => raw_response(16, MAGIC_BYTE, PROTOCOL_VERSION, id, 1, 1),
        Fault::CloseConnection => Vec::new(),
    }
}
