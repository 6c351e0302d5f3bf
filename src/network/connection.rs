//! Connection Manager
//!
//! Owns the single socket of a client, its buffered endpoints and the
//! per-connection operation counter.

use std::io::{self, BufReader, BufWriter};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};

use socket2::{Domain, Protocol, Socket, Type};

use crate::error::Result;
use crate::protocol::write_frame;

/// Receive buffer size requested for every socket (16 MB)
pub const RECEIVE_BUFFER_SIZE: usize = 16 * 1024 * 1024;

/// Send buffer size requested for every socket (16 MB)
pub const SEND_BUFFER_SIZE: usize = 16 * 1024 * 1024;

/// Buffered read/write halves of one live socket
pub struct Transport {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,
}

impl Transport {
    fn new(stream: TcpStream) -> Result<Self> {
        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
        })
    }

    /// Write a complete frame and flush it to the socket
    pub fn send(&mut self, frame: &[u8]) -> Result<()> {
        write_frame(&mut self.writer, frame)
    }

    /// Buffered reader over the socket
    pub fn reader(&mut self) -> &mut BufReader<TcpStream> {
        &mut self.reader
    }

    fn close(self) -> io::Result<()> {
        self.reader.get_ref().shutdown(Shutdown::Both)
    }
}

/// The client's connection to one endpoint
///
/// Either *Connected* (a transport exists) or *Disconnected*. Never holds
/// more than one socket.
pub struct Connection {
    host: String,
    port: u16,

    /// `host:port` for logging
    endpoint: String,

    /// Live socket, if any
    transport: Option<Transport>,

    /// Operations attempted since the last successful connect
    operation_count: u32,
}

impl Connection {
    /// Create a disconnected connection; nothing is opened until the first
    /// `reconnect_quietly`
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        let endpoint = format!("{}:{}", host, port);
        Self {
            host,
            port,
            endpoint,
            transport: None,
            operation_count: 0,
        }
    }

    /// `host:port` this connection targets
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// True iff a socket exists and is connected
    pub fn is_healthy(&self) -> bool {
        match &self.transport {
            Some(transport) => transport.reader.get_ref().peer_addr().is_ok(),
            None => false,
        }
    }

    /// Operations attempted on the current socket
    pub fn operation_count(&self) -> u32 {
        self.operation_count
    }

    /// Count one attempted operation, returning the new total
    pub fn record_operation(&mut self) -> u32 {
        self.operation_count = self.operation_count.saturating_add(1);
        self.operation_count
    }

    /// Live transport, if connected
    pub fn transport_mut(&mut self) -> Option<&mut Transport> {
        self.transport.as_mut()
    }

    /// Close the current socket, suppressing any error
    pub fn disconnect(&mut self) {
        if let Some(transport) = self.transport.take() {
            tracing::warn!("Closing socket [{}]", self.endpoint);
            if let Err(e) = transport.close() {
                tracing::trace!("Ignoring error while closing socket [{}]: {}", self.endpoint, e);
            }
        }
    }

    /// Tear down the current socket (if any) and open a fresh one
    ///
    /// Never fails: if the new socket cannot be opened the connection stays
    /// disconnected and the caller finds out through `is_healthy`.
    pub fn reconnect_quietly(&mut self) {
        self.disconnect();

        match self.open() {
            Ok(transport) => {
                self.transport = Some(transport);
                self.operation_count = 0;
                tracing::warn!("Connected to {}, connectionOperationCount = 0", self.endpoint);
            }
            Err(e) => {
                tracing::warn!("Can't connect to {}: {}", self.endpoint, e);
            }
        }
    }

    /// Resolve the endpoint and connect to the first address that accepts
    fn open(&self) -> Result<Transport> {
        let mut last_error = None;

        for addr in (self.host.as_str(), self.port).to_socket_addrs()? {
            match connect_socket(addr) {
                Ok(stream) => return Transport::new(stream),
                Err(e) => {
                    tracing::debug!("Connect to {} ({}) failed: {}", self.endpoint, addr, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no addresses resolved for {}", self.endpoint),
                )
            })
            .into())
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Some(transport) = self.transport.take() {
            let _ = transport.close();
        }
    }
}

/// Open a socket with the fixed option set and connect it
fn connect_socket(addr: SocketAddr) -> io::Result<TcpStream> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;

    socket.set_recv_buffer_size(RECEIVE_BUFFER_SIZE)?;
    socket.set_send_buffer_size(SEND_BUFFER_SIZE)?;
    // Disable Nagle's algorithm for low latency
    socket.set_nodelay(true)?;
    socket.set_keepalive(true)?;
    socket.set_reuse_address(true)?;

    socket.connect(&addr.into())?;

    Ok(socket.into())
}
