//! Protocol Module
//!
//! Defines the wire protocol between the client and a Riorita server.
//!
//! ## Protocol Format (V1 - Length-Prefixed Binary, little-endian)
//!
//! Every frame opens with a 4-byte total length that includes itself,
//! followed by the magic byte (113) and the protocol version (1).
//!
//! ### Operations
//! - 0x01: PING   - no key, no value
//! - 0x02: HAS    - key
//! - 0x03: GET    - key
//! - 0x04: PUT    - key + value
//! - 0x05: DELETE - key
//!
//! ### Responses
//! Echo the request id, then a success byte and a verdict byte (each 0 or 1).
//! A GET with verdict 1 carries a length-prefixed value.

mod request;
mod response;
mod codec;

pub use request::{OperationType, Request};
pub use response::{Response, ResponseHeader};
pub use codec::{
    encode_request, decode_response_header,
    read_response_length, read_response_header,
    read_verdict_response, read_get_response, write_frame,
    decode_request, read_request, encode_response, write_response,
    MAGIC_BYTE, PROTOCOL_VERSION, LENGTH_FIELD_SIZE,
    REQUEST_HEADER_SIZE, RESPONSE_HEADER_SIZE, RESPONSE_HEADER_LENGTH,
    MAX_FIELD_LENGTH, MAX_REQUEST_SIZE,
};
