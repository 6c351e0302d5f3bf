//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol. All integers are
//! little-endian.
//!
//! ## Wire Format
//!
//! ### Request Format
//! ```text
//! ┌─────────┬───────┬─────────┬────────┬────────────┬────────────┬─────┬──────────────────────┐
//! │ Len (4) │ Magic │ Version │ Type   │ ReqId (8)  │ KeyLen (4) │ Key │ [ValLen (4) + Value] │
//! └─────────┴───────┴─────────┴────────┴────────────┴────────────┴─────┴──────────────────────┘
//! ```
//!
//! ### Response Format
//! ```text
//! ┌─────────┬───────┬─────────┬────────────┬─────────┬─────────┬──────────────────────┐
//! │ Len (4) │ Magic │ Version │ ReqId (8)  │ Success │ Verdict │ [ValLen (4) + Value] │
//! └─────────┴───────┴─────────┴────────────┴─────────┴─────────┴──────────────────────┘
//! ```
//!
//! `Len` counts every byte of the frame, itself included.

use std::io::{Read, Write};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Result, RioritaError};
use super::{OperationType, Request, Response, ResponseHeader};

/// Magic byte opening every frame after the length field
pub const MAGIC_BYTE: u8 = 113;

/// Protocol version spoken by this client
pub const PROTOCOL_VERSION: u8 = 1;

/// Size of a length field
pub const LENGTH_FIELD_SIZE: usize = 4;

/// Fixed part of a request: length + magic + version + type + request id + key length
pub const REQUEST_HEADER_SIZE: usize = 4 + 1 + 1 + 1 + 8 + 4;

/// Response header after the length field: magic + version + request id + success + verdict
pub const RESPONSE_HEADER_SIZE: usize = 1 + 1 + 8 + 1 + 1;

/// Declared length of a response that carries no value
pub const RESPONSE_HEADER_LENGTH: u32 = (LENGTH_FIELD_SIZE + RESPONSE_HEADER_SIZE) as u32;

/// Largest key or value the signed 32-bit length fields can describe
pub const MAX_FIELD_LENGTH: usize = i32::MAX as usize;

/// Largest request frame `read_request` accepts (64 MB)
pub const MAX_REQUEST_SIZE: u32 = 64 * 1024 * 1024;

// =============================================================================
// Request Encoding
// =============================================================================

/// Encode a request frame
///
/// The value section is written only when `value` is `Some`.
pub fn encode_request(
    op_type: OperationType,
    request_id: i64,
    key: &[u8],
    value: Option<&[u8]>,
) -> Result<Bytes> {
    if key.len() > MAX_FIELD_LENGTH {
        return Err(RioritaError::Protocol(format!(
            "Key too large: {} bytes (max {})",
            key.len(),
            MAX_FIELD_LENGTH
        )));
    }

    let value_section = match value {
        Some(v) if v.len() > MAX_FIELD_LENGTH => {
            return Err(RioritaError::Protocol(format!(
                "Value too large: {} bytes (max {})",
                v.len(),
                MAX_FIELD_LENGTH
            )));
        }
        Some(v) => LENGTH_FIELD_SIZE + v.len(),
        None => 0,
    };

    let total_len = REQUEST_HEADER_SIZE + key.len() + value_section;
    if total_len > u32::MAX as usize {
        return Err(RioritaError::Protocol(format!(
            "Request frame too large: {} bytes",
            total_len
        )));
    }

    let mut frame = BytesMut::with_capacity(total_len);
    frame.put_u32_le(total_len as u32);
    frame.put_u8(MAGIC_BYTE);
    frame.put_u8(PROTOCOL_VERSION);
    frame.put_u8(op_type.code());
    frame.put_i64_le(request_id);
    frame.put_u32_le(key.len() as u32);
    frame.put_slice(key);

    if let Some(v) = value {
        frame.put_u32_le(v.len() as u32);
        frame.put_slice(v);
    }

    Ok(frame.freeze())
}

// =============================================================================
// Response Decoding
// =============================================================================

/// Decode and validate a response header (the 12 bytes after the length field)
///
/// Checks, in order: magic, version, request id, success byte, success flag,
/// verdict byte.
pub fn decode_response_header(bytes: &[u8], expected_request_id: i64) -> Result<ResponseHeader> {
    if bytes.len() < RESPONSE_HEADER_SIZE {
        return Err(RioritaError::Protocol(format!(
            "Incomplete response header: expected {} bytes, got {} [requestId={}]",
            RESPONSE_HEADER_SIZE,
            bytes.len(),
            expected_request_id
        )));
    }

    let mut buf = &bytes[..RESPONSE_HEADER_SIZE];

    let magic = buf.get_u8();
    if magic != MAGIC_BYTE {
        return Err(RioritaError::Protocol(format!(
            "Invalid magic: expected {}, found {} [requestId={}]",
            MAGIC_BYTE, magic, expected_request_id
        )));
    }

    let version = buf.get_u8();
    if version != PROTOCOL_VERSION {
        return Err(RioritaError::Protocol(format!(
            "Invalid protocol: expected {}, found {} [requestId={}]",
            PROTOCOL_VERSION, version, expected_request_id
        )));
    }

    let request_id = buf.get_i64_le();
    if request_id != expected_request_id {
        return Err(RioritaError::Protocol(format!(
            "Invalid request id: expected {}, found {}",
            expected_request_id, request_id
        )));
    }

    let success = buf.get_u8();
    if success > 1 {
        return Err(RioritaError::MalformedResponse(format!(
            "Operation returned illegal success {} [requestId={}]",
            success, request_id
        )));
    }
    if success != 1 {
        return Err(RioritaError::NotSuccessful { request_id });
    }

    let verdict = buf.get_u8();
    if verdict > 1 {
        return Err(RioritaError::MalformedResponse(format!(
            "Operation returned illegal verdict {} [requestId={}]",
            verdict, request_id
        )));
    }

    Ok(ResponseHeader {
        request_id,
        success: true,
        verdict: verdict == 1,
    })
}

// =============================================================================
// Stream-based I/O helpers (client side)
// =============================================================================

/// Write a complete frame and flush
pub fn write_frame<W: Write>(writer: &mut W, frame: &[u8]) -> Result<()> {
    writer.write_all(frame)?;
    writer.flush()?;
    Ok(())
}

/// Read the 4-byte total length that opens every response
pub fn read_response_length<R: Read>(reader: &mut R) -> Result<u32> {
    let mut len = [0u8; LENGTH_FIELD_SIZE];
    reader.read_exact(&mut len)?;
    Ok(u32::from_le_bytes(len))
}

/// Read and validate the 12-byte response header
pub fn read_response_header<R: Read>(reader: &mut R, request_id: i64) -> Result<ResponseHeader> {
    let mut header = [0u8; RESPONSE_HEADER_SIZE];
    reader.read_exact(&mut header)?;
    decode_response_header(&header, request_id)
}

/// Read a response that carries only a verdict (PING, HAS, PUT, DELETE)
pub fn read_verdict_response<R: Read>(reader: &mut R, request_id: i64) -> Result<bool> {
    let response_len = read_response_length(reader)?;
    if response_len != RESPONSE_HEADER_LENGTH {
        return Err(RioritaError::Protocol(format!(
            "Expected exactly {} bytes in response, but {} found [requestId={}]",
            RESPONSE_HEADER_LENGTH, response_len, request_id
        )));
    }

    Ok(read_response_header(reader, request_id)?.verdict)
}

/// Read a GET response
///
/// Returns `None` when the server reports the key as absent. The declared
/// length must match the value length exactly, so a lying server cannot leave
/// unread bytes on the stream.
pub fn read_get_response<R: Read>(reader: &mut R, request_id: i64) -> Result<Option<Vec<u8>>> {
    let response_len = read_response_length(reader)?;
    if response_len < RESPONSE_HEADER_LENGTH {
        return Err(RioritaError::Protocol(format!(
            "Expected at least {} bytes in response, but {} found [requestId={}]",
            RESPONSE_HEADER_LENGTH, response_len, request_id
        )));
    }

    let header = read_response_header(reader, request_id)?;

    if !header.verdict {
        if response_len != RESPONSE_HEADER_LENGTH {
            return Err(RioritaError::Protocol(format!(
                "Expected exactly {} bytes in response, but {} found [requestId={}]",
                RESPONSE_HEADER_LENGTH, response_len, request_id
            )));
        }
        return Ok(None);
    }

    // A hit must declare room for the value length, or we'd block reading past the frame
    let min_hit_len = RESPONSE_HEADER_LENGTH + LENGTH_FIELD_SIZE as u32;
    if response_len < min_hit_len {
        return Err(RioritaError::Protocol(format!(
            "Expected at least {} bytes in response with value, but {} found [requestId={}]",
            min_hit_len, response_len, request_id
        )));
    }

    let mut value_len = [0u8; LENGTH_FIELD_SIZE];
    reader.read_exact(&mut value_len)?;
    let value_len = i32::from_le_bytes(value_len);
    if value_len < 0 {
        return Err(RioritaError::Protocol(format!(
            "Expected positive length of value in response, but {} found [requestId={}]",
            value_len, request_id
        )));
    }

    let expected_len = RESPONSE_HEADER_LENGTH as u64 + LENGTH_FIELD_SIZE as u64 + value_len as u64;
    if response_len as u64 != expected_len {
        return Err(RioritaError::Protocol(format!(
            "Response length {} doesn't match value length {} (expected {}) [requestId={}]",
            response_len, value_len, expected_len, request_id
        )));
    }

    let mut value = vec![0u8; value_len as usize];
    reader.read_exact(&mut value)?;
    Ok(Some(value))
}

// =============================================================================
// Server-side helpers
// =============================================================================

/// Decode a complete request frame (length field included)
pub fn decode_request(bytes: &[u8]) -> Result<Request> {
    if bytes.len() < REQUEST_HEADER_SIZE {
        return Err(RioritaError::Protocol(format!(
            "Incomplete request header: expected {} bytes, got {}",
            REQUEST_HEADER_SIZE,
            bytes.len()
        )));
    }

    let mut buf = bytes;

    let declared_len = buf.get_u32_le() as usize;
    if declared_len != bytes.len() {
        return Err(RioritaError::Protocol(format!(
            "Request length mismatch: declared {}, got {}",
            declared_len,
            bytes.len()
        )));
    }

    let magic = buf.get_u8();
    if magic != MAGIC_BYTE {
        return Err(RioritaError::Protocol(format!(
            "Invalid magic: expected {}, found {}",
            MAGIC_BYTE, magic
        )));
    }

    let version = buf.get_u8();
    if version != PROTOCOL_VERSION {
        return Err(RioritaError::Protocol(format!(
            "Invalid protocol: expected {}, found {}",
            PROTOCOL_VERSION, version
        )));
    }

    let type_code = buf.get_u8();
    let op_type = OperationType::from_code(type_code).ok_or_else(|| {
        RioritaError::Protocol(format!("Unknown operation type: 0x{:02x}", type_code))
    })?;

    let request_id = buf.get_i64_le();

    let key_len = buf.get_u32_le() as usize;
    if buf.remaining() < key_len {
        return Err(RioritaError::Protocol(format!(
            "{} request: incomplete key (expected {}, got {})",
            op_type,
            key_len,
            buf.remaining()
        )));
    }
    let key = buf.copy_to_bytes(key_len).to_vec();

    let value = if op_type == OperationType::Put {
        if buf.remaining() < LENGTH_FIELD_SIZE {
            return Err(RioritaError::Protocol(
                "PUT request: missing value length".to_string(),
            ));
        }
        let value_len = buf.get_u32_le() as usize;
        if buf.remaining() != value_len {
            return Err(RioritaError::Protocol(format!(
                "PUT request: value length {} doesn't match remaining {} bytes",
                value_len,
                buf.remaining()
            )));
        }
        Some(buf.copy_to_bytes(value_len).to_vec())
    } else {
        None
    };

    if buf.has_remaining() {
        return Err(RioritaError::Protocol(format!(
            "{} request: {} unexpected trailing bytes",
            op_type,
            buf.remaining()
        )));
    }

    Ok(Request {
        op_type,
        request_id,
        key,
        value,
    })
}

/// Read a complete request from a stream
///
/// Blocks until a complete request is received or an error occurs
pub fn read_request<R: Read>(reader: &mut R) -> Result<Request> {
    let mut len = [0u8; LENGTH_FIELD_SIZE];
    reader.read_exact(&mut len)?;
    let total_len = u32::from_le_bytes(len);

    if total_len as usize > MAX_REQUEST_SIZE as usize || (total_len as usize) < REQUEST_HEADER_SIZE {
        return Err(RioritaError::Protocol(format!(
            "Invalid request length: {} bytes (min {}, max {})",
            total_len, REQUEST_HEADER_SIZE, MAX_REQUEST_SIZE
        )));
    }

    let mut frame = vec![0u8; total_len as usize];
    frame[..LENGTH_FIELD_SIZE].copy_from_slice(&len);
    reader.read_exact(&mut frame[LENGTH_FIELD_SIZE..])?;

    decode_request(&frame)
}

/// Encode a response frame
///
/// The value section is written only for a successful response with a value.
pub fn encode_response(response: &Response) -> Bytes {
    let value = match (&response.value, response.success && response.verdict) {
        (Some(v), true) => Some(v.as_slice()),
        _ => None,
    };

    let total_len = RESPONSE_HEADER_LENGTH as usize + value.map_or(0, |v| LENGTH_FIELD_SIZE + v.len());

    let mut frame = BytesMut::with_capacity(total_len);
    frame.put_u32_le(total_len as u32);
    frame.put_u8(MAGIC_BYTE);
    frame.put_u8(PROTOCOL_VERSION);
    frame.put_i64_le(response.request_id);
    frame.put_u8(response.success as u8);
    frame.put_u8(response.verdict as u8);

    if let Some(v) = value {
        frame.put_i32_le(v.len() as i32);
        frame.put_slice(v);
    }

    frame.freeze()
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    write_frame(writer, &encode_response(response))
}
