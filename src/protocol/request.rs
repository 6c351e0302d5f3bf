//! Request definitions
//!
//! Represents requests sent to the server.

use std::fmt;

use bytes::Bytes;

use crate::error::Result;
use super::codec::encode_request;

/// Operation types, encoded on the wire as a single byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OperationType {
    Ping = 0x01,
    Has = 0x02,
    Get = 0x03,
    Put = 0x04,
    Delete = 0x05,
}

impl OperationType {
    /// Wire code for this operation
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Parse a wire code
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(OperationType::Ping),
            0x02 => Some(OperationType::Has),
            0x03 => Some(OperationType::Get),
            0x04 => Some(OperationType::Put),
            0x05 => Some(OperationType::Delete),
            _ => None,
        }
    }

    /// Upper-case name used in log lines
    pub fn name(self) -> &'static str {
        match self {
            OperationType::Ping => "PING",
            OperationType::Has => "HAS",
            OperationType::Get => "GET",
            OperationType::Put => "PUT",
            OperationType::Delete => "DELETE",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single request frame before encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Operation type
    pub op_type: OperationType,

    /// Correlates the response with this request on one connection
    pub request_id: i64,

    /// Key bytes (already namespaced); empty for PING
    pub key: Vec<u8>,

    /// Value bytes, only for PUT
    pub value: Option<Vec<u8>>,
}

impl Request {
    pub fn ping(request_id: i64) -> Self {
        Self {
            op_type: OperationType::Ping,
            request_id,
            key: Vec::new(),
            value: None,
        }
    }

    pub fn has(request_id: i64, key: impl Into<Vec<u8>>) -> Self {
        Self::keyed(OperationType::Has, request_id, key.into())
    }

    pub fn get(request_id: i64, key: impl Into<Vec<u8>>) -> Self {
        Self::keyed(OperationType::Get, request_id, key.into())
    }

    pub fn delete(request_id: i64, key: impl Into<Vec<u8>>) -> Self {
        Self::keyed(OperationType::Delete, request_id, key.into())
    }

    pub fn put(request_id: i64, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            op_type: OperationType::Put,
            request_id,
            key: key.into(),
            value: Some(value.into()),
        }
    }

    fn keyed(op_type: OperationType, request_id: i64, key: Vec<u8>) -> Self {
        Self {
            op_type,
            request_id,
            key,
            value: None,
        }
    }

    /// Encode into a complete wire frame
    pub fn encode(&self) -> Result<Bytes> {
        encode_request(
            self.op_type,
            self.request_id,
            &self.key,
            self.value.as_deref(),
        )
    }

    /// Payload size reported in timing logs (key + value bytes)
    pub fn payload_size(&self) -> usize {
        self.key.len() + self.value.as_ref().map_or(0, Vec::len)
    }
}
