use std::collections::BTreeMap;

use super::commands::CommandId;
use super::crc::crc16;
use crate::error::{Error, Result};

/// Magic byte at the start of every Huawei SPP frame.
pub const MAGIC: u8 = 0x5A;

/// Header (magic + length + reserved) plus CRC trailer.
const HEADER_LEN: usize = 4;
const TRAILER_LEN: usize = 2;

/// Largest length field accepted when splitting a byte stream.
const MAX_STREAM_LENGTH: usize = 1000;

/// A Huawei SPP protocol frame.
///
/// Wire format:
/// ```text
/// [0x5A] [length: 2 bytes BE] [0x00] [command_id: 2 bytes] [TLV params...] [CRC16: 2 bytes]
/// ```
///
/// Where `length` = size of (command_id + params) + 1.
/// TLV param: [key: 1 byte] [length: 1 byte] [value: `length` bytes]
///
/// Parameters are kept ordered by key, which is also the order they go on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command_id: CommandId,
    pub parameters: BTreeMap<u8, Vec<u8>>,
}

impl Frame {
    /// Create a new frame with the given command ID and no parameters.
    pub fn new(command_id: CommandId) -> Self {
        Self {
            command_id,
            parameters: BTreeMap::new(),
        }
    }

    /// Build a read request: command + empty-value parameters for the given keys.
    pub fn read_request(command_id: CommandId, keys: &[u8]) -> Self {
        let mut frame = Self::new(command_id);
        for &k in keys {
            frame.parameters.insert(k, Vec::new());
        }
        frame
    }

    /// Build a write request with the given parameter values.
    pub fn write_request(command_id: CommandId, params: &[(u8, Vec<u8>)]) -> Self {
        let mut frame = Self::new(command_id);
        for (k, v) in params {
            frame.parameters.insert(*k, v.clone());
        }
        frame
    }

    /// Get a parameter value if present.
    pub fn param(&self, key: u8) -> Option<&[u8]> {
        self.parameters.get(&key).map(|v| v.as_slice())
    }

    /// Convenience: get a parameter value, returning empty slice if not present.
    pub fn find_param(&self, key: u8) -> &[u8] {
        self.param(key).unwrap_or(&[])
    }

    /// Serialize this frame for transmission.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut body = Vec::new();
        body.extend_from_slice(&self.command_id.to_be_bytes());
        for (&key, value) in &self.parameters {
            let len = u8::try_from(value.len()).map_err(|_| {
                Error::invalid(format!(
                    "parameter {} is {} bytes (max 255)",
                    key,
                    value.len()
                ))
            })?;
            body.push(key);
            body.push(len);
            body.extend_from_slice(value);
        }

        let length = u16::try_from(body.len() + 1)
            .map_err(|_| Error::invalid(format!("frame body too large: {} bytes", body.len())))?;

        let mut result = Vec::with_capacity(HEADER_LEN + body.len() + TRAILER_LEN);
        result.push(MAGIC);
        result.extend_from_slice(&length.to_be_bytes());
        result.push(0x00);
        result.extend_from_slice(&body);

        let crc = crc16(&result);
        result.extend_from_slice(&crc.to_be_bytes());
        Ok(result)
    }

    /// Parse and validate a complete frame.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < 6 || data[0] != MAGIC || data[3] != 0x00 {
            return Err(Error::MalformedHeader);
        }

        let end = data.len() - TRAILER_LEN;
        let computed = crc16(&data[..end]);
        let received = u16::from_be_bytes([data[end], data[end + 1]]);
        if computed != received {
            return Err(Error::ChecksumMismatch { computed, received });
        }

        let mut frame = Self::new(u16::from_be_bytes([data[4], data[5]]));

        let mut pos = 6;
        while pos < end {
            let key = data[pos];
            if pos + 1 >= end {
                return Err(Error::TruncatedParameter {
                    key,
                    len: 0,
                    offset: pos,
                });
            }
            let len = data[pos + 1] as usize;
            let value_end = pos + 2 + len;
            if value_end > end {
                return Err(Error::TruncatedParameter {
                    key,
                    len,
                    offset: pos,
                });
            }
            frame.parameters.insert(key, data[pos + 2..value_end].to_vec());
            pos = value_end;
        }

        Ok(frame)
    }
}

impl std::fmt::Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cmd={:04X}", self.command_id)?;
        for (&k, v) in &self.parameters {
            write!(f, " p{}={}", k, hex::encode(v))?;
        }
        Ok(())
    }
}

/// Remove every complete frame from the front of a receive buffer.
///
/// Bytes that cannot start a frame are dropped until the next magic byte. A
/// trailing partial frame stays in `buf` for the next read.
pub fn extract_frames(buf: &mut Vec<u8>) -> Vec<Vec<u8>> {
    let mut frames = Vec::new();
    let mut pos = 0;

    while pos < buf.len() {
        if buf[pos] != MAGIC {
            pos += 1;
            continue;
        }
        if buf.len() - pos < HEADER_LEN {
            break;
        }
        let length = u16::from_be_bytes([buf[pos + 1], buf[pos + 2]]) as usize;
        if buf[pos + 3] != 0x00 || !(3..=MAX_STREAM_LENGTH).contains(&length) {
            tracing::warn!(
                "Invalid frame header at offset {} (length={}), resyncing",
                pos,
                length
            );
            pos += 1;
            continue;
        }
        // length counts the reserved byte, which is already part of the header
        let total = HEADER_LEN + (length - 1) + TRAILER_LEN;
        if buf.len() - pos < total {
            break;
        }
        frames.push(buf[pos..pos + total].to_vec());
        pos += total;
    }

    buf.drain(..pos);
    frames
}

/// Lowercase hex for log output.
pub(crate) mod hex {
    pub fn encode(data: &[u8]) -> String {
        data.iter().map(|b| format!("{:02x}", b)).collect()
    }
}
