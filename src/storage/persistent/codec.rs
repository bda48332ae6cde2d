//! Framing codec for the record log.
//!
//! Each frame is
//!
//! ```text
//! [version: 1 byte][length: 4 bytes LE][row: N bytes JSON][crc32: 4 bytes LE]
//! ```
//!
//! and the file starts with `[MAGIC: 4 bytes][version: 1 byte]`.

use std::io::{Error as IoError, ErrorKind, Read, Result as IoResult, Write};

use crc32fast::Hasher;
use serde::{de::DeserializeOwned, Serialize};

/// Current frame version.
pub const CODEC_VERSION: u8 = 1;

/// Magic bytes identifying a heatquiz record log.
pub const MAGIC: [u8; 4] = *b"HQRL";

/// Length of the file header in bytes.
pub const HEADER_LEN: u64 = 5;

/// Bytes a frame adds around its payload: version, length and crc32.
pub const FRAME_OVERHEAD: usize = 1 + 4 + 4;

/// Upper bound on a single frame's payload.
const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

fn invalid(message: String) -> IoError {
    IoError::new(ErrorKind::InvalidData, message)
}

fn checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Encodes a value into one frame.
pub fn encode_frame<T: Serialize>(value: &T) -> IoResult<Vec<u8>> {
    let data = serde_json::to_vec(value).map_err(|e| invalid(format!("serialization failed: {e}")))?;
    let len = u32::try_from(data.len())
        .ok()
        .filter(|&n| n as usize <= MAX_FRAME_SIZE)
        .ok_or_else(|| invalid(format!("frame of {} bytes exceeds maximum {MAX_FRAME_SIZE}", data.len())))?;

    let mut out = Vec::with_capacity(FRAME_OVERHEAD + data.len());
    out.push(CODEC_VERSION);
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&data);
    out.extend_from_slice(&checksum(&data).to_le_bytes());
    Ok(out)
}

/// Decodes one frame, verifying its checksum.
///
/// A frame cut short by the end of input yields `ErrorKind::UnexpectedEof`;
/// every other problem yields `ErrorKind::InvalidData`.
pub fn decode_frame<T: DeserializeOwned>(reader: &mut impl Read) -> IoResult<T> {
    let mut version = [0u8; 1];
    reader.read_exact(&mut version)?;
    if version[0] != CODEC_VERSION {
        return Err(invalid(format!(
            "unsupported frame version: {} (expected {CODEC_VERSION})",
            version[0]
        )));
    }

    let mut len_bytes = [0u8; 4];
    reader.read_exact(&mut len_bytes)?;
    let len = u32::from_le_bytes(len_bytes) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(invalid(format!("frame size {len} exceeds maximum {MAX_FRAME_SIZE}")));
    }

    let mut data = vec![0u8; len];
    reader.read_exact(&mut data)?;

    let mut crc_bytes = [0u8; 4];
    reader.read_exact(&mut crc_bytes)?;
    let stored = u32::from_le_bytes(crc_bytes);
    let computed = checksum(&data);
    if stored != computed {
        return Err(invalid(format!(
            "CRC mismatch: stored={stored:08x}, computed={computed:08x} (data corrupted)"
        )));
    }

    serde_json::from_slice(&data).map_err(|e| invalid(format!("deserialization failed: {e}")))
}

/// Returns true if `bytes` starts with a whole frame whose checksum matches.
///
/// Only the framing is checked; the payload is not deserialized.
pub fn starts_with_frame(bytes: &[u8]) -> bool {
    let Some((&version, rest)) = bytes.split_first() else {
        return false;
    };
    if version != CODEC_VERSION || rest.len() < 8 {
        return false;
    }

    let len = u32::from_le_bytes([rest[0], rest[1], rest[2], rest[3]]) as usize;
    if len > MAX_FRAME_SIZE || rest.len() < 8 + len {
        return false;
    }

    let data = &rest[4..4 + len];
    let stored = u32::from_le_bytes([rest[4 + len], rest[5 + len], rest[6 + len], rest[7 + len]]);
    stored == checksum(data)
}

/// Write the file header.
pub fn write_header(writer: &mut impl Write) -> IoResult<()> {
    writer.write_all(&MAGIC)?;
    writer.write_all(&[CODEC_VERSION])
}

/// Read and validate the file header, returning its version.
pub fn read_header(reader: &mut impl Read) -> IoResult<u8> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(invalid(format!(
            "invalid magic bytes: expected {MAGIC:?}, got {magic:?}"
        )));
    }

    let mut version = [0u8; 1];
    reader.read_exact(&mut version)?;
    Ok(version[0])
}
