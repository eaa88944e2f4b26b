// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Message header (`magic + version + encoding`) and payload encodings.

use crate::config::{FORMAT_VERSION, HEADER_LEN, MAGIC};
use crate::error::{Result, SerializationError};
use std::fmt;

/// Optional compression applied to the message body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Encoding {
    /// Raw body.
    Plain,
    /// DEFLATE-compressed body (`deflate` feature).
    Deflate,
}

impl Encoding {
    pub const fn to_u8(self) -> u8 {
        match self {
            Encoding::Plain => 0,
            Encoding::Deflate => 1,
        }
    }

    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Encoding::Plain),
            1 => Ok(Encoding::Deflate),
            other => Err(SerializationError::UnsupportedEncoding {
                encoding: format!("{:#04x}", other),
            }),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Plain => write!(f, "plain"),
            Encoding::Deflate => write!(f, "deflate"),
        }
    }
}

/// Parsed message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u8,
    pub encoding: Encoding,
}

impl Header {
    pub const fn current(encoding: Encoding) -> Self {
        Self {
            version: FORMAT_VERSION,
            encoding,
        }
    }

    pub fn to_bytes(self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[..MAGIC.len()].copy_from_slice(&MAGIC);
        bytes[MAGIC.len()] = self.version;
        bytes[MAGIC.len() + 1] = self.encoding.to_u8();
        bytes
    }

    /// Split `bytes` into the header and the (still encoded) body.
    pub fn parse(bytes: &[u8]) -> Result<(Self, &[u8])> {
        if bytes.len() < HEADER_LEN {
            return Err(SerializationError::malformed(format!(
                "message shorter than header ({} < {} bytes)",
                bytes.len(),
                HEADER_LEN
            )));
        }
        if bytes[..MAGIC.len()] != MAGIC {
            return Err(SerializationError::malformed("bad magic"));
        }
        let version = bytes[MAGIC.len()];
        if version != FORMAT_VERSION {
            return Err(SerializationError::malformed(format!(
                "unsupported format version {}",
                version
            )));
        }
        let encoding = Encoding::from_u8(bytes[MAGIC.len() + 1])?;
        Ok((Self { version, encoding }, &bytes[HEADER_LEN..]))
    }
}

/// Returns true if `bytes` starts with the graphser magic (any version).
pub fn has_magic(bytes: &[u8]) -> bool {
    bytes.len() >= MAGIC.len() && bytes[..MAGIC.len()] == MAGIC
}

/// Apply `encoding` to a message body.
pub fn encode_body(encoding: Encoding, body: Vec<u8>) -> Result<Vec<u8>> {
    match encoding {
        Encoding::Plain => Ok(body),
        Encoding::Deflate => deflate(&body),
    }
}

/// Undo `encoding`, refusing bodies larger than `limit` once decoded.
pub fn decode_body(encoding: Encoding, body: &[u8], limit: usize) -> Result<Vec<u8>> {
    let decoded = match encoding {
        Encoding::Plain => body.to_vec(),
        Encoding::Deflate => inflate(body, limit)?,
    };
    if decoded.len() > limit {
        return Err(SerializationError::malformed(format!(
            "message body of {} bytes exceeds limit {}",
            decoded.len(),
            limit
        )));
    }
    Ok(decoded)
}

#[cfg(feature = "deflate")]
fn deflate(body: &[u8]) -> Result<Vec<u8>> {
    use flate2::write::DeflateEncoder;
    use flate2::Compression;
    use std::io::Write;

    let failed = |e: std::io::Error| SerializationError::UnsupportedEncoding {
        encoding: format!("deflate: {}", e),
    };
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(body).map_err(failed)?;
    encoder.finish().map_err(failed)
}

#[cfg(feature = "deflate")]
fn inflate(body: &[u8], limit: usize) -> Result<Vec<u8>> {
    use flate2::read::DeflateDecoder;
    use std::io::Read;

    let mut decoded = Vec::new();
    // One byte past the limit is enough to detect an oversized body.
    let cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
    DeflateDecoder::new(body)
        .take(cap)
        .read_to_end(&mut decoded)
        .map_err(|e| SerializationError::malformed(format!("corrupt deflate body: {}", e)))?;
    Ok(decoded)
}

#[cfg(not(feature = "deflate"))]
fn deflate(_body: &[u8]) -> Result<Vec<u8>> {
    Err(SerializationError::UnsupportedEncoding {
        encoding: "deflate (feature disabled)".into(),
    })
}

#[cfg(not(feature = "deflate"))]
fn inflate(_body: &[u8], _limit: usize) -> Result<Vec<u8>> {
    deflate(&[])
}
