// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compressed blob storage for activity inputs, outputs, and snapshots
//! (spec §3, §6).
//!
//! Payloads are JSON-serialized then zlib-compressed (spec §6 mandates
//! zlib, default level 6); the row only ever stores the compressed bytes.

use crate::config::EngineConfig;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{Read, Write};

/// Compressed, opaque bytes as stored on an activity row. Kept distinct from
/// `Vec<u8>` so callers can't accidentally treat compressed bytes as plain
/// JSON.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompressedBlob(Vec<u8>);

impl CompressedBlob {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Serialize `value` to JSON and zlib-compress it at `config`'s configured
/// level (spec §6).
pub fn compress<T: Serialize>(value: &T, config: &EngineConfig) -> Result<CompressedBlob, BlobError> {
    let json = serde_json::to_vec(value).map_err(BlobError::Serialize)?;
    let mut encoder =
        ZlibEncoder::new(Vec::new(), Compression::new(config.blob_compression_level()));
    encoder.write_all(&json).map_err(BlobError::Io)?;
    let compressed = encoder.finish().map_err(BlobError::Io)?;
    Ok(CompressedBlob(compressed))
}

/// Inverse of [`compress`]: zlib-decompress then JSON-deserialize.
pub fn decompress<T: DeserializeOwned>(blob: &CompressedBlob) -> Result<T, BlobError> {
    let mut decoder = ZlibDecoder::new(blob.0.as_slice());
    let mut json = Vec::new();
    decoder.read_to_end(&mut json).map_err(BlobError::Io)?;
    serde_json::from_slice(&json).map_err(BlobError::Deserialize)
}

#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("failed to serialize blob payload: {0}")]
    Serialize(serde_json::Error),
    #[error("failed to deserialize blob payload: {0}")]
    Deserialize(serde_json::Error),
    #[error("zlib (de)compression failed: {0}")]
    Io(std::io::Error),
}

#[cfg(test)]
#[path = "blob_tests.rs"]
mod tests;
