//! # PNG Payload Stego Tool
//!
//! This library hides an arbitrary payload inside a PNG image by appending a
//! custom `inFo` chunk after the image's `IEND` chunk, and recovers it again.
//!
//! Every chunk of the source image is copied through byte-for-byte. The appended
//! chunk carries a correct CRC-32, so structurally it looks like any other PNG
//! chunk. The payload bytes are XORed with a single-byte key; this is light
//! obfuscation only and offers no confidentiality.

// Public API exports
pub mod cipher;
pub mod cli;
pub mod crc;
pub mod png;
pub mod stego;

pub use png::parser::scan_chunks;
pub use stego::{Extraction, extract, inject};

use png::ChunkType;
use std::io;

/// Result type alias for stego operations
pub type StegoResult<T> = Result<T, StegoError>;

/// Error type for chunk-stream and orchestration failures
#[derive(Debug, thiserror::Error)]
pub enum StegoError {
    #[error("not a PNG image: signature is {found:02x?}")]
    SignatureInvalid { found: [u8; 8] },

    #[error("truncated {field}: expected {expected} bytes, got {got}")]
    Truncated {
        field: &'static str,
        expected: u64,
        got: u64,
    },

    #[error("read failed: {0}")]
    Read(#[source] io::Error),

    #[error("write failed: {0}")]
    Write(#[source] io::Error),

    #[error("chunk declares {length} data bytes, more than a PNG chunk may hold")]
    ChunkTooLarge { length: u32 },

    #[error("payload of {length} bytes does not fit in a single PNG chunk")]
    PayloadTooLarge { length: u64 },
}

/// Tunables shared by injection and extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StegoConfig {
    /// XOR key applied to the payload bytes
    pub key: u8,
    /// Type tag of the appended payload chunk
    pub chunk_type: ChunkType,
}

impl Default for StegoConfig {
    fn default() -> Self {
        Self {
            key: cipher::DEFAULT_KEY,
            chunk_type: png::PAYLOAD_CHUNK_TYPE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StegoConfig::default();
        assert_eq!(config.key, 0xAF);
        assert_eq!(config.chunk_type.as_bytes(), b"inFo");
    }

    #[test]
    fn test_error_messages() {
        let err = StegoError::Truncated { field: "chunk data", expected: 10, got: 3 };
        assert_eq!(err.to_string(), "truncated chunk data: expected 10 bytes, got 3");

        let err = StegoError::SignatureInvalid { found: [0; 8] };
        assert!(err.to_string().starts_with("not a PNG image"));
    }
}
