//! PNG chunk types and constants

pub mod parser;

use std::fmt;
use crate::crc;
use crate::{StegoError, StegoResult};

/// PNG file signature
pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Largest data length a PNG chunk may declare (2^31 - 1)
pub const MAX_CHUNK_LENGTH: u32 = i32::MAX as u32;

/// Terminal chunk of a PNG stream
pub const IEND: ChunkType = ChunkType(*b"IEND");

/// Chunk type used for the hidden payload
pub const PAYLOAD_CHUNK_TYPE: ChunkType = ChunkType(*b"inFo");

/// Four-byte chunk type tag. The PNG case conventions are not enforced.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkType(pub [u8; 4]);

impl ChunkType {
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    pub fn is_iend(&self) -> bool {
        *self == IEND
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkType({:?})", String::from_utf8_lossy(&self.0))
    }
}

/// Length and type, the first eight bytes of every chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub length: u32, // Data bytes only, excluding header and CRC
    pub chunk_type: ChunkType,
}

/// PNG chunk structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub header: ChunkHeader,
    pub data: Vec<u8>,
    pub crc: u32,
}

impl Chunk {
    /// Build a chunk around `data`, computing its length and CRC
    pub fn new(chunk_type: ChunkType, data: Vec<u8>) -> StegoResult<Self> {
        let length = u32::try_from(data.len())
            .ok()
            .filter(|&len| len <= MAX_CHUNK_LENGTH)
            .ok_or(StegoError::PayloadTooLarge { length: data.len() as u64 })?;
        let crc = chunk_crc(chunk_type, &data);

        Ok(Self {
            header: ChunkHeader { length, chunk_type },
            data,
            crc,
        })
    }

    pub fn chunk_type(&self) -> ChunkType {
        self.header.chunk_type
    }

    /// CRC over type and data, regardless of the stored value
    pub fn computed_crc(&self) -> u32 {
        chunk_crc(self.header.chunk_type, &self.data)
    }

    pub fn crc_matches(&self) -> bool {
        self.computed_crc() == self.crc
    }
}

/// CRC32 of `type || data`, as stored in a chunk trailer
pub fn chunk_crc(chunk_type: ChunkType, data: &[u8]) -> u32 {
    let mut hasher = crc::Hasher::new();
    hasher.update(chunk_type.as_bytes());
    hasher.update(data);
    hasher.finalize()
}
