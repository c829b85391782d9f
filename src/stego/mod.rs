//! Injection and extraction flows

use std::io::{Read, Write};
use log::{debug, info, warn};
use crate::cipher;
use crate::png::parser::{
    append_payload_chunk, expect_signature, has_trailing_bytes, try_read_chunk, walk_through_iend,
    write_chunk,
};
use crate::{StegoConfig, StegoError, StegoResult};

/// What an injection wrote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectReport {
    /// Chunks copied from the source image, `IEND` included
    pub chunks_copied: usize,
    pub payload_len: u32,
    /// CRC of the appended payload chunk
    pub payload_crc: u32,
}

/// Outcome of an extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Recovered, de-obfuscated payload bytes
    Payload(Vec<u8>),
    /// The stream ended cleanly right after `IEND`
    NoPayloadPresent,
}

impl Extraction {
    pub fn into_payload(self) -> Option<Vec<u8>> {
        match self {
            Extraction::Payload(data) => Some(data),
            Extraction::NoPayloadPresent => None,
        }
    }
}

/// Copy `image` to `out` and append `payload` as an obfuscated chunk after `IEND`.
///
/// The signature is checked before anything is written, so a non-PNG source
/// leaves `out` untouched. Any later failure may leave `out` partially written.
pub fn inject<R, P, W>(
    image: &mut R,
    payload: &mut P,
    out: &mut W,
    config: &StegoConfig,
) -> StegoResult<InjectReport>
where
    R: Read,
    P: Read,
    W: Write,
{
    let signature = expect_signature(image)?;
    out.write_all(&signature).map_err(StegoError::Write)?;

    let chunks_copied = walk_through_iend(image, |chunk| write_chunk(&mut *out, chunk))?;
    debug!("copied {} chunks through IEND", chunks_copied);

    let mut data = Vec::new();
    payload.read_to_end(&mut data).map_err(StegoError::Read)?;
    cipher::xor_in_place(&mut data, config.key);

    let chunk = append_payload_chunk(out, config.chunk_type, data)?;
    out.flush().map_err(StegoError::Write)?;

    info!(
        "injected {} payload bytes as {} chunk after {} chunks",
        chunk.header.length, config.chunk_type, chunks_copied
    );

    Ok(InjectReport {
        chunks_copied,
        payload_len: chunk.header.length,
        payload_crc: chunk.crc,
    })
}

/// Recover the payload chunk that follows `IEND`, if there is one.
///
/// The trailing chunk is taken whatever its type; a type other than the
/// configured one, or a CRC mismatch, is only logged.
pub fn extract<R: Read>(image: &mut R, config: &StegoConfig) -> StegoResult<Extraction> {
    expect_signature(image)?;

    let skipped = walk_through_iend(image, |_| Ok(()))?;
    debug!("skipped {} chunks through IEND", skipped);

    let Some(chunk) = try_read_chunk(image)? else {
        info!("no chunk after IEND");
        return Ok(Extraction::NoPayloadPresent);
    };

    if chunk.chunk_type() != config.chunk_type {
        warn!(
            "chunk after IEND is {}, expected {}; decoding it anyway",
            chunk.chunk_type(),
            config.chunk_type
        );
    }
    if !chunk.crc_matches() {
        warn!(
            "payload chunk CRC mismatch: stored {:08x}, computed {:08x}",
            chunk.crc,
            chunk.computed_crc()
        );
    }

    if has_trailing_bytes(image)? {
        warn!("ignoring bytes after the payload chunk");
    }

    let mut data = chunk.data;
    cipher::xor_in_place(&mut data, config.key);
    info!("extracted {} payload bytes", data.len());

    Ok(Extraction::Payload(data))
}
