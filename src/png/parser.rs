//! Streaming PNG chunk reader and writer.
//!
//! Chunks are read one at a time from any `Read` and never buffered beyond the
//! chunk in hand. Stored CRCs are not checked on read; chunks pass through
//! exactly as they were found.

use std::io::{self, Read, Write};
use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use log::debug;
use super::{Chunk, ChunkHeader, ChunkType, MAX_CHUNK_LENGTH, PNG_SIGNATURE};
use crate::{StegoError, StegoResult};

/// Summary of one chunk, as shown by `--list`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSummary {
    pub chunk_type: ChunkType,
    pub length: u32,
    pub crc: u32,
    pub crc_valid: bool,
}

impl From<&Chunk> for ChunkSummary {
    fn from(chunk: &Chunk) -> Self {
        Self {
            chunk_type: chunk.chunk_type(),
            length: chunk.header.length,
            crc: chunk.crc,
            crc_valid: chunk.crc_matches(),
        }
    }
}

/// Fill as much of `buf` as the source allows, returning the byte count.
/// Only end of stream stops early; other errors propagate.
fn fill<R: Read>(source: &mut R, buf: &mut [u8]) -> StegoResult<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(StegoError::Read(e)),
        }
    }
    Ok(filled)
}

fn read_field<R: Read, const N: usize>(source: &mut R, field: &'static str) -> StegoResult<[u8; N]> {
    let mut buf = [0u8; N];
    let got = fill(source, &mut buf)?;
    if got != N {
        return Err(StegoError::Truncated { field, expected: N as u64, got: got as u64 });
    }
    Ok(buf)
}

/// Read the 8-byte signature and report whether it is the PNG magic
pub fn read_signature<R: Read>(source: &mut R) -> StegoResult<([u8; 8], bool)> {
    let signature: [u8; 8] = read_field(source, "signature")?;
    Ok((signature, signature == PNG_SIGNATURE))
}

/// Read the signature, failing with `SignatureInvalid` on mismatch
pub fn expect_signature<R: Read>(source: &mut R) -> StegoResult<[u8; 8]> {
    match read_signature(source)? {
        (signature, true) => Ok(signature),
        (found, false) => Err(StegoError::SignatureInvalid { found }),
    }
}

/// Read one chunk, or `None` if the stream ends cleanly before its length field.
///
/// A partial length field, or any short read after it, is `Truncated`.
pub fn try_read_chunk<R: Read>(source: &mut R) -> StegoResult<Option<Chunk>> {
    let mut length_bytes = [0u8; 4];
    match fill(source, &mut length_bytes)? {
        0 => return Ok(None),
        4 => {}
        got => {
            return Err(StegoError::Truncated {
                field: "chunk length",
                expected: 4,
                got: got as u64,
            });
        }
    }
    let length = BigEndian::read_u32(&length_bytes);

    let chunk_type = ChunkType(read_field(source, "chunk type")?);

    if length > MAX_CHUNK_LENGTH {
        return Err(StegoError::ChunkTooLarge { length });
    }

    // Grows with the bytes actually present, so a lying length cannot
    // force a huge allocation up front
    let mut data = Vec::new();
    source
        .by_ref()
        .take(u64::from(length))
        .read_to_end(&mut data)
        .map_err(StegoError::Read)?;
    if data.len() != length as usize {
        return Err(StegoError::Truncated {
            field: "chunk data",
            expected: u64::from(length),
            got: data.len() as u64,
        });
    }

    let crc = BigEndian::read_u32(&read_field::<_, 4>(source, "chunk CRC")?);

    debug!("read chunk {} ({} bytes, crc {:08x})", chunk_type, length, crc);

    Ok(Some(Chunk {
        header: ChunkHeader { length, chunk_type },
        data,
        crc,
    }))
}

/// Read one chunk; end of stream at any point is `Truncated`
pub fn read_chunk<R: Read>(source: &mut R) -> StegoResult<Chunk> {
    try_read_chunk(source)?.ok_or(StegoError::Truncated {
        field: "chunk length",
        expected: 4,
        got: 0,
    })
}

/// Whether any byte remains in `source`. Consumes at most one byte.
pub fn has_trailing_bytes<R: Read>(source: &mut R) -> StegoResult<bool> {
    let mut next = [0u8; 1];
    Ok(fill(source, &mut next)? > 0)
}

/// Serialize a chunk verbatim: length, type, data, CRC
pub fn write_chunk<W: Write>(sink: &mut W, chunk: &Chunk) -> StegoResult<()> {
    sink.write_u32::<BigEndian>(chunk.header.length).map_err(StegoError::Write)?;
    sink.write_all(chunk.header.chunk_type.as_bytes()).map_err(StegoError::Write)?;
    sink.write_all(&chunk.data).map_err(StegoError::Write)?;
    sink.write_u32::<BigEndian>(chunk.crc).map_err(StegoError::Write)?;
    Ok(())
}

/// Append a payload chunk built from already-obfuscated bytes.
///
/// Returns the chunk as written, with its freshly computed CRC.
pub fn append_payload_chunk<W: Write>(
    sink: &mut W,
    chunk_type: ChunkType,
    obfuscated: Vec<u8>,
) -> StegoResult<Chunk> {
    let chunk = Chunk::new(chunk_type, obfuscated)?;
    write_chunk(sink, &chunk)?;
    debug!("appended {} chunk ({} bytes, crc {:08x})", chunk_type, chunk.header.length, chunk.crc);
    Ok(chunk)
}

/// Visit every chunk up to and including `IEND`, returning how many were seen.
/// Each chunk is dropped once `visit` returns.
pub fn walk_through_iend<R, F>(source: &mut R, mut visit: F) -> StegoResult<usize>
where
    R: Read,
    F: FnMut(&Chunk) -> StegoResult<()>,
{
    let mut count = 0;
    loop {
        let chunk = read_chunk(source)?;
        visit(&chunk)?;
        count += 1;
        if chunk.chunk_type().is_iend() {
            return Ok(count);
        }
    }
}

/// List every chunk of a PNG stream, including one trailing chunk after `IEND`
pub fn scan_chunks<R: Read>(source: &mut R) -> StegoResult<Vec<ChunkSummary>> {
    expect_signature(source)?;

    let mut summaries = Vec::new();
    walk_through_iend(source, |chunk| {
        summaries.push(ChunkSummary::from(chunk));
        Ok(())
    })?;

    if let Some(trailing) = try_read_chunk(source)? {
        summaries.push(ChunkSummary::from(&trailing));
    }

    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use crate::png::{IEND, PAYLOAD_CHUNK_TYPE};

    fn encode(chunk: &Chunk) -> Vec<u8> {
        let mut out = Vec::new();
        write_chunk(&mut out, chunk).unwrap();
        out
    }

    fn minimal_png() -> Vec<u8> {
        let mut png = PNG_SIGNATURE.to_vec();
        png.extend(encode(&Chunk::new(ChunkType(*b"IHDR"), vec![0, 0, 0, 1, 0, 0, 0, 1, 8, 2, 0, 0, 0]).unwrap()));
        png.extend(encode(&Chunk::new(IEND, Vec::new()).unwrap()));
        png
    }

    /// Sink that accepts a fixed number of bytes and then refuses
    struct FullSink {
        room: usize,
    }

    impl Write for FullSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.room == 0 {
                return Err(io::Error::new(io::ErrorKind::Other, "sink full"));
            }
            let n = buf.len().min(self.room);
            self.room -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_signature_valid() {
        let (sig, valid) = read_signature(&mut Cursor::new(PNG_SIGNATURE)).unwrap();
        assert_eq!(sig, PNG_SIGNATURE);
        assert!(valid);
    }

    #[test]
    fn test_signature_mismatch_reported() {
        let bytes = *b"GIF89a\0\0";
        let (sig, valid) = read_signature(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(sig, bytes);
        assert!(!valid);

        let result = expect_signature(&mut Cursor::new(bytes));
        assert!(matches!(result, Err(StegoError::SignatureInvalid { found }) if found == bytes));
    }

    #[test]
    fn test_signature_truncated() {
        let result = read_signature(&mut Cursor::new(&PNG_SIGNATURE[..5]));
        assert!(matches!(
            result,
            Err(StegoError::Truncated { field: "signature", expected: 8, got: 5 })
        ));
    }

    #[test]
    fn test_chunk_wire_layout() {
        let chunk = Chunk::new(PAYLOAD_CHUNK_TYPE, vec![0xC7, 0xC6]).unwrap();
        let bytes = encode(&chunk);
        assert_eq!(&bytes[0..4], &[0, 0, 0, 2]);
        assert_eq!(&bytes[4..8], b"inFo");
        assert_eq!(&bytes[8..10], &[0xC7, 0xC6]);
        assert_eq!(&bytes[10..14], &crate::crc::crc32(b"inFo\xC7\xC6").to_be_bytes());
        assert_eq!(bytes.len(), 14);
    }

    #[test]
    fn test_read_preserves_bad_crc() {
        let mut chunk = Chunk::new(ChunkType(*b"tEXt"), b"key\0value".to_vec()).unwrap();
        chunk.crc = 0xDEAD_BEEF;
        let read = read_chunk(&mut Cursor::new(encode(&chunk))).unwrap();
        assert_eq!(read, chunk);
        assert_eq!(encode(&read), encode(&chunk));
    }

    #[test]
    fn test_clean_end_is_none() {
        assert!(try_read_chunk(&mut Cursor::new(Vec::<u8>::new())).unwrap().is_none());
        assert!(matches!(
            read_chunk(&mut Cursor::new(Vec::<u8>::new())),
            Err(StegoError::Truncated { field: "chunk length", got: 0, .. })
        ));
    }

    #[test]
    fn test_partial_length_is_truncated() {
        let result = try_read_chunk(&mut Cursor::new(vec![0, 0]));
        assert!(matches!(
            result,
            Err(StegoError::Truncated { field: "chunk length", expected: 4, got: 2 })
        ));
    }

    #[test]
    fn test_short_data_is_truncated() {
        let mut bytes = encode(&Chunk::new(ChunkType(*b"IDAT"), vec![7; 16]).unwrap());
        bytes.truncate(8 + 10);
        let result = read_chunk(&mut Cursor::new(bytes));
        assert!(matches!(
            result,
            Err(StegoError::Truncated { field: "chunk data", expected: 16, got: 10 })
        ));
    }

    #[test]
    fn test_missing_crc_is_truncated() {
        let mut bytes = encode(&Chunk::new(IEND, Vec::new()).unwrap());
        bytes.truncate(10);
        let result = read_chunk(&mut Cursor::new(bytes));
        assert!(matches!(result, Err(StegoError::Truncated { field: "chunk CRC", got: 2, .. })));
    }

    #[test]
    fn test_oversized_length_rejected() {
        let mut bytes = 0x8000_0000u32.to_be_bytes().to_vec();
        bytes.extend_from_slice(b"IDAT");
        let result = read_chunk(&mut Cursor::new(bytes));
        assert!(matches!(result, Err(StegoError::ChunkTooLarge { length: 0x8000_0000 })));
    }

    #[test]
    fn test_lying_length_is_truncated_not_allocated() {
        let mut bytes = MAX_CHUNK_LENGTH.to_be_bytes().to_vec();
        bytes.extend_from_slice(b"IDAT");
        bytes.extend_from_slice(&[1, 2, 3]);
        let result = read_chunk(&mut Cursor::new(bytes));
        assert!(matches!(result, Err(StegoError::Truncated { field: "chunk data", got: 3, .. })));
    }

    #[test]
    fn test_write_error_propagates() {
        let chunk = Chunk::new(ChunkType(*b"IDAT"), vec![0; 32]).unwrap();
        let result = write_chunk(&mut FullSink { room: 10 }, &chunk);
        assert!(matches!(result, Err(StegoError::Write(_))));
    }

    #[test]
    fn test_append_payload_chunk() {
        let mut out = Vec::new();
        let chunk = append_payload_chunk(&mut out, PAYLOAD_CHUNK_TYPE, vec![0xC7, 0xC6]).unwrap();
        assert_eq!(chunk.crc, crate::crc::crc32(b"inFo\xC7\xC6"));
        assert_eq!(out, encode(&chunk));
    }

    #[test]
    fn test_walk_stops_at_iend() {
        let mut png = minimal_png();
        png.extend_from_slice(b"trailing");
        let mut cursor = Cursor::new(png);
        expect_signature(&mut cursor).unwrap();

        let mut types = Vec::new();
        let count = walk_through_iend(&mut cursor, |chunk| {
            types.push(chunk.chunk_type());
            Ok(())
        })
        .unwrap();

        assert_eq!(count, 2);
        assert_eq!(types, vec![ChunkType(*b"IHDR"), IEND]);

        let mut rest = Vec::new();
        cursor.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"trailing");
    }

    #[test]
    fn test_trailing_bytes() {
        assert!(!has_trailing_bytes(&mut Cursor::new(Vec::<u8>::new())).unwrap());
        assert!(has_trailing_bytes(&mut Cursor::new(vec![0u8])).unwrap());
    }

    #[test]
    fn test_walk_without_iend_is_truncated() {
        let mut png = PNG_SIGNATURE.to_vec();
        png.extend(encode(&Chunk::new(ChunkType(*b"IHDR"), vec![0; 13]).unwrap()));
        let mut cursor = Cursor::new(png);
        expect_signature(&mut cursor).unwrap();
        let result = walk_through_iend(&mut cursor, |_| Ok(()));
        assert!(matches!(result, Err(StegoError::Truncated { .. })));
    }

    #[test]
    fn test_scan_chunks() {
        let mut png = minimal_png();
        let mut bad = Chunk::new(PAYLOAD_CHUNK_TYPE, vec![1, 2, 3]).unwrap();
        bad.crc = 0;
        png.extend(encode(&bad));

        let summaries = scan_chunks(&mut Cursor::new(png)).unwrap();
        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries[0].chunk_type, ChunkType(*b"IHDR"));
        assert_eq!(summaries[0].length, 13);
        assert!(summaries[1].crc_valid);
        assert_eq!(summaries[1].crc, 0xAE42_6082);
        assert_eq!(summaries[2].chunk_type, PAYLOAD_CHUNK_TYPE);
        assert!(!summaries[2].crc_valid);
    }
}
