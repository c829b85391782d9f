//! CRC-32 as used by PNG chunks (IEEE 802.3, reflected polynomial 0xEDB88320)

/// Reflected CRC-32 polynomial
pub const POLYNOMIAL: u32 = 0xEDB8_8320;

/// Lookup table for all 8-bit messages, built at compile time
pub const CRC_TABLE: [u32; 256] = make_crc_table();

const fn make_crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut n = 0;
    while n < 256 {
        let mut c = n as u32;
        let mut k = 0;
        while k < 8 {
            if c & 1 != 0 {
                c = POLYNOMIAL ^ (c >> 1);
            } else {
                c >>= 1;
            }
            k += 1;
        }
        table[n] = c;
        n += 1;
    }
    table
}

/// Update a running (non-inverted) CRC with `bytes`
pub fn update_crc(crc: u32, bytes: &[u8]) -> u32 {
    bytes.iter().fold(crc, |c, &byte| {
        CRC_TABLE[((c ^ u32::from(byte)) & 0xFF) as usize] ^ (c >> 8)
    })
}

/// Calculate CRC32 checksum for given data
pub fn crc32(bytes: &[u8]) -> u32 {
    update_crc(u32::MAX, bytes) ^ u32::MAX
}

/// Incremental CRC-32, so a chunk's type and data can be hashed without
/// concatenating them first
#[derive(Debug, Clone, Copy)]
pub struct Hasher {
    state: u32,
}

impl Hasher {
    pub fn new() -> Self {
        Self { state: u32::MAX }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.state = update_crc(self.state, bytes);
    }

    pub fn finalize(self) -> u32 {
        self.state ^ u32::MAX
    }
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}
