//! Payload obfuscation.
//!
//! A single-byte XOR over the payload. It is its own inverse and hides the
//! payload from a casual `strings` scan, nothing more: anyone who knows or
//! guesses the key (there are only 256) recovers the plaintext.

/// Key used unless the caller supplies another one
pub const DEFAULT_KEY: u8 = 0xAF;

/// XOR every byte of `data` with `key`, in place
pub fn xor_in_place(data: &mut [u8], key: u8) {
    for byte in data.iter_mut() {
        *byte ^= key;
    }
}

/// Return an obfuscated copy of `bytes`
pub fn obfuscate(bytes: &[u8], key: u8) -> Vec<u8> {
    bytes.iter().map(|b| b ^ key).collect()
}

/// Inverse of [`obfuscate`]
pub fn deobfuscate(bytes: &[u8], key: u8) -> Vec<u8> {
    obfuscate(bytes, key)
}
