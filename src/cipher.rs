//! Single-byte XOR keystream. Applying it twice with the same key is the identity,
//! so encryption and decryption are the same transform.

use crate::error::{FsError, Result};

pub fn xor_in_place(data: &mut [u8], key: u8) {
    for byte in data.iter_mut() {
        *byte ^= key;
    }
}

/// Parses a cipher key given as exactly two hex digits, e.g. `"7f"` or `"A0"`.
pub fn parse_key(text: &str) -> Result<u8> {
    if text.len() != 2 || !text.bytes().all(|c| c.is_ascii_hexdigit()) {
        return Err(FsError::InvalidKey(text.to_string()));
    }
    u8::from_str_radix(text, 16).map_err(|_| FsError::InvalidKey(text.to_string()))
}
