//! Compact length prefix ("short vec") used for every variable-length array
//! in the wire format.
//!
//! Little-endian base-128: seven payload bits per byte, high bit set on every
//! byte except the last.
//!
//! - Values 0..0x7f       -> 1 byte
//! - Values 0x80..0x3fff  -> 2 bytes
//! - Values 0x4000..      -> 3 bytes

use crate::error::TransactionError;

/// A length never takes more than this many bytes on the wire.
pub const MAX_ENCODING_LENGTH: usize = 3;

/// Encode `len` as a compact length prefix.
pub fn encode_length(len: usize) -> Vec<u8> {
    let mut rem = len;
    let mut out = Vec::with_capacity(MAX_ENCODING_LENGTH);

    loop {
        let mut byte = (rem & 0x7f) as u8;
        rem >>= 7;
        if rem > 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if rem == 0 {
            break;
        }
    }

    out
}

/// Decode a compact length prefix from the front of `data`.
///
/// Returns `(value, bytes_consumed)`. Fails if the input runs out before the
/// final byte or if the encoding needs more than [`MAX_ENCODING_LENGTH`] bytes.
pub fn decode_length(data: &[u8]) -> Result<(usize, usize), TransactionError> {
    let mut value = 0usize;
    let mut consumed = 0usize;

    loop {
        if consumed >= MAX_ENCODING_LENGTH {
            return Err(TransactionError::MalformedLength);
        }
        let Some(&byte) = data.get(consumed) else {
            return Err(TransactionError::MalformedLength);
        };

        value |= ((byte & 0x7f) as usize) << (consumed * 7);
        consumed += 1;

        if byte & 0x80 == 0 {
            return Ok((value, consumed));
        }
    }
}
