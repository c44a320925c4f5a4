//! Varint (LEB128) and zigzag codec
//!
//! Unsigned values are written little-endian, seven bits per byte, with the
//! high bit set on every byte except the last. Signed values are zigzag
//! mapped first (`n -> (n << 1) ^ (n >> 63)`) so small negative and positive
//! numbers both stay short. This is the protobuf varint scheme bit for bit;
//! decoders depend on it.

/// Longest encoding of a u64.
pub const MAX_VARINT_LEN: usize = 10;

/// Map a signed value onto the unsigned zigzag space.
#[inline]
pub fn zigzag(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

/// Inverse of [`zigzag`].
#[inline]
pub fn unzigzag(v: u64) -> i64 {
    ((v >> 1) as i64) ^ -((v & 1) as i64)
}

/// Append `value` as a varint.
pub fn encode_u64(mut value: u64, buf: &mut Vec<u8>) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

/// Append `value` as a zigzag varint.
#[inline]
pub fn encode_i64(value: i64, buf: &mut Vec<u8>) {
    encode_u64(zigzag(value), buf);
}

/// Number of bytes `value` occupies as a varint.
pub fn encoded_len_u64(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    (bits + 6) / 7
}

/// Number of bytes `value` occupies as a zigzag varint.
#[inline]
pub fn encoded_len_i64(value: i64) -> usize {
    encoded_len_u64(zigzag(value))
}

/// Decode a varint from a byte slice, returning (value, bytes_consumed).
///
/// Returns `None` when the input is truncated or the value overflows 64 bits.
pub fn decode_u64(data: &[u8]) -> Option<(u64, usize)> {
    let mut value: u64 = 0;
    let mut shift = 0u32;
    for (i, &byte) in data.iter().enumerate().take(MAX_VARINT_LEN) {
        let low = (byte & 0x7F) as u64;
        if shift == 63 && low > 1 {
            return None; // overflow
        }
        value |= low << shift;
        if byte & 0x80 == 0 {
            return Some((value, i + 1));
        }
        shift += 7;
    }
    None // truncated or over-long
}

/// Decode a zigzag varint, returning (value, bytes_consumed).
#[inline]
pub fn decode_i64(data: &[u8]) -> Option<(i64, usize)> {
    decode_u64(data).map(|(v, n)| (unzigzag(v), n))
}
