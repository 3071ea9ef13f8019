//! proto3 wire-format primitives shared by all generated codecs.
//!
//! This file is embedded into `protoc-gen-tagwire` and emitted once per
//! generation run as `wire_runtime.rs` next to the generated sources, so it
//! must remain standalone: std only, no external dependencies.

// ============================================================================
// Wire types
// ============================================================================

/// Wire type constants, as they appear in the low 3 bits of a field key.
pub const WIRE_VARINT: u64 = 0;
pub const WIRE_FIXED64: u64 = 1;
pub const WIRE_LEN: u64 = 2;
pub const WIRE_FIXED32: u64 = 5;

/// Error type for decoding operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Input ended inside a value or a declared length-delimited span.
    Truncated,
    /// Varint ran past 10 bytes without terminating.
    OverlongVarint,
    /// Key carried a wire type other than 0, 1, 2 or 5.
    InvalidWireType(u64),
    /// String field payload was not valid UTF-8.
    InvalidUtf8,
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::Truncated => write!(f, "protobuf: truncated input"),
            DecodeError::OverlongVarint => write!(f, "protobuf: varint longer than 10 bytes"),
            DecodeError::InvalidWireType(wt) => write!(f, "protobuf: invalid wire type {}", wt),
            DecodeError::InvalidUtf8 => write!(f, "protobuf: invalid UTF-8 in string field"),
        }
    }
}

impl std::error::Error for DecodeError {}

// ============================================================================
// Varint (wire type 0)
// ============================================================================

/// Encode an unsigned integer as a base-128 varint.
#[inline]
pub fn encode_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            return;
        }
    }
}

/// Decode a base-128 varint, advancing the cursor past it.
///
/// A 64-bit value fits in at most 10 bytes; an 11th continuation byte is
/// rejected as [`DecodeError::OverlongVarint`].
#[inline]
pub fn decode_varint(buf: &mut &[u8]) -> Result<u64, DecodeError> {
    let mut result: u64 = 0;
    let mut shift = 0;
    loop {
        if buf.is_empty() {
            return Err(DecodeError::Truncated);
        }
        if shift >= 64 {
            return Err(DecodeError::OverlongVarint);
        }
        let byte = buf[0];
        *buf = &buf[1..];
        result |= ((byte & 0x7F) as u64) << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
    }
}

/// Encode a field key: `(field_number << 3) | wire_type`, varint-framed.
#[inline]
pub fn encode_key(buf: &mut Vec<u8>, key: u64) {
    encode_varint(buf, key);
}

/// Decode a field key. The wire type is in the low 3 bits.
#[inline]
pub fn decode_key(buf: &mut &[u8]) -> Result<u64, DecodeError> {
    decode_varint(buf)
}

// ============================================================================
// Bool (over varint)
// ============================================================================

#[inline]
pub fn encode_bool(buf: &mut Vec<u8>, value: bool) {
    buf.push(if value { 1 } else { 0 });
}

#[inline]
pub fn decode_bool(buf: &mut &[u8]) -> Result<bool, DecodeError> {
    Ok(decode_varint(buf)? != 0)
}

// ============================================================================
// ZigZag (sint32 / sint64)
// ============================================================================

#[inline]
pub fn encode_zigzag32(buf: &mut Vec<u8>, value: i32) {
    let encoded = ((value << 1) ^ (value >> 31)) as u32;
    encode_varint(buf, encoded as u64);
}

#[inline]
pub fn decode_zigzag32(buf: &mut &[u8]) -> Result<i32, DecodeError> {
    let raw = decode_varint(buf)? as u32;
    Ok(((raw >> 1) as i32) ^ (-((raw & 1) as i32)))
}

#[inline]
pub fn encode_zigzag64(buf: &mut Vec<u8>, value: i64) {
    let encoded = ((value << 1) ^ (value >> 63)) as u64;
    encode_varint(buf, encoded);
}

#[inline]
pub fn decode_zigzag64(buf: &mut &[u8]) -> Result<i64, DecodeError> {
    let raw = decode_varint(buf)?;
    Ok(((raw >> 1) as i64) ^ (-((raw & 1) as i64)))
}

// ============================================================================
// 64-bit fixed (wire type 1)
// ============================================================================

#[inline]
pub fn encode_fixed64(buf: &mut Vec<u8>, value: u64) {
    buf.extend_from_slice(&value.to_le_bytes());
}

#[inline]
pub fn decode_fixed64(buf: &mut &[u8]) -> Result<u64, DecodeError> {
    if buf.len() < 8 {
        return Err(DecodeError::Truncated);
    }
    let bytes = [buf[0], buf[1], buf[2], buf[3], buf[4], buf[5], buf[6], buf[7]];
    *buf = &buf[8..];
    Ok(u64::from_le_bytes(bytes))
}

#[inline]
pub fn encode_sfixed64(buf: &mut Vec<u8>, value: i64) {
    encode_fixed64(buf, value as u64);
}

#[inline]
pub fn decode_sfixed64(buf: &mut &[u8]) -> Result<i64, DecodeError> {
    Ok(decode_fixed64(buf)? as i64)
}

/// Doubles travel as their IEEE-754 bit pattern over the fixed64 path,
/// preserving NaN payloads and signed zero exactly.
#[inline]
pub fn encode_double(buf: &mut Vec<u8>, value: f64) {
    encode_fixed64(buf, value.to_bits());
}

#[inline]
pub fn decode_double(buf: &mut &[u8]) -> Result<f64, DecodeError> {
    Ok(f64::from_bits(decode_fixed64(buf)?))
}

// ============================================================================
// 32-bit fixed (wire type 5)
// ============================================================================

#[inline]
pub fn encode_fixed32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

#[inline]
pub fn decode_fixed32(buf: &mut &[u8]) -> Result<u32, DecodeError> {
    if buf.len() < 4 {
        return Err(DecodeError::Truncated);
    }
    let bytes = [buf[0], buf[1], buf[2], buf[3]];
    *buf = &buf[4..];
    Ok(u32::from_le_bytes(bytes))
}

#[inline]
pub fn encode_sfixed32(buf: &mut Vec<u8>, value: i32) {
    encode_fixed32(buf, value as u32);
}

#[inline]
pub fn decode_sfixed32(buf: &mut &[u8]) -> Result<i32, DecodeError> {
    Ok(decode_fixed32(buf)? as i32)
}

#[inline]
pub fn encode_float(buf: &mut Vec<u8>, value: f32) {
    encode_fixed32(buf, value.to_bits());
}

#[inline]
pub fn decode_float(buf: &mut &[u8]) -> Result<f32, DecodeError> {
    Ok(f32::from_bits(decode_fixed32(buf)?))
}

// ============================================================================
// Length-delimited (wire type 2)
// ============================================================================

/// Read a varint length prefix and split off exactly that many bytes.
///
/// Nested-message and map-entry decoding go through here; the returned
/// slice is bounded, so an inner decoder can never read adjacent fields.
#[inline]
pub fn take_len_prefixed<'a>(buf: &mut &'a [u8]) -> Result<&'a [u8], DecodeError> {
    let len = decode_varint(buf)? as usize;
    if buf.len() < len {
        return Err(DecodeError::Truncated);
    }
    let (head, rest) = buf.split_at(len);
    *buf = rest;
    Ok(head)
}

#[inline]
pub fn encode_bytes(buf: &mut Vec<u8>, value: &[u8]) {
    encode_varint(buf, value.len() as u64);
    buf.extend_from_slice(value);
}

#[inline]
pub fn decode_bytes(buf: &mut &[u8]) -> Result<Vec<u8>, DecodeError> {
    Ok(take_len_prefixed(buf)?.to_vec())
}

#[inline]
pub fn encode_string(buf: &mut Vec<u8>, value: &str) {
    encode_bytes(buf, value.as_bytes());
}

#[inline]
pub fn decode_string(buf: &mut &[u8]) -> Result<String, DecodeError> {
    String::from_utf8(decode_bytes(buf)?).map_err(|_| DecodeError::InvalidUtf8)
}

// ============================================================================
// Skip unknown fields
// ============================================================================

/// Consume exactly one value of the given wire type without interpreting it.
#[inline]
pub fn skip_field(buf: &mut &[u8], wire_type: u64) -> Result<(), DecodeError> {
    match wire_type {
        WIRE_VARINT => {
            decode_varint(buf)?;
            Ok(())
        }
        WIRE_FIXED64 => {
            if buf.len() < 8 {
                return Err(DecodeError::Truncated);
            }
            *buf = &buf[8..];
            Ok(())
        }
        WIRE_LEN => {
            take_len_prefixed(buf)?;
            Ok(())
        }
        WIRE_FIXED32 => {
            if buf.len() < 4 {
                return Err(DecodeError::Truncated);
            }
            *buf = &buf[4..];
            Ok(())
        }
        other => Err(DecodeError::InvalidWireType(other)),
    }
}
