//! Message-shaped scenarios exercising the primitives exactly the way the
//! generated codecs compose them: tag dispatch loops, nested length-delimited
//! slicing, parallel-sequence map entries and unknown-field skipping.

use tagwire_runtime as wire;
use wire::DecodeError;

/// Hand-written counterpart of a generated codec for:
///
/// ```proto
/// message Point { uint64 x = 1; string label = 2; }
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
struct Point {
    x: u64,
    label: String,
}

impl Point {
    fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode_raw(&mut buf);
        buf
    }

    fn encode_raw(&self, buf: &mut Vec<u8>) {
        wire::encode_key(buf, 8);
        wire::encode_varint(buf, self.x);
        wire::encode_key(buf, 18);
        wire::encode_string(buf, &self.label);
    }

    fn decode(mut data: &[u8]) -> Result<Self, DecodeError> {
        let buf = &mut data;
        let mut msg = Self::default();
        while !buf.is_empty() {
            match wire::decode_key(buf)? {
                8 => msg.x = wire::decode_varint(buf)?,
                18 => msg.label = wire::decode_string(buf)?,
                other => wire::skip_field(buf, other & 0x7)?,
            }
        }
        Ok(msg)
    }
}

fn sample() -> Point {
    Point { x: 300, label: "origin".into() }
}

#[test]
fn message_roundtrip() {
    let point = sample();
    assert_eq!(Point::decode(&point.encode()).unwrap(), point);
}

#[test]
fn absent_fields_keep_defaults() {
    // Only field 1 on the wire; label must stay at its default.
    let mut buf = Vec::new();
    wire::encode_key(&mut buf, 8);
    wire::encode_varint(&mut buf, 7);
    let msg = Point::decode(&buf).unwrap();
    assert_eq!(msg.x, 7);
    assert_eq!(msg.label, "");
}

#[test]
fn nested_message_roundtrip() {
    // Outer message: Point inner = 3, framed as tag + len + payload.
    let inner = sample();
    let mut buf = Vec::new();
    wire::encode_key(&mut buf, 26);
    wire::encode_bytes(&mut buf, &inner.encode());

    let mut cur = buf.as_slice();
    assert_eq!(wire::decode_key(&mut cur).unwrap(), 26);
    let decoded = Point::decode(wire::take_len_prefixed(&mut cur).unwrap()).unwrap();
    assert_eq!(decoded, inner);
    assert!(cur.is_empty());
}

#[test]
fn nested_message_truncated_length_fails() {
    let inner = sample();
    let payload = inner.encode();
    let mut buf = Vec::new();
    wire::encode_key(&mut buf, 26);
    // Declare one byte more than the payload actually has.
    wire::encode_varint(&mut buf, payload.len() as u64 + 1);
    buf.extend_from_slice(&payload);

    let mut cur = buf.as_slice();
    wire::decode_key(&mut cur).unwrap();
    assert_eq!(wire::take_len_prefixed(&mut cur), Err(DecodeError::Truncated));
}

#[test]
fn nested_slice_is_bounded() {
    // A short inner length must not let the inner decoder see the bytes of
    // the following field.
    let mut buf = Vec::new();
    wire::encode_key(&mut buf, 26);
    let mut inner = Vec::new();
    wire::encode_key(&mut inner, 8);
    wire::encode_varint(&mut inner, 1);
    wire::encode_bytes(&mut buf, &inner);
    wire::encode_key(&mut buf, 8);
    wire::encode_varint(&mut buf, 999);

    let mut cur = buf.as_slice();
    wire::decode_key(&mut cur).unwrap();
    let msg = Point::decode(wire::take_len_prefixed(&mut cur).unwrap()).unwrap();
    assert_eq!(msg.x, 1);
    // The outer field is still intact after the nested decode.
    assert_eq!(wire::decode_key(&mut cur).unwrap(), 8);
    assert_eq!(wire::decode_varint(&mut cur).unwrap(), 999);
}

#[test]
fn unpacked_repeated_preserves_order() {
    // repeated int32 values = 4: three independent tag+value units.
    let values: [i32; 3] = [5, -1, 42];
    let mut buf = Vec::new();
    for v in values {
        wire::encode_key(&mut buf, 32);
        wire::encode_varint(&mut buf, v as u64);
    }

    let mut decoded = Vec::new();
    let mut cur = buf.as_slice();
    while !cur.is_empty() {
        assert_eq!(wire::decode_key(&mut cur).unwrap(), 32);
        decoded.push(wire::decode_varint(&mut cur).unwrap() as i32);
    }
    assert_eq!(decoded, values);
}

#[test]
fn map_entries_fill_parallel_sequences() {
    // map<string, uint32> attrs = 5: each entry is a nested message with
    // the key at field 1 and the value at field 2.
    let entries = [("a", 1u32), ("b", 2)];
    let mut buf = Vec::new();
    for (k, v) in entries {
        let mut entry = Vec::new();
        wire::encode_key(&mut entry, 10);
        wire::encode_string(&mut entry, k);
        wire::encode_key(&mut entry, 16);
        wire::encode_varint(&mut entry, v as u64);
        wire::encode_key(&mut buf, 42);
        wire::encode_bytes(&mut buf, &entry);
    }

    let mut keys: Vec<String> = Vec::new();
    let mut values: Vec<u32> = Vec::new();
    let mut cur = buf.as_slice();
    while !cur.is_empty() {
        assert_eq!(wire::decode_key(&mut cur).unwrap(), 42);
        let mut entry = wire::take_len_prefixed(&mut cur).unwrap();
        let entry = &mut entry;
        let mut key = String::new();
        let mut value = 0u32;
        while !entry.is_empty() {
            match wire::decode_key(entry).unwrap() {
                10 => key = wire::decode_string(entry).unwrap(),
                16 => value = wire::decode_varint(entry).unwrap() as u32,
                other => wire::skip_field(entry, other & 0x7).unwrap(),
            }
        }
        keys.push(key);
        values.push(value);
    }

    assert_eq!(keys, ["a", "b"]);
    assert_eq!(values, [1, 2]);
    assert_eq!(keys.len(), values.len());
}

#[test]
fn unknown_fields_of_every_wire_type_are_skipped() {
    let point = sample();
    let mut buf = Vec::new();

    // Unknown field 90: varint.
    wire::encode_key(&mut buf, 90 << 3 | 0);
    wire::encode_varint(&mut buf, 12345);
    wire::encode_key(&mut buf, 8);
    wire::encode_varint(&mut buf, point.x);
    // Unknown field 91: fixed64.
    wire::encode_key(&mut buf, 91 << 3 | 1);
    wire::encode_fixed64(&mut buf, 0xAABB);
    // Unknown field 92: length-delimited.
    wire::encode_key(&mut buf, 92 << 3 | 2);
    wire::encode_bytes(&mut buf, b"junk");
    wire::encode_key(&mut buf, 18);
    wire::encode_string(&mut buf, &point.label);
    // Unknown field 93: fixed32.
    wire::encode_key(&mut buf, 93 << 3 | 5);
    wire::encode_fixed32(&mut buf, 0xCC);

    assert_eq!(Point::decode(&buf).unwrap(), point);
}

#[test]
fn later_scalar_occurrence_overwrites() {
    let mut buf = Vec::new();
    wire::encode_key(&mut buf, 8);
    wire::encode_varint(&mut buf, 1);
    wire::encode_key(&mut buf, 8);
    wire::encode_varint(&mut buf, 2);
    assert_eq!(Point::decode(&buf).unwrap().x, 2);
}
