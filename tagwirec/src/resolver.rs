//! The field-type resolution table: one static row per scalar type, plus
//! short-name resolution for message and enum references.
//!
//! Every wire-type and cast decision the codegen makes comes out of this
//! table; adding or auditing a type touches exactly one row here.

use heck::ToUpperCamelCase;

use crate::Error;
use crate::descriptor::FieldType;

/// The four proto3 wire types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    Varint,
    Fixed64,
    Len,
    Fixed32,
}

impl WireType {
    /// Numeric value as it appears in the low 3 bits of a key.
    pub fn as_u64(self) -> u64 {
        match self {
            WireType::Varint => 0,
            WireType::Fixed64 => 1,
            WireType::Len => 2,
            WireType::Fixed32 => 5,
        }
    }
}

/// One row of the type table: everything codegen needs to emit a scalar
/// field of this type.
pub struct ScalarEntry {
    pub ty: FieldType,
    /// Rust type of the struct field.
    pub rust: &'static str,
    pub wire: WireType,
    /// Runtime primitive names, e.g. `encode_varint`.
    pub encode_fn: &'static str,
    pub decode_fn: &'static str,
    /// Default expression used for map-entry accumulators.
    pub default_expr: &'static str,
    /// Whether the encode primitive takes the value by reference.
    pub by_ref: bool,
    /// Cast suffix widening the value onto the u64 varint carrier.
    pub encode_cast: &'static str,
    /// Cast suffix narrowing the carrier back to the logical type.
    pub decode_cast: &'static str,
}

/// The closed scalar table. Message and enum references are the only kinds
/// resolved outside it, via [`resolve`].
pub static SCALARS: [ScalarEntry; 15] = [
    ScalarEntry {
        ty: FieldType::Double,
        rust: "f64",
        wire: WireType::Fixed64,
        encode_fn: "encode_double",
        decode_fn: "decode_double",
        default_expr: "0.0",
        by_ref: false,
        encode_cast: "",
        decode_cast: "",
    },
    ScalarEntry {
        ty: FieldType::Float,
        rust: "f32",
        wire: WireType::Fixed32,
        encode_fn: "encode_float",
        decode_fn: "decode_float",
        default_expr: "0.0",
        by_ref: false,
        encode_cast: "",
        decode_cast: "",
    },
    ScalarEntry {
        ty: FieldType::Int64,
        rust: "i64",
        wire: WireType::Varint,
        encode_fn: "encode_varint",
        decode_fn: "decode_varint",
        default_expr: "0",
        by_ref: false,
        encode_cast: " as u64",
        decode_cast: " as i64",
    },
    ScalarEntry {
        ty: FieldType::Uint64,
        rust: "u64",
        wire: WireType::Varint,
        encode_fn: "encode_varint",
        decode_fn: "decode_varint",
        default_expr: "0",
        by_ref: false,
        encode_cast: "",
        decode_cast: "",
    },
    ScalarEntry {
        // Negative int32 values sign-extend onto the 64-bit carrier, which
        // is what makes them 10 bytes on the wire.
        ty: FieldType::Int32,
        rust: "i32",
        wire: WireType::Varint,
        encode_fn: "encode_varint",
        decode_fn: "decode_varint",
        default_expr: "0",
        by_ref: false,
        encode_cast: " as i64 as u64",
        decode_cast: " as i32",
    },
    ScalarEntry {
        ty: FieldType::Fixed64,
        rust: "u64",
        wire: WireType::Fixed64,
        encode_fn: "encode_fixed64",
        decode_fn: "decode_fixed64",
        default_expr: "0",
        by_ref: false,
        encode_cast: "",
        decode_cast: "",
    },
    ScalarEntry {
        ty: FieldType::Fixed32,
        rust: "u32",
        wire: WireType::Fixed32,
        encode_fn: "encode_fixed32",
        decode_fn: "decode_fixed32",
        default_expr: "0",
        by_ref: false,
        encode_cast: "",
        decode_cast: "",
    },
    ScalarEntry {
        ty: FieldType::Bool,
        rust: "bool",
        wire: WireType::Varint,
        encode_fn: "encode_bool",
        decode_fn: "decode_bool",
        default_expr: "false",
        by_ref: false,
        encode_cast: "",
        decode_cast: "",
    },
    ScalarEntry {
        ty: FieldType::String,
        rust: "String",
        wire: WireType::Len,
        encode_fn: "encode_string",
        decode_fn: "decode_string",
        default_expr: "String::new()",
        by_ref: true,
        encode_cast: "",
        decode_cast: "",
    },
    ScalarEntry {
        ty: FieldType::Bytes,
        rust: "Vec<u8>",
        wire: WireType::Len,
        encode_fn: "encode_bytes",
        decode_fn: "decode_bytes",
        default_expr: "Vec::new()",
        by_ref: true,
        encode_cast: "",
        decode_cast: "",
    },
    ScalarEntry {
        ty: FieldType::Uint32,
        rust: "u32",
        wire: WireType::Varint,
        encode_fn: "encode_varint",
        decode_fn: "decode_varint",
        default_expr: "0",
        by_ref: false,
        encode_cast: " as u64",
        decode_cast: " as u32",
    },
    ScalarEntry {
        ty: FieldType::Sfixed32,
        rust: "i32",
        wire: WireType::Fixed32,
        encode_fn: "encode_sfixed32",
        decode_fn: "decode_sfixed32",
        default_expr: "0",
        by_ref: false,
        encode_cast: "",
        decode_cast: "",
    },
    ScalarEntry {
        ty: FieldType::Sfixed64,
        rust: "i64",
        wire: WireType::Fixed64,
        encode_fn: "encode_sfixed64",
        decode_fn: "decode_sfixed64",
        default_expr: "0",
        by_ref: false,
        encode_cast: "",
        decode_cast: "",
    },
    ScalarEntry {
        ty: FieldType::Sint32,
        rust: "i32",
        wire: WireType::Varint,
        encode_fn: "encode_zigzag32",
        decode_fn: "decode_zigzag32",
        default_expr: "0",
        by_ref: false,
        encode_cast: "",
        decode_cast: "",
    },
    ScalarEntry {
        ty: FieldType::Sint64,
        rust: "i64",
        wire: WireType::Varint,
        encode_fn: "encode_zigzag64",
        decode_fn: "decode_zigzag64",
        default_expr: "0",
        by_ref: false,
        encode_cast: "",
        decode_cast: "",
    },
];

/// Look up the table row for a scalar type. `None` for message and enum
/// references, which carry no row.
pub fn scalar_entry(ty: FieldType) -> Option<&'static ScalarEntry> {
    SCALARS.iter().find(|e| e.ty == ty)
}

/// Wire type of any field type. Total over the supported set.
pub fn wire_type_of(ty: FieldType) -> WireType {
    match ty {
        FieldType::Message => WireType::Len,
        FieldType::Enum => WireType::Varint,
        other => scalar_entry(other).expect("every non-reference type has a table row").wire,
    }
}

/// Resolve a field's Rust-facing type name.
///
/// Scalars come straight from the table. Message and enum references
/// resolve to the referenced type's short name: the package prefix is
/// stripped and the remaining path segments are camel-joined, matching how
/// extraction names nested types.
pub fn resolve(
    ty: FieldType,
    type_name: Option<&str>,
    package: &str,
    field: &str,
    message: &str,
) -> Result<String, Error> {
    match ty {
        FieldType::Message | FieldType::Enum => {
            let Some(qualified) = type_name else {
                return Err(Error::MissingTypeName {
                    field: field.to_string(),
                    message: message.to_string(),
                });
            };
            Ok(short_name(qualified, package))
        }
        other => Ok(scalar_entry(other)
            .expect("every non-reference type has a table row")
            .rust
            .to_string()),
    }
}

fn short_name(qualified: &str, package: &str) -> String {
    let stripped = qualified.strip_prefix('.').unwrap_or(qualified);
    let stripped = if package.is_empty() {
        stripped
    } else {
        // Only strip a whole leading package segment, not a shared prefix.
        stripped.strip_prefix(package).and_then(|s| s.strip_prefix('.')).unwrap_or(stripped)
    };
    stripped.split('.').map(|p| p.to_upper_camel_case()).collect()
}
