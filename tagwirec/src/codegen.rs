//! Rust code generation: one encode fragment and one decode match arm per
//! field, assembled into a struct plus `encode`/`encode_raw`/`decode` per
//! message.
//!
//! Field shape is decided in priority order map -> repeated -> message ->
//! scalar. Repeated scalars are emitted unpacked only (one tag per element);
//! maps become two parallel `_keys`/`_values` vectors fed by synthetic
//! {1: key, 2: value} entries. Singular fields are always written, defaults
//! included: generated structs are value-typed and track no presence.

use heck::{ToSnakeCase, ToUpperCamelCase};

use crate::Error;
use crate::descriptor::{Enum, Field, FieldType, Label, MapEntry, Message, Schema};
use crate::resolver::{self, ScalarEntry};

/// Render one schema file into a generated source unit.
///
/// Any unresolvable field fails the whole unit; a partially-correct codec
/// is worse than none.
pub fn generate_schema(schema: &Schema) -> Result<String, Error> {
    let mut out = String::new();
    out.push_str("// Generated by protoc-gen-tagwire. Do not edit.\n");
    out.push_str("#![allow(dead_code, clippy::all)]\n\n");
    out.push_str("use super::wire_runtime as wire;\n");
    for en in &schema.enums {
        out.push_str(&generate_enum(en));
    }
    for msg in &schema.messages {
        out.push_str(&generate_message(msg, schema)?);
    }
    Ok(out)
}

/// Compute a field's wire key: `(number << 3) | wire_type`.
fn tag(number: u32, ty: FieldType) -> u64 {
    ((number as u64) << 3) | resolver::wire_type_of(ty).as_u64()
}

/// Convert a proto field name to a Rust identifier.
fn field_ident(name: &str) -> String {
    let snake = name.to_snake_case();
    match snake.as_str() {
        // Not expressible as raw identifiers; suffix instead.
        "self" | "super" | "crate" => format!("{snake}_"),
        // Stable keywords plus the reserved-for-future set; all of these
        // accept raw-identifier escaping.
        "abstract" | "as" | "async" | "await" | "become" | "box" | "break" | "const"
        | "continue" | "do" | "dyn" | "else" | "enum" | "extern" | "false" | "final" | "fn"
        | "for" | "gen" | "if" | "impl" | "in" | "let" | "loop" | "macro" | "match" | "mod"
        | "move" | "mut" | "override" | "priv" | "pub" | "ref" | "return" | "static"
        | "struct" | "trait" | "true" | "try" | "type" | "typeof" | "unsafe" | "unsized"
        | "use" | "virtual" | "where" | "while" | "yield" => {
            format!("r#{snake}")
        }
        _ => snake,
    }
}

/// How a field is laid out and coded, decided once per field.
enum Shape<'a> {
    Map(&'a MapEntry),
    RepeatedScalar(&'static ScalarEntry),
    RepeatedEnum(String),
    RepeatedMessage(String),
    Enum(String),
    Message(String),
    Scalar(&'static ScalarEntry),
}

fn classify<'a>(field: &'a Field, msg: &Message, schema: &Schema) -> Result<Shape<'a>, Error> {
    if let Some(map) = &field.map_entry {
        return Ok(Shape::Map(map));
    }
    let reference = || {
        resolver::resolve(
            field.ty,
            field.type_name.as_deref(),
            &schema.package,
            &field.name,
            &msg.name,
        )
    };
    Ok(match (field.label, field.ty) {
        (Label::Repeated, FieldType::Message) => Shape::RepeatedMessage(reference()?),
        (Label::Repeated, FieldType::Enum) => Shape::RepeatedEnum(reference()?),
        (Label::Repeated, ty) => Shape::RepeatedScalar(scalar_row(ty)),
        (_, FieldType::Message) => Shape::Message(reference()?),
        (_, FieldType::Enum) => Shape::Enum(reference()?),
        (_, ty) => Shape::Scalar(scalar_row(ty)),
    })
}

fn scalar_row(ty: FieldType) -> &'static ScalarEntry {
    resolver::scalar_entry(ty).expect("every non-reference type has a table row")
}

/// Resolve the Rust type and codec pieces for one side of a map entry.
struct MapSide {
    rust: String,
    default_expr: String,
    tag: u64,
    kind: MapSideKind,
}

enum MapSideKind {
    Scalar(&'static ScalarEntry),
    Enum(String),
    Message(String),
}

fn map_side(
    number: u32,
    ty: FieldType,
    type_name: Option<&str>,
    field: &Field,
    msg: &Message,
    schema: &Schema,
) -> Result<MapSide, Error> {
    let tag = tag(number, ty);
    match ty {
        FieldType::Message | FieldType::Enum => {
            let rust = resolver::resolve(ty, type_name, &schema.package, &field.name, &msg.name)?;
            let kind = if ty == FieldType::Message {
                MapSideKind::Message(rust.clone())
            } else {
                MapSideKind::Enum(rust.clone())
            };
            Ok(MapSide { rust, default_expr: "Default::default()".to_string(), tag, kind })
        }
        other => {
            let entry = scalar_row(other);
            Ok(MapSide {
                rust: entry.rust.to_string(),
                default_expr: entry.default_expr.to_string(),
                tag,
                kind: MapSideKind::Scalar(entry),
            })
        }
    }
}

fn generate_message(msg: &Message, schema: &Schema) -> Result<String, Error> {
    let name = msg.name.clone();
    let mut fields_src = String::new();
    let mut encode_src = String::new();
    let mut decode_arms = String::new();

    for field in &msg.fields {
        let ident = field_ident(&field.name);
        let shape = classify(field, msg, schema)?;
        fields_src.push_str(&struct_fields(field, &ident, &shape, msg, schema)?);
        encode_src.push_str(&encode_fragment(field, &ident, &shape, msg, schema)?);
        decode_arms.push_str(&decode_arm(field, &ident, &shape, msg, schema)?);
    }

    if msg.fields.is_empty() {
        encode_src.push_str("        let _ = buf;\n");
    }

    Ok(format!(
        "\n#[derive(Debug, Clone, PartialEq, Default)]\n\
         pub struct {name} {{\n\
         {fields_src}\
         }}\n\
         \n\
         impl {name} {{\n\
         \x20   pub fn encode(&self) -> Vec<u8> {{\n\
         \x20       let mut buf = Vec::new();\n\
         \x20       self.encode_raw(&mut buf);\n\
         \x20       buf\n\
         \x20   }}\n\
         \n\
         \x20   pub fn encode_raw(&self, buf: &mut Vec<u8>) {{\n\
         {encode_src}\
         \x20   }}\n\
         \n\
         \x20   pub fn decode(mut data: &[u8]) -> Result<Self, wire::DecodeError> {{\n\
         \x20       let buf = &mut data;\n\
         \x20       let mut msg = Self::default();\n\
         \x20       while !buf.is_empty() {{\n\
         \x20           match wire::decode_key(buf)? {{\n\
         {decode_arms}\
         \x20               other => wire::skip_field(buf, other & 0x7)?,\n\
         \x20           }}\n\
         \x20       }}\n\
         \x20       Ok(msg)\n\
         \x20   }}\n\
         }}\n"
    ))
}

/// Struct field declaration(s) for one schema field. Maps contribute two
/// lock-step vectors.
fn struct_fields(
    field: &Field,
    ident: &str,
    shape: &Shape<'_>,
    msg: &Message,
    schema: &Schema,
) -> Result<String, Error> {
    Ok(match shape {
        Shape::Map(map) => {
            let k = map_side(1, map.key_type, None, field, msg, schema)?;
            let v = map_side(2, map.value_type, map.value_type_name.as_deref(), field, msg, schema)?;
            format!(
                "    pub {ident}_keys: Vec<{}>,\n    pub {ident}_values: Vec<{}>,\n",
                k.rust, v.rust
            )
        }
        Shape::RepeatedScalar(entry) => format!("    pub {ident}: Vec<{}>,\n", entry.rust),
        Shape::RepeatedEnum(ty) | Shape::RepeatedMessage(ty) => {
            format!("    pub {ident}: Vec<{ty}>,\n")
        }
        Shape::Enum(ty) | Shape::Message(ty) => format!("    pub {ident}: {ty},\n"),
        Shape::Scalar(entry) => format!("    pub {ident}: {},\n", entry.rust),
    })
}

fn encode_fragment(
    field: &Field,
    ident: &str,
    shape: &Shape<'_>,
    msg: &Message,
    schema: &Schema,
) -> Result<String, Error> {
    let key = tag(field.number, field.ty);
    Ok(match shape {
        Shape::Scalar(entry) => {
            let arg = if entry.by_ref {
                format!("&self.{ident}")
            } else {
                format!("self.{ident}{}", entry.encode_cast)
            };
            format!(
                "        wire::encode_key(buf, {key});\n\
                 \x20       wire::{}(buf, {arg});\n",
                entry.encode_fn
            )
        }
        Shape::Enum(_) => format!(
            "        wire::encode_key(buf, {key});\n\
             \x20       wire::encode_varint(buf, self.{ident} as i32 as u64);\n"
        ),
        Shape::Message(_) => format!(
            "        let mut {ident}_buf = Vec::new();\n\
             \x20       self.{ident}.encode_raw(&mut {ident}_buf);\n\
             \x20       wire::encode_key(buf, {key});\n\
             \x20       wire::encode_bytes(buf, &{ident}_buf);\n"
        ),
        Shape::RepeatedScalar(entry) => {
            let arg = if entry.by_ref {
                "value".to_string()
            } else {
                format!("*value{}", entry.encode_cast)
            };
            format!(
                "        for value in &self.{ident} {{\n\
                 \x20           wire::encode_key(buf, {key});\n\
                 \x20           wire::{}(buf, {arg});\n\
                 \x20       }}\n",
                entry.encode_fn
            )
        }
        Shape::RepeatedEnum(_) => format!(
            "        for value in &self.{ident} {{\n\
             \x20           wire::encode_key(buf, {key});\n\
             \x20           wire::encode_varint(buf, *value as i32 as u64);\n\
             \x20       }}\n"
        ),
        Shape::RepeatedMessage(_) => format!(
            "        for value in &self.{ident} {{\n\
             \x20           let mut entry_buf = Vec::new();\n\
             \x20           value.encode_raw(&mut entry_buf);\n\
             \x20           wire::encode_key(buf, {key});\n\
             \x20           wire::encode_bytes(buf, &entry_buf);\n\
             \x20       }}\n"
        ),
        Shape::Map(map) => {
            let k = map_side(1, map.key_type, None, field, msg, schema)?;
            let v = map_side(2, map.value_type, map.value_type_name.as_deref(), field, msg, schema)?;
            let MapSideKind::Scalar(key_entry) = &k.kind else {
                return Err(Error::MalformedMapEntry {
                    entry: format!("{}.{}", msg.name, field.name),
                });
            };
            let key_arg = if key_entry.by_ref {
                "key".to_string()
            } else {
                format!("*key{}", key_entry.encode_cast)
            };
            let value_stmts = match &v.kind {
                MapSideKind::Scalar(entry) => {
                    let arg = if entry.by_ref {
                        "value".to_string()
                    } else {
                        format!("*value{}", entry.encode_cast)
                    };
                    format!(
                        "            wire::encode_key(&mut entry_buf, {});\n\
                         \x20           wire::{}(&mut entry_buf, {arg});\n",
                        v.tag, entry.encode_fn
                    )
                }
                MapSideKind::Enum(_) => format!(
                    "            wire::encode_key(&mut entry_buf, {});\n\
                     \x20           wire::encode_varint(&mut entry_buf, *value as i32 as u64);\n",
                    v.tag
                ),
                MapSideKind::Message(_) => format!(
                    "            let mut value_buf = Vec::new();\n\
                     \x20           value.encode_raw(&mut value_buf);\n\
                     \x20           wire::encode_key(&mut entry_buf, {});\n\
                     \x20           wire::encode_bytes(&mut entry_buf, &value_buf);\n",
                    v.tag
                ),
            };
            format!(
                "        for (key, value) in self.{ident}_keys.iter().zip(self.{ident}_values.iter()) {{\n\
                 \x20           let mut entry_buf = Vec::new();\n\
                 \x20           wire::encode_key(&mut entry_buf, {});\n\
                 \x20           wire::{}(&mut entry_buf, {key_arg});\n\
                 {value_stmts}\
                 \x20           wire::encode_key(buf, {key});\n\
                 \x20           wire::encode_bytes(buf, &entry_buf);\n\
                 \x20       }}\n",
                k.tag, key_entry.encode_fn
            )
        }
    })
}

fn decode_arm(
    field: &Field,
    ident: &str,
    shape: &Shape<'_>,
    msg: &Message,
    schema: &Schema,
) -> Result<String, Error> {
    let key = tag(field.number, field.ty);
    let comment = format!("                // {} = {}\n", field.name, field.number);
    Ok(match shape {
        Shape::Scalar(entry) => format!(
            "{comment}                {key} => msg.{ident} = wire::{}(buf)?{},\n",
            entry.decode_fn, entry.decode_cast
        ),
        Shape::Enum(ty) => format!(
            "{comment}                {key} => msg.{ident} = {ty}::from_i32(wire::decode_varint(buf)? as i32),\n"
        ),
        Shape::Message(ty) => format!(
            "{comment}                {key} => msg.{ident} = {ty}::decode(wire::take_len_prefixed(buf)?)?,\n"
        ),
        Shape::RepeatedScalar(entry) => format!(
            "{comment}                {key} => msg.{ident}.push(wire::{}(buf)?{}),\n",
            entry.decode_fn, entry.decode_cast
        ),
        Shape::RepeatedEnum(ty) => format!(
            "{comment}                {key} => msg.{ident}.push({ty}::from_i32(wire::decode_varint(buf)? as i32)),\n"
        ),
        Shape::RepeatedMessage(ty) => format!(
            "{comment}                {key} => msg.{ident}.push({ty}::decode(wire::take_len_prefixed(buf)?)?),\n"
        ),
        Shape::Map(map) => {
            let k = map_side(1, map.key_type, None, field, msg, schema)?;
            let v = map_side(2, map.value_type, map.value_type_name.as_deref(), field, msg, schema)?;
            let MapSideKind::Scalar(key_entry) = &k.kind else {
                return Err(Error::MalformedMapEntry {
                    entry: format!("{}.{}", msg.name, field.name),
                });
            };
            let value_expr = match &v.kind {
                MapSideKind::Scalar(entry) => {
                    format!("wire::{}(entry)?{}", entry.decode_fn, entry.decode_cast)
                }
                MapSideKind::Enum(ty) => {
                    format!("{ty}::from_i32(wire::decode_varint(entry)? as i32)")
                }
                MapSideKind::Message(ty) => {
                    format!("{ty}::decode(wire::take_len_prefixed(entry)?)?")
                }
            };
            format!(
                "{comment}                {key} => {{\n\
                 \x20                   let mut entry = wire::take_len_prefixed(buf)?;\n\
                 \x20                   let entry = &mut entry;\n\
                 \x20                   let mut key: {} = {};\n\
                 \x20                   let mut value: {} = {};\n\
                 \x20                   while !entry.is_empty() {{\n\
                 \x20                       match wire::decode_key(entry)? {{\n\
                 \x20                           {} => key = wire::{}(entry)?{},\n\
                 \x20                           {} => value = {value_expr},\n\
                 \x20                           other => wire::skip_field(entry, other & 0x7)?,\n\
                 \x20                       }}\n\
                 \x20                   }}\n\
                 \x20                   msg.{ident}_keys.push(key);\n\
                 \x20                   msg.{ident}_values.push(value);\n\
                 \x20               }}\n",
                k.rust, k.default_expr, v.rust, v.default_expr,
                k.tag, key_entry.decode_fn, key_entry.decode_cast, v.tag
            )
        }
    })
}

fn generate_enum(en: &Enum) -> String {
    if en.variants.is_empty() {
        return String::new();
    }

    // Default is the zero variant when present (proto3 guarantees one),
    // otherwise the first declared. Aliased numbers keep the first name.
    let default_number = if en.variants.iter().any(|(_, n)| *n == 0) { 0 } else { en.variants[0].1 };
    let mut seen = Vec::new();
    let mut variants_src = String::new();
    let mut arms_src = String::new();
    let mut default_name = String::new();

    for (raw_name, number) in &en.variants {
        if seen.contains(number) {
            continue;
        }
        seen.push(*number);
        let variant = raw_name.to_upper_camel_case();
        if *number == default_number {
            default_name = variant.clone();
            variants_src.push_str(&format!("    #[default]\n    {variant} = {number},\n"));
        } else {
            variants_src.push_str(&format!("    {variant} = {number},\n"));
            arms_src.push_str(&format!("            {number} => {}::{variant},\n", en.name));
        }
    }

    format!(
        "\n#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]\n\
         #[repr(i32)]\n\
         pub enum {name} {{\n\
         {variants_src}\
         }}\n\
         \n\
         impl {name} {{\n\
         \x20   /// Unknown wire values collapse to the default variant; proto3\n\
         \x20   /// enum decoding is total.\n\
         \x20   pub fn from_i32(value: i32) -> Self {{\n\
         \x20       match value {{\n\
         {arms_src}\
         \x20           _ => {name}::{default_name},\n\
         \x20       }}\n\
         \x20   }}\n\
         }}\n",
        name = en.name,
    )
}
