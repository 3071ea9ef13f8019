//! The generator's own read-only descriptor model, and its extraction from
//! the `prost-types` file descriptor tree.
//!
//! Nested message types are flattened with joined camel-case names
//! (`Outer.Inner` becomes `OuterInner`), and the synthetic map-entry
//! messages protoc produces for `map<K, V>` fields are folded into the
//! owning field's [`MapEntry`] instead of being emitted as types.

use std::collections::HashMap;

use heck::ToUpperCamelCase;
use prost_types::{DescriptorProto, EnumDescriptorProto, FieldDescriptorProto, FileDescriptorProto};

use crate::Error;

/// The 18 base field kinds of the descriptor wire, minus the legacy group
/// type, which this generator rejects as unsupported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Double,
    Float,
    Int64,
    Uint64,
    Int32,
    Fixed64,
    Fixed32,
    Bool,
    String,
    Message,
    Bytes,
    Uint32,
    Enum,
    Sfixed32,
    Sfixed64,
    Sint32,
    Sint64,
}

impl FieldType {
    /// Map a raw descriptor type id to a field type.
    ///
    /// Returns the offending id for anything outside the supported set, so
    /// the caller can fail the owning message's generation.
    pub fn from_type_id(id: i32) -> Result<FieldType, i32> {
        Ok(match id {
            1 => FieldType::Double,
            2 => FieldType::Float,
            3 => FieldType::Int64,
            4 => FieldType::Uint64,
            5 => FieldType::Int32,
            6 => FieldType::Fixed64,
            7 => FieldType::Fixed32,
            8 => FieldType::Bool,
            9 => FieldType::String,
            11 => FieldType::Message,
            12 => FieldType::Bytes,
            13 => FieldType::Uint32,
            14 => FieldType::Enum,
            15 => FieldType::Sfixed32,
            16 => FieldType::Sfixed64,
            17 => FieldType::Sint32,
            18 => FieldType::Sint64,
            // 10 is TYPE_GROUP, proto2-only and not generated for.
            other => return Err(other),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Optional,
    Required,
    Repeated,
}

/// Key/value shape of a protobuf map field, recovered from the synthetic
/// two-field entry message.
#[derive(Debug, Clone)]
pub struct MapEntry {
    pub key_type: FieldType,
    pub value_type: FieldType,
    pub value_type_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub number: u32,
    pub ty: FieldType,
    /// Qualified name of the referenced type, present exactly when `ty` is
    /// `Message` or `Enum`.
    pub type_name: Option<String>,
    pub label: Label,
    pub oneof_index: Option<i32>,
    pub map_entry: Option<MapEntry>,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub name: String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone)]
pub struct Enum {
    pub name: String,
    /// Variants in declaration order, as (name, number) pairs.
    pub variants: Vec<(String, i32)>,
}

/// One schema file's worth of descriptors, ready for codegen.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub package: String,
    pub messages: Vec<Message>,
    pub enums: Vec<Enum>,
}

/// Lower a file descriptor into the generator's model.
pub fn extract(file: &FileDescriptorProto) -> Result<Schema, Error> {
    let package = file.package().to_string();

    // First pass: index the synthetic map-entry messages by qualified name,
    // so fields referencing them can be folded in the second pass.
    let mut map_entries = HashMap::new();
    let prefix = if package.is_empty() { String::new() } else { format!(".{package}") };
    for message in &file.message_type {
        index_map_entries(message, &prefix, &mut map_entries)?;
    }

    let mut schema = Schema { package, ..Default::default() };
    for message in &file.message_type {
        extract_message(message, &[], &map_entries, &mut schema)?;
    }
    for en in &file.enum_type {
        schema.enums.push(extract_enum(en, &[]));
    }
    Ok(schema)
}

/// Join nested-type path segments into one flat camel-case type name.
pub fn flat_type_name(parts: &[&str]) -> String {
    parts.iter().map(|p| p.to_upper_camel_case()).collect()
}

fn is_map_entry(message: &DescriptorProto) -> bool {
    message.options.as_ref().is_some_and(|o| o.map_entry())
}

fn index_map_entries(
    message: &DescriptorProto,
    prefix: &str,
    out: &mut HashMap<String, MapEntry>,
) -> Result<(), Error> {
    let qualified = format!("{prefix}.{}", message.name());
    if is_map_entry(message) {
        out.insert(qualified.clone(), map_entry_shape(message)?);
        return Ok(());
    }
    for nested in &message.nested_type {
        index_map_entries(nested, &qualified, out)?;
    }
    Ok(())
}

/// Recover the {1: key, 2: value} shape of a synthetic map-entry message.
fn map_entry_shape(message: &DescriptorProto) -> Result<MapEntry, Error> {
    let by_number = |n: i32| message.field.iter().find(|f| f.number() == n);
    let (Some(key), Some(value)) = (by_number(1), by_number(2)) else {
        return Err(Error::MalformedMapEntry { entry: message.name().to_string() });
    };
    let key_type = FieldType::from_type_id(key.r#type.unwrap_or(0)).map_err(|id| Error::UnsupportedType {
        type_id: id,
        field: key.name().to_string(),
        message: message.name().to_string(),
    })?;
    let value_type = FieldType::from_type_id(value.r#type.unwrap_or(0)).map_err(|id| Error::UnsupportedType {
        type_id: id,
        field: value.name().to_string(),
        message: message.name().to_string(),
    })?;
    Ok(MapEntry {
        key_type,
        value_type,
        value_type_name: value.type_name.clone(),
    })
}

fn extract_message(
    message: &DescriptorProto,
    path: &[&str],
    map_entries: &HashMap<String, MapEntry>,
    schema: &mut Schema,
) -> Result<(), Error> {
    if is_map_entry(message) {
        return Ok(());
    }

    let mut parts = path.to_vec();
    parts.push(message.name());
    let name = flat_type_name(&parts);

    let mut fields = Vec::with_capacity(message.field.len());
    for field in &message.field {
        fields.push(extract_field(field, &name, map_entries)?);
    }
    schema.messages.push(Message { name: name.clone(), fields });

    for nested in &message.nested_type {
        extract_message(nested, &parts, map_entries, schema)?;
    }
    for en in &message.enum_type {
        schema.enums.push(extract_enum(en, &parts));
    }
    Ok(())
}

fn extract_field(
    field: &FieldDescriptorProto,
    message_name: &str,
    map_entries: &HashMap<String, MapEntry>,
) -> Result<Field, Error> {
    let ty = FieldType::from_type_id(field.r#type.unwrap_or(0)).map_err(|id| Error::UnsupportedType {
        type_id: id,
        field: field.name().to_string(),
        message: message_name.to_string(),
    })?;

    let number = field.number();
    if number < 1 {
        return Err(Error::InvalidFieldNumber {
            number,
            field: field.name().to_string(),
            message: message_name.to_string(),
        });
    }

    let label = match field.label() {
        prost_types::field_descriptor_proto::Label::Repeated => Label::Repeated,
        prost_types::field_descriptor_proto::Label::Required => Label::Required,
        prost_types::field_descriptor_proto::Label::Optional => Label::Optional,
    };

    // A map field arrives as a repeated message whose type is a synthetic
    // entry; fold the entry's shape into the field itself.
    let map_entry = if ty == FieldType::Message && label == Label::Repeated {
        field.type_name.as_deref().and_then(|tn| map_entries.get(tn)).cloned()
    } else {
        None
    };

    Ok(Field {
        name: field.name().to_string(),
        number: number as u32,
        ty,
        type_name: field.type_name.clone(),
        label,
        oneof_index: field.oneof_index,
        map_entry,
    })
}

fn extract_enum(en: &EnumDescriptorProto, path: &[&str]) -> Enum {
    let mut parts = path.to_vec();
    parts.push(en.name());
    Enum {
        name: flat_type_name(&parts),
        variants: en.value.iter().map(|v| (v.name().to_string(), v.number())).collect(),
    }
}
