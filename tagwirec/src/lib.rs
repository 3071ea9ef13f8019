//! `protoc-gen-tagwire`: a protoc plugin that turns message descriptors into
//! self-contained Rust proto3 codecs with no runtime reflection layer.
//!
//! The pipeline is one-way: descriptor extraction builds the read-only
//! schema model, the message assembler walks it in declaration order, the
//! field generator emits per-shape fragments, and the type resolver supplies
//! every wire-type, cast and default decision from its static table. All
//! generated code calls into one shared runtime source unit, emitted once
//! per run.

pub mod codegen;
pub mod descriptor;
pub mod plugin;
pub mod resolver;

use thiserror::Error as ThisError;

/// Source text of the shared wire-format runtime, emitted once per
/// generation run alongside the generated codecs.
pub const RUNTIME_SOURCE: &str = include_str!("../../runtime-rust/src/lib.rs");

/// File name the runtime is emitted under.
pub const RUNTIME_FILE_NAME: &str = "wire_runtime.rs";

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("unsupported field type {type_id} on field `{field}` in message `{message}`")]
    UnsupportedType { type_id: i32, field: String, message: String },

    #[error("field `{field}` in message `{message}` references a type but carries no type name")]
    MissingTypeName { field: String, message: String },

    #[error("invalid field number {number} on field `{field}` in message `{message}`")]
    InvalidFieldNumber { number: i32, field: String, message: String },

    #[error("map entry `{entry}` does not have the expected {{1: key, 2: value}} shape")]
    MalformedMapEntry { entry: String },

    #[error("failed to decode descriptor input: {0}")]
    Descriptor(#[from] prost::DecodeError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Generate the full source unit for one schema file.
pub fn generate_file(file: &prost_types::FileDescriptorProto) -> Result<String, Error> {
    let schema = descriptor::extract(file)?;
    codegen::generate_schema(&schema)
}
