//! The protoc plugin transport: a `CodeGeneratorRequest` arrives on stdin,
//! a `CodeGeneratorResponse` leaves on stdout. Generation failures are
//! reported through the response's `error` field, per the plugin contract.

use prost::Message as _;
use prost_types::compiler::{CodeGeneratorRequest, CodeGeneratorResponse, code_generator_response};
use tracing::debug;

use crate::{Error, RUNTIME_FILE_NAME, RUNTIME_SOURCE};

/// Decode a request, generate, and encode the response.
pub fn run(input: &[u8]) -> Result<Vec<u8>, Error> {
    let request = CodeGeneratorRequest::decode(input)?;
    Ok(respond(&request).encode_to_vec())
}

/// Build the response: one generated source per requested file, plus the
/// shared runtime exactly once.
pub fn respond(request: &CodeGeneratorRequest) -> CodeGeneratorResponse {
    let mut response = CodeGeneratorResponse {
        supported_features: Some(code_generator_response::Feature::Proto3Optional as u64),
        ..Default::default()
    };

    let mut files = Vec::with_capacity(request.file_to_generate.len() + 1);
    for name in &request.file_to_generate {
        let Some(file) = request.proto_file.iter().find(|f| f.name() == name.as_str()) else {
            response.error = Some(format!("descriptor for `{name}` missing from request"));
            return response;
        };
        match crate::generate_file(file) {
            Ok(content) => {
                debug!(file = name.as_str(), bytes = content.len(), "generated codec");
                files.push(code_generator_response::File {
                    name: Some(output_name(name)),
                    content: Some(content),
                    ..Default::default()
                });
            }
            Err(err) => {
                response.error = Some(format!("{name}: {err}"));
                return response;
            }
        }
    }
    files.push(code_generator_response::File {
        name: Some(RUNTIME_FILE_NAME.to_string()),
        content: Some(RUNTIME_SOURCE.to_string()),
        ..Default::default()
    });

    response.file = files;
    response
}

/// `dir/foo.proto` -> `dir/foo.rs`.
pub fn output_name(proto_name: &str) -> String {
    let stem = proto_name.strip_suffix(".proto").unwrap_or(proto_name);
    format!("{stem}.rs")
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost_types::{DescriptorProto, FieldDescriptorProto, FileDescriptorProto};

    fn request_with(file: FileDescriptorProto) -> CodeGeneratorRequest {
        CodeGeneratorRequest {
            file_to_generate: vec![file.name().to_string()],
            proto_file: vec![file],
            ..Default::default()
        }
    }

    fn simple_file() -> FileDescriptorProto {
        FileDescriptorProto {
            name: Some("demo/thing.proto".to_string()),
            package: Some("demo".to_string()),
            message_type: vec![DescriptorProto {
                name: Some("Thing".to_string()),
                field: vec![FieldDescriptorProto {
                    name: Some("id".to_string()),
                    number: Some(1),
                    r#type: Some(4), // uint64
                    label: Some(1),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn emits_codec_file_and_runtime_once() {
        let response = respond(&request_with(simple_file()));
        assert_eq!(response.error, None);
        let names: Vec<_> = response.file.iter().map(|f| f.name()).collect();
        assert_eq!(names, ["demo/thing.rs", RUNTIME_FILE_NAME]);
        assert!(response.file[0].content().contains("pub struct Thing"));
        assert!(response.file[1].content().contains("pub fn encode_varint"));
    }

    #[test]
    fn missing_descriptor_is_reported_in_response() {
        let request = CodeGeneratorRequest {
            file_to_generate: vec!["absent.proto".to_string()],
            ..Default::default()
        };
        let response = respond(&request);
        assert!(response.error.unwrap().contains("absent.proto"));
        assert!(response.file.is_empty());
    }

    #[test]
    fn generation_failure_is_reported_in_response() {
        let mut file = simple_file();
        // A message-typed field with no type name cannot be resolved.
        file.message_type[0].field[0].r#type = Some(11);
        let response = respond(&request_with(file));
        let error = response.error.unwrap();
        assert!(error.contains("demo/thing.proto"), "error should name the file: {error}");
        assert!(response.file.is_empty());
    }

    #[test]
    fn round_trips_through_the_wire_envelope() {
        let request = request_with(simple_file());
        let output = run(&request.encode_to_vec()).unwrap();
        let response = CodeGeneratorResponse::decode(output.as_slice()).unwrap();
        assert_eq!(response.file.len(), 2);
    }
}
