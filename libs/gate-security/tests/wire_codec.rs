#![allow(clippy::unwrap_used, clippy::expect_used)]

use gate_security::{
    OperationResult, OperationStatus, WireDecodeError, decode_response,
};

#[test]
fn success_frame_is_byte_exact() {
    let result = OperationResult::success()
        .with_param("implName", "RollingLogFile")
        .with_param("level", "3");

    let encoded = result.encode().expect("success frame encodes");

    let mut expected = vec![0, 0, 0, 0];
    expected.extend_from_slice(b"implName=RollingLogFile&level=3");
    assert_eq!(encoded, expected);
}

#[test]
fn error_frame_carries_length_prefixed_message() {
    let result = OperationResult::error("no such instance");
    let encoded = result.encode().expect("error frame encodes");

    assert_eq!(&encoded[..4], &[0, 0, 0, 1]);
    assert_eq!(&encoded[4..6], &16u16.to_be_bytes());
    assert_eq!(&encoded[6..], b"no such instance");
}

#[test]
fn encoding_is_idempotent() {
    let result = OperationResult::restart("restart required")
        .with_param("id", "Foo")
        .with_param("note", "a value with spaces & separators=");

    let first = result.encode().expect("first encode");
    let second = result.encode().expect("second encode");
    assert_eq!(first, second, "encoder must hold no hidden mutable state");
}

#[test]
fn params_round_trip_through_percent_encoding() {
    let result = OperationResult::success()
        .with_param("desc", "a=b&c d")
        .with_param("empty", "");

    let encoded = result.encode().expect("encodes");
    let decoded = decode_response(&encoded).expect("decodes");

    assert_eq!(decoded.status(), OperationStatus::Success);
    assert_eq!(decoded.param("desc"), Some("a=b&c d"));
    assert_eq!(decoded.param("empty"), Some(""));
    assert_eq!(decoded.params().len(), 2);
}

#[test]
fn error_frame_round_trips() {
    let result = OperationResult::error("duplicate roles").with_param("RS_ID", "Administrators");
    let decoded = decode_response(&result.encode().expect("encodes")).expect("decodes");

    assert_eq!(decoded.status(), OperationStatus::Error);
    assert_eq!(decoded.message(), Some("duplicate roles"));
    assert_eq!(decoded.param("RS_ID"), Some("Administrators"));
}

#[test]
fn truncated_frames_are_rejected() {
    assert_eq!(decode_response(&[0, 0]).unwrap_err(), WireDecodeError::Truncated);

    // Error status promises a message the frame does not carry.
    assert_eq!(
        decode_response(&[0, 0, 0, 1, 0]).unwrap_err(),
        WireDecodeError::Truncated
    );
    assert_eq!(
        decode_response(&[0, 0, 0, 1, 0, 5, b'h', b'i']).unwrap_err(),
        WireDecodeError::Truncated
    );
}

#[test]
fn unknown_status_code_is_rejected() {
    assert_eq!(
        decode_response(&[0, 0, 0, 9]).unwrap_err(),
        WireDecodeError::UnknownStatus(9)
    );
}

#[test]
fn debug_never_prints_sensitive_values() {
    let result = OperationResult::success()
        .with_param("bindPwd", "hunter2")
        .with_param("host", "ldap.example.com");

    let rendered = format!("{result:?}");
    assert!(!rendered.contains("hunter2"));
    assert!(rendered.contains("ldap.example.com"));

    // The wire frame still carries the value for the authorized caller.
    let encoded = result.encode().expect("encodes");
    assert!(String::from_utf8(encoded).expect("utf8").contains("hunter2"));
}
