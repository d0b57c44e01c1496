//! Protocol Tests
//!
//! Tests for request decoding and response encoding.

use filevault::protocol::{
    decode_command, decode_response, encode_command, encode_response, Body, Command, Response,
    Status, Verb,
};
use filevault::VaultError;

// =============================================================================
// Command Decoding Tests
// =============================================================================

#[test]
fn test_decode_list() {
    assert_eq!(decode_command(b"LIST").unwrap(), Command::List);
    assert_eq!(decode_command(b"  list  ").unwrap(), Command::List);
}

#[test]
fn test_decode_verb_is_case_insensitive() {
    for line in ["GET a.txt", "get a.txt", "Get a.txt", "gEt a.txt"] {
        let command = decode_command(line.as_bytes()).unwrap();
        assert_eq!(command.verb(), Verb::Get, "{}", line);
        assert_eq!(command.filename(), Some("a.txt"));
    }
}

#[test]
fn test_decode_get_and_delete() {
    assert_eq!(
        decode_command(b"GET report.pdf").unwrap(),
        Command::Get {
            filename: "report.pdf".to_string()
        }
    );
    assert_eq!(
        decode_command(b"DELETE report.pdf").unwrap(),
        Command::Delete {
            filename: "report.pdf".to_string()
        }
    );
}

#[test]
fn test_decode_upload() {
    let command = decode_command(b"UPLOAD test.txt dGVzdCBjb250ZW50Cg==").unwrap();
    assert_eq!(
        command,
        Command::Upload {
            filename: "test.txt".to_string(),
            data: b"test content\n".to_vec(),
        }
    );
}

#[test]
fn test_decode_upload_rejoins_split_payload() {
    // "dGVzdCBjb250ZW50Cg==" broken up by stray whitespace
    let command = decode_command(b"UPLOAD test.txt dGVzdCBj b250\tZW50Cg==").unwrap();
    match command {
        Command::Upload { data, .. } => assert_eq!(data, b"test content\n"),
        other => panic!("Expected UPLOAD command, got {:?}", other),
    }
}

#[test]
fn test_decode_upload_padding_only_is_error() {
    let err = decode_command(b"UPLOAD a.bin ===").unwrap_err();
    assert!(matches!(err, VaultError::Decode(_)));
}

#[test]
fn test_decode_upload_invalid_base64() {
    let err = decode_command(b"UPLOAD a.bin not*base64!").unwrap_err();
    assert!(matches!(err, VaultError::Decode(_)));
    assert!(err.to_string().starts_with("invalid base64 payload"));
}

#[test]
fn test_decode_wrong_token_counts() {
    for line in [
        "",
        "   ",
        "LIST extra",
        "GET",
        "GET a.txt b.txt",
        "DELETE",
        "DELETE a.txt b.txt",
        "UPLOAD",
        "UPLOAD a.txt",
    ] {
        let err = decode_command(line.as_bytes()).unwrap_err();
        assert!(matches!(err, VaultError::InvalidCommand), "{:?}", line);
        assert_eq!(err.to_string(), "invalid command format");
    }
}

#[test]
fn test_decode_unknown_verb() {
    let err = decode_command(b"FOO bar").unwrap_err();
    assert!(matches!(err, VaultError::InvalidCommand));
}

#[test]
fn test_decode_non_utf8() {
    let err = decode_command(&[0x47, 0x45, 0x54, 0x20, 0xFF, 0xFE]).unwrap_err();
    assert!(matches!(err, VaultError::InvalidCommand));
}

// =============================================================================
// Command Encoding Tests
// =============================================================================

#[test]
fn test_encode_commands() {
    assert_eq!(encode_command(&Command::List), b"LIST\r\n\r\n");
    assert_eq!(
        encode_command(&Command::Delete {
            filename: "a.txt".to_string()
        }),
        b"DELETE a.txt\r\n\r\n"
    );
    assert_eq!(
        encode_command(&Command::Upload {
            filename: "test.txt".to_string(),
            data: b"test content\n".to_vec(),
        }),
        b"UPLOAD test.txt dGVzdCBjb250ZW50Cg==\r\n\r\n"
    );
}

#[test]
fn test_encoded_binary_upload_decodes() {
    let data: Vec<u8> = (0..=255).collect();
    let encoded = encode_command(&Command::Upload {
        filename: "all.bin".to_string(),
        data: data.clone(),
    });
    let frame = &encoded[..encoded.len() - 4];
    match decode_command(frame).unwrap() {
        Command::Upload { filename, data: decoded } => {
            assert_eq!(filename, "all.bin");
            assert_eq!(decoded, data);
        }
        other => panic!("Expected UPLOAD command, got {:?}", other),
    }
}

// =============================================================================
// Response Encoding Tests
// =============================================================================

#[test]
fn test_encode_message_response() {
    let bytes = encode_response(&Response::message("test.txt uploaded")).unwrap();
    assert_eq!(bytes, b"{\"status\":\"OK\",\"data\":\"test.txt uploaded\"}\r\n\r\n");
}

#[test]
fn test_encode_file_response() {
    let bytes = encode_response(&Response::file("test.txt", b"test content\n")).unwrap();
    assert_eq!(
        bytes,
        &b"{\"status\":\"OK\",\"data_namafile\":\"test.txt\",\"data_file\":\"dGVzdCBjb250ZW50Cg==\"}\r\n\r\n"[..]
    );
}

#[test]
fn test_encode_list_response() {
    let response = Response::list(vec!["a.txt".to_string(), "b.png".to_string()]);
    let bytes = encode_response(&response).unwrap();
    assert_eq!(bytes, b"{\"status\":\"OK\",\"data\":[\"a.txt\",\"b.png\"]}\r\n\r\n");

    let empty = encode_response(&Response::list(Vec::new())).unwrap();
    assert_eq!(empty, b"{\"status\":\"OK\",\"data\":[]}\r\n\r\n");
}

#[test]
fn test_encode_error_response() {
    let bytes = encode_response(&Response::error("file not found: missing.txt")).unwrap();
    assert_eq!(
        bytes,
        &b"{\"status\":\"ERROR\",\"data\":\"file not found: missing.txt\"}\r\n\r\n"[..]
    );
}

// =============================================================================
// Response Decoding Tests
// =============================================================================

#[test]
fn test_decode_response_shapes_by_field_presence() {
    let file = decode_response(
        br#"{"status":"OK","data_namafile":"a.txt","data_file":"aGk="}"#,
    )
    .unwrap();
    assert_eq!(file.status, Status::Ok);
    assert!(matches!(file.body, Body::File { ref name, .. } if name == "a.txt"));
    assert_eq!(file.file_bytes().unwrap(), b"hi");

    let list = decode_response(br#"{"status":"OK","data":["a.txt"]}"#).unwrap();
    assert_eq!(list.names(), Some(&["a.txt".to_string()][..]));

    let error = decode_response(br#"{"status":"ERROR","data":"boom"}"#).unwrap();
    assert!(!error.is_ok());
    assert_eq!(error.text(), Some("boom"));
}

#[test]
fn test_decode_response_accepts_spaced_json() {
    let response = decode_response(br#"{"status": "OK", "data": "x.txt deleted"}"#).unwrap();
    assert_eq!(response, Response::message("x.txt deleted"));
}

#[test]
fn test_decode_response_rejects_garbage() {
    assert!(matches!(decode_response(b"not json"), Err(VaultError::Json(_))));
    assert!(decode_response(br#"{"status":"MAYBE","data":"x"}"#).is_err());
    assert!(decode_response(br#"{"status":"OK"}"#).is_err());
}

#[test]
fn test_file_bytes_on_message_is_error() {
    assert!(Response::message("hello").file_bytes().is_err());
}
