//! Codec Tests
//!
//! Tests for frame encoding, incremental decoding and stream helpers.

use std::io::{BufReader, Cursor};

use ringkv::protocol::{
    encode_frame, encode_request, encode_response, parse_length, read_frame, write_frame,
    FrameDecoder, RequestBody, Response,
};
use ringkv::RingError;
use serde_json::json;

// =============================================================================
// Encoding Tests
// =============================================================================

#[test]
fn test_encode_frame_prefixes_byte_length() {
    let frame = encode_frame(br#"{"a":1}"#);
    assert_eq!(frame, br#"7,{"a":1}"#.to_vec());
}

#[test]
fn test_encode_frame_counts_bytes_not_chars() {
    let body = r#"{"key":"héllo"}"#;
    let frame = encode_frame(body.as_bytes());

    let expected = format!("{},{}", body.len(), body);
    assert_eq!(frame, expected.into_bytes());
    assert_ne!(body.len(), body.chars().count());
}

#[test]
fn test_encode_empty_frame() {
    assert_eq!(encode_frame(b""), b"0,".to_vec());
}

#[test]
fn test_encode_request_body_omits_absent_fields() {
    let frame = encode_request(&RequestBody::lookup("a")).unwrap();
    let text = String::from_utf8(frame).unwrap();
    let (_, body) = text.split_once(',').unwrap();

    let value: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(value, json!({"method": "lookup", "key": "a"}));
}

#[test]
fn test_encode_response_uses_wire_status_names() {
    let frame = encode_response(&Response::invalid_request("bad")).unwrap();
    let text = String::from_utf8(frame).unwrap();
    assert!(text.contains(r#""status":"Invalid Request""#));
}

// =============================================================================
// Length Parsing Tests
// =============================================================================

#[test]
fn test_parse_length_accepts_digits() {
    assert_eq!(parse_length(b"0").unwrap(), 0);
    assert_eq!(parse_length(b"1234").unwrap(), 1234);
}

#[test]
fn test_parse_length_rejects_garbage() {
    for header in [&b""[..], b"-1", b"12a", b" 12", b"999999999999999999999999"] {
        let err = parse_length(header).unwrap_err();
        assert!(err.is_invalid_request(), "header {:?} gave {:?}", header, err);
    }
}

// =============================================================================
// FrameDecoder Tests
// =============================================================================

#[test]
fn test_decoder_waits_for_complete_body() {
    let mut decoder = FrameDecoder::new();
    let frame = encode_frame(br#"{"method":"lookup","key":"a"}"#);

    decoder.extend(&frame[..3]);
    assert!(decoder.next_frame().unwrap().is_none());

    decoder.extend(&frame[3..frame.len() - 1]);
    assert!(decoder.next_frame().unwrap().is_none());

    decoder.extend(&frame[frame.len() - 1..]);
    let body = decoder.next_frame().unwrap().unwrap();
    assert_eq!(&body[..], br#"{"method":"lookup","key":"a"}"#);
    assert_eq!(decoder.buffered(), 0);
}

#[test]
fn test_decoder_byte_at_a_time() {
    let mut decoder = FrameDecoder::new();
    let frame = encode_frame(b"hello world");

    let mut bodies = Vec::new();
    for byte in frame {
        decoder.extend(&[byte]);
        if let Some(body) = decoder.next_frame().unwrap() {
            bodies.push(body);
        }
    }

    assert_eq!(bodies.len(), 1);
    assert_eq!(&bodies[0][..], b"hello world");
}

#[test]
fn test_decoder_splits_pipelined_frames() {
    let mut decoder = FrameDecoder::new();
    let mut stream = encode_frame(b"first");
    stream.extend(encode_frame(b"second"));
    stream.extend(encode_frame(b"thi"));
    decoder.extend(&stream[..stream.len() - 1]);

    assert_eq!(&decoder.next_frame().unwrap().unwrap()[..], b"first");
    assert_eq!(&decoder.next_frame().unwrap().unwrap()[..], b"second");
    assert!(decoder.next_frame().unwrap().is_none());
}

#[test]
fn test_decoder_handles_empty_body() {
    let mut decoder = FrameDecoder::new();
    decoder.extend(b"0,");
    assert_eq!(decoder.next_frame().unwrap().unwrap().len(), 0);
}

#[test]
fn test_decoder_rejects_non_numeric_header_and_resets() {
    let mut decoder = FrameDecoder::new();
    decoder.extend(b"abc,{}");

    let err = decoder.next_frame().unwrap_err();
    assert!(err.is_invalid_request());
    assert_eq!(decoder.buffered(), 0);

    decoder.extend(&encode_frame(b"ok"));
    assert_eq!(&decoder.next_frame().unwrap().unwrap()[..], b"ok");
}

#[test]
fn test_decoder_rejects_header_without_comma() {
    let mut decoder = FrameDecoder::new();
    decoder.extend(b"12{\"method\"");

    assert!(decoder.next_frame().unwrap_err().is_invalid_request());
}

#[test]
fn test_decoder_rejects_overlong_header() {
    let mut decoder = FrameDecoder::new();
    decoder.extend(&[b'9'; 40]);

    assert!(decoder.next_frame().is_err());
}

// =============================================================================
// Stream Helper Tests
// =============================================================================

#[test]
fn test_write_then_read_frame() {
    let mut wire = Vec::new();
    write_frame(&mut wire, br#"{"status":"Success"}"#).unwrap();
    write_frame(&mut wire, b"[]").unwrap();

    let mut reader = BufReader::new(Cursor::new(wire));
    assert_eq!(read_frame(&mut reader).unwrap(), br#"{"status":"Success"}"#.to_vec());
    assert_eq!(read_frame(&mut reader).unwrap(), b"[]".to_vec());
}

#[test]
fn test_read_frame_with_tiny_buffer() {
    let wire = encode_frame(&vec![b'x'; 10_000]);
    let mut reader = BufReader::with_capacity(7, Cursor::new(wire));

    assert_eq!(read_frame(&mut reader).unwrap().len(), 10_000);
}

#[test]
fn test_read_frame_short_body_is_protocol_error() {
    let mut reader = BufReader::new(Cursor::new(b"10,short".to_vec()));

    match read_frame(&mut reader) {
        Err(RingError::Protocol(msg)) => assert!(msg.contains("never satisfied")),
        other => panic!("expected protocol error, got {:?}", other),
    }
}

#[test]
fn test_read_frame_on_closed_stream() {
    let mut reader = BufReader::new(Cursor::new(Vec::new()));
    assert!(matches!(read_frame(&mut reader), Err(RingError::Protocol(_))));
}

#[test]
fn test_read_frame_bad_header() {
    let mut reader = BufReader::new(Cursor::new(b"x1,{}".to_vec()));
    assert!(matches!(read_frame(&mut reader), Err(RingError::Protocol(_))));
}
