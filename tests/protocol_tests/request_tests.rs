//! Request/Response Tests
//!
//! Tests for request validation and the response schema.

use ringkv::protocol::{Method, Request, RequestBody, Response, Status, NOT_FOUND};
use serde_json::{json, Value};

fn decode(value: Value) -> ringkv::Result<Request> {
    Request::from_json(value.to_string().as_bytes())
}

// =============================================================================
// Valid Requests
// =============================================================================

#[test]
fn test_decode_insert() {
    let request = decode(json!({"method": "insert", "key": "a", "value": {"x": 1}})).unwrap();
    assert_eq!(
        request,
        Request::Insert {
            key: "a".into(),
            value: json!({"x": 1})
        }
    );
    assert!(request.is_mutation());
    assert_eq!(request.method(), Method::Insert);
}

#[test]
fn test_decode_insert_accepts_any_json_value() {
    for value in [json!(null), json!(1), json!("s"), json!([1, 2]), json!({"n": {"m": true}})] {
        let request = decode(json!({"method": "insert", "key": "k", "value": value.clone()}))
            .unwrap();
        assert_eq!(request, Request::Insert { key: "k".into(), value });
    }
}

#[test]
fn test_decode_lookup_remove_scan() {
    assert_eq!(
        decode(json!({"method": "lookup", "key": "a"})).unwrap(),
        Request::Lookup { key: "a".into() }
    );
    assert_eq!(
        decode(json!({"method": "remove", "key": "a"})).unwrap(),
        Request::Remove { key: "a".into() }
    );
    let scan = decode(json!({"method": "scan", "regex": "^K.*"})).unwrap();
    assert_eq!(scan, Request::Scan { regex: "^K.*".into() });
    assert!(!scan.is_mutation());
}

#[test]
fn test_request_serializes_as_wire_json() {
    let request = Request::Insert {
        key: "a".into(),
        value: json!([1]),
    };
    let value: Value = serde_json::from_slice(&request.to_json().unwrap()).unwrap();
    assert_eq!(value, json!({"method": "insert", "key": "a", "value": [1]}));

    assert_eq!(Request::from_json(&request.to_json().unwrap()).unwrap(), request);
}

// =============================================================================
// Invalid Requests
// =============================================================================

#[test]
fn test_non_string_keys_are_invalid() {
    for method in ["insert", "lookup", "remove"] {
        for key in [json!(1), json!(null), json!(["a"]), json!({"a": 1})] {
            let err = decode(json!({"method": method, "key": key, "value": 1})).unwrap_err();
            assert!(err.is_invalid_request(), "{} with key {}", method, key);
        }
    }
}

#[test]
fn test_empty_key_is_invalid() {
    let err = decode(json!({"method": "insert", "key": "", "value": ""})).unwrap_err();
    assert!(err.is_invalid_request());
}

#[test]
fn test_missing_fields_are_invalid() {
    assert!(decode(json!({"method": "insert", "key": "a"})).unwrap_err().is_invalid_request());
    assert!(decode(json!({"method": "lookup"})).unwrap_err().is_invalid_request());
    assert!(decode(json!({"method": "scan"})).unwrap_err().is_invalid_request());
    assert!(decode(json!({"key": "a"})).unwrap_err().is_invalid_request());
}

#[test]
fn test_unknown_method_is_invalid() {
    let err = decode(json!({"method": "upsert", "key": "a"})).unwrap_err();
    assert!(err.is_invalid_request());
    assert!(err.to_string().contains("upsert"));

    assert!(decode(json!({"method": 7})).unwrap_err().is_invalid_request());
}

#[test]
fn test_non_string_regex_is_invalid() {
    assert!(decode(json!({"method": "scan", "regex": null})).unwrap_err().is_invalid_request());
}

#[test]
fn test_malformed_json_is_invalid() {
    let err = Request::from_json(b"{\"method\": ").unwrap_err();
    assert!(err.is_invalid_request());
    assert!(Request::from_json(b"[1,2]").unwrap_err().is_invalid_request());
}

// =============================================================================
// RequestBody
// =============================================================================

#[test]
fn test_request_body_carries_non_string_keys() {
    let body = RequestBody::insert(json!(1), json!({"age": "57"}));
    let value: Value = serde_json::from_slice(&body.to_json().unwrap()).unwrap();
    assert_eq!(value, json!({"method": "insert", "key": 1, "value": {"age": "57"}}));
}

#[test]
fn test_request_body_keeps_null_value() {
    let body = RequestBody::insert("a", Value::Null);
    let value: Value = serde_json::from_slice(&body.to_json().unwrap()).unwrap();
    assert_eq!(value, json!({"method": "insert", "key": "a", "value": null}));
}

#[test]
fn test_request_body_from_request() {
    let request = Request::Scan { regex: "a+".into() };
    assert_eq!(RequestBody::from(&request), RequestBody::scan("a+"));
}

// =============================================================================
// Responses
// =============================================================================

#[test]
fn test_response_schema() {
    let ok = serde_json::to_value(Response::success(json!(3))).unwrap();
    assert_eq!(ok, json!({"status": "Success", "result": 3}));

    let failure = serde_json::to_value(Response::failure("disk full")).unwrap();
    assert_eq!(failure, json!({"status": "Failure", "error": "disk full"}));

    let invalid = serde_json::to_value(Response::invalid_request("TypeError")).unwrap();
    assert_eq!(invalid, json!({"status": "Invalid Request", "error": "TypeError"}));
}

#[test]
fn test_not_found_is_a_success() {
    let response = Response::not_found();
    assert_eq!(response.status, Status::Success);
    assert!(response.is_not_found());
    assert_eq!(response.message(), NOT_FOUND);

    assert!(!Response::success(json!(NOT_FOUND)).is_not_found());
    assert!(!Response::success(Value::Null).is_not_found());
}

#[test]
fn test_response_parses_from_wire() {
    let response: Response =
        serde_json::from_str(r#"{"status":"Invalid Request","error":"KeyError"}"#).unwrap();
    assert!(response.is_invalid_request());
    assert!(!response.is_not_found());
}
