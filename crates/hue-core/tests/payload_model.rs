//! Integration tests for the hue-core payload model and discovery protocol.
//!
//! These tests go through the public API only, the same way the `hue-bridge`
//! crate uses it: build a probe, recognise replies, and parse the JSON bodies
//! a real bridge sends back.

use hue_core::{
    is_bridge_response, ApiErrorResponse, CreateUser, CreateUserResult, RequestInput,
    SearchRequest,
};
use serde_json::{json, Value};

#[test]
fn test_probe_is_plain_ascii_text() {
    let probe = SearchRequest::default().encode();
    assert!(probe.is_ascii());
    assert!(probe.len() < 1500, "probe must fit in a single datagram");
}

#[test]
fn test_bridge_reply_from_real_firmware_is_recognised() {
    let reply = "HTTP/1.1 200 OK\r\n\
                 LOCATION: http://10.0.0.7:80/description.xml\r\n\
                 SERVER: Hue/1.0 UPnP/1.0 IpBridge/1.60.0\r\n\r\n";
    assert!(is_bridge_response(reply.as_bytes()));
}

#[test]
fn test_create_user_body_matches_bridge_field_names() {
    // Arrange
    let req = CreateUser::new("hue-over-ip#test");

    // Act
    let body: Value = serde_json::from_str(&serde_json::to_string(&req).unwrap()).unwrap();

    // Assert
    assert_eq!(body, json!({"devicetype": "hue-over-ip#test"}));
}

#[test]
fn test_wrapped_success_array_parses_first_element() {
    // The bridge wraps single results in a one-element array.
    let body = r#"[{"success":{"username":"abc123"}}]"#;

    let results: Vec<CreateUserResult> = serde_json::from_str(body).unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].username(), "abc123");
}

#[test]
fn test_wrapped_error_array_parses_as_api_error() {
    let body = r#"[{"error":{"type":101,"address":"","description":"link button not pressed"}}]"#;

    let results: Vec<ApiErrorResponse> = serde_json::from_str(body).unwrap();

    assert_eq!(results[0].error.error_type, 101);
    assert_eq!(results[0].error.description, "link button not pressed");
}

#[test]
fn test_request_input_body_is_json_value() {
    let input = RequestInput::post("lights", &json!({"on": true})).unwrap();
    assert_eq!(input.body, Some(json!({"on": true})));
}
