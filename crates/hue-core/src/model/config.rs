//! Credential handshake records.
//!
//! Creating a user is a `POST /api` with a [`CreateUser`] body.  The bridge
//! answers with a JSON *array* holding a single record, either
//!
//! ```json
//! [{"success": {"username": "1028d66426293e821ecfd9ef1a0731df"}}]
//! ```
//!
//! or, when the link button has not been pressed,
//!
//! ```json
//! [{"error": {"type": 101, "address": "", "description": "link button not pressed"}}]
//! ```

use serde::{Deserialize, Serialize};

/// Device type sent when the caller does not supply one.
pub const DEFAULT_DEVICE_TYPE: &str = "hue-over-ip#bridge";

/// Body of the credential-creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateUser {
    /// Label identifying the requesting application, `<app>#<device>`.
    #[serde(rename = "devicetype")]
    pub device_type: String,
}

impl CreateUser {
    /// Creates a request for `device_type`, falling back to
    /// [`DEFAULT_DEVICE_TYPE`] when it is empty or blank.
    pub fn new(device_type: impl Into<String>) -> Self {
        let device_type = device_type.into();
        if device_type.trim().is_empty() {
            return Self::default();
        }
        Self { device_type }
    }
}

impl Default for CreateUser {
    fn default() -> Self {
        Self {
            device_type: DEFAULT_DEVICE_TYPE.to_string(),
        }
    }
}

/// A successful credential-creation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateUserResult {
    pub success: CreateUserSuccess,
}

/// The `success` object of a [`CreateUserResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateUserSuccess {
    /// The issued access token.
    pub username: String,
}

impl CreateUserResult {
    /// Returns the issued access token.
    pub fn username(&self) -> &str {
        &self.success.username
    }
}

/// An application-level error record returned by the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

/// The `error` object of an [`ApiErrorResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    /// Numeric error type, e.g. `101` for "link button not pressed".
    #[serde(rename = "type")]
    pub error_type: u16,
    /// Resource the error refers to.  Some firmware omits it.
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub description: String,
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_user_serializes_devicetype_field() {
        // Arrange
        let req = CreateUser::new("my-app#kitchen");

        // Act
        let value = serde_json::to_value(&req).unwrap();

        // Assert
        assert_eq!(value, json!({"devicetype": "my-app#kitchen"}));
    }

    #[test]
    fn test_create_user_default_uses_default_device_type() {
        assert_eq!(CreateUser::default().device_type, DEFAULT_DEVICE_TYPE);
    }

    #[test]
    fn test_create_user_blank_device_type_falls_back_to_default() {
        assert_eq!(CreateUser::new("").device_type, DEFAULT_DEVICE_TYPE);
        assert_eq!(CreateUser::new("   ").device_type, DEFAULT_DEVICE_TYPE);
    }

    #[test]
    fn test_create_user_result_parses_success_record() {
        let result: CreateUserResult =
            serde_json::from_str(r#"{"success":{"username":"abc123"}}"#).unwrap();
        assert_eq!(result.username(), "abc123");
    }

    #[test]
    fn test_create_user_result_rejects_error_record() {
        let result = serde_json::from_str::<CreateUserResult>(
            r#"{"error":{"type":101,"address":"","description":"link button not pressed"}}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_api_error_parses_without_address() {
        let err: ApiErrorResponse =
            serde_json::from_str(r#"{"error":{"type":1,"description":"unauthorized user"}}"#)
                .unwrap();
        assert_eq!(err.error.error_type, 1);
        assert_eq!(err.error.address, "");
        assert_eq!(err.error.description, "unauthorized user");
    }
}
