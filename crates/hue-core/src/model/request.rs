//! Generic request descriptor for arbitrary bridge API calls.

use serde::Serialize;
use serde_json::Value;

/// Describes one HTTP call against the bridge REST API.
///
/// The path is relative to `/api/<username>/`, e.g. `"lights"` or
/// `"lights/1/state"`.  The method is kept as text so this crate stays free of
/// any HTTP library; the client validates it when building the request.
///
/// # Examples
///
/// ```rust
/// use hue_core::RequestInput;
/// use serde_json::json;
///
/// let input = RequestInput::put("lights/1/state", &json!({"on": true})).unwrap();
/// assert_eq!(input.method, "PUT");
/// assert_eq!(input.body, Some(json!({"on": true})));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RequestInput {
    pub method: String,
    pub path: String,
    pub body: Option<Value>,
}

impl RequestInput {
    /// Creates a bodiless request.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            body: None,
        }
    }

    /// Attaches a JSON body, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if `body` cannot be represented as JSON
    /// (for example a map with non-string keys).
    pub fn with_body<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new("GET", path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new("DELETE", path)
    }

    /// # Errors
    ///
    /// See [`RequestInput::with_body`].
    pub fn post<T: Serialize + ?Sized>(
        path: impl Into<String>,
        body: &T,
    ) -> Result<Self, serde_json::Error> {
        Self::new("POST", path).with_body(body)
    }

    /// # Errors
    ///
    /// See [`RequestInput::with_body`].
    pub fn put<T: Serialize + ?Sized>(
        path: impl Into<String>,
        body: &T,
    ) -> Result<Self, serde_json::Error> {
        Self::new("PUT", path).with_body(body)
    }
}
