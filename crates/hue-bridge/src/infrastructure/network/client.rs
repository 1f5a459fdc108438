//! HTTP request execution against a bridge REST API.
//!
//! Every call goes to
//!
//! ```text
//! http://<address>/api[/<username>][/<path>]
//! ```
//!
//! The username is empty for unauthenticated calls (credential creation),
//! in which case that segment is omitted.
//!
//! # Status codes
//!
//! The bridge answers **200** for every request it understood, including
//! application-level failures (those come back as `{"error": ...}` JSON).
//! Any other status therefore means something between us and the bridge
//! is broken, and is reported as [`ClientError::BadStatus`] without looking
//! at the body.
//!
//! # Cancellation
//!
//! [`Client::execute_request`] races the request against a
//! [`CancellationToken`].  When the token fires first the request future is
//! dropped, which aborts the underlying connection, and the call returns
//! [`ClientError::Cancelled`].

use hue_core::RequestInput;
use reqwest::{header, Method, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::domain::ClientConfig;

/// Path segment of the REST API root.
pub const API_ROOT: &str = "api";

/// Coarse classification of a [`ClientError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request could not be built or sent, or was cancelled.
    Request,
    /// The bridge answered with a status other than 200.
    Protocol,
    /// The body did not have the expected shape.
    Deserialization,
}

/// Errors returned by the request client and the bridge handle.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The underlying HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    /// The descriptor's method is not a valid HTTP method.
    #[error("invalid HTTP method {0:?}")]
    InvalidMethod(String),

    /// The composed endpoint is not a valid URL.
    #[error("invalid endpoint {endpoint}: {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },

    /// The request body could not be encoded as JSON.
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// Connecting, sending, or reading the body failed (timeouts included).
    #[error("error executing HTTP request: {0}")]
    Transport(#[source] reqwest::Error),

    /// The caller cancelled the request.
    #[error("request cancelled")]
    Cancelled,

    /// The bridge answered with a non-200 status.
    #[error("HTTP bad status code {status} from {endpoint}")]
    BadStatus { status: u16, endpoint: String },

    /// The body is not valid UTF-8.
    #[error("response body is not valid UTF-8: {0}")]
    InvalidUtf8(#[source] std::string::FromUtf8Error),

    /// The body is not JSON of the expected type.
    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    /// The body is JSON but not of the expected shape.
    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),

    /// The bridge returned an application-level error record where a
    /// success record was expected.
    #[error("bridge returned error {error_type} at {address:?}: {description}")]
    Api {
        error_type: u16,
        address: String,
        description: String,
    },
}

impl ClientError {
    /// Returns the coarse classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Build(_)
            | Self::InvalidMethod(_)
            | Self::InvalidEndpoint { .. }
            | Self::Encode(_)
            | Self::Transport(_)
            | Self::Cancelled => ErrorKind::Request,
            Self::BadStatus { .. } => ErrorKind::Protocol,
            Self::InvalidUtf8(_) | Self::Decode(_) | Self::UnexpectedShape(_) | Self::Api { .. } => {
                ErrorKind::Deserialization
            }
        }
    }

    /// Returns `true` if the caller cancelled the request.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns `true` if the request hit the client's timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }
}

// ── Response ──────────────────────────────────────────────────────────────────

/// A 200 response whose body has not been read yet.
///
/// The client does not assume anything about the body's shape; callers pick
/// [`ApiResponse::text`], [`ApiResponse::bytes`] or [`ApiResponse::json`].
/// Reading the body still honours the cancellation token of the request.
#[derive(Debug)]
pub struct ApiResponse {
    endpoint: String,
    response: reqwest::Response,
    cancel: CancellationToken,
}

impl ApiResponse {
    /// The endpoint the request was sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Gives up the wrapper and returns the raw `reqwest` response.
    pub fn into_inner(self) -> reqwest::Response {
        self.response
    }

    /// Reads the whole body.
    ///
    /// # Errors
    ///
    /// [`ClientError::Transport`] if the connection fails mid-body,
    /// [`ClientError::Cancelled`] if the token fires first.
    pub async fn bytes(self) -> Result<Vec<u8>, ClientError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ClientError::Cancelled),
            body = self.response.bytes() => Ok(body.map_err(ClientError::Transport)?.to_vec()),
        }
    }

    /// Reads the whole body as UTF-8 text.
    ///
    /// # Errors
    ///
    /// As [`ApiResponse::bytes`], plus [`ClientError::InvalidUtf8`].
    pub async fn text(self) -> Result<String, ClientError> {
        let bytes = self.bytes().await?;
        String::from_utf8(bytes).map_err(ClientError::InvalidUtf8)
    }

    /// Reads the whole body and deserializes it as `T`.
    ///
    /// # Errors
    ///
    /// As [`ApiResponse::bytes`], plus [`ClientError::Decode`].
    pub async fn json<T: DeserializeOwned>(self) -> Result<T, ClientError> {
        let bytes = self.bytes().await?;
        serde_json::from_slice(&bytes).map_err(ClientError::Decode)
    }
}

// ── Client ────────────────────────────────────────────────────────────────────

/// Executes requests against one bridge on behalf of one username.
///
/// Keeps no idle connections: each connection is closed as soon as its
/// response body has been read or dropped.  Cloning is cheap.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    username: String,
}

impl Client {
    /// Creates a client for the bridge at `address` (`host` or `host:port`).
    ///
    /// Pass an empty `username` for unauthenticated calls.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Build`] if the HTTP client cannot be created.
    pub fn new(
        address: &str,
        username: impl Into<String>,
        config: &ClientConfig,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(0)
            .build()
            .map_err(ClientError::Build)?;

        Ok(Self {
            http,
            base_url: format!("http://{address}/{API_ROOT}"),
            username: username.into(),
        })
    }

    /// The username this client authenticates with (may be empty).
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Composes the endpoint for `path`.
    ///
    /// ```rust
    /// use hue_bridge::domain::ClientConfig;
    /// use hue_bridge::infrastructure::network::Client;
    ///
    /// let client = Client::new("10.0.0.2", "abc", &ClientConfig::default()).unwrap();
    /// assert_eq!(client.endpoint("lights"), "http://10.0.0.2/api/abc/lights");
    ///
    /// let anonymous = Client::new("10.0.0.2", "", &ClientConfig::default()).unwrap();
    /// assert_eq!(anonymous.endpoint(""), "http://10.0.0.2/api");
    /// ```
    pub fn endpoint(&self, path: &str) -> String {
        let mut endpoint = self.base_url.clone();
        if !self.username.is_empty() {
            endpoint.push('/');
            endpoint.push_str(&self.username);
        }
        let path = path.trim_start_matches('/');
        if !path.is_empty() {
            endpoint.push('/');
            endpoint.push_str(path);
        }
        endpoint
    }

    /// Sends `input` and returns the response if the bridge answered 200.
    ///
    /// A present body is sent as indented JSON with
    /// `Content-Type: application/json`; no body means a bodiless request.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::Request`]: invalid method or endpoint, body encoding,
    ///   transport failure or timeout, cancellation.
    /// - [`ErrorKind::Protocol`]: [`ClientError::BadStatus`].
    pub async fn execute_request(
        &self,
        cancel: &CancellationToken,
        input: RequestInput,
    ) -> Result<ApiResponse, ClientError> {
        let method = Method::from_bytes(input.method.to_ascii_uppercase().as_bytes())
            .map_err(|_| ClientError::InvalidMethod(input.method.clone()))?;

        let endpoint = self.endpoint(&input.path);
        let url = Url::parse(&endpoint).map_err(|source| ClientError::InvalidEndpoint {
            endpoint: endpoint.clone(),
            source,
        })?;

        let mut request = self.http.request(method.clone(), url);
        if let Some(body) = &input.body {
            let encoded = serde_json::to_vec_pretty(body).map_err(ClientError::Encode)?;
            request = request
                .header(header::CONTENT_TYPE, "application/json")
                .body(encoded);
        }

        debug!(%method, %endpoint, has_body = input.body.is_some(), "executing bridge request");

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(%method, %endpoint, "bridge request cancelled");
                return Err(ClientError::Cancelled);
            }
            result = request.send() => result.map_err(ClientError::Transport)?,
        };

        let status = response.status();
        if status != StatusCode::OK {
            warn!(%method, %endpoint, status = status.as_u16(), "bridge returned bad status");
            return Err(ClientError::BadStatus {
                status: status.as_u16(),
                endpoint,
            });
        }

        Ok(ApiResponse {
            endpoint,
            response,
            cancel: cancel.clone(),
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
