//! A handle to one discovered bridge.
//!
//! [`Bridge`] knows the bridge's address and the client settings, and
//! performs the credential handshake.  Everything after the handshake goes
//! through a [`Client`] obtained from [`Bridge::client`].
//!
//! # The handshake (for beginners)
//!
//! A bridge only hands out a username after someone physically presses the
//! round "link" button on top of it.  The application then has about thirty
//! seconds to send
//!
//! ```text
//! POST http://<bridge>/api
//! {"devicetype": "my-app#my-device"}
//! ```
//!
//! and receives `[{"success": {"username": "..."}}]`.  Before the button is
//! pressed the same call returns `[{"error": {"type": 101, ...}}]`.

use hue_core::{ApiErrorResponse, CreateUser, CreateUserResult, RequestInput};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::client::{Client, ClientError};
use crate::domain::ClientConfig;

/// Errors constructing a [`Bridge`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BridgeError {
    #[error("bridge address must not be empty")]
    EmptyAddress,
}

/// A bridge reachable at a known address.
#[derive(Debug, Clone)]
pub struct Bridge {
    address: String,
    config: ClientConfig,
}

impl Bridge {
    /// Creates a handle with the default [`ClientConfig`].
    ///
    /// # Errors
    ///
    /// [`BridgeError::EmptyAddress`] if `address` is empty or blank.
    pub fn new(address: impl Into<String>) -> Result<Self, BridgeError> {
        Self::with_config(address, ClientConfig::default())
    }

    /// Creates a handle with explicit client settings.
    ///
    /// # Errors
    ///
    /// [`BridgeError::EmptyAddress`] if `address` is empty or blank.
    pub fn with_config(address: impl Into<String>, config: ClientConfig) -> Result<Self, BridgeError> {
        let address = address.into().trim().to_string();
        if address.is_empty() {
            return Err(BridgeError::EmptyAddress);
        }
        Ok(Self { address, config })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns a request client bound to this bridge and `username`.
    ///
    /// # Errors
    ///
    /// [`ClientError::Build`] if the HTTP client cannot be created.
    pub fn client(&self, username: impl Into<String>) -> Result<Client, ClientError> {
        Client::new(&self.address, username, &self.config)
    }

    /// Requests a new username.
    ///
    /// `device_type` falls back to the configured device type when `None`
    /// or blank.
    ///
    /// # Errors
    ///
    /// See [`Bridge::create_user_with`].
    pub async fn create_user(
        &self,
        cancel: &CancellationToken,
        device_type: Option<&str>,
    ) -> Result<CreateUserResult, ClientError> {
        let request = match device_type.map(str::trim) {
            Some(device_type) if !device_type.is_empty() => CreateUser::new(device_type),
            _ => CreateUser::new(self.config.device_type.as_str()),
        };
        self.create_user_with(cancel, &request).await
    }

    /// Sends `request` to the unauthenticated API root and returns the first
    /// record of the reply.
    ///
    /// # Errors
    ///
    /// - Any request or protocol error from [`Client::execute_request`].
    /// - [`ClientError::Decode`] if the body is not a JSON array.
    /// - [`ClientError::UnexpectedShape`] if the array is empty.
    /// - [`ClientError::Api`] if the first record is a bridge error record
    ///   (e.g. link button not pressed).
    /// - [`ClientError::Decode`] if the first record is neither.
    pub async fn create_user_with(
        &self,
        cancel: &CancellationToken,
        request: &CreateUser,
    ) -> Result<CreateUserResult, ClientError> {
        let client = self.client("")?;
        let input = RequestInput::post("", request).map_err(ClientError::Encode)?;

        debug!(address = %self.address, device_type = %request.device_type, "requesting new username");
        let body = client.execute_request(cancel, input).await?.bytes().await?;

        let result = parse_create_user_reply(&body)?;
        info!(address = %self.address, "bridge issued a new username");
        Ok(result)
    }
}

/// Extracts the first record of a credential-creation reply.
///
/// Records after the first are ignored.
pub fn parse_create_user_reply(body: &[u8]) -> Result<CreateUserResult, ClientError> {
    let records: Vec<Value> = serde_json::from_slice(body).map_err(ClientError::Decode)?;

    let first = records
        .into_iter()
        .next()
        .ok_or_else(|| ClientError::UnexpectedShape("empty result array".to_string()))?;

    match CreateUserResult::deserialize(&first) {
        Ok(result) => Ok(result),
        Err(decode_err) => match ApiErrorResponse::deserialize(&first) {
            Ok(api) => {
                warn!(
                    error_type = api.error.error_type,
                    description = %api.error.description,
                    "bridge refused to create user"
                );
                Err(ClientError::Api {
                    error_type: api.error.error_type,
                    address: api.error.address,
                    description: api.error.description,
                })
            }
            Err(_) => Err(ClientError::Decode(decode_err)),
        },
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
