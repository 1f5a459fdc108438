//! TOML-based configuration persistence for the `hue` tool.
//!
//! Reads [`AppConfig`] from the platform-appropriate config file:
//! - Windows:  `%APPDATA%\HueOverIP\config.toml`
//! - Linux:    `~/.config/hue-over-ip/config.toml`
//! - macOS:    `~/Library/Application Support/HueOverIP/config.toml`
//!
//! # What is TOML? (for beginners)
//!
//! TOML is a configuration file format designed to be easy to read and
//! write.  Example:
//!
//! ```toml
//! log_level = "debug"
//!
//! [discovery]
//! timeout_secs = 10
//!
//! [client]
//! device_type = "living-room#tablet"
//! ```
//!
//! # Serde default values
//!
//! Every field carries `#[serde(default = "...")]`, so a missing file, an
//! empty file, and a file with only some keys all load successfully.

use std::net::SocketAddrV4;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::config::{DEFAULT_BUFFER_SIZE, DEFAULT_DISCOVERY_TIMEOUT, DEFAULT_REQUEST_TIMEOUT};
use crate::domain::{ClientConfig, DiscoveryConfig};
use hue_core::model::config::DEFAULT_DEVICE_TYPE;
use hue_core::protocol::ssdp::{multicast_group, DEFAULT_SEARCH_TARGET};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// `discovery.multicast_addr` is not an `ip:port` IPv4 address.
    #[error("invalid multicast address {value:?}: {source}")]
    InvalidMulticastAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AppConfig {
    /// `tracing` log level used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub discovery: DiscoverySection,
    #[serde(default)]
    pub client: ClientSection,
}

/// `[discovery]` table.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DiscoverySection {
    #[serde(default = "default_discovery_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    #[serde(default = "default_multicast_addr")]
    pub multicast_addr: String,
    #[serde(default = "default_search_target")]
    pub search_target: String,
}

/// `[client]` table.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ClientSection {
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_device_type")]
    pub device_type: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_discovery_timeout_secs() -> u64 {
    DEFAULT_DISCOVERY_TIMEOUT.as_secs()
}
fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}
fn default_multicast_addr() -> String {
    multicast_group().to_string()
}
fn default_search_target() -> String {
    DEFAULT_SEARCH_TARGET.to_string()
}
fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_secs()
}
fn default_device_type() -> String {
    DEFAULT_DEVICE_TYPE.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            discovery: DiscoverySection::default(),
            client: ClientSection::default(),
        }
    }
}

impl Default for DiscoverySection {
    fn default() -> Self {
        Self {
            timeout_secs: default_discovery_timeout_secs(),
            buffer_size: default_buffer_size(),
            multicast_addr: default_multicast_addr(),
            search_target: default_search_target(),
        }
    }
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            device_type: default_device_type(),
        }
    }
}

// ── Conversion into runtime settings ─────────────────────────────────────────

impl AppConfig {
    /// Builds the discovery settings described by this file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidMulticastAddr`] if `multicast_addr` does not parse.
    pub fn discovery_config(&self) -> Result<DiscoveryConfig, ConfigError> {
        let multicast_addr: SocketAddrV4 =
            self.discovery
                .multicast_addr
                .parse()
                .map_err(|source| ConfigError::InvalidMulticastAddr {
                    value: self.discovery.multicast_addr.clone(),
                    source,
                })?;

        Ok(DiscoveryConfig {
            multicast_addr,
            timeout: Duration::from_secs(self.discovery.timeout_secs),
            buffer_size: self.discovery.buffer_size.max(1),
            search_target: self.discovery.search_target.clone(),
        })
    }

    /// Builds the request client settings described by this file.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            request_timeout: Duration::from_secs(self.client.request_timeout_secs),
            device_type: self.client.device_type.clone(),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads [`AppConfig`] from the platform config file, returning the defaults
/// if the file does not yet exist.
///
/// # Errors
///
/// See [`load_config_from`].
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads [`AppConfig`] from `path`, returning the defaults if the file does
/// not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("HueOverIP"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("hue-over-ip"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("HueOverIP")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
