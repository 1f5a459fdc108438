//! hue-bridge library crate.
//!
//! Finds Hue bridges on the local network and talks to their REST API.
//!
//! # Architecture
//!
//! ```text
//! [hue-bridge]
//!   ├── domain/              DiscoveryConfig, ClientConfig (plain values)
//!   └── infrastructure/
//!         ├── network/
//!         │     ├── discovery  SSDP multicast search (std UDP sockets)
//!         │     ├── client     HTTP request execution (reqwest)
//!         │     └── bridge     Bridge handle + credential handshake
//!         └── storage/
//!               └── config     TOML config file
//! ```
//!
//! # Typical use
//!
//! ```no_run
//! use hue_bridge::domain::{ClientConfig, DiscoveryConfig};
//! use hue_bridge::infrastructure::network::{discovery, Bridge};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let addresses = discovery::discover(&DiscoveryConfig::default())?;
//! if let Some(address) = addresses.first() {
//!     let bridge = Bridge::with_config(address.clone(), ClientConfig::default())?;
//!     let created = bridge.create_user(&CancellationToken::new(), None).await?;
//!     println!("username: {}", created.username());
//! }
//! # Ok(())
//! # }
//! ```

/// Domain layer: configuration values (no I/O).
pub mod domain;

/// Infrastructure layer: sockets, HTTP and the config file.
pub mod infrastructure;
