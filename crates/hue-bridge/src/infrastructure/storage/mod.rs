//! Storage infrastructure.
//!
//! - **`config`** – TOML config file load/save and platform config paths.

pub mod config;
