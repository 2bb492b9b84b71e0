//! platform-rs: Rust SDK for the universe platform management API
//!
//! Provides the [`PlatformApi`] trait the wizard is written against, the wire
//! types it exchanges, and an HTTP implementation driven by a YAML config file.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use api::PlatformApi;
pub use client::PlatformClient;
pub use config::PlatformConfig;
pub use error::{PlatformError, Result};
pub use types::*;
