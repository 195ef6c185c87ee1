//! # Adapters Layer
//!
//! - `channel`: in-process transport over `tokio::sync::mpsc`
//! - `config`: TOML and environment loaders for the engine configuration

pub mod channel;
pub mod config;

pub use channel::{connect, spawn_inbound_pump, ChannelTransport};
pub use config::ConfigError;
