//! # Configuration Management
//!
//! Connection settings, cache lifetimes and observability options.
//! See [`settings`] for the structures and their environment variables.

pub mod settings;

pub use settings::{AppConfig, CacheConfig, ConnectionSettings, ObservabilityConfig};
