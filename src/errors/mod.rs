//! # Error Handling
//!
//! Error types for the synchronization core, built with `thiserror`.
//! [`SyncError`] covers the whole taxonomy; [`TlsError`] carries the
//! certificate and key decoding failures of the TLS strategy.

pub mod tls;
pub mod types;

pub use tls::TlsError;
pub use types::{Result, SyncError};
