//! # Vault access
//!
//! Transport traits, the metered client, and the two vault-facing caches
//! (connected clients and record indexes).

pub mod client;
pub mod clients;
pub mod index;
pub mod memory;

pub use client::{VaultApi, VaultClient, VaultConnector};
pub use clients::ClientCache;
pub use index::VaultIndexCache;
pub use memory::InMemoryVault;
