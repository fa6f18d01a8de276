//! # vaultsync
//!
//! Policy-driven synchronization of vault records into platform-native
//! secrets. The crate holds the reconciliation core: it decides which vault
//! credentials serve a request, detects whether anything changed since the
//! last pass, and assembles the target secret for each supported type.
//!
//! ## Architecture
//!
//! ```text
//! request → PolicyEngine → ClientCache → VaultIndexCache → SecretBuilder → target
//!              ↓                                               ↓
//!         PolicyCache ← PolicyLoader                   SecretStrategy per type
//! ```
//!
//! ## Core Components
//!
//! - **Policy layer**: loads namespace policies from vault records and picks
//!   the most specific one for a namespace
//! - **Vault layer**: transport traits, the metered client and its caches
//! - **Secret layer**: change detection and per-type assembly, including TLS
//!   material from PEM bundles, PKCS#12 archives or separate records
//! - **Synchronizer**: one reconciliation pass with status and event output
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vaultsync::{AppConfig, InMemoryVault, NamespaceCatalog, Result, SecretSynchronizer};
//! use vaultsync::{TargetSecret, VaultSecret};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AppConfig::from_env()?;
//!     let vault = Arc::new(InMemoryVault::default());
//!     let namespaces = Arc::new(NamespaceCatalog::default());
//!     let synchronizer = SecretSynchronizer::from_config(&config, vault, namespaces);
//!
//!     let mut request = VaultSecret::new("team-a", "db");
//!     let mut target = TargetSecret::new("team-a", "db");
//!     let outcome = synchronizer.reconcile(&mut request, &mut target).await;
//!     println!("{}", outcome.status);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod domain;
pub mod errors;
pub mod observability;
pub mod policy;
pub mod secret;
pub mod sync;
pub mod utils;
pub mod vault;

// Re-export commonly used types and traits
pub use config::{AppConfig, CacheConfig, ConnectionSettings, ObservabilityConfig};
pub use domain::{
    SecretKeyReference, SecretType, SyncStatus, TargetSecret, VaultSecret, VaultSecretStatus,
};
pub use errors::{Result, SyncError, TlsError};
pub use observability::init_observability;
pub use policy::{NamespaceCatalog, NamespaceLister, PolicyEngine};
pub use sync::{SecretSynchronizer, SyncEvent, SyncOutcome, SyncReason};
pub use vault::{InMemoryVault, VaultApi, VaultConnector};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
