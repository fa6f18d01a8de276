//! # Secret Assembly
//!
//! Turns a request and the fetched vault records into target secret data.
//! [`SecretBuilder`] handles the common metadata and dispatches to one
//! [`SecretStrategy`] per secret type.

pub mod basic_auth;
pub mod builder;
pub mod hash;
pub mod htpasswd;
pub mod opaque;
pub mod ssh_auth;
pub mod strategy;
pub mod tls;

pub use builder::{SecretBuilder, STANDARD_LABELS};
pub use hash::ContentHasher;
pub use strategy::{strategy_for, BuildContext, MissingRecord, SecretStrategy};
