//! # Credential Policies
//!
//! Policies live in vault record comments and bind a namespace (by name, name
//! pattern or label selector) to the record's client credentials. This module
//! loads them, caches the set and resolves the policy serving a namespace.

pub mod cache;
pub mod declaration;
pub mod engine;
pub mod loader;
pub mod namespaces;
pub mod resolver;
pub mod selector;

pub use cache::PolicyCache;
pub use declaration::{policies_from_record, POLICY_MARKER};
pub use engine::PolicyEngine;
pub use loader::{PolicyLoader, PolicySource};
pub use namespaces::{NamespaceCatalog, NamespaceLister};
pub use resolver::NamespacePolicyResolver;
pub use selector::LabelSelector;
