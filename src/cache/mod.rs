//! Cache primitives shared by the policy, client and index caches.

pub mod ttl;

pub use ttl::TtlCache;
