//! Vault identifier types with the NewType pattern
//!
//! Group and record identifiers are both UUID strings issued by the vault.
//! Wrapping them keeps a record id from being passed where a group id is
//! expected (the get-record call takes both).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate NewType ID wrappers with all required traits
macro_rules! vault_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create an ID from a string value
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Get the inner string value
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Convert to inner string value
            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

vault_id!(
    /// Identifier of a vault group
    GroupId
);

vault_id!(
    /// Identifier of a vault record, as referenced by `SecretKeyReference::record`
    RecordId
);
