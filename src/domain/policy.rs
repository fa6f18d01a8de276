//! Access policy types
//!
//! A policy maps namespaces (by exact name, name pattern, or label selector)
//! to the vault credentials used on their behalf. Policies are declared in the
//! comment of a vault record; the record's username and password become the
//! policy's [`ClientCredentials`].

use super::sensitive::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque key identifying one set of vault API credentials.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialIdentity(String);

impl CredentialIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CredentialIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CredentialIdentity {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// API client id and secret pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCredentials {
    pub client_id: CredentialIdentity,
    pub client_secret: SecretString,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<SecretString>) -> Self {
        Self { client_id: CredentialIdentity::new(client_id), client_secret: client_secret.into() }
    }
}

/// Scope a policy applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PolicyKind {
    Namespace,
    /// Declared with a type this version does not understand; never matches.
    #[serde(other)]
    Unsupported,
}

/// Policy as declared in a record comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDeclaration {
    #[serde(rename = "type")]
    pub kind: PolicyKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_regex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_selector: Option<String>,
}

impl PolicyDeclaration {
    /// Declaration matching one namespace by exact name.
    pub fn namespace(name: impl Into<String>) -> Self {
        Self {
            kind: PolicyKind::Namespace,
            name: Some(name.into()),
            name_regex: None,
            label_selector: None,
        }
    }

    /// Declaration matching namespaces whose name matches a regular expression.
    pub fn namespace_regex(pattern: impl Into<String>) -> Self {
        Self {
            kind: PolicyKind::Namespace,
            name: None,
            name_regex: Some(pattern.into()),
            label_selector: None,
        }
    }

    /// Declaration matching namespaces by label selector.
    pub fn namespace_selector(selector: impl Into<String>) -> Self {
        Self {
            kind: PolicyKind::Namespace,
            name: None,
            name_regex: None,
            label_selector: Some(selector.into()),
        }
    }
}

/// A loaded policy: declaration plus the credentials it grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    pub declaration: PolicyDeclaration,
    pub credentials: ClientCredentials,
}

impl Policy {
    pub fn new(declaration: PolicyDeclaration, credentials: ClientCredentials) -> Self {
        Self { declaration, credentials }
    }

    pub fn kind(&self) -> PolicyKind {
        self.declaration.kind
    }

    pub fn client_id(&self) -> &CredentialIdentity {
        &self.credentials.client_id
    }

    pub fn label_selector(&self) -> Option<&str> {
        self.declaration.label_selector.as_deref().filter(|s| !s.is_empty())
    }

    pub fn name_regex(&self) -> Option<&str> {
        self.declaration.name_regex.as_deref().filter(|s| !s.is_empty())
    }

    pub fn name(&self) -> Option<&str> {
        self.declaration.name.as_deref().filter(|s| !s.is_empty())
    }
}
