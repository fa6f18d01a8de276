//! Target secret types
//!
//! The target is a generic key/value secret. Its type string selects the
//! assembly strategy and cannot change once set.

use super::request::ObjectMeta;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Target secret type enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum SecretType {
    /// Arbitrary user-defined keys
    #[default]
    Opaque,
    /// `username` and `password` keys
    BasicAuth,
    /// `ssh-privatekey` key
    SshAuth,
    /// `tls.crt` and `tls.key` keys
    Tls,
    /// A single `users` key in htpasswd format
    ApacheHtpasswd,
    /// Any other type string; assembled like an opaque secret
    Other(String),
}

impl SecretType {
    pub const OPAQUE: &'static str = "Opaque";
    pub const BASIC_AUTH: &'static str = "kubernetes.io/basic-auth";
    pub const SSH_AUTH: &'static str = "kubernetes.io/ssh-auth";
    pub const TLS: &'static str = "kubernetes.io/tls";
    pub const APACHE_HTPASSWD: &'static str = "vaultsync.io/apache-htpasswd";

    /// Wire representation of this type
    pub fn as_str(&self) -> &str {
        match self {
            Self::Opaque => Self::OPAQUE,
            Self::BasicAuth => Self::BASIC_AUTH,
            Self::SshAuth => Self::SSH_AUTH,
            Self::Tls => Self::TLS,
            Self::ApacheHtpasswd => Self::APACHE_HTPASSWD,
            Self::Other(s) => s,
        }
    }

    /// Parses a template type; empty means opaque.
    pub fn from_template(value: &str) -> Self {
        match value {
            "" | Self::OPAQUE => Self::Opaque,
            Self::BASIC_AUTH => Self::BasicAuth,
            Self::SSH_AUTH => Self::SshAuth,
            Self::TLS => Self::Tls,
            Self::APACHE_HTPASSWD => Self::ApacheHtpasswd,
            other => Self::Other(other.to_string()),
        }
    }
}

impl FromStr for SecretType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_template(s))
    }
}

impl fmt::Display for SecretType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SecretType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SecretType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::from_template(&value))
    }
}

/// The generic secret produced by the synchronizer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSecret {
    pub metadata: ObjectMeta,
    /// Unset until the first successful build.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub secret_type: Option<SecretType>,
    #[serde(default)]
    pub data: BTreeMap<String, Vec<u8>>,
}

impl TargetSecret {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self { metadata: ObjectMeta::new(namespace, name), ..Default::default() }
    }

    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.data.get(key).map(Vec::as_slice)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| std::str::from_utf8(v).ok())
    }
}
