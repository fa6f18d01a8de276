//! Request object types
//!
//! A [`VaultSecret`] declares which vault records feed which keys of a target
//! secret. The synchronizer reads its spec and owns its status sub-object.

use super::id::RecordId;
use super::vault::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Name, namespace, labels and annotations of a platform object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl ObjectMeta {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self { name: name.into(), namespace: namespace.into(), ..Default::default() }
    }
}

/// Labels and annotations applied to the target secret.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateMetadata {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// Shape of the target secret.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretTemplate {
    /// Target secret type; empty means opaque.
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub secret_type: String,
    #[serde(default)]
    pub metadata: TemplateMetadata,
}

/// Mapping from one vault record to one target secret key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretKeyReference {
    /// Output key (or role name for the strict secret types).
    pub name: String,
    pub record: RecordId,
    /// Record field to emit; empty selects the password.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub property: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub format: String,
}

impl SecretKeyReference {
    pub fn new(name: impl Into<String>, record: impl Into<RecordId>) -> Self {
        Self {
            name: name.into(),
            record: record.into(),
            property: String::new(),
            format: String::new(),
        }
    }

    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.property = property.into();
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// Whether the output should hold a bcrypt hash instead of the plaintext.
    pub fn wants_bcrypt(&self) -> bool {
        self.format == "bcrypt"
    }
}

/// Declarative part of the request object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultSecretSpec {
    #[serde(default)]
    pub template: SecretTemplate,
    pub data: Vec<SecretKeyReference>,
}

/// Overall synchronization state reported on the request object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncStatus {
    Synced,
    OutOfSync,
    #[default]
    Unknown,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Synced => "Synced",
            Self::OutOfSync => "OutOfSync",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last synchronized state of one referenced record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultRecordStatus {
    #[serde(rename = "recordID")]
    pub record_id: RecordId,
    pub name: String,
    pub last_modified_at: DateTime<Utc>,
}

/// Content hash of one produced output key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretKeyStatus {
    pub key: String,
    pub hash: String,
}

/// Observed state of the request object, owned by the synchronizer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultSecretStatus {
    #[serde(default)]
    pub sync: SyncStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vault_record_statuses: Vec<VaultRecordStatus>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secret_key_statuses: Vec<SecretKeyStatus>,
}

impl VaultSecretStatus {
    pub fn record_status(&self, record_id: &RecordId) -> Option<&VaultRecordStatus> {
        self.vault_record_statuses.iter().find(|s| &s.record_id == record_id)
    }

    pub fn key_status(&self, key: &str) -> Option<&SecretKeyStatus> {
        self.secret_key_statuses.iter().find(|s| s.key == key)
    }

    /// Upserts the status entry for a freshly fetched record.
    pub fn set_record_status(&mut self, record: &Record) {
        match self.vault_record_statuses.iter_mut().find(|s| s.record_id == record.uuid) {
            Some(existing) => {
                existing.name = record.name.clone();
                existing.last_modified_at = record.last_modified_at;
            }
            None => self.vault_record_statuses.push(VaultRecordStatus {
                record_id: record.uuid.clone(),
                name: record.name.clone(),
                last_modified_at: record.last_modified_at,
            }),
        }
    }

    /// Upserts the hash entry for an output key.
    pub fn set_key_status(&mut self, key: &str, hash: String) {
        match self.secret_key_statuses.iter_mut().find(|s| s.key == key) {
            Some(existing) => existing.hash = hash,
            None => self.secret_key_statuses.push(SecretKeyStatus { key: key.to_string(), hash }),
        }
    }

    /// Drops record and key statuses that are not in the retained sets.
    /// Returns the keys whose status was removed.
    pub fn retain(&mut self, records: &HashSet<&RecordId>, keys: &HashSet<&str>) -> Vec<String> {
        self.vault_record_statuses.retain(|s| records.contains(&s.record_id));
        let mut removed = Vec::new();
        self.secret_key_statuses.retain(|s| {
            let keep = keys.contains(s.key.as_str());
            if !keep {
                removed.push(s.key.clone());
            }
            keep
        });
        removed
    }

    pub fn clear(&mut self) {
        self.vault_record_statuses.clear();
        self.secret_key_statuses.clear();
    }
}

/// The request object: which vault records map to which target secret keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultSecret {
    pub metadata: ObjectMeta,
    pub spec: VaultSecretSpec,
    #[serde(default)]
    pub status: VaultSecretStatus,
}

impl VaultSecret {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self { metadata: ObjectMeta::new(namespace, name), ..Default::default() }
    }

    pub fn namespace(&self) -> &str {
        &self.metadata.namespace
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// `namespace/name`, used in logs and events.
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.metadata.namespace, self.metadata.name)
    }

    pub fn with_type(mut self, secret_type: impl Into<String>) -> Self {
        self.spec.template.secret_type = secret_type.into();
        self
    }

    pub fn with_reference(mut self, reference: SecretKeyReference) -> Self {
        self.spec.data.push(reference);
        self
    }
}
