//! Vault entities as returned by the vault API
//!
//! [`RecordSummary`] is what list calls return; [`Record`] is what a get call
//! returns when the decrypted secret is requested. The record index built by
//! the index cache only ever holds summaries.

use super::id::{GroupId, RecordId};
use super::sensitive::SecretString;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Color marking records that must never act as policy carriers.
pub const RESTRICTED_COLOR: &str = "RED";

/// A vault group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub uuid: GroupId,
    pub name: String,
}

impl Group {
    pub fn new(uuid: impl Into<GroupId>, name: impl Into<String>) -> Self {
        Self { uuid: uuid.into(), name: name.into() }
    }
}

/// Lightweight listing entry for a record; never carries decrypted material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSummary {
    pub uuid: RecordId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub last_modified_at: DateTime<Utc>,
}

impl RecordSummary {
    pub fn is_restricted(&self) -> bool {
        self.color.as_deref() == Some(RESTRICTED_COLOR)
    }
}

/// A fully fetched record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub uuid: RecordId,
    pub name: String,
    pub color: Option<String>,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub url: Option<String>,
    pub file: Option<Vec<u8>>,
    pub comment: Option<String>,
    pub last_modified_at: DateTime<Utc>,
}

impl Record {
    pub fn summary(&self) -> RecordSummary {
        RecordSummary {
            uuid: self.uuid.clone(),
            name: self.name.clone(),
            color: self.color.clone(),
            last_modified_at: self.last_modified_at,
        }
    }

    pub fn username(&self) -> &str {
        self.username.as_deref().unwrap_or_default()
    }

    /// Password, or an empty string when the record has none.
    pub fn password(&self) -> &str {
        self.password.as_ref().map(SecretString::expose_secret).unwrap_or_default()
    }

    pub fn url(&self) -> &str {
        self.url.as_deref().unwrap_or_default()
    }

    /// Attached file, `None` when absent or empty.
    pub fn file(&self) -> Option<&[u8]> {
        self.file.as_deref().filter(|f| !f.is_empty())
    }

    pub fn comment(&self) -> &str {
        self.comment.as_deref().unwrap_or_default()
    }
}

/// What a get-record call should include in its response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordOptions {
    /// Include decrypted secret fields (password, file).
    pub secret: bool,
    /// Include audit metadata (last modification).
    pub audit: bool,
}

impl RecordOptions {
    /// Secret and audit data, as used for every sync fetch.
    pub fn full() -> Self {
        Self { secret: true, audit: true }
    }
}

/// A record summary paired with the group that holds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordIndexEntry {
    pub group: Group,
    pub record: RecordSummary,
}

/// Flattened map from record id to its index entry, shared read-only.
pub type RecordIndex = Arc<HashMap<RecordId, RecordIndexEntry>>;
