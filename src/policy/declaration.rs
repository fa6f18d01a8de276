//! Policy declarations embedded in record comments.
//!
//! A record carries policies when its comment starts with `policies:`; the
//! comment is then a YAML document:
//!
//! ```yaml
//! policies:
//!   - type: namespace
//!     labelSelector: team=a
//! ```

use crate::domain::{ClientCredentials, Policy, PolicyDeclaration, Record};
use serde::Deserialize;

/// Prefix marking a record comment as a policy declaration
pub const POLICY_MARKER: &str = "policies:";

#[derive(Debug, Deserialize)]
struct PolicyComment {
    #[serde(default)]
    policies: Vec<PolicyDeclaration>,
}

/// Why a record yielded no policies
#[derive(Debug, PartialEq, Eq)]
pub enum Skipped {
    /// Username, password or marker missing
    NotAPolicyRecord,
    /// The comment has the marker but is not valid YAML
    Malformed(String),
}

/// Policies declared by a fetched record, with the record's credentials.
pub fn policies_from_record(record: &Record) -> Result<Vec<Policy>, Skipped> {
    if record.username().is_empty()
        || record.password().is_empty()
        || !record.comment().starts_with(POLICY_MARKER)
    {
        return Err(Skipped::NotAPolicyRecord);
    }

    let comment: PolicyComment =
        serde_yaml::from_str(record.comment()).map_err(|e| Skipped::Malformed(e.to_string()))?;

    let credentials = ClientCredentials::new(record.username(), record.password());
    Ok(comment
        .policies
        .into_iter()
        .map(|declaration| Policy::new(declaration, credentials.clone()))
        .collect())
}
