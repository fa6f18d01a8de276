//! Domain layer
//!
//! Plain data types shared by the policy, vault and secret layers. Nothing in
//! here performs I/O.
//!
//! ## Module Organization
//!
//! - `id`: type-safe vault identifiers with the NewType pattern
//! - `sensitive`: redacting wrapper for credential material
//! - `policy`: access policies and the credentials they grant
//! - `vault`: groups, record summaries, fetched records and the record index
//! - `request`: the request object, its spec and its status
//! - `secret`: the target secret and its type

pub mod id;
pub mod policy;
pub mod request;
pub mod secret;
pub mod sensitive;
pub mod vault;

pub use id::{GroupId, RecordId};
pub use policy::{ClientCredentials, CredentialIdentity, Policy, PolicyDeclaration, PolicyKind};
pub use request::{
    ObjectMeta, SecretKeyReference, SecretKeyStatus, SecretTemplate, SyncStatus,
    TemplateMetadata, VaultRecordStatus, VaultSecret, VaultSecretSpec, VaultSecretStatus,
};
pub use secret::{SecretType, TargetSecret};
pub use sensitive::SecretString;
pub use vault::{Group, Record, RecordIndex, RecordIndexEntry, RecordOptions, RecordSummary};
