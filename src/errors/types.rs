//! # Error Types
//!
//! Error taxonomy for the synchronization core using `thiserror`.

use super::tls::TlsError;

/// Custom result type for vaultsync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Main error type for the synchronization core
#[derive(thiserror::Error, Debug)]
pub enum SyncError {
    /// Malformed settings or other configuration problems
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A policy label selector could not be parsed
    #[error("Invalid label selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// No policy grants credentials for the namespace
    #[error("No credentials found for namespace {namespace}")]
    NoPolicyFound { namespace: String },

    /// Two policies match the namespace with the same specificity
    #[error(
        "Policy for client '{client_id}' with label selector '{selector}' matches namespace \
         '{namespace}' with the same score as the policy for client '{other_client_id}' with \
         label selector '{other_selector}'"
    )]
    PolicyConflict {
        namespace: String,
        client_id: String,
        selector: String,
        other_client_id: String,
        other_selector: String,
    },

    /// A declared reference has no matching vault record
    #[error("Record {record} not found for key {key}")]
    RecordNotFound { record: String, key: String },

    /// A vault API call failed
    #[error("Vault request '{operation}' failed: {message}")]
    Upstream { operation: String, message: String },

    /// Certificate or key material could not be decoded
    #[error(transparent)]
    Tls(#[from] TlsError),

    /// The request object does not fit the shape its secret type requires
    #[error("Invalid {secret_type} request: {message}")]
    InvalidRequest { secret_type: String, message: String },

    /// A fetched record lacks content the secret type requires
    #[error("{field} field of record {record} is empty")]
    MissingField { record: String, field: String },

    /// The target secret already carries a different type
    #[error("Secret type is immutable: existing '{existing}', requested '{requested}'")]
    ImmutableType { existing: String, requested: String },

    /// Hashing a secret value failed
    #[error("Hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

impl SyncError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a configuration error with source
    pub fn config_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Config { message: message.into(), source: Some(source) }
    }

    /// Create an invalid selector error
    pub fn invalid_selector<S: Into<String>, R: Into<String>>(selector: S, reason: R) -> Self {
        Self::InvalidSelector { selector: selector.into(), reason: reason.into() }
    }

    /// Create a no-policy error for a namespace
    pub fn no_policy<S: Into<String>>(namespace: S) -> Self {
        Self::NoPolicyFound { namespace: namespace.into() }
    }

    /// Create a record-not-found error
    pub fn record_not_found<R: Into<String>, K: Into<String>>(record: R, key: K) -> Self {
        Self::RecordNotFound { record: record.into(), key: key.into() }
    }

    /// Create an upstream (vault API) error
    pub fn upstream<O: Into<String>, M: Into<String>>(operation: O, message: M) -> Self {
        Self::Upstream { operation: operation.into(), message: message.into() }
    }

    /// Create an invalid request error for a secret type
    pub fn invalid_request<T: Into<String>, M: Into<String>>(secret_type: T, message: M) -> Self {
        Self::InvalidRequest { secret_type: secret_type.into(), message: message.into() }
    }

    /// Create a missing field error
    pub fn missing_field<R: Into<String>, F: Into<String>>(record: R, field: F) -> Self {
        Self::MissingField { record: record.into(), field: field.into() }
    }

    /// Stable category name, used for events and metric labels
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Config { .. } | SyncError::InvalidSelector { .. } => "ConfigurationError",
            SyncError::NoPolicyFound { .. } | SyncError::PolicyConflict { .. } => {
                "PolicyResolutionError"
            }
            SyncError::RecordNotFound { .. } => "RecordNotFoundError",
            SyncError::Upstream { .. } => "UpstreamError",
            SyncError::Tls(_) => "FormatError",
            SyncError::InvalidRequest { .. }
            | SyncError::MissingField { .. }
            | SyncError::ImmutableType { .. } => "InvalidRequestError",
            SyncError::Hash(_) => "InternalError",
        }
    }

    /// Whether the error invalidates the cached policy set
    pub fn is_policy_error(&self) -> bool {
        matches!(
            self,
            SyncError::NoPolicyFound { .. }
                | SyncError::PolicyConflict { .. }
                | SyncError::InvalidSelector { .. }
        )
    }
}

impl From<validator::ValidationErrors> for SyncError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string())
                    })
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        Self::config(format!("Validation failed: {}", message))
    }
}
