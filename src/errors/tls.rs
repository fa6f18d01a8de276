use thiserror::Error;

/// Certificate and key decoding failures raised while assembling TLS secrets.
#[derive(Debug, Error)]
pub enum TlsError {
    /// No certificates were found in the supplied PEM data.
    #[error("No certificate found")]
    EmptyCertificateChain,

    /// The certificate PEM contents were invalid or unreadable.
    #[error("Certificate data is not a valid PEM: {reason}")]
    InvalidCertificatePem { reason: String },

    /// A certificate block could not be parsed as X.509.
    #[error("Certificate could not be parsed: {reason}")]
    InvalidCertificate { reason: String },

    /// The private key PEM contents were invalid or unsupported.
    #[error("Data does not contain a supported private key: {reason}")]
    InvalidPrivateKey { reason: String },

    /// The PKCS#12 container could not be decoded.
    #[error("PKCS#12 data could not be decoded: {reason}")]
    InvalidPkcs12 { reason: String },

    /// The record holding the material has no file attached.
    #[error("Missing file for record {record}")]
    MissingFile { record: String },

    /// Generic metadata extraction failure.
    #[error("Failed to extract certificate metadata: {reason}")]
    CertificateMetadata { reason: String },
}
