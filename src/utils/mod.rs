//! Utility functions and helpers

pub mod certificates;

pub use certificates::{CertificateBundle, CertificateInfo, ANNOTATION_PREFIX};
