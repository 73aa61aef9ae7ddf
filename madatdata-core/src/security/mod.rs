//! Security utilities for credential protection.
//!
//! # Security Guarantees
//! - Credentials are stored in `Zeroizing` containers for automatic memory clearing
//! - Secrets never appear in `Debug` output, logs or error messages
//!
//! # Module Structure
//! - `credentials`: backend credential bundles
//! - `headers`: conversion of credentials into HTTP auth headers

mod credentials;
#[cfg(feature = "http")]
pub(crate) mod headers;

pub use credentials::CredentialOptions;
