//! Credential bundles with automatic memory zeroing.
//!
//! # Security
//! - Secrets are stored in `Zeroizing<String>` containers and cleared on drop
//! - `Debug` output never contains secret material
//! - Secrets are only exposed to the transport that turns them into headers
//!   or a login

use std::fmt;
use zeroize::Zeroizing;

/// Backend credential bundle.
///
/// The contract layer only cares whether a credential is present; each
/// client decides how (and whether) it can use a given variant.
///
/// # Example
///
/// ```rust
/// use madatdata_core::security::CredentialOptions;
///
/// let creds = CredentialOptions::api_key("key".to_string(), "secret".to_string());
/// assert_eq!(creds.kind(), "api-key");
/// assert!(!format!("{:?}", creds).contains("secret"));
/// ```
#[derive(Clone)]
pub enum CredentialOptions {
    /// Splitgraph API key pair
    ApiKey {
        api_key: Zeroizing<String>,
        api_secret: Zeroizing<String>,
    },
    /// Bearer token (Splitgraph access token or Seafowl write password)
    Token { token: Zeroizing<String> },
}

impl CredentialOptions {
    /// Creates an API key credential.
    pub fn api_key(api_key: String, api_secret: String) -> Self {
        Self::ApiKey {
            api_key: Zeroizing::new(api_key),
            api_secret: Zeroizing::new(api_secret),
        }
    }

    /// Creates a bearer token credential.
    pub fn token(token: String) -> Self {
        Self::Token {
            token: Zeroizing::new(token),
        }
    }

    /// Short, loggable name of the credential variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ApiKey { .. } => "api-key",
            Self::Token { .. } => "token",
        }
    }

    /// Returns `true` when any secret field is empty.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::ApiKey {
                api_key,
                api_secret,
            } => api_key.is_empty() || api_secret.is_empty(),
            Self::Token { token } => token.is_empty(),
        }
    }

    /// Login pair for password-based transports.
    ///
    /// API keys map to `(key, secret)`; tokens have no user name.
    pub fn login(&self) -> (Option<&str>, &str) {
        match self {
            Self::ApiKey {
                api_key,
                api_secret,
            } => (Some(api_key.as_str()), api_secret.as_str()),
            Self::Token { token } => (None, token.as_str()),
        }
    }
}

impl fmt::Debug for CredentialOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print secret material
        f.debug_struct("CredentialOptions")
            .field("kind", &self.kind())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_api_key() {
        let creds = CredentialOptions::api_key("key".to_string(), "secret".to_string());
        assert_eq!(creds.kind(), "api-key");
        assert!(!creds.is_blank());
        assert_eq!(creds.login(), (Some("key"), "secret"));
    }

    #[test]
    fn test_credential_token() {
        let creds = CredentialOptions::token("tok".to_string());
        assert_eq!(creds.kind(), "token");
        assert_eq!(creds.login(), (None, "tok"));
    }

    #[test]
    fn test_credential_blank() {
        assert!(CredentialOptions::token(String::new()).is_blank());
        assert!(CredentialOptions::api_key("key".to_string(), String::new()).is_blank());
    }

    #[test]
    fn test_credential_debug_redacts_secrets() {
        let creds = CredentialOptions::api_key("visible-key".to_string(), "hunter2".to_string());
        let debug = format!("{:?}", creds);

        assert!(debug.contains("api-key"));
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("visible-key"));
    }
}
