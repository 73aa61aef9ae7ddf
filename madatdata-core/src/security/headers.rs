//! Conversion of credentials into HTTP authentication headers.
//!
//! Header values built here are marked sensitive so `reqwest` and `http`
//! never print them in debug output.

use super::CredentialOptions;
use crate::{Result, error::MadatdataError};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use zeroize::Zeroizing;

pub(crate) const API_KEY_HEADER: &str = "x-api-key";
pub(crate) const API_SECRET_HEADER: &str = "x-api-secret";

fn sensitive_value(value: &str, what: &str) -> Result<HeaderValue> {
    let mut header = HeaderValue::from_str(value).map_err(|_| {
        MadatdataError::configuration(format!("{} contains invalid header characters", what))
    })?;
    header.set_sensitive(true);
    Ok(header)
}

/// `Authorization` value for a bearer token, cleared on drop.
fn bearer_value(token: &str) -> Zeroizing<String> {
    Zeroizing::new(format!("Bearer {}", token))
}

/// Headers for a bearer token credential.
pub(crate) fn bearer_headers(token: &str) -> Result<HeaderMap> {
    let value = bearer_value(token);
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, sensitive_value(&value, "token")?);
    Ok(headers)
}

/// Headers for a Splitgraph API key pair.
pub(crate) fn api_key_headers(api_key: &str, api_secret: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static(API_KEY_HEADER),
        sensitive_value(api_key, "API key")?,
    );
    headers.insert(
        HeaderName::from_static(API_SECRET_HEADER),
        sensitive_value(api_secret, "API secret")?,
    );
    Ok(headers)
}

/// Headers for any credential a Splitgraph endpoint accepts.
pub(crate) fn credential_headers(credential: &CredentialOptions) -> Result<HeaderMap> {
    match credential {
        CredentialOptions::ApiKey {
            api_key,
            api_secret,
        } => api_key_headers(api_key, api_secret),
        CredentialOptions::Token { token } => bearer_headers(token),
    }
}
