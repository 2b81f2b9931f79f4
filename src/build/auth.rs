//! Registry credentials.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::build::error::{BuildError, Result};

/// Username and password for a registry push.
#[derive(Debug, Clone)]
pub struct RegistryCredentials {
    pub username: String,
    pub password: SecretString,
}

#[derive(Serialize)]
struct AuthPayload<'a> {
    username: &'a str,
    password: &'a str,
}

impl RegistryCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// The registry auth token: `{"username","password"}` as JSON, base64
    /// encoded with the standard alphabet.
    pub fn encode(&self) -> Result<String> {
        let payload = AuthPayload {
            username: &self.username,
            password: self.password.expose_secret(),
        };
        let json = serde_json::to_vec(&payload).map_err(|e| BuildError::AuthEncoding {
            reason: e.to_string(),
        })?;
        Ok(STANDARD.encode(json))
    }
}
