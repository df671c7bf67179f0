//! Service account credentials.
//!
//! A credential bundle is the JSON document downloaded from the Firebase console
//! ("Project settings > Service accounts"). It is parsed into a
//! [`ServiceAccountKey`] and checked before any client is built from it, so a
//! malformed bundle is rejected at startup rather than on the first send.

use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::RsaPrivateKey;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use yup_oauth2::ServiceAccountKey;

#[cfg(test)]
mod tests;

const SERVICE_ACCOUNT_TYPE: &str = "service_account";

/// Error type for loading a credential bundle.
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("failed to read credential file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid service account certificate: expected type \"service_account\", got {0:?}")]
    InvalidType(Option<String>),
    #[error("invalid service account certificate: \"{0}\" is missing or empty")]
    MissingField(&'static str),
    #[error("invalid service account certificate: failed to parse private key: {0}")]
    InvalidPrivateKey(String),
}

/// A validated service account credential.
#[derive(Clone)]
pub struct Certificate {
    key: ServiceAccountKey,
    project_id: String,
}

impl Certificate {
    /// Reads and validates the credential bundle at `path`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CredentialError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| CredentialError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Parses and validates a credential bundle held in memory.
    pub fn from_json(json: &str) -> Result<Self, CredentialError> {
        let key: ServiceAccountKey = serde_json::from_str(json)?;
        Self::from_key(key)
    }

    /// Validates an already-deserialized key.
    pub fn from_key(key: ServiceAccountKey) -> Result<Self, CredentialError> {
        if key.key_type.as_deref() != Some(SERVICE_ACCOUNT_TYPE) {
            return Err(CredentialError::InvalidType(key.key_type));
        }
        if key.client_email.trim().is_empty() {
            return Err(CredentialError::MissingField("client_email"));
        }
        if key.private_key.trim().is_empty() {
            return Err(CredentialError::MissingField("private_key"));
        }
        parse_private_key(&key.private_key)?;

        let project_id = match key.project_id.as_deref() {
            Some(id) if !id.trim().is_empty() => id.to_string(),
            _ => return Err(CredentialError::MissingField("project_id")),
        };

        Ok(Self { key, project_id })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    pub fn service_account_key(&self) -> &ServiceAccountKey {
        &self.key
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("project_id", &self.project_id)
            .field("client_email", &self.key.client_email)
            .finish_non_exhaustive()
    }
}

// Bundles from the console carry PKCS#8; older tooling emitted PKCS#1.
fn parse_private_key(pem: &str) -> Result<RsaPrivateKey, CredentialError> {
    RsaPrivateKey::from_pkcs8_pem(pem).or_else(|pkcs8_err| {
        RsaPrivateKey::from_pkcs1_pem(pem)
            .map_err(|_| CredentialError::InvalidPrivateKey(pkcs8_err.to_string()))
    })
}
