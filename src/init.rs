//! Idempotent Firebase Admin initialization.
//!
//! [`ensure_initialized`] is safe to call any number of times per process. It
//! probes the registry first, and only when no app is registered does it read
//! the service account key and register a new app. Failures never escape: they
//! are logged and reported as `false`, so a broken push setup cannot stop the
//! host application from starting.

use crate::app::{AppError, AppRegistry};
use crate::config::FcmSettings;
use crate::credentials::{Certificate, CredentialError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// An app was already registered; nothing was read or constructed.
    AlreadyInitialized,
    /// This call registered the app.
    Initialized,
}

#[derive(Error, Debug)]
pub enum InitError {
    #[error("service account key path is not configured")]
    MissingConfiguration,
    #[error("service account key file does not exist: {}", .0.display())]
    CredentialFileNotFound(PathBuf),
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error(transparent)]
    Registration(#[from] AppError),
}

/// Initializes the app described by `settings` in the process-wide registry.
///
/// Returns `true` when an app is available after the call.
pub fn ensure_initialized(settings: &FcmSettings) -> bool {
    ensure_initialized_in(AppRegistry::global(), settings)
}

/// Same as [`ensure_initialized`], against an explicit registry.
pub fn ensure_initialized_in(registry: &AppRegistry, settings: &FcmSettings) -> bool {
    match try_initialize_in(registry, settings) {
        Ok(InitOutcome::AlreadyInitialized) => {
            info!("Firebase Admin SDK already initialized");
            true
        }
        Ok(InitOutcome::Initialized) => {
            info!("Firebase Admin SDK initialized successfully");
            true
        }
        Err(InitError::MissingConfiguration) => {
            error!(
                "Firebase service account key not found at: {}",
                settings
                    .fcm_service_account_key_path
                    .as_deref()
                    .unwrap_or_default()
            );
            false
        }
        Err(InitError::CredentialFileNotFound(path)) => {
            error!(
                "Firebase service account key not found at: {}",
                path.display()
            );
            false
        }
        Err(e) => {
            error!("Failed to initialize Firebase Admin SDK: {}", e);
            false
        }
    }
}

/// Probe-then-register, reporting why initialization did not happen.
///
/// The registry stays locked for the whole sequence, so concurrent callers
/// construct at most one app.
pub fn try_initialize_in(
    registry: &AppRegistry,
    settings: &FcmSettings,
) -> Result<InitOutcome, InitError> {
    let mut entries = registry.entries();
    if entries.get(&settings.app_name).is_some() {
        return Ok(InitOutcome::AlreadyInitialized);
    }

    let path = settings.key_path().ok_or(InitError::MissingConfiguration)?;
    let path = Path::new(path);
    if !path.exists() {
        return Err(InitError::CredentialFileNotFound(path.to_path_buf()));
    }

    let certificate = Certificate::from_file(path)?;
    entries.register(certificate, &settings.app_name)?;
    Ok(InitOutcome::Initialized)
}
