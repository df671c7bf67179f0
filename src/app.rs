//! Process-wide registry of initialized Firebase apps.
//!
//! An app is registered at most once per name. Looking an app up never fails:
//! [`AppRegistry::try_get_app`] returns `None` when nothing was registered, so
//! callers probe before initializing instead of reacting to a duplicate error.

use crate::credentials::Certificate;
use crate::FirebaseApp;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use thiserror::Error;


/// Name used when no explicit app name is configured.
pub const DEFAULT_APP_NAME: &str = "[DEFAULT]";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Firebase app named \"{0}\" already exists")]
    AlreadyExists(String),
    #[error("illegal Firebase app name: must be a non-empty string")]
    InvalidName,
}

/// Whether an app name has been registered yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitializationState {
    Uninitialized,
    Initialized,
}

#[derive(Default)]
pub struct AppRegistry {
    apps: Mutex<HashMap<String, Arc<FirebaseApp>>>,
}

static GLOBAL_REGISTRY: OnceLock<AppRegistry> = OnceLock::new();

impl AppRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry shared by the whole process.
    pub fn global() -> &'static AppRegistry {
        GLOBAL_REGISTRY.get_or_init(AppRegistry::new)
    }

    pub fn try_get_app(&self, name: &str) -> Option<Arc<FirebaseApp>> {
        self.lock().get(name).cloned()
    }

    pub fn try_get_default(&self) -> Option<Arc<FirebaseApp>> {
        self.try_get_app(DEFAULT_APP_NAME)
    }

    pub fn state(&self, name: &str) -> InitializationState {
        if self.lock().contains_key(name) {
            InitializationState::Initialized
        } else {
            InitializationState::Uninitialized
        }
    }

    pub fn app_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Registers a new app. Fails if `name` is already taken.
    pub fn initialize_app(
        &self,
        certificate: Certificate,
        name: &str,
    ) -> Result<Arc<FirebaseApp>, AppError> {
        self.entries().register(certificate, name)
    }

    /// Locks the registry for a probe-then-register sequence.
    ///
    /// Holding the returned guard keeps other threads from registering in
    /// between the probe and the registration.
    pub fn entries(&self) -> RegistryEntries<'_> {
        RegistryEntries { apps: self.lock() }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<FirebaseApp>>> {
        // Entries are only ever inserted whole, a poisoned map is still consistent.
        self.apps.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Exclusive view over the registry, see [`AppRegistry::entries`].
pub struct RegistryEntries<'a> {
    apps: MutexGuard<'a, HashMap<String, Arc<FirebaseApp>>>,
}

impl RegistryEntries<'_> {
    pub fn get(&self, name: &str) -> Option<Arc<FirebaseApp>> {
        self.apps.get(name).cloned()
    }

    pub fn register(
        &mut self,
        certificate: Certificate,
        name: &str,
    ) -> Result<Arc<FirebaseApp>, AppError> {
        if name.trim().is_empty() {
            return Err(AppError::InvalidName);
        }
        if self.apps.contains_key(name) {
            return Err(AppError::AlreadyExists(name.to_string()));
        }

        let app = Arc::new(FirebaseApp::new(name.to_string(), certificate));
        self.apps.insert(name.to_string(), app.clone());
        Ok(app)
    }
}

/// Registers an app in the global registry.
pub fn initialize_app(certificate: Certificate, name: &str) -> Result<Arc<FirebaseApp>, AppError> {
    AppRegistry::global().initialize_app(certificate, name)
}

/// Looks an app up in the global registry.
pub fn get_app(name: &str) -> Option<Arc<FirebaseApp>> {
    AppRegistry::global().try_get_app(name)
}
