pub mod app;
pub mod config;
pub mod core;
pub mod credentials;
pub mod init;
pub mod lifecycle;
pub mod logging;
#[cfg(feature = "messaging")]
pub mod messaging;

#[cfg(test)]
mod test_support;

pub use app::{get_app, initialize_app, AppRegistry, DEFAULT_APP_NAME};
pub use credentials::Certificate;
pub use init::{ensure_initialized, ensure_initialized_in};

#[cfg(feature = "messaging")]
use crate::core::middleware::AuthMiddleware;
#[cfg(feature = "messaging")]
use messaging::FirebaseMessaging;

/// An initialized Firebase app. Obtained from an [`AppRegistry`].
#[derive(Debug)]
pub struct FirebaseApp {
    name: String,
    certificate: Certificate,
}

impl FirebaseApp {
    pub(crate) fn new(name: String, certificate: Certificate) -> Self {
        Self { name, certificate }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn project_id(&self) -> &str {
        self.certificate.project_id()
    }

    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    #[cfg(feature = "messaging")]
    pub fn messaging(&self) -> FirebaseMessaging {
        FirebaseMessaging::new(AuthMiddleware::new(
            self.certificate.service_account_key().clone(),
        ))
    }
}
