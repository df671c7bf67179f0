//! Startup hooks.
//!
//! The host process owns a [`Bootstrap`] and runs it once its own startup is
//! done. Hooks must tolerate being run more than once: auto-reloaders and
//! multi-worker servers routinely bootstrap the same module again.

use crate::app::AppRegistry;
use crate::config::FcmSettings;
use crate::init::ensure_initialized_in;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;


pub trait StartupHook: Send + Sync {
    /// Short identifier used in logs.
    fn label(&self) -> &str;

    /// Called when the owning module is ready. Must not panic or fail.
    fn ready(&self);
}

impl<T: StartupHook + ?Sized> StartupHook for Arc<T> {
    fn label(&self) -> &str {
        (**self).label()
    }

    fn ready(&self) {
        (**self).ready()
    }
}

/// Initializes the Firebase app for push notifications when ready.
pub struct PushNotificationsHook {
    settings: FcmSettings,
    registry: &'static AppRegistry,
    available: AtomicBool,
}

impl PushNotificationsHook {
    pub const LABEL: &'static str = "fcm_django";
    pub const VERBOSE_NAME: &'static str = "FCM Django";

    pub fn new(settings: FcmSettings) -> Self {
        Self::with_registry(settings, AppRegistry::global())
    }

    pub fn with_registry(settings: FcmSettings, registry: &'static AppRegistry) -> Self {
        Self {
            settings,
            registry,
            available: AtomicBool::new(false),
        }
    }

    /// Whether the last `ready()` left a usable Firebase app behind.
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }
}

impl StartupHook for PushNotificationsHook {
    fn label(&self) -> &str {
        Self::LABEL
    }

    fn ready(&self) {
        let ok = ensure_initialized_in(self.registry, &self.settings);
        self.available.store(ok, Ordering::Release);
    }
}

#[derive(Default)]
pub struct Bootstrap {
    hooks: Vec<Box<dyn StartupHook>>,
}

impl Bootstrap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, hook: impl StartupHook + 'static) -> &mut Self {
        self.hooks.push(Box::new(hook));
        self
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Runs every hook in registration order.
    pub fn run(&self) {
        for hook in &self.hooks {
            debug!(hook = hook.label(), "running startup hook");
            hook.ready();
        }
    }
}
