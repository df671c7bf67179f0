use anyhow::{Context, Result};
use clap::Parser;
use firebase_push::app::{AppRegistry, InitializationState};
use firebase_push::config::Settings;
use firebase_push::lifecycle::{Bootstrap, PushNotificationsHook};
use std::path::PathBuf;
use std::process::ExitCode;

/// Runs the push notification startup hook and reports whether Firebase is usable.
#[derive(Parser, Debug)]
#[command(name = "fcm-check", version, about)]
struct Cli {
    /// JSON settings file. Defaults to ./settings.json when present.
    #[arg(short, long, env = "FCM_SETTINGS_FILE")]
    settings: Option<PathBuf>,

    /// Overrides FCM_DJANGO_SETTINGS.FCM_SERVICE_ACCOUNT_KEY_PATH.
    #[arg(short, long)]
    key_path: Option<String>,

    /// Overrides the configured log level.
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut settings = match &cli.settings {
        Some(path) => Settings::load_from_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => Settings::load().context("Failed to load settings")?,
    };
    if let Some(key_path) = cli.key_path {
        settings.fcm_django_settings.fcm_service_account_key_path = Some(key_path);
    }
    if let Some(level) = cli.log_level {
        settings.log_level = level;
    }

    firebase_push::logging::init(&settings.log_level)?;

    let app_name = settings.fcm_django_settings.app_name.clone();
    let mut bootstrap = Bootstrap::new();
    bootstrap.register(PushNotificationsHook::new(settings.fcm_django_settings));
    bootstrap.run();

    let registry = AppRegistry::global();
    match registry.state(&app_name) {
        InitializationState::Initialized => {
            if let Some(app) = registry.try_get_app(&app_name) {
                println!("{}: initialized for project {}", app.name(), app.project_id());
            }
            Ok(ExitCode::SUCCESS)
        }
        InitializationState::Uninitialized => {
            println!("{}: not initialized, see log output", app_name);
            Ok(ExitCode::FAILURE)
        }
    }
}
