use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use story_api::{StoryApi, StoryClient, default_client};
use story_notify::config::{AccountFile, AppConfig, JsonSettings, Preferences, SettingsStore};
use story_notify::credentials::{
    Authenticator, CommandAuthenticator, FallbackAuthenticator, SessionRecovery,
};
use story_notify::logging::init_logging;
use story_notify::monitor::PollingEngine;
use story_notify::notification::{Notifier, TracingNotifier};
use story_notify::panic_hook;
use story_notify::update::{CURRENT_VERSION, UpdateChecker};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const UPDATE_REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().context("invalid configuration")?;

    let (logging, _log_guard) = init_logging(&config.log_dir)?;
    panic_hook::install(&config.log_dir);
    info!(version = CURRENT_VERSION, data_dir = %config.data_dir.display(), "story-notify starting");

    let account = Arc::new(AccountFile::new(config.account_path()));
    if let Err(e) = account.ensure_exists() {
        error!(error = %e, "Account file is not usable");
        return Err(e.into());
    }

    let cancel = CancellationToken::new();
    logging.start_retention_cleanup(cancel.child_token());

    let http = default_client()?;
    let client = match &config.api_base_url {
        Some(base) => StoryClient::with_base_url(http, base)?,
        None => StoryClient::new(http),
    };
    let api: Arc<dyn StoryApi> = Arc::new(client);

    let authenticator = build_authenticator(&config);
    if authenticator.is_empty() {
        warn!(
            "No login helper configured (STORY_NOTIFY_LOGIN_HELPER), expired sessions cannot be renewed"
        );
    }
    let authenticator = Arc::new(authenticator);
    let recovery = Arc::new(SessionRecovery::new(api.clone(), authenticator, account));

    let settings: Arc<dyn SettingsStore> = Arc::new(JsonSettings::new(config.settings_path()));
    let preferences = Preferences::new(settings.clone());
    let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);

    let engine = PollingEngine::new(
        api,
        recovery,
        preferences,
        notifier.clone(),
        config.poll_interval,
    );

    let update_http = reqwest::Client::builder()
        .timeout(UPDATE_REQUEST_TIMEOUT)
        .user_agent(format!("story-notify/{} (update-check)", CURRENT_VERSION))
        .build()
        .context("build update HTTP client")?;
    let updater = UpdateChecker::new(update_http, &config, settings, notifier)?;

    let engine_task = tokio::spawn(engine.run(cancel.child_token()));
    let update_task = tokio::spawn(updater.run(cancel.child_token()));

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("Shutdown requested");
    cancel.cancel();

    for (name, task) in [("engine", engine_task), ("update checker", update_task)] {
        if let Err(e) = task.await {
            warn!(task = name, error = %e, "Task ended abnormally");
        }
    }

    info!("story-notify stopped");
    Ok(())
}

/// Headless login first, then an interactive one the user can complete by hand.
fn build_authenticator(config: &AppConfig) -> FallbackAuthenticator {
    let Some(helper) = &config.login_helper else {
        return FallbackAuthenticator::new(Vec::new());
    };

    let args = config.login_helper_args.clone();
    FallbackAuthenticator::new(vec![
        Arc::new(CommandAuthenticator::headless(helper, args.clone())) as Arc<dyn Authenticator>,
        Arc::new(CommandAuthenticator::interactive(helper, args)),
    ])
}
