//! `helperbot run`: wire everything together and listen until shut down.

use super::load_config;
use helperbot_agent::prompt::load_system_template;
use helperbot_agent::{Responder, TranscriptBuilder};
use helperbot_channels::{RedditEndpoints, RedditPlatform};
use helperbot_core::platform::Platform;
use helperbot_core::provider::Provider;
use helperbot_listener::{Listener, TriggerFilter, spawn_status_reporter};
use helperbot_providers::OpenAiCompatProvider;
use helperbot_tools::default_registry;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let missing = config.missing_credentials();
    if !missing.is_empty() {
        return Err(format!("missing required settings: {}", missing.join(", ")).into());
    }

    let platform: Arc<dyn Platform> = Arc::new(RedditPlatform::new(
        &config.reddit,
        &config.bot.subreddits,
        RedditEndpoints::default(),
    )?);
    if !platform.health_check().await? {
        warn!(username = platform.bot_username(), "Reddit token does not belong to the configured account");
    }

    let provider: Arc<dyn Provider> = Arc::new(OpenAiCompatProvider::from_config(&config.model)?);
    let tools = Arc::new(default_registry(&config.tools, &config.retry.search)?);
    let template = load_system_template(config.model.system_prompt_path.as_deref())?;
    let responder = Responder::from_config(provider, tools, &config.model, config.retry.model.clone())
        .with_system_template(template);

    let filter = TriggerFilter::from_config(&config.bot, platform.bot_username())?;
    let builder = TranscriptBuilder::new(config.bot.trigger_regex()?, &config.transcript);
    let mut listener = Listener::new(platform, filter, builder, responder).configure(&config);

    info!(
        model = %config.model.model,
        subreddits = ?config.bot.subreddits,
        rate_limit_secs = config.bot.rate_limit_secs,
        "helperbot starting"
    );

    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone());
    let reporter = config
        .bot
        .status_interval()
        .map(|interval| spawn_status_reporter(listener.subscribe(), interval, cancel.clone()));

    let result = listener.run(cancel.clone()).await;
    cancel.cancel();
    if let Some(reporter) = reporter {
        let _ = reporter.await;
    }
    result?;

    info!("helperbot stopped");
    Ok(())
}

/// Cancel `cancel` on SIGINT or SIGTERM.
fn spawn_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received");
        cancel.cancel();
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
