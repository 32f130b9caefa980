mod bot;
mod config;
mod data;
mod monitoring;
mod notify;
mod strategies;
mod tracking;

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;
use config::{Config, EnvConfig};
use data::sofascore::ScoreFeedClient;
use monitoring::logger::MatchCheckLog;
use monitoring::monitor::SignalMonitor;
use notify::telegram::TelegramClient;
use notify::{LogNotifier, Notifier};
use strategies::quarter_rules::QuarterStrategies;
use strategies::types::SignalState;
use tracking::persistence::SignalLogDatabase;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("🏀 Quarter signal monitor starting...");

    // Load configuration
    tracing::info!("Loading configuration...");
    let config = Config::load("config.toml")?;
    let env_config = EnvConfig::load()?;

    tracing::info!("Dry run mode: {}", config.system.dry_run);
    tracing::info!(
        "3Q rule: {} (min {} pts, line {})",
        config.strategies.third_quarter.enabled,
        config.strategies.third_quarter.min_points,
        config.strategies.third_quarter.line
    );
    tracing::info!(
        "4Q rule: {} (max diff {}, line {})",
        config.strategies.fourth_quarter.enabled,
        config.strategies.fourth_quarter.max_diff,
        config.strategies.fourth_quarter.line
    );

    // Initialize signal log
    tracing::info!("Initializing database: {}", config.system.database_path);
    let store = Arc::new(SignalLogDatabase::new(&config.system.database_path)?);
    tracking::persistence::report_unresolved(&store).await?;

    // Check database state
    tracing::info!(
        "Signal log: {} issued, {} passed, {} failed",
        store.count_by_status(SignalState::Pending)?,
        store.count_by_status(SignalState::Passed)?,
        store.count_by_status(SignalState::Failed)?
    );

    let feed = Arc::new(ScoreFeedClient::new(&config.feed)?);

    let telegram = match env_config.bot_token.as_deref() {
        Some(token) => Some(Arc::new(TelegramClient::new(&env_config.telegram_api_url, token)?)),
        None if config.system.dry_run => None,
        None => anyhow::bail!("BOT_TOKEN must be set unless system.dry_run is enabled"),
    };

    let notifier: Arc<dyn Notifier> = match &telegram {
        Some(client) if !config.system.dry_run => Arc::clone(client) as Arc<dyn Notifier>,
        _ => {
            tracing::info!("📝 Dry run: notifications go to the log only");
            Arc::new(LogNotifier)
        }
    };

    let match_log = if config.monitoring.csv_logging {
        Some(
            MatchCheckLog::new(config.monitoring.csv_log_path.clone())
                .context("Failed to create match check log")?,
        )
    } else {
        None
    };

    let monitor = Arc::new(SignalMonitor::new(
        feed,
        QuarterStrategies::new(config.strategies.clone()),
        Arc::clone(&store),
        notifier,
        match_log,
        config.monitor.clone(),
    ));

    if let Some(chat_id) = env_config.autostart_chat_id.as_deref() {
        tracing::info!("Autostarting analysis for chat {}", chat_id);
        monitor.start(chat_id)?;
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let command_task = telegram.map(|client| {
        tokio::spawn(bot::run_command_loop(client, Arc::clone(&monitor), shutdown_rx))
    });

    tracing::info!("✅ Monitor initialized successfully");

    // Keep running
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");

    let _ = shutdown_tx.send(true);
    if let Ok(handle) = monitor.stop() {
        handle.join().await;
    }
    if let Some(task) = command_task {
        if let Err(e) = task.await {
            tracing::warn!("Command listener ended abnormally: {}", e);
        }
    }

    tracing::info!(
        "Signals tracked this session: {} ({} pending)",
        monitor.tracker().len(),
        monitor.tracker().pending_count()
    );

    Ok(())
}
