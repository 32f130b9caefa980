pub mod commands;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use crate::bot::commands::{handle, Command};
use crate::monitoring::monitor::SignalMonitor;
use crate::notify::telegram::TelegramClient;
use crate::notify::Notifier;

const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Long-poll Telegram for commands and apply them to the monitor
pub async fn run_command_loop(
    client: Arc<TelegramClient>,
    monitor: Arc<SignalMonitor>,
    mut shutdown: watch::Receiver<bool>,
) {
    info!("🤖 Listening for bot commands");
    let mut offset: i64 = 0;

    loop {
        if *shutdown.borrow() {
            break;
        }

        let updates = tokio::select! {
            updates = client.get_updates(offset) => updates,
            _ = shutdown.changed() => break,
        };

        let updates = match updates {
            Ok(updates) => updates,
            Err(e) => {
                warn!("Failed to poll bot updates: {:#}", e);
                tokio::select! {
                    _ = tokio::time::sleep(RETRY_DELAY) => continue,
                    _ = shutdown.changed() => break,
                }
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);

            let Some(message) = update.message else { continue };
            let Some(command) = message.text.as_deref().and_then(Command::parse) else {
                continue;
            };

            let chat_id = message.chat.id.to_string();
            debug!("Command {:?} from chat {}", command, chat_id);

            let reply = handle(command, &monitor, &chat_id);
            if let Err(e) = client.send(&chat_id, &reply).await {
                warn!("Failed to reply to chat {}: {}", chat_id, e);
            }
        }
    }

    info!("Command listener stopped");
}
