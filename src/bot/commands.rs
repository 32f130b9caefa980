use crate::monitoring::monitor::{MonitorError, MonitorStatus, SignalMonitor};

/// Rows shown by `/checked`
const CHECKED_ROWS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    StartAnalysis,
    StopAnalysis,
    Status,
    Checked,
}

impl Command {
    /// Parse the leading `/command` (optionally `/command@botname`) of a message
    pub fn parse(text: &str) -> Option<Self> {
        let first = text.split_whitespace().next()?;
        let name = first.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);

        match name {
            "start" | "help" => Some(Command::Help),
            "start_analiz" | "start_analysis" => Some(Command::StartAnalysis),
            "stop_analiz" | "stop_analysis" => Some(Command::StopAnalysis),
            "status" => Some(Command::Status),
            "checked" => Some(Command::Checked),
            _ => None,
        }
    }
}

/// Apply a command to the monitor and build the reply text
pub fn handle(command: Command, monitor: &SignalMonitor, chat_id: &str) -> String {
    match command {
        Command::Help => {
            "Bot is up. Use /start_analiz to begin analysis, /stop_analiz to stop it, \
             /status to check the state and /checked for recent matches."
                .to_string()
        }
        Command::StartAnalysis => match monitor.start(chat_id) {
            Ok(()) => "✅ Live match monitoring started.".to_string(),
            Err(MonitorError::AlreadyRunning) => "Analysis is already running.".to_string(),
            Err(e) => format!("Could not start analysis: {}", e),
        },
        Command::StopAnalysis => match monitor.stop() {
            // Loop winds down on its own at the next iteration boundary
            Ok(_) => "⛔ Analysis stopped. No more matches will be polled.".to_string(),
            Err(MonitorError::NotRunning) => "Analysis is already stopped.".to_string(),
            Err(e) => format!("Could not stop analysis: {}", e),
        },
        Command::Status => {
            let stats = monitor.stats();
            let mut reply = format!(
                "Analysis: {}\nSignals tracked: {} ({} pending)",
                stats.status, stats.tracked_signals, stats.pending_signals
            );
            if stats.status == MonitorStatus::Running {
                if let Some(destination) = stats.destination {
                    reply.push_str(&format!("\nReporting to: {}", destination));
                }
            }
            reply
        }
        Command::Checked => match monitor.match_log() {
            None => "Match logging is disabled.".to_string(),
            Some(log) => match log.recent(CHECKED_ROWS) {
                Ok(rows) if rows.is_empty() => "No matches checked yet.".to_string(),
                Ok(rows) => format!("Recent checks:\n{}", rows.join("\n")),
                Err(_) => "Match log has not been created yet.".to_string(),
            },
        },
    }
}
