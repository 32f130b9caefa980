//! The polling session: fetch live events, analyse each one concurrently,
//! sleep, repeat until stopped.
//!
//! Per event: summary → rules → dedup + record → persist, then settle the
//! previous quarter's signal if the event has moved on, then notify.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};
use crate::config::MonitorConfig;
use crate::data::types::{FeedError, LiveEvent, MatchSummary};
use crate::data::LiveFeed;
use crate::monitoring::logger::MatchCheckLog;
use crate::notify::format::{format_result, format_signal, format_warning};
use crate::notify::Notifier;
use crate::strategies::quarter_rules::QuarterStrategies;
use crate::strategies::types::Signal;
use crate::tracking::persistence::SignalLogDatabase;
use crate::tracking::resolver::resolve_previous_quarter;
use crate::tracking::tracker::SignalTracker;
use crate::tracking::types::SignalLogEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorStatus {
    Running,
    Stopped,
}

impl std::fmt::Display for MonitorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonitorStatus::Running => f.write_str("running"),
            MonitorStatus::Stopped => f.write_str("stopped"),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MonitorError {
    #[error("monitoring is already running")]
    AlreadyRunning,

    #[error("monitoring is not running")]
    NotRunning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorStats {
    pub status: MonitorStatus,
    pub destination: Option<String>,
    pub tracked_signals: usize,
    pub pending_signals: usize,
}

/// Outcome of one per-event analysis
#[derive(Debug, Default, Clone, Copy)]
struct EventOutcome {
    signals: usize,
    resolutions: usize,
    persist_failures: usize,
    timed_out: bool,
}

#[derive(Debug, Default, Clone, Copy)]
struct IterationReport {
    events: usize,
    signals: usize,
    resolutions: usize,
    failures: usize,
}

/// Shared by the loop and every per-event task
struct Pipeline {
    feed: Arc<dyn LiveFeed>,
    strategies: QuarterStrategies,
    tracker: SignalTracker,
    store: Arc<SignalLogDatabase>,
    notifier: Arc<dyn Notifier>,
    match_log: Option<MatchCheckLog>,
    config: MonitorConfig,
}

struct Session {
    destination: String,
    cancel: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Handle to a stopped session's loop, which may still be finishing its
/// current iteration
pub struct LoopHandle {
    handle: JoinHandle<()>,
}

impl LoopHandle {
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            warn!("Monitoring loop ended abnormally: {}", e);
        }
    }
}

/// Start/stop/status surface over a single monitoring session
pub struct SignalMonitor {
    pipeline: Arc<Pipeline>,
    session: Mutex<Option<Session>>,
}

impl SignalMonitor {
    pub fn new(
        feed: Arc<dyn LiveFeed>,
        strategies: QuarterStrategies,
        store: Arc<SignalLogDatabase>,
        notifier: Arc<dyn Notifier>,
        match_log: Option<MatchCheckLog>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            pipeline: Arc::new(Pipeline {
                feed,
                strategies,
                tracker: SignalTracker::new(),
                store,
                notifier,
                match_log,
                config,
            }),
            session: Mutex::new(None),
        }
    }

    /// Begin polling, sending notifications to `destination`
    pub fn start(&self, destination: &str) -> Result<(), MonitorError> {
        let mut session = self.session.lock();
        if session.is_some() {
            return Err(MonitorError::AlreadyRunning);
        }

        let (cancel, cancel_rx) = watch::channel(false);
        let handle = tokio::spawn(run_loop(
            Arc::clone(&self.pipeline),
            destination.to_string(),
            cancel_rx,
        ));

        *session = Some(Session {
            destination: destination.to_string(),
            cancel,
            handle,
        });
        Ok(())
    }

    /// Request the loop to stop. The current iteration is allowed to finish;
    /// the loop exits at its next boundary.
    pub fn stop(&self) -> Result<LoopHandle, MonitorError> {
        let session = self.session.lock().take().ok_or(MonitorError::NotRunning)?;
        // Receiver may already be gone if the loop exited; nothing to signal then
        let _ = session.cancel.send(true);

        info!("Stop requested for session → {}", session.destination);
        Ok(LoopHandle { handle: session.handle })
    }

    pub fn status(&self) -> MonitorStatus {
        if self.session.lock().is_some() {
            MonitorStatus::Running
        } else {
            MonitorStatus::Stopped
        }
    }

    pub fn stats(&self) -> MonitorStats {
        let session = self.session.lock();
        MonitorStats {
            status: if session.is_some() { MonitorStatus::Running } else { MonitorStatus::Stopped },
            destination: session.as_ref().map(|s| s.destination.clone()),
            tracked_signals: self.pipeline.tracker.len(),
            pending_signals: self.pipeline.tracker.pending_count(),
        }
    }

    pub fn tracker(&self) -> &SignalTracker {
        &self.pipeline.tracker
    }

    pub fn match_log(&self) -> Option<&MatchCheckLog> {
        self.pipeline.match_log.as_ref()
    }
}

fn is_cancelled(cancel: &watch::Receiver<bool>) -> bool {
    *cancel.borrow() || cancel.has_changed().is_err()
}

/// Sleep for `duration` unless cancelled first. Returns true when cancelled.
async fn sleep_or_cancel(cancel: &mut watch::Receiver<bool>, duration: Duration) -> bool {
    if is_cancelled(cancel) {
        return true;
    }

    tokio::select! {
        _ = tokio::time::sleep(duration) => is_cancelled(cancel),
        changed = cancel.changed() => changed.is_err() || *cancel.borrow(),
    }
}

async fn run_loop(pipeline: Arc<Pipeline>, destination: String, mut cancel: watch::Receiver<bool>) {
    info!("▶️ Monitoring started → {}", destination);
    let destination: Arc<str> = Arc::from(destination);
    let mut iteration: u64 = 0;

    while !is_cancelled(&cancel) {
        iteration += 1;

        // Spawned so that a panic anywhere in the iteration surfaces here as
        // an error instead of ending the session
        let outcome = tokio::spawn(run_iteration(Arc::clone(&pipeline), Arc::clone(&destination))).await;

        let delay = match outcome {
            Ok(report) => {
                if report.events > 0 {
                    debug!(
                        "Iteration {}: {} events, {} signals, {} results, {} failures",
                        iteration, report.events, report.signals, report.resolutions, report.failures
                    );
                }
                pipeline.config.poll_interval()
            }
            Err(e) => {
                let recovery = pipeline.config.recovery_delay();
                error!("🔴 Monitoring iteration {} failed: {}", iteration, e);
                pipeline.notify(&destination, &format_warning(recovery)).await;
                recovery
            }
        };

        if sleep_or_cancel(&mut cancel, delay).await {
            break;
        }
    }

    info!("⏹️ Monitoring stopped after {} iterations", iteration);
}

async fn run_iteration(pipeline: Arc<Pipeline>, destination: Arc<str>) -> IterationReport {
    let events = pipeline.feed.list_live().await;
    let mut report = IterationReport {
        events: events.len(),
        ..IterationReport::default()
    };
    if events.is_empty() {
        return report;
    }

    let mut tasks = JoinSet::new();
    for event in events {
        let pipeline = Arc::clone(&pipeline);
        let destination = Arc::clone(&destination);
        tasks.spawn(async move { pipeline.analyze_event(event, &destination).await });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(outcome) => {
                report.signals += outcome.signals;
                report.resolutions += outcome.resolutions;
                report.failures += outcome.persist_failures + usize::from(outcome.timed_out);
            }
            Err(e) => {
                warn!("Event analysis task failed: {}", e);
                report.failures += 1;
            }
        }
    }

    report
}

impl Pipeline {
    /// Fetch the event's detail, bounded by the task timeout. A timed-out
    /// fetch reads as both halves having failed.
    async fn fetch_summary(&self, event_id: u64) -> (MatchSummary, bool) {
        let timeout = self.config.task_timeout();
        match tokio::time::timeout(timeout, self.feed.fetch_summary(event_id)).await {
            Ok(summary) => (summary, false),
            Err(_) => {
                warn!("Event {}: summary fetch timed out after {:?}", event_id, timeout);
                let reason = format!("no response within {:?}", timeout);
                let summary = MatchSummary {
                    periods: Err(FeedError::Timeout(reason.clone())),
                    incidents: Err(FeedError::Timeout(reason)),
                };
                (summary, true)
            }
        }
    }

    /// Network I/O happens up front. Every state change is persisted before
    /// anything is delivered, so a slow notifier cannot lose a log row.
    async fn analyze_event(&self, event: LiveEvent, destination: &str) -> EventOutcome {
        let (summary, timed_out) = self.fetch_summary(event.id).await;
        let mut outcome = EventOutcome {
            timed_out,
            ..EventOutcome::default()
        };
        let mut status = String::from("checked");
        let mut outbox = Vec::new();

        for signal in self.strategies.evaluate(&event, &summary) {
            if !self.tracker.record(signal.clone()) {
                continue;
            }

            info!(
                "🏀 Signal [{}] event={} {} ({}): {}",
                signal.strategy,
                signal.event_id,
                event.match_name(),
                signal.recommendation(),
                signal.reason
            );

            if !self.persist(&signal) {
                outcome.persist_failures += 1;
            }
            outcome.signals += 1;
            status = format!("signal {}", signal.strategy);
            outbox.push(format_signal(&signal));
        }

        if let Some(resolution) =
            resolve_previous_quarter(&self.tracker, event.id, event.period, summary.periods())
        {
            info!(
                "{} Result [{}] event={} {}: {} points vs line {}",
                if resolution.passed { "✅" } else { "❌" },
                resolution.signal.quarter_label(),
                event.id,
                event.match_name(),
                resolution.signal.points_in_quarter.unwrap_or_default(),
                resolution.signal.line
            );

            if !self.persist(&resolution.signal) {
                outcome.persist_failures += 1;
            }
            outcome.resolutions += 1;
            status = format!(
                "result {} {}",
                resolution.signal.quarter_label(),
                resolution.signal.state
            );
            outbox.push(format_result(&resolution));
        }

        if let Some(log) = &self.match_log {
            if let Err(e) = log.log_check(&event, &status) {
                warn!("Failed to write match log: {}", e);
            }
        }

        for text in &outbox {
            self.notify(destination, text).await;
        }

        outcome
    }

    /// Best-effort delivery; failures are logged and dropped
    async fn notify(&self, destination: &str, text: &str) {
        if let Err(e) = self.notifier.send(destination, text).await {
            warn!("Notification to {} failed: {}", destination, e);
        }
    }

    fn persist(&self, signal: &Signal) -> bool {
        match self.store.append(&SignalLogEntry::from_signal(signal)) {
            Ok(_) => true,
            Err(e) => {
                error!(
                    "Failed to persist {} signal for event {}: {}",
                    signal.quarter_label(),
                    signal.event_id,
                    e
                );
                false
            }
        }
    }
}
