use chrono::{DateTime, Utc};
use crate::strategies::types::{Signal, SignalState};

/// One persisted row. Issuance and resolution are separate rows.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalLogEntry {
    pub id: Option<i64>,
    pub timestamp: DateTime<Utc>,
    pub event_id: u64,
    pub league: String,
    pub home: String,
    pub away: String,
    pub quarter: String,
    pub line: f64,
    pub recommendation: String,
    pub status: SignalState,
    pub points_in_quarter: Option<u32>,
}

impl SignalLogEntry {
    /// Snapshot of the signal in its current state
    pub fn from_signal(signal: &Signal) -> Self {
        Self {
            id: None,
            timestamp: Utc::now(),
            event_id: signal.event_id,
            league: signal.league.clone(),
            home: signal.home.clone(),
            away: signal.away.clone(),
            quarter: signal.quarter_label(),
            line: signal.line,
            recommendation: signal.strength.to_string(),
            status: signal.state,
            points_in_quarter: signal.points_in_quarter,
        }
    }
}
