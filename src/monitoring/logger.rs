use anyhow::Result;
use chrono::Utc;
use parking_lot::Mutex;
use std::fs::{self, OpenOptions};
use std::io::Write;
use crate::data::types::LiveEvent;

const HEADER: &str = "timestamp,event_id,match,period,status";

/// CSV trail of every match the monitor looked at
pub struct MatchCheckLog {
    log_path: String,
    write_lock: Mutex<()>,
}

impl MatchCheckLog {
    pub fn new(log_path: String) -> Result<Self> {
        // Create CSV file with headers if it doesn't exist
        if !std::path::Path::new(&log_path).exists() {
            let mut file = OpenOptions::new()
                .create(true)
                .write(true)
                .open(&log_path)?;

            writeln!(file, "{}", HEADER)?;
        }

        Ok(Self {
            log_path,
            write_lock: Mutex::new(()),
        })
    }

    /// Append one row for an analysed event
    pub fn log_check(&self, event: &LiveEvent, status: &str) -> Result<()> {
        let line = format!(
            "{},{},{},{},{}",
            Utc::now().to_rfc3339(),
            event.id,
            csv_field(&event.match_name()),
            event.period,
            csv_field(status)
        );

        let _guard = self.write_lock.lock();
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.log_path)?;
        writeln!(file, "{}", line)?;

        Ok(())
    }

    /// Last `limit` rows, oldest first
    pub fn recent(&self, limit: usize) -> Result<Vec<String>> {
        let contents = fs::read_to_string(&self.log_path)?;
        let rows: Vec<&str> = contents
            .lines()
            .filter(|line| !line.is_empty() && *line != HEADER)
            .collect();

        let start = rows.len().saturating_sub(limit);
        Ok(rows[start..].iter().map(|row| row.to_string()).collect())
    }
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\"").replace('\n', " "))
    } else {
        value.to_string()
    }
}
