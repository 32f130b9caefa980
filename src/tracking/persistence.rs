use anyhow::Result;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use crate::strategies::types::SignalState;
use crate::tracking::types::SignalLogEntry;

/// Append-only sqlite log of issued and resolved signals
pub struct SignalLogDatabase {
    conn: Mutex<Connection>,
}

const SELECT_COLUMNS: &str =
    "id, ts, event_id, league, home, away, quarter, line, recommendation, status, points_in_quarter";

impl SignalLogDatabase {
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS signals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ts TEXT NOT NULL,
                event_id INTEGER NOT NULL,
                league TEXT NOT NULL,
                home TEXT NOT NULL,
                away TEXT NOT NULL,
                quarter TEXT NOT NULL,
                line REAL NOT NULL,
                recommendation TEXT NOT NULL,
                status TEXT NOT NULL,
                points_in_quarter INTEGER
            );

            CREATE INDEX IF NOT EXISTS idx_signals_event ON signals(event_id, quarter);
            CREATE INDEX IF NOT EXISTS idx_signals_status ON signals(status);
            "#
        )?;

        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Append a row; existing rows are never rewritten
    pub fn append(&self, entry: &SignalLogEntry) -> Result<i64> {
        let conn = self.conn.lock();

        conn.execute(
            "INSERT INTO signals (ts, event_id, league, home, away, quarter, line, recommendation, status, points_in_quarter)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                entry.timestamp.to_rfc3339(),
                i64::try_from(entry.event_id)?,
                entry.league,
                entry.home,
                entry.away,
                entry.quarter,
                entry.line,
                entry.recommendation,
                entry.status.to_string(),
                entry.points_in_quarter,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Most recent rows first
    pub fn recent(&self, limit: usize) -> Result<Vec<SignalLogEntry>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM signals ORDER BY id DESC LIMIT ?1",
            SELECT_COLUMNS
        ))?;

        let rows = stmt.query_map(params![i64::try_from(limit)?], row_to_entry)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(|e| e.into())
    }

    /// Pending rows whose (event, quarter) never received a terminal row
    pub fn unresolved(&self) -> Result<Vec<SignalLogEntry>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM signals p
             WHERE p.status = 'PENDING'
             AND NOT EXISTS (
                SELECT 1 FROM signals r
                WHERE r.event_id = p.event_id
                AND r.quarter = p.quarter
                AND r.status != 'PENDING'
                AND r.id > p.id
             )
             ORDER BY p.id",
            SELECT_COLUMNS
        ))?;

        let rows = stmt.query_map([], row_to_entry)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(|e| e.into())
    }

    pub fn count_by_status(&self, status: SignalState) -> Result<usize> {
        let count: usize = self.conn.lock().query_row(
            "SELECT COUNT(*) FROM signals WHERE status = ?1",
            params![status.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<SignalLogEntry> {
    let ts: String = row.get(1)?;
    let timestamp = DateTime::parse_from_rfc3339(&ts)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?
        .with_timezone(&Utc);

    let event_id: i64 = row.get(2)?;
    let status: String = row.get(9)?;
    let status = status
        .parse::<SignalState>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(9, Type::Text, e.into()))?;

    Ok(SignalLogEntry {
        id: Some(row.get(0)?),
        timestamp,
        event_id: event_id as u64,
        league: row.get(3)?,
        home: row.get(4)?,
        away: row.get(5)?,
        quarter: row.get(6)?,
        line: row.get(7)?,
        recommendation: row.get(8)?,
        status,
        points_in_quarter: row.get(10)?,
    })
}

/// Signal state lives in memory only. Anything still pending from a previous
/// run will never be resolved; report it so the operator knows.
pub async fn report_unresolved(db: &SignalLogDatabase) -> Result<()> {
    use tracing::{info, warn};

    let orphaned = db.unresolved()?;
    if orphaned.is_empty() {
        info!("No unresolved signals from previous sessions");
        return Ok(());
    }

    warn!("Found {} unresolved signals from previous sessions", orphaned.len());
    for entry in &orphaned {
        warn!(
            "Unresolved: event={} {} – {} {} line={} issued={}",
            entry.event_id,
            entry.home,
            entry.away,
            entry.quarter,
            entry.line,
            entry.timestamp.to_rfc3339()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(event_id: u64, quarter: &str, status: SignalState, points: Option<u32>) -> SignalLogEntry {
        SignalLogEntry {
            id: None,
            timestamp: Utc::now(),
            event_id,
            league: "NBA".to_string(),
            home: "Lakers".to_string(),
            away: "Celtics".to_string(),
            quarter: quarter.to_string(),
            line: 37.5,
            recommendation: "optimal".to_string(),
            status,
            points_in_quarter: points,
        }
    }

    #[test]
    fn test_append_and_recent() {
        let db = SignalLogDatabase::new(":memory:").unwrap();

        let first = db.append(&entry(1, "3Q", SignalState::Pending, Some(15))).unwrap();
        let second = db.append(&entry(1, "3Q", SignalState::Passed, Some(40))).unwrap();
        assert!(second > first);

        let rows = db.recent(10).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].status, SignalState::Passed);
        assert_eq!(rows[0].points_in_quarter, Some(40));
        assert_eq!(rows[1].status, SignalState::Pending);
        assert_eq!(rows[1].event_id, 1);
        assert_eq!(rows[1].quarter, "3Q");

        assert_eq!(db.recent(1).unwrap().len(), 1);
    }

    #[test]
    fn test_terminal_rows_are_appended_not_updated() {
        let db = SignalLogDatabase::new(":memory:").unwrap();
        db.append(&entry(1, "4Q", SignalState::Pending, None)).unwrap();
        db.append(&entry(1, "4Q", SignalState::Failed, Some(30))).unwrap();

        assert_eq!(db.count_by_status(SignalState::Pending).unwrap(), 1);
        assert_eq!(db.count_by_status(SignalState::Failed).unwrap(), 1);
        assert_eq!(db.count_by_status(SignalState::Passed).unwrap(), 0);
    }

    #[test]
    fn test_unresolved_excludes_settled_signals() {
        let db = SignalLogDatabase::new(":memory:").unwrap();
        db.append(&entry(1, "3Q", SignalState::Pending, Some(15))).unwrap();
        db.append(&entry(1, "3Q", SignalState::Passed, Some(40))).unwrap();
        db.append(&entry(1, "4Q", SignalState::Pending, None)).unwrap();
        db.append(&entry(2, "3Q", SignalState::Pending, Some(14))).unwrap();

        let unresolved = db.unresolved().unwrap();
        let keys: Vec<_> = unresolved.iter().map(|e| (e.event_id, e.quarter.as_str())).collect();
        assert_eq!(keys, vec![(1, "4Q"), (2, "3Q")]);
    }

    #[test]
    fn test_file_backed_log_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signals.db");
        let path = path.to_str().unwrap();

        {
            let db = SignalLogDatabase::new(path).unwrap();
            db.append(&entry(3, "3Q", SignalState::Pending, Some(13))).unwrap();
        }

        let reopened = SignalLogDatabase::new(path).unwrap();
        assert_eq!(reopened.recent(5).unwrap().len(), 1);
        assert_eq!(reopened.unresolved().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_report_unresolved_runs_on_empty_log() {
        let db = SignalLogDatabase::new(":memory:").unwrap();
        report_unresolved(&db).await.unwrap();
    }
}
