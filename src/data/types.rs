/// An in-progress match as reported by the provider at one poll.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveEvent {
    pub id: u64,
    pub league: String,
    pub home_team: String,
    pub away_team: String,
    pub home_team_id: Option<u64>,
    pub away_team_id: Option<u64>,
    pub period: u8,
    pub clock: String,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
}

impl LiveEvent {
    pub fn match_name(&self) -> String {
        format!("{} – {}", self.home_team, self.away_team)
    }

    /// Combined cumulative score, if the feed published both sides
    pub fn total_score(&self) -> Option<u32> {
        Some(self.home_score? + self.away_score?)
    }

    pub fn score_diff(&self) -> Option<u32> {
        Some(self.home_score?.abs_diff(self.away_score?))
    }

    pub fn score_text(&self) -> String {
        match (self.home_score, self.away_score) {
            (Some(h), Some(a)) => format!("{}:{}", h, a),
            _ => "-".to_string(),
        }
    }
}

/// Points scored by each side within a single period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodScore {
    pub home: u32,
    pub away: u32,
}

impl PeriodScore {
    pub fn new(home: u32, away: u32) -> Self {
        Self { home, away }
    }

    pub fn total(&self) -> u32 {
        self.home + self.away
    }
}

/// Recognised incident categories. The provider's free-form `type` string is
/// classified once, at decode time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncidentKind {
    Foul,
    FreeThrow,
    Substitution,
    Timeout,
    PeriodMarker,
    Unknown(String),
}

impl IncidentKind {
    /// Any type mentioning "foul", in any case, is a foul
    pub fn classify(raw: &str) -> Self {
        if raw.to_ascii_lowercase().contains("foul") {
            return IncidentKind::Foul;
        }

        match raw {
            "freeThrow" | "freeThrows" => IncidentKind::FreeThrow,
            "substitution" => IncidentKind::Substitution,
            "timeout" | "injuryTime" => IncidentKind::Timeout,
            "period" | "periodStart" | "periodEnd" => IncidentKind::PeriodMarker,
            other => IncidentKind::Unknown(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incident {
    pub kind: IncidentKind,
    pub team_id: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FoulCount {
    pub home: u32,
    pub away: u32,
}

impl FoulCount {
    /// Count fouls per side. Anything not attributed to the home team is
    /// counted against the away side.
    pub fn tally(incidents: &[Incident], home_team_id: Option<u64>) -> Self {
        incidents
            .iter()
            .filter(|inc| inc.kind == IncidentKind::Foul)
            .fold(FoulCount::default(), |mut acc, inc| {
                if inc.team_id.is_some() && inc.team_id == home_team_id {
                    acc.home += 1;
                } else {
                    acc.away += 1;
                }
                acc
            })
    }
}

impl std::fmt::Display for FoulCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.home, self.away)
    }
}

/// Failure of a single provider call
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("provider returned status {0}")]
    Status(u16),

    #[error("malformed payload: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FeedError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FeedError::Timeout(e.to_string())
        } else if e.is_decode() {
            FeedError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            FeedError::Status(status.as_u16())
        } else {
            FeedError::Transport(e.to_string())
        }
    }
}

/// Best-effort per-event detail. Each half is fetched independently and keeps
/// its own outcome, so a failed call stays distinguishable from an empty one.
#[derive(Debug)]
pub struct MatchSummary {
    pub periods: Result<Vec<PeriodScore>, FeedError>,
    pub incidents: Result<Vec<Incident>, FeedError>,
}

impl MatchSummary {
    pub fn empty() -> Self {
        Self {
            periods: Ok(Vec::new()),
            incidents: Ok(Vec::new()),
        }
    }

    /// Parsed periods; empty means "unknown", including after a failed fetch
    pub fn periods(&self) -> &[PeriodScore] {
        self.periods.as_deref().unwrap_or(&[])
    }

    pub fn foul_counts(&self, home_team_id: Option<u64>) -> Option<FoulCount> {
        self.incidents
            .as_ref()
            .ok()
            .map(|incidents| FoulCount::tally(incidents, home_team_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn foul(team_id: Option<u64>) -> Incident {
        Incident { kind: IncidentKind::Foul, team_id }
    }

    #[test]
    fn test_classify_incident_types() {
        assert_eq!(IncidentKind::classify("personalFoul"), IncidentKind::Foul);
        assert_eq!(IncidentKind::classify("foul"), IncidentKind::Foul);
        assert_eq!(IncidentKind::classify("substitution"), IncidentKind::Substitution);
        assert_eq!(IncidentKind::classify("freeThrow"), IncidentKind::FreeThrow);
        assert_eq!(
            IncidentKind::classify("goal"),
            IncidentKind::Unknown("goal".to_string())
        );
    }

    #[test]
    fn test_classify_foul_ignores_case_and_separators() {
        for raw in ["Foul", "PersonalFoul", "personal_foul", "FOUL", "technical-FOUL"] {
            assert_eq!(IncidentKind::classify(raw), IncidentKind::Foul, "{}", raw);
        }

        let incidents: Vec<Incident> = ["Foul", "PERSONAL_FOUL", "Substitution"]
            .iter()
            .map(|raw| Incident { kind: IncidentKind::classify(raw), team_id: Some(10) })
            .collect();
        assert_eq!(FoulCount::tally(&incidents, Some(10)), FoulCount { home: 2, away: 0 });
    }

    #[test]
    fn test_foul_tally_by_team() {
        let incidents = vec![
            foul(Some(10)),
            foul(Some(10)),
            foul(Some(20)),
            Incident { kind: IncidentKind::Substitution, team_id: Some(10) },
            foul(None),
        ];

        let fouls = FoulCount::tally(&incidents, Some(10));
        assert_eq!(fouls, FoulCount { home: 2, away: 2 });
    }

    #[test]
    fn test_failed_incident_fetch_has_no_tally() {
        let summary = MatchSummary {
            periods: Ok(vec![PeriodScore::new(20, 18)]),
            incidents: Err(FeedError::Status(503)),
        };

        assert_eq!(summary.foul_counts(Some(1)), None);
        assert_eq!(summary.periods().len(), 1);
        assert_eq!(MatchSummary::empty().foul_counts(Some(1)), Some(FoulCount::default()));
    }

    #[test]
    fn test_failed_summary_fetch_reads_as_unknown() {
        let summary = MatchSummary {
            periods: Err(FeedError::Timeout("10s".into())),
            incidents: Ok(Vec::new()),
        };
        assert!(summary.periods().is_empty());
    }

    #[test]
    fn test_event_score_helpers() {
        let event = LiveEvent {
            id: 1,
            league: "NBA".into(),
            home_team: "Lakers".into(),
            away_team: "Celtics".into(),
            home_team_id: Some(1),
            away_team_id: Some(2),
            period: 4,
            clock: "5:00".into(),
            home_score: Some(85),
            away_score: Some(88),
        };

        assert_eq!(event.total_score(), Some(173));
        assert_eq!(event.score_diff(), Some(3));
        assert_eq!(event.score_text(), "85:88");

        let unknown = LiveEvent { home_score: None, ..event };
        assert_eq!(unknown.total_score(), None);
        assert_eq!(unknown.score_text(), "-");
    }
}
