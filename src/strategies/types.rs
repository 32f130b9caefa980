use crate::data::types::FoulCount;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    ThirdQuarterPace,
    FourthQuarterClose,
}

impl Strategy {
    /// Short tag used in messages and logs
    pub fn tag(&self) -> &'static str {
        match self {
            Strategy::ThirdQuarterPace => "3Q",
            Strategy::FourthQuarterClose => "4Q",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineType {
    Over,
}

impl std::fmt::Display for LineType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineType::Over => f.write_str("over"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendationStrength {
    Optimal,
}

impl std::fmt::Display for RecommendationStrength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecommendationStrength::Optimal => f.write_str("optimal"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalState {
    Pending,
    Passed,
    Failed,
}

impl SignalState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SignalState::Pending)
    }
}

impl std::fmt::Display for SignalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalState::Pending => f.write_str("PENDING"),
            SignalState::Passed => f.write_str("PASSED"),
            SignalState::Failed => f.write_str("FAILED"),
        }
    }
}

impl std::str::FromStr for SignalState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(SignalState::Pending),
            "PASSED" => Ok(SignalState::Passed),
            "FAILED" => Ok(SignalState::Failed),
            other => Err(format!("unknown signal status: {}", other)),
        }
    }
}

/// A recommendation tied to one event and one quarter
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub strategy: Strategy,
    pub event_id: u64,
    pub quarter: u8,
    pub league: String,
    pub home: String,
    pub away: String,
    pub line: f64,
    pub line_type: LineType,
    pub strength: RecommendationStrength,
    pub reason: String,
    /// Observed at issuance for 3Q; set to the final count on resolution
    pub points_in_quarter: Option<u32>,
    pub fouls: Option<FoulCount>,
    pub score: String,
    pub clock: String,
    pub state: SignalState,
}

impl Signal {
    pub fn quarter_label(&self) -> String {
        format!("{}Q", self.quarter)
    }

    pub fn recommendation(&self) -> String {
        format!("{} {}", self.line_type, self.line)
    }
}
