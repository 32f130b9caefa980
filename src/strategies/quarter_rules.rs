use crate::config::{FourthQuarterConfig, StrategiesConfig, ThirdQuarterConfig};
use crate::data::types::{LiveEvent, MatchSummary, PeriodScore};
use crate::strategies::types::{LineType, RecommendationStrength, Signal, SignalState, Strategy};
use tracing::debug;

/// Both quarter heuristics, configured once. Stateless across calls:
/// duplicate suppression belongs to the tracker.
pub struct QuarterStrategies {
    third: ThirdQuarterConfig,
    fourth: FourthQuarterConfig,
}

impl QuarterStrategies {
    pub fn new(config: StrategiesConfig) -> Self {
        Self {
            third: config.third_quarter,
            fourth: config.fourth_quarter,
        }
    }

    /// Run every enabled rule against one event snapshot
    pub fn evaluate(&self, event: &LiveEvent, summary: &MatchSummary) -> Vec<Signal> {
        let mut signals = Vec::new();

        if self.third.enabled {
            signals.extend(evaluate_third_quarter(event, summary, &self.third));
        }
        if self.fourth.enabled {
            signals.extend(evaluate_fourth_quarter(event, summary, &self.fourth));
        }

        signals
    }
}

/// Scoring pace in the 3rd quarter.
///
/// Uses the published 3rd-period breakdown when present, otherwise
/// approximates it as the live total minus the first two periods. The two
/// sources are not guaranteed to be contemporaneous.
pub fn evaluate_third_quarter(
    event: &LiveEvent,
    summary: &MatchSummary,
    config: &ThirdQuarterConfig,
) -> Option<Signal> {
    if event.period != 3 {
        return None;
    }

    let points = points_in_third_quarter(summary.periods(), event.total_score())?;

    debug!("Event {}: {} points in 3Q", event.id, points);

    if points < config.min_points {
        return None;
    }

    Some(Signal {
        strategy: Strategy::ThirdQuarterPace,
        event_id: event.id,
        quarter: 3,
        league: event.league.clone(),
        home: event.home_team.clone(),
        away: event.away_team.clone(),
        line: config.line,
        line_type: LineType::Over,
        strength: RecommendationStrength::Optimal,
        reason: format!("Points in 3Q = {}", points),
        points_in_quarter: Some(points),
        fouls: summary.foul_counts(event.home_team_id),
        score: event.score_text(),
        clock: event.clock.clone(),
        state: SignalState::Pending,
    })
}

/// Close game entering the 4th quarter
pub fn evaluate_fourth_quarter(
    event: &LiveEvent,
    summary: &MatchSummary,
    config: &FourthQuarterConfig,
) -> Option<Signal> {
    if event.period != 4 {
        return None;
    }

    let diff = event.score_diff()?;
    if diff > config.max_diff {
        return None;
    }

    Some(Signal {
        strategy: Strategy::FourthQuarterClose,
        event_id: event.id,
        quarter: 4,
        league: event.league.clone(),
        home: event.home_team.clone(),
        away: event.away_team.clone(),
        line: config.line,
        line_type: LineType::Over,
        strength: RecommendationStrength::Optimal,
        reason: format!("Diff={}", diff),
        points_in_quarter: None,
        fouls: summary.foul_counts(event.home_team_id),
        score: event.score_text(),
        clock: event.clock.clone(),
        state: SignalState::Pending,
    })
}

/// `None` when fewer than two periods are known, or the fallback would go
/// negative
pub fn points_in_third_quarter(periods: &[PeriodScore], total_score: Option<u32>) -> Option<u32> {
    match periods {
        [_, _, third, ..] => Some(third.total()),
        [first, second] => total_score?.checked_sub(first.total() + second.total()),
        _ => None,
    }
}
