use std::time::Duration;
use crate::strategies::types::{Signal, Strategy};
use crate::tracking::tracker::Resolution;

pub fn format_signal(signal: &Signal) -> String {
    let fouls = signal
        .fouls
        .map(|f| f.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let details = match signal.strategy {
        Strategy::ThirdQuarterPace => format!(
            "— Points in {}: {}\n— Fouls: {}",
            signal.quarter_label(),
            signal
                .points_in_quarter
                .map_or_else(|| "-".to_string(), |p| p.to_string()),
            fouls
        ),
        Strategy::FourthQuarterClose => format!("— Fouls: {}", fouls),
    };

    format!(
        "🏀 Signal [{}]\n\
         Match: {} – {}\n\
         Score: {}\n\
         Time: {}\n\n\
         📊 Data:\n\
         {}\n\n\
         💡 Recommendation: {}\n\
         🎯 Entry: {}\n\
         Reason: {}",
        signal.strategy,
        signal.home,
        signal.away,
        signal.score,
        signal.clock,
        details,
        signal.recommendation(),
        signal.strength,
        signal.reason
    )
}

pub fn format_result(resolution: &Resolution) -> String {
    let signal = &resolution.signal;
    let (icon, verdict) = if resolution.passed {
        ("✅", "passed")
    } else {
        ("❌", "failed")
    };

    format!(
        "{} Result [{}]\n\
         Match: {} – {}\n\
         Bet: {}\n\
         Points in {}: {} → {}",
        icon,
        signal.quarter_label(),
        signal.home,
        signal.away,
        signal.recommendation(),
        signal.quarter_label(),
        signal
            .points_in_quarter
            .map_or_else(|| "-".to_string(), |p| p.to_string()),
        verdict
    )
}

pub fn format_warning(recovery_delay: Duration) -> String {
    format!(
        "⚠️ Monitoring error; recovering in {} s.",
        recovery_delay.as_secs_f64()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::FoulCount;
    use crate::strategies::types::{LineType, RecommendationStrength, SignalState};

    fn signal(strategy: Strategy, quarter: u8) -> Signal {
        Signal {
            strategy,
            event_id: 1,
            quarter,
            league: "NBA".to_string(),
            home: "Lakers".to_string(),
            away: "Celtics".to_string(),
            line: 37.5,
            line_type: LineType::Over,
            strength: RecommendationStrength::Optimal,
            reason: format!("{} quarter pace", quarter),
            points_in_quarter: Some(15),
            fouls: Some(FoulCount { home: 3, away: 4 }),
            score: "57:52".to_string(),
            clock: "3rd quarter".to_string(),
            state: SignalState::Pending,
        }
    }

    #[test]
    fn test_third_quarter_message() {
        let text = format_signal(&signal(Strategy::ThirdQuarterPace, 3));
        assert!(text.starts_with("🏀 Signal [3Q]"));
        assert!(text.contains("Match: Lakers – Celtics"));
        assert!(text.contains("— Points in 3Q: 15"));
        assert!(text.contains("— Fouls: 3:4"));
        assert!(text.contains("💡 Recommendation: over 37.5"));
        assert!(text.contains("🎯 Entry: optimal"));
    }

    #[test]
    fn test_fourth_quarter_message_omits_points() {
        let mut s = signal(Strategy::FourthQuarterClose, 4);
        s.fouls = None;
        let text = format_signal(&s);
        assert!(text.starts_with("🏀 Signal [4Q]"));
        assert!(!text.contains("— Points in"));
        assert!(text.contains("— Fouls: unknown"));
    }

    #[test]
    fn test_result_message() {
        let mut s = signal(Strategy::ThirdQuarterPace, 3);
        s.points_in_quarter = Some(40);
        s.state = SignalState::Passed;

        let text = format_result(&Resolution { signal: s.clone(), passed: true });
        assert!(text.starts_with("✅ Result [3Q]"));
        assert!(text.contains("Points in 3Q: 40 → passed"));

        s.points_in_quarter = Some(30);
        let text = format_result(&Resolution { signal: s, passed: false });
        assert!(text.starts_with("❌"));
        assert!(text.ends_with("30 → failed"));
    }

    #[test]
    fn test_warning_message() {
        assert_eq!(
            format_warning(Duration::from_secs(5)),
            "⚠️ Monitoring error; recovering in 5 s."
        );
    }
}
