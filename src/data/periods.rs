//! Normalises the provider's match-summary payload into per-period scores.
//!
//! Two payload shapes are recognised, tried in order:
//! 1. `{"periods": [{"homeScore": 20, "awayScore": 18}, ...]}`
//! 2. `{"homeTeam": {"periodScores": [{"score": 20}, ...]}, "awayTeam": {...}}`
//!
//! An empty result means "unknown", never "no periods played".

use serde_json::Value;
use crate::data::types::PeriodScore;

pub fn parse_period_scores(summary: &Value) -> Vec<PeriodScore> {
    let flat = parse_flat_periods(summary);
    if !flat.is_empty() {
        return flat;
    }
    parse_parallel_periods(summary)
}

fn parse_flat_periods(summary: &Value) -> Vec<PeriodScore> {
    let Some(entries) = summary.get("periods").and_then(Value::as_array) else {
        return Vec::new();
    };

    entries
        .iter()
        .map_while(|entry| {
            let home = first_present(entry, &["homeScore", "home"]).and_then(as_points)?;
            let away = first_present(entry, &["awayScore", "away"]).and_then(as_points)?;
            Some(PeriodScore::new(home, away))
        })
        .collect()
}

fn parse_parallel_periods(summary: &Value) -> Vec<PeriodScore> {
    let side = |team: &str| {
        summary
            .get(team)
            .and_then(|t| first_present(t, &["periodScores", "periods"]))
            .and_then(Value::as_array)
    };

    let (Some(home), Some(away)) = (side("homeTeam"), side("awayTeam")) else {
        return Vec::new();
    };
    if home.len() != away.len() {
        return Vec::new();
    }

    home.iter()
        .zip(away)
        .map_while(|(h, a)| Some(PeriodScore::new(entry_score(h)?, entry_score(a)?)))
        .collect()
}

/// A side's period entry; a missing `score` counts as zero
fn entry_score(entry: &Value) -> Option<u32> {
    match entry.get("score") {
        None | Some(Value::Null) => Some(0),
        Some(v) => as_points(v),
    }
}

fn first_present<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| value.get(*k))
        .find(|v| !v.is_null())
}

/// Accepts integers, integral floats and numeric strings
pub(crate) fn as_points(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.trunc() as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_period_list() {
        let summary = json!({
            "periods": [
                {"homeScore": 20, "awayScore": 18},
                {"home": "22", "away": 20},
                {"homeScore": 8.0, "awayScore": 7}
            ]
        });

        assert_eq!(
            parse_period_scores(&summary),
            vec![PeriodScore::new(20, 18), PeriodScore::new(22, 20), PeriodScore::new(8, 7)]
        );
    }

    #[test]
    fn test_flat_list_keeps_readable_prefix() {
        let summary = json!({
            "periods": [
                {"homeScore": 20, "awayScore": 18},
                {"homeScore": "n/a", "awayScore": 20},
                {"homeScore": 8, "awayScore": 7}
            ]
        });

        assert_eq!(parse_period_scores(&summary), vec![PeriodScore::new(20, 18)]);
    }

    #[test]
    fn test_parallel_arrays_of_equal_length() {
        let summary = json!({
            "homeTeam": {"periodScores": [{"score": 20}, {"score": 22}, {"score": 8}]},
            "awayTeam": {"periods": [{"score": 18}, {"score": 20}, {}]}
        });

        let periods = parse_period_scores(&summary);
        assert_eq!(periods.len(), 3);
        assert_eq!(periods[2], PeriodScore::new(8, 0));
    }

    #[test]
    fn test_parallel_arrays_length_mismatch_is_unknown() {
        let summary = json!({
            "homeTeam": {"periodScores": [{"score": 20}, {"score": 22}, {"score": 8}]},
            "awayTeam": {"periodScores": [{"score": 18}, {"score": 20}]}
        });

        assert!(parse_period_scores(&summary).is_empty());
    }

    #[test]
    fn test_empty_flat_list_falls_through_to_parallel_arrays() {
        let summary = json!({
            "periods": [],
            "homeTeam": {"periodScores": [{"score": 25}]},
            "awayTeam": {"periodScores": [{"score": 19}]}
        });

        assert_eq!(parse_period_scores(&summary), vec![PeriodScore::new(25, 19)]);
    }

    #[test]
    fn test_unrecognised_shapes() {
        assert!(parse_period_scores(&json!(null)).is_empty());
        assert!(parse_period_scores(&json!({"teamStats": {}})).is_empty());
        assert!(parse_period_scores(&json!({"periods": "first"})).is_empty());
        assert!(parse_period_scores(&json!([1, 2, 3])).is_empty());
    }
}
