use dashmap::DashMap;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use crate::strategies::types::{Signal, SignalState};

/// In-memory signal table keyed by event id, then quarter.
///
/// Every operation runs under the owning shard's lock, so check-and-insert and
/// resolve are atomic with respect to concurrent per-event tasks.
pub struct SignalTracker {
    signals: DashMap<u64, BTreeMap<u8, Signal>>,
}

/// A signal that has just left the pending state
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub signal: Signal,
    pub passed: bool,
}

impl SignalTracker {
    pub fn new() -> Self {
        Self {
            signals: DashMap::new(),
        }
    }

    /// Insert the signal unless one already exists for its (event, quarter).
    /// Returns false, leaving the existing entry untouched, on a duplicate.
    pub fn record(&self, signal: Signal) -> bool {
        let mut quarters = self.signals.entry(signal.event_id).or_default();

        match quarters.entry(signal.quarter) {
            Entry::Vacant(slot) => {
                slot.insert(signal);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    pub fn has_signal(&self, event_id: u64, quarter: u8) -> bool {
        self.signals
            .get(&event_id)
            .map_or(false, |quarters| quarters.contains_key(&quarter))
    }

    pub fn get(&self, event_id: u64, quarter: u8) -> Option<Signal> {
        self.signals
            .get(&event_id)
            .and_then(|quarters| quarters.get(&quarter).cloned())
    }

    /// Settle a pending signal against the points scored in its quarter.
    ///
    /// Succeeds at most once per key; later calls, and calls for unknown keys,
    /// return `None` and change nothing.
    pub fn resolve(&self, event_id: u64, quarter: u8, points_in_quarter: u32) -> Option<Resolution> {
        let mut quarters = self.signals.get_mut(&event_id)?;
        let signal = quarters.get_mut(&quarter)?;

        if signal.state.is_terminal() {
            return None;
        }

        let passed = f64::from(points_in_quarter) > signal.line;
        signal.state = if passed { SignalState::Passed } else { SignalState::Failed };
        signal.points_in_quarter = Some(points_in_quarter);

        Some(Resolution {
            signal: signal.clone(),
            passed,
        })
    }

    /// Total signals ever recorded this session
    pub fn len(&self) -> usize {
        self.signals.iter().map(|quarters| quarters.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pending_count(&self) -> usize {
        self.signals
            .iter()
            .map(|quarters| quarters.values().filter(|s| !s.state.is_terminal()).count())
            .sum()
    }
}

impl Default for SignalTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::types::{LineType, RecommendationStrength, Strategy};
    use std::sync::Arc;

    fn signal(event_id: u64, quarter: u8, line: f64) -> Signal {
        Signal {
            strategy: Strategy::ThirdQuarterPace,
            event_id,
            quarter,
            league: "NBA".to_string(),
            home: "Home".to_string(),
            away: "Away".to_string(),
            line,
            line_type: LineType::Over,
            strength: RecommendationStrength::Optimal,
            reason: "Points in 3Q = 15".to_string(),
            points_in_quarter: Some(15),
            fouls: None,
            score: "50:45".to_string(),
            clock: "6:00".to_string(),
            state: SignalState::Pending,
        }
    }

    #[test]
    fn test_record_is_idempotent_per_key() {
        let tracker = SignalTracker::new();

        assert!(tracker.record(signal(1, 3, 37.5)));
        assert!(!tracker.record(signal(1, 3, 99.5)));

        assert_eq!(tracker.len(), 1);
        assert!(tracker.has_signal(1, 3));
        assert!((tracker.get(1, 3).unwrap().line - 37.5).abs() < f64::EPSILON);

        assert!(tracker.record(signal(1, 4, 39.5)));
        assert!(tracker.record(signal(2, 3, 37.5)));
        assert_eq!(tracker.len(), 3);
        assert!(!tracker.has_signal(2, 4));
    }

    #[test]
    fn test_resolve_passed() {
        let tracker = SignalTracker::new();
        tracker.record(signal(1, 3, 37.5));

        let resolution = tracker.resolve(1, 3, 40).unwrap();
        assert!(resolution.passed);
        assert_eq!(resolution.signal.state, SignalState::Passed);
        assert_eq!(resolution.signal.points_in_quarter, Some(40));
    }

    #[test]
    fn test_resolve_failed() {
        let tracker = SignalTracker::new();
        tracker.record(signal(1, 3, 37.5));

        let resolution = tracker.resolve(1, 3, 30).unwrap();
        assert!(!resolution.passed);
        assert_eq!(tracker.get(1, 3).unwrap().state, SignalState::Failed);
    }

    #[test]
    fn test_resolve_only_once() {
        let tracker = SignalTracker::new();
        tracker.record(signal(1, 3, 37.5));

        assert!(tracker.resolve(1, 3, 30).is_some());
        assert!(tracker.resolve(1, 3, 45).is_none());

        let stored = tracker.get(1, 3).unwrap();
        assert_eq!(stored.state, SignalState::Failed);
        assert_eq!(stored.points_in_quarter, Some(30));
        assert_eq!(tracker.pending_count(), 0);
    }

    #[test]
    fn test_resolve_unknown_key() {
        let tracker = SignalTracker::new();
        tracker.record(signal(1, 3, 37.5));

        assert!(tracker.resolve(1, 2, 50).is_none());
        assert!(tracker.resolve(9, 3, 50).is_none());
        assert_eq!(tracker.pending_count(), 1);
    }

    #[test]
    fn test_concurrent_record_and_resolve() {
        let tracker = Arc::new(SignalTracker::new());
        tracker.record(signal(5, 3, 37.5));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || {
                    let inserted = tracker.record(signal(5, 4, 39.5));
                    let resolved = tracker.resolve(5, 3, 40).is_some();
                    (inserted, resolved)
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results.iter().filter(|(inserted, _)| *inserted).count(), 1);
        assert_eq!(results.iter().filter(|(_, resolved)| *resolved).count(), 1);
        assert_eq!(tracker.len(), 2);
    }
}
