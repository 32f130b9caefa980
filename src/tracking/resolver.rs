use crate::data::types::PeriodScore;
use crate::tracking::tracker::{Resolution, SignalTracker};

/// Settle the signal for the quarter before `current_period`, if one is
/// pending and the feed has published that quarter's breakdown.
///
/// Only the immediately preceding quarter is considered. When the feed jumps
/// more than one period between polls, the skipped quarter stays pending.
pub fn resolve_previous_quarter(
    tracker: &SignalTracker,
    event_id: u64,
    current_period: u8,
    periods: &[PeriodScore],
) -> Option<Resolution> {
    let completed = current_period.checked_sub(1).filter(|q| *q >= 1)?;
    let points = periods.get(usize::from(completed) - 1)?.total();

    tracker.resolve(event_id, completed, points)
}
