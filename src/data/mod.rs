pub mod periods;
pub mod sofascore;
pub mod types;

use async_trait::async_trait;
use crate::data::types::{LiveEvent, MatchSummary};

/// Source of live events and per-event detail.
///
/// Implementations never fail outward: an unreachable provider yields no
/// events, and a summary carries the outcome of each sub-fetch.
#[async_trait]
pub trait LiveFeed: Send + Sync {
    async fn list_live(&self) -> Vec<LiveEvent>;

    async fn fetch_summary(&self, event_id: u64) -> MatchSummary;
}
