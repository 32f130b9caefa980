use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use crate::config::FeedConfig;
use crate::data::periods::{as_points, parse_period_scores};
use crate::data::types::{FeedError, Incident, IncidentKind, LiveEvent, MatchSummary};
use crate::data::LiveFeed;

/// Client for the SofaScore-style public live-data API
pub struct ScoreFeedClient {
    client: Client,
    base_url: String,
    sport: String,
}

#[derive(Debug, Deserialize)]
struct LiveEventsResponse {
    #[serde(default)]
    events: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SofaEvent {
    id: Option<u64>,
    tournament: Option<SofaNamed>,
    home_team: Option<SofaTeam>,
    away_team: Option<SofaTeam>,
    status: Option<SofaStatus>,
    home_score: Option<SofaScore>,
    away_score: Option<SofaScore>,
}

#[derive(Debug, Deserialize)]
struct SofaNamed {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SofaTeam {
    id: Option<u64>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SofaStatus {
    period: Option<Value>,
    current_period: Option<Value>,
    description: Option<String>,
    time: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct SofaScore {
    current: Option<Value>,
    period1: Option<Value>,
}

impl ScoreFeedClient {
    pub fn new(config: &FeedConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent("QuarterSignals/1.0")
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            sport: config.sport.clone(),
        })
    }

    /// Fetch in-progress events, surfacing the failure to the caller
    pub async fn try_list_live(&self) -> Result<Vec<LiveEvent>, FeedError> {
        let url = format!("{}/sport/{}/events/live", self.base_url, self.sport);
        let payload = self.get_json(&url).await?;
        let response: LiveEventsResponse =
            serde_json::from_value(payload).map_err(|e| FeedError::Decode(e.to_string()))?;

        let events = decode_live_events(response.events);
        debug!("Feed: {} live events", events.len());
        Ok(events)
    }

    /// Fetch in-progress events; any failure reads as "nothing live"
    pub async fn list_live(&self) -> Vec<LiveEvent> {
        match self.try_list_live().await {
            Ok(events) => events,
            Err(e) => {
                warn!("Live events unavailable: {}", e);
                Vec::new()
            }
        }
    }

    /// Fetch summary and incidents concurrently. Neither half can fail the other.
    pub async fn fetch_summary(&self, event_id: u64) -> MatchSummary {
        let summary_url = format!("{}/event/{}/match-summary", self.base_url, event_id);
        let incidents_url = format!("{}/event/{}/incidents", self.base_url, event_id);

        let (summary, incidents) =
            tokio::join!(self.get_json(&summary_url), self.get_json(&incidents_url));

        let periods = summary.map(|payload| parse_period_scores(&payload));
        let incidents = incidents.and_then(|payload| decode_incidents(&payload));

        if let Err(e) = &periods {
            debug!("Event {}: summary unavailable: {}", event_id, e);
        }
        if let Err(e) = &incidents {
            debug!("Event {}: incidents unavailable: {}", event_id, e);
        }

        MatchSummary { periods, incidents }
    }

    async fn get_json(&self, url: &str) -> Result<Value, FeedError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl LiveFeed for ScoreFeedClient {
    async fn list_live(&self) -> Vec<LiveEvent> {
        ScoreFeedClient::list_live(self).await
    }

    async fn fetch_summary(&self, event_id: u64) -> MatchSummary {
        ScoreFeedClient::fetch_summary(self, event_id).await
    }
}

/// Convert raw provider events, dropping any without an id
fn decode_live_events(raw: Vec<Value>) -> Vec<LiveEvent> {
    raw.into_iter()
        .filter_map(|value| serde_json::from_value::<SofaEvent>(value).ok())
        .filter_map(convert_event)
        .collect()
}

fn convert_event(ev: SofaEvent) -> Option<LiveEvent> {
    let id = ev.id?;

    let (period, clock) = ev.status.map(status_period_and_clock).unwrap_or((0, String::new()));

    let (home_team, home_team_id) = team_name_and_id(ev.home_team, "Home");
    let (away_team, away_team_id) = team_name_and_id(ev.away_team, "Away");

    Some(LiveEvent {
        id,
        league: ev.tournament.and_then(|t| t.name).unwrap_or_default(),
        home_team,
        away_team,
        home_team_id,
        away_team_id,
        period,
        clock,
        home_score: ev.home_score.and_then(current_score),
        away_score: ev.away_score.and_then(current_score),
    })
}

fn team_name_and_id(team: Option<SofaTeam>, fallback: &str) -> (String, Option<u64>) {
    match team {
        Some(t) => (t.name.unwrap_or_else(|| fallback.to_string()), t.id),
        None => (fallback.to_string(), None),
    }
}

fn status_period_and_clock(status: SofaStatus) -> (u8, String) {
    let period = [status.period.as_ref(), status.current_period.as_ref()]
        .into_iter()
        .flatten()
        .filter_map(as_points)
        .find(|p| *p > 0)
        .and_then(|p| u8::try_from(p).ok())
        .unwrap_or(0);

    let clock = match (status.description, status.time) {
        (Some(desc), _) if !desc.is_empty() => desc,
        (_, Some(Value::String(time))) => time,
        (_, Some(time)) if !time.is_null() => time.to_string(),
        _ => String::new(),
    };

    (period, clock)
}

fn current_score(score: SofaScore) -> Option<u32> {
    score
        .current
        .as_ref()
        .and_then(as_points)
        .or_else(|| score.period1.as_ref().and_then(as_points))
}

/// Incidents arrive either wrapped as `{"incidents": [...]}` or as a bare array
fn decode_incidents(payload: &Value) -> Result<Vec<Incident>, FeedError> {
    let entries = match payload {
        Value::Array(entries) => entries,
        Value::Object(obj) => match obj.get("incidents") {
            Some(Value::Array(entries)) => entries,
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(_) => return Err(FeedError::Decode("incidents is not a list".to_string())),
        },
        _ => return Err(FeedError::Decode("unexpected incidents payload".to_string())),
    };

    Ok(entries
        .iter()
        .map(|entry| {
            let raw_type = entry
                .get("type")
                .or_else(|| entry.get("incidentType"))
                .and_then(Value::as_str)
                .unwrap_or_default();

            Incident {
                kind: IncidentKind::classify(raw_type),
                team_id: entry.get("team").and_then(|t| t.get("id")).and_then(Value::as_u64),
            }
        })
        .collect())
}
