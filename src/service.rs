//! Request orchestration: fetch feeds, build in-memory tables, run one pass.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::db::models::{
    parse_timestamp, AthleteSimulation, DraftablesFeed, OddsFeed, ProjectionRecord,
    RawSimulationsFeed, RosterSlotEntry, Service, SimulationsFeed, Sport, TeamAveragesFeed,
};
use crate::db::CrosswalkDb;
use crate::error::ProjectionError;
use crate::feeds::{self, BlobStore, FeedCache};
use crate::projection::{aggregate, SlateContext, SlateTables, SlotDiagnostic};

#[derive(Debug, Clone)]
pub struct ProjectionRequest {
    pub sport: Sport,
    pub service: Service,
    pub slate: String,
    /// Overrides the slate's own start time as the reference timestamp
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectionResponse {
    pub data: Vec<ProjectionRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<SlotDiagnostic>,
}

#[derive(Clone)]
pub struct ProjectionService {
    store: Arc<dyn BlobStore>,
    cache: FeedCache,
    crosswalk: CrosswalkDb,
}

fn decode<T: DeserializeOwned>(feed: &'static str, bytes: &[u8]) -> Result<T, ProjectionError> {
    serde_json::from_slice(bytes).map_err(|source| ProjectionError::MalformedFeed { feed, source })
}

/// Id fields that services publish as either strings or integers.
const ROW_ID_KEYS: [&str; 2] = ["provider_id", "canonical_id"];

fn value_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Decode feed rows one at a time. Rows that fail are dropped with a warning
/// and reported as diagnostics; the rest of the feed is kept.
pub fn decode_rows<T: DeserializeOwned>(
    feed: &'static str,
    rows: Vec<Value>,
    diagnostics: &mut Vec<SlotDiagnostic>,
) -> Vec<T> {
    let mut out = Vec::with_capacity(rows.len());
    for (index, mut row) in rows.into_iter().enumerate() {
        // numeric provider ids become strings
        if let Some(id) = row.get_mut("provider_id") {
            if id.is_number() {
                *id = Value::String(id.to_string());
            }
        }
        let id = ROW_ID_KEYS
            .iter()
            .find_map(|k| row.get(*k))
            .map(value_text)
            .unwrap_or_default();
        let name = row
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        match serde_json::from_value::<T>(row) {
            Ok(v) => out.push(v),
            Err(e) => {
                warn!("Skipping malformed {} row {} ({} {}): {}", feed, index, id, name, e);
                diagnostics.push(SlotDiagnostic {
                    provider_id: id,
                    name,
                    reason: format!("malformed {} row {}: {}", feed, index, e),
                });
            }
        }
    }
    out
}

/// Reference time: explicit date, else the slate's start, else now.
///
/// A `slate_start` that does not parse is returned alongside the fallback so
/// the caller can report it.
pub fn reference_time(
    requested: Option<DateTime<Utc>>,
    slate_start: Option<&str>,
    now: DateTime<Utc>,
) -> (DateTime<Utc>, Option<String>) {
    if let Some(t) = requested {
        return (t, None);
    }
    match slate_start.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => match parse_timestamp(raw) {
            Some(t) => (t, None),
            None => (now, Some(raw.to_string())),
        },
        None => (now, None),
    }
}

impl ProjectionService {
    pub fn new(store: Arc<dyn BlobStore>, cache: FeedCache, crosswalk: CrosswalkDb) -> Self {
        ProjectionService {
            store,
            cache,
            crosswalk,
        }
    }

    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    pub fn crosswalk_db(&self) -> &CrosswalkDb {
        &self.crosswalk
    }

    pub async fn cached_feeds(&self) -> usize {
        self.cache.len().await
    }

    pub async fn invalidate_cache(&self) {
        self.cache.invalidate_all().await;
    }

    async fn fetch_required<T: DeserializeOwned>(
        &self,
        feed: &'static str,
        object: &str,
    ) -> Result<T, ProjectionError> {
        let bytes = self
            .cache
            .get_or_fetch(self.store.as_ref(), object)
            .await
            .map_err(|source| ProjectionError::FeedUnavailable { feed, source })?;
        decode(feed, &bytes)
    }

    /// Optional feeds degrade to `None` with a warning.
    async fn fetch_optional<T: DeserializeOwned>(&self, feed: &'static str, object: &str) -> Option<T> {
        match self.fetch_required(feed, object).await {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("Continuing without {} feed: {}", feed, e);
                None
            }
        }
    }

    pub async fn projections(
        &self,
        req: &ProjectionRequest,
    ) -> Result<ProjectionResponse, ProjectionError> {
        if !feeds::is_valid_slate_name(&req.slate) {
            return Err(ProjectionError::InvalidRequest(format!(
                "invalid slate name '{}'",
                req.slate
            )));
        }

        let draftables_obj = feeds::draftables_object(req.service, req.sport, &req.slate);
        let odds_obj = feeds::odds_object(req.sport);
        let averages_obj = feeds::team_averages_object(req.sport);
        let (draftables, odds, averages) = futures_util::future::join3(
            self.fetch_required::<DraftablesFeed>(feeds::DRAFTABLES_FEED, &draftables_obj),
            self.fetch_optional::<OddsFeed>(feeds::ODDS_FEED, &odds_obj),
            self.fetch_optional::<TeamAveragesFeed>(feeds::TEAM_AVERAGES_FEED, &averages_obj),
        )
        .await;
        let draftables = draftables?;

        let mut diagnostics = Vec::new();
        let slate_start = draftables.slate_start.as_ref().map(value_text);
        let (reference, bad_start) = reference_time(req.date, slate_start.as_deref(), Utc::now());
        if let Some(raw) = bad_start {
            warn!(
                "Malformed slate_start '{}' for {} {} slate '{}'; projecting against {}",
                raw,
                req.sport,
                req.service,
                req.slate,
                reference.to_rfc3339()
            );
            diagnostics.push(SlotDiagnostic {
                provider_id: String::new(),
                name: "slate_start".to_string(),
                reason: format!("malformed slate start '{}', using current time", raw),
            });
        }

        let slots: Vec<RosterSlotEntry> =
            decode_rows(feeds::DRAFTABLES_FEED, draftables.draftables, &mut diagnostics);

        let raw_simulations: RawSimulationsFeed = self
            .fetch_required(
                feeds::SIMULATIONS_FEED,
                &feeds::simulations_object(req.sport, reference.date_naive()),
            )
            .await?;
        let simulations = SimulationsFeed {
            athletes: decode_rows::<AthleteSimulation>(
                feeds::SIMULATIONS_FEED,
                raw_simulations.athletes,
                &mut diagnostics,
            ),
        };

        let crosswalk = self
            .crosswalk
            .load_crosswalk(req.sport, req.service)
            .map_err(ProjectionError::CrosswalkUnavailable)?;
        if crosswalk.is_empty() {
            warn!(
                "Crosswalk has no {} {} mappings; every record will be unresolved",
                req.sport, req.service
            );
        }

        info!(
            "Projecting {} {} slate '{}' at {} ({} draftables, {} crosswalk ids)",
            req.sport,
            req.service,
            req.slate,
            reference.to_rfc3339(),
            slots.len(),
            crosswalk.len()
        );

        let tables = SlateTables::from_feeds(simulations, odds, averages);
        let ctx = SlateContext {
            sport: req.sport,
            service: req.service,
            reference_time: reference,
        };
        let outcome = aggregate(&slots, ctx, &tables, &crosswalk);
        diagnostics.extend(outcome.diagnostics);

        Ok(ProjectionResponse {
            data: outcome.records,
            diagnostics,
        })
    }
}
