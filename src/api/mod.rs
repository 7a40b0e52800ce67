use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::db::models::{parse_reference_time, Service, Sport};
use crate::error::ProjectionError;
use crate::service::{ProjectionRequest, ProjectionService};

const DEFAULT_SLATE: &str = "main";

#[derive(Clone)]
pub struct AppState {
    pub service: ProjectionService,
    pub default_sport: Sport,
    pub default_service: Service,
}

/// Build the Axum router for the projections API.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/api/projections", get(projections_handler))
        .route("/api/cache/invalidate", post(invalidate_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// Raw query string; every field is optional and validated by `to_request`.
#[derive(Debug, Default, Deserialize)]
pub struct ProjectionQuery {
    pub sport: Option<String>,
    pub service: Option<String>,
    pub slate: Option<String>,
    pub date: Option<String>,
}

impl ProjectionQuery {
    pub fn to_request(
        &self,
        default_sport: Sport,
        default_service: Service,
    ) -> Result<ProjectionRequest, ProjectionError> {
        let sport = match self.sport.as_deref() {
            Some(s) => s.parse().map_err(ProjectionError::InvalidRequest)?,
            None => default_sport,
        };
        let service = match self.service.as_deref() {
            Some(s) => s.parse().map_err(ProjectionError::InvalidRequest)?,
            None => default_service,
        };
        let date = match self.date.as_deref() {
            Some(raw) => Some(parse_reference_time(raw).ok_or_else(|| {
                ProjectionError::InvalidRequest(format!("malformed reference time '{}'", raw))
            })?),
            None => None,
        };
        Ok(ProjectionRequest {
            sport,
            service,
            slate: self.slate.clone().unwrap_or_else(|| DEFAULT_SLATE.to_string()),
            date,
        })
    }
}

async fn index_handler() -> impl IntoResponse {
    Html(INDEX_HTML)
}

/// GET /health
async fn health_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mappings = state
        .service
        .crosswalk_db()
        .count()
        .map_err(|e| (StatusCode::SERVICE_UNAVAILABLE, e.to_string()))?;
    Ok(Json(serde_json::json!({
        "status": "ok",
        "crosswalk_mappings": mappings,
        "feed_store": state.service.store_name(),
        "cached_feeds": state.service.cached_feeds().await,
    })))
}

/// GET /api/projections?sport=nfl&service=draftkings&slate=main&date=2026-10-19
async fn projections_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProjectionQuery>,
) -> Result<impl IntoResponse, ProjectionError> {
    let req = query.to_request(state.default_sport, state.default_service)?;
    let resp = state.service.projections(&req).await?;
    Ok(Json(resp))
}

/// POST /api/cache/invalidate
async fn invalidate_handler(State(state): State<Arc<AppState>>) -> StatusCode {
    state.service.invalidate_cache().await;
    info!("Feed cache invalidated");
    StatusCode::NO_CONTENT
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>DFS Projections</title>
<style>
  body { background: #0f1117; color: #e0e0e0; font-family: system-ui, sans-serif; padding: 2rem; }
  code { color: #6c63ff; }
  li { margin: .4rem 0; }
</style>
</head>
<body>
<h1>DFS Projections</h1>
<ul>
  <li><code>GET /api/projections?sport=nfl&amp;service=draftkings&amp;slate=main&amp;date=2026-10-19</code></li>
  <li><code>GET /health</code></li>
  <li><code>POST /api/cache/invalidate</code></li>
</ul>
</body>
</html>
"#;
