use axum::{http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;

/// Request-level failures surfaced to API callers.
#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("{feed} feed unavailable: {source:#}")]
    FeedUnavailable {
        feed: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("{feed} feed is malformed: {source}")]
    MalformedFeed {
        feed: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("crosswalk unavailable: {0:#}")]
    CrosswalkUnavailable(#[source] anyhow::Error),
}

impl ProjectionError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProjectionError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ProjectionError::FeedUnavailable { .. }
            | ProjectionError::MalformedFeed { .. }
            | ProjectionError::CrosswalkUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ProjectionError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

/// Per-slot failures. These skip the offending roster slot and are
/// reported as diagnostics; they never abort the pass.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SlotError {
    #[error("malformed game timestamp '{0}'")]
    MalformedTimestamp(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ProjectionError::InvalidRequest("bad sport".into()).status(),
            StatusCode::BAD_REQUEST
        );
        let unavailable = ProjectionError::FeedUnavailable {
            feed: "draftables",
            source: anyhow::anyhow!("connection refused"),
        };
        assert_eq!(unavailable.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            unavailable.to_string(),
            "draftables feed unavailable: connection refused"
        );
    }

    #[test]
    fn test_slot_error_message() {
        let err = SlotError::MalformedTimestamp("tbd".into());
        assert_eq!(err.to_string(), "malformed game timestamp 'tbd'");
    }
}
