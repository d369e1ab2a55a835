//! Error-to-response mapping for the control plane (spec §7: "every
//! surfaced error carries phase, item identifier, and a human-readable
//! message" — at the HTTP boundary that becomes a JSON body plus a status
//! code).

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::agent::AgentError;
use crate::settings::SettingsError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("site {0} not found")]
    SiteNotFound(uuid::Uuid),

    #[error("agent run {0} not found")]
    RunNotFound(uuid::Uuid),

    #[error("build {0} not found")]
    BuildNotFound(uuid::Uuid),

    #[error("settings rejected: {0}")]
    InvalidSettings(#[from] SettingsError),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::SiteNotFound(_) | ApiError::RunNotFound(_) | ApiError::BuildNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidSettings(_) => StatusCode::BAD_REQUEST,
            ApiError::Agent(AgentError::AlreadyRunning { .. }) => StatusCode::CONFLICT,
            ApiError::Agent(AgentError::WorkDirMissing(_)) => StatusCode::CONFLICT,
            ApiError::Agent(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
