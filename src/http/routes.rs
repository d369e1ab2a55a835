//! Control-plane route handlers (spec §6 "HTTP surface (control plane)").

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::settings::{Settings, diff, merge_values, schema};

use super::errors::ApiError;
use super::state::AppState;

fn site_or_404(state: &AppState, site_id: Uuid) -> Result<crate::models::Site, ApiError> {
    state.sites.get(site_id).ok_or(ApiError::SiteNotFound(site_id))
}

/// `GET /sites/{id}/settings` → `{settings, defaults}`.
pub async fn get_settings(State(state): State<AppState>, Path(site_id): Path<Uuid>) -> Result<Json<Value>, ApiError> {
    let site = site_or_404(&state, site_id)?;
    let defaults = Settings::default_value();
    let settings = merge_values(&defaults, &site.settings_overrides);
    Ok(Json(json!({ "settings": settings, "defaults": defaults })))
}

/// `GET /sites/{id}/settings/diff` → `{diff, overrideCount}`.
pub async fn get_settings_diff(State(state): State<AppState>, Path(site_id): Path<Uuid>) -> Result<Json<Value>, ApiError> {
    let site = site_or_404(&state, site_id)?;
    let defaults = Settings::default_value();
    let effective = merge_values(&defaults, &site.settings_overrides);
    let (sparse, override_count) = diff(&defaults, &effective);
    Ok(Json(json!({ "diff": sparse, "overrideCount": override_count })))
}

/// `PUT /sites/{id}/settings` (body: full override tree) → 204.
pub async fn put_settings(
    State(state): State<AppState>,
    Path(site_id): Path<Uuid>,
    Json(overrides): Json<Value>,
) -> Result<StatusCode, ApiError> {
    site_or_404(&state, site_id)?;
    schema::validate(&overrides)?;
    state.sites.update(site_id, |site| site.settings_overrides = overrides);
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /sites/{id}/settings` → resets overrides.
pub async fn delete_settings(State(state): State<AppState>, Path(site_id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    site_or_404(&state, site_id)?;
    state.sites.update(site_id, |site| site.settings_overrides = Value::Object(serde_json::Map::new()));
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /sites/{id}/agent` → starts an `AgentRun`, returns `{runId}`
/// immediately; the loop itself continues on a background task.
pub async fn start_agent(State(state): State<AppState>, Path(site_id): Path<Uuid>) -> Result<Json<Value>, ApiError> {
    let site = site_or_404(&state, site_id)?;
    let defaults = Settings::default_value();
    let initial_settings = merge_values(&defaults, &site.settings_overrides);
    let work_dir = state.config.work_dir_root.join(site_id.to_string());

    let run_id = state.engine.start_background(site_id, site.origin_url.clone(), work_dir, initial_settings)?;
    state.sites.record_run(site_id, run_id);
    Ok(Json(json!({ "runId": run_id })))
}

/// `POST /sites/{id}/agent/{runId}/resume` → resumes a failed run; 409 if
/// its work directory has expired (mapped from `AgentError::WorkDirMissing`
/// by `ApiError`'s `IntoResponse`).
pub async fn resume_agent(
    State(state): State<AppState>,
    Path((site_id, run_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let site = site_or_404(&state, site_id)?;
    state.engine.resume_background(run_id, site.origin_url.clone()).await?;
    state.sites.record_run(site_id, run_id);
    Ok(StatusCode::ACCEPTED)
}

/// `POST /sites/{id}/agent/{runId}/stop` → sets the abort flag.
pub async fn stop_agent(State(state): State<AppState>, Path((_site_id, run_id)): Path<(Uuid, Uuid)>) -> Result<StatusCode, ApiError> {
    if state.engine.stop(run_id) { Ok(StatusCode::NO_CONTENT) } else { Err(ApiError::RunNotFound(run_id)) }
}

/// `GET /sites/{id}/agent` → current state + tail logs of the site's most
/// recently started run.
pub async fn get_agent_state(State(state): State<AppState>, Path(site_id): Path<Uuid>) -> Result<Json<Value>, ApiError> {
    site_or_404(&state, site_id)?;
    let run_id = state.sites.latest_run(site_id).ok_or(ApiError::SiteNotFound(site_id))?;
    let run = state.engine.load_run(run_id).await?;
    Ok(Json(serde_json::to_value(&run).map_err(|e| ApiError::Internal(e.into()))?))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::extract::{Path, State};
    use reqwest::Client;

    use crate::agent::{AgentController, RemotePlanner, RemoteReviewer};
    use crate::browser::{BrowserPool, BrowserPoolConfig, ChromiumDriverPool};
    use crate::engine_config::EngineConfig;
    use crate::events::EventBusRegistry;
    use crate::http::state::SiteDirectory;
    use crate::models::Site;
    use crate::publish::LocalEdgePublisher;
    use crate::queue::{BuildQueue, SiteRegistry};
    use crate::settings::Settings;
    use crate::store::JsonFileCheckpointStore;

    use super::*;

    fn test_state(tmp: &tempfile::TempDir) -> AppState {
        let config = Arc::new(EngineConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            work_dir_root: tmp.path().to_path_buf(),
            publish_root: tmp.path().join("publish"),
            publish_base_url: "http://127.0.0.1:0/published".to_string(),
            max_concurrent_builds: 1,
            master_key: None,
            pagespeed_api_key: None,
            event_bus_capacity: 16,
        });

        let registry = Arc::new(SiteRegistry::new());
        let events = Arc::new(EventBusRegistry::new(config.event_bus_capacity));
        let publisher = Arc::new(LocalEdgePublisher::new(config.publish_root.clone(), config.publish_base_url.clone()));
        let queue = Arc::new(BuildQueue::with_worker_slots(
            publisher,
            Arc::clone(&registry),
            Arc::clone(&events),
            Client::new(),
            config.max_concurrent_builds,
        ));

        let driver_pool = Arc::new(ChromiumDriverPool::new(BrowserPool::new(BrowserPoolConfig::default())));
        let planner = Arc::new(RemotePlanner::new(Client::new(), "http://127.0.0.1:0/plan"));
        let reviewer = Arc::new(RemoteReviewer::new(Client::new(), "http://127.0.0.1:0/review"));
        let store = Arc::new(JsonFileCheckpointStore::new(tmp.path().join("checkpoints")));
        let engine = Arc::new(AgentController::new(driver_pool, planner, reviewer, Arc::clone(&queue), store, Arc::clone(&registry), None));

        AppState { sites: Arc::new(SiteDirectory::new()), registry, queue, events, engine, config }
    }

    #[tokio::test]
    async fn get_settings_on_unknown_site_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let state = test_state(&tmp);

        let err = get_settings(State(state), Path(Uuid::new_v4())).await.unwrap_err();
        assert!(matches!(err, ApiError::SiteNotFound(_)));
    }

    #[tokio::test]
    async fn put_then_get_settings_round_trips_the_override() {
        let tmp = tempfile::tempdir().unwrap();
        let state = test_state(&tmp);
        let site = Site::new("https://example.com");
        let site_id = site.id;
        state.sites.insert(site);

        let overrides = serde_json::json!({ "build": { "maxPages": 10 } });
        let status = put_settings(State(state.clone()), Path(site_id), Json(overrides.clone())).await.unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let Json(body) = get_settings(State(state), Path(site_id)).await.unwrap();
        let defaults = Settings::default_value();
        let expected = merge_values(&defaults, &overrides);
        assert_eq!(body["settings"], expected);
    }

    #[tokio::test]
    async fn delete_settings_resets_overrides_to_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let state = test_state(&tmp);
        let site = Site::new("https://example.com");
        let site_id = site.id;
        state.sites.insert(site);

        put_settings(State(state.clone()), Path(site_id), Json(serde_json::json!({ "build": { "maxPages": 10 } }))).await.unwrap();
        delete_settings(State(state.clone()), Path(site_id)).await.unwrap();

        let Json(body) = get_settings(State(state), Path(site_id)).await.unwrap();
        assert_eq!(body["settings"], body["defaults"]);
    }

    #[tokio::test]
    async fn stop_agent_on_unknown_run_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let state = test_state(&tmp);

        let err = stop_agent(State(state), Path((Uuid::new_v4(), Uuid::new_v4()))).await.unwrap_err();
        assert!(matches!(err, ApiError::RunNotFound(_)));
    }
}
