//! Control-plane HTTP transport (spec §6 "HTTP surface (control plane)";
//! SPEC_FULL §6: rebuilt directly on `axum` + `tower-http` since the
//! teacher's private `kodegen_server_http` sibling crate is unavailable —
//! the one dependency swap in this whole transform).

pub mod auth;
pub mod errors;
pub mod routes;
pub mod sse;
pub mod state;

pub use errors::ApiError;
pub use state::{AppState, Engine, SiteDirectory};

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Build the full control-plane router: the routes in spec §6, a master-key
/// auth layer in front of all of them, request tracing, and a `ServeDir`
/// mount over `publish_root` for builds `LocalEdgePublisher` has staged
/// locally (used by the `serve` CLI subcommand).
pub fn app(state: AppState) -> Router {
    let publish_root = state.config.publish_root.clone();

    let api = Router::new()
        .route("/sites/{id}/settings", get(routes::get_settings).put(routes::put_settings).delete(routes::delete_settings))
        .route("/sites/{id}/settings/diff", get(routes::get_settings_diff))
        .route("/sites/{id}/agent", get(routes::get_agent_state).post(routes::start_agent))
        .route("/sites/{id}/agent/{runId}/resume", post(routes::resume_agent))
        .route("/sites/{id}/agent/{runId}/stop", post(routes::stop_agent))
        .route("/builds/{buildId}/logs", get(sse::build_logs))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_master_key));

    Router::new()
        .merge(api)
        .nest_service("/published", ServeDir::new(publish_root))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve `app(state)` until the process is terminated (spec §6;
/// SPEC_FULL §6's `TcpListener::bind` + `axum::serve` shape).
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let addr = state.config.bind_addr.clone();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "control plane listening");
    axum::serve(listener, app(state)).await?;
    Ok(())
}
