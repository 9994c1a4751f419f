use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::{profile::ExploreParams, region::REGIONS},
    services::{
        directory::{DirectoryStore, EXPLORE_FEED_LIMIT},
        markers::MarkerReconciler,
        session::SessionStore,
    },
};

/// Explore sidebar. Prefers the requested province, else the session owner's.
pub async fn explore_feed(
    State(directory): State<Arc<DirectoryStore>>,
    State(sessions): State<Arc<SessionStore>>,
    Query(params): Query<ExploreParams>,
) -> Result<impl IntoResponse, AppError> {
    let province = match params.province {
        Some(province) => Some(province),
        None => sessions.current_profile().await.map(|p| p.province),
    };
    let limit = params.limit.unwrap_or(EXPLORE_FEED_LIMIT);

    Ok(Json(directory.explore_feed(province.as_deref(), limit).await))
}

/// Markers currently placed on the map.
pub async fn list_markers(
    State(markers): State<Arc<MarkerReconciler>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(markers.markers().await))
}

/// Runs a reconciliation pass against the current online subset.
pub async fn refresh_markers(
    State(markers): State<Arc<MarkerReconciler>>,
    State(directory): State<Arc<DirectoryStore>>,
) -> Result<impl IntoResponse, AppError> {
    let online = directory.online_subset().await;
    Ok(Json(markers.reconcile(&online).await))
}

pub async fn list_regions() -> impl IntoResponse {
    Json(REGIONS)
}
