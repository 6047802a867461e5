//! JSON API over the same views the pages render.

use axum::{
    extract::{Query, State},
    Json,
};
use historias_view::metrics::{SeriesPoint, Summary};
use historias_view::state::LoadStatus;
use historias_view::TableView;
use serde::Serialize;

use crate::error::ApiError;
use crate::handlers::historias::TableQuery;
use crate::state::SharedState;

pub async fn api_historias(
    State(state): State<SharedState>,
    Query(query): Query<TableQuery>,
) -> Result<Json<TableView>, ApiError> {
    let (_, view) = state.with_dashboard(|d| d.table(query.view_state())).await?;
    Ok(Json(view))
}

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub summary: Summary,
    pub series: Vec<SeriesPoint>,
}

pub async fn api_metricas(State(state): State<SharedState>) -> Result<Json<MetricsResponse>, ApiError> {
    let response = state
        .with_dashboard(|d| MetricsResponse { summary: d.summary(), series: d.series() })
        .await?;
    Ok(Json(response))
}

pub async fn api_estado(State(state): State<SharedState>) -> Json<LoadStatus> {
    Json(state.status().await)
}
