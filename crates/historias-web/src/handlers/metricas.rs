//! Extraction metrics: summary tiles, charts and the per-sample table.

use axum::{
    extract::{Path, Query, State},
    response::Html,
};
use historias_view::chart::{self, ChartSize};
use historias_view::metrics::{self, Tile};
use minijinja::context;
use serde::Deserialize;

use crate::error::{ApiError, PageError};
use crate::state::SharedState;
use crate::templates;

#[derive(Debug, Default, Deserialize)]
pub struct MetricsQuery {
    /// Tile whose explanation is expanded.
    pub detalle: Option<String>,
}

pub async fn metricas_page(
    State(state): State<SharedState>,
    Query(query): Query<MetricsQuery>,
) -> Result<Html<String>, PageError> {
    let (summary, series, rows) = state
        .with_dashboard(|d| (d.summary(), d.series(), metrics::sample_rows(&d.samples)))
        .await?;

    let tiles = metrics::tiles(&summary);
    let selected: Option<&Tile> = query
        .detalle
        .as_deref()
        .and_then(|key| tiles.iter().find(|t| t.key == key));

    Ok(templates::render(
        "metricas.html",
        context! {
            active => "metricas",
            summary => summary,
            tiles => tiles,
            selected => selected,
            charts => chart::panel(&series),
            rows => rows,
        },
    )?)
}

/// One chart at zoom size.
pub async fn grafica_page(
    State(state): State<SharedState>,
    Path(metric): Path<String>,
) -> Result<Html<String>, PageError> {
    let series = state.with_dashboard(|d| d.series()).await?;
    let chart = chart::line_chart(&metric, &series, ChartSize::Zoom)
        .ok_or_else(|| ApiError::NotFound(format!("gráfica {}", metric)))?;

    Ok(templates::render(
        "grafica.html",
        context! {
            active => "metricas",
            chart => chart,
        },
    )?)
}
