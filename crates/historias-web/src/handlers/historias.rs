//! Clinical-history table page and reload.

use axum::{
    extract::{Query, State},
    response::{Html, Redirect},
};
use historias_common::ClinicalRecord;
use historias_view::{TableView, ViewState};
use minijinja::context;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::PageError;
use crate::state::SharedState;
use crate::templates;

#[derive(Debug, Default, Deserialize)]
pub struct TableQuery {
    pub q: Option<String>,
    pub page: Option<usize>,
    pub guardado: Option<String>,
}

impl TableQuery {
    pub fn view_state(&self) -> ViewState {
        ViewState::new(self.q.clone().unwrap_or_default(), self.page.unwrap_or(1))
    }
}

/// One table row as displayed.
#[derive(Debug, Serialize)]
struct Row<'a> {
    id: &'a str,
    cedula: &'a str,
    nombre: &'a str,
    edad: String,
    diagnostico: &'a str,
    fecha: String,
    /// Records the backend has not assigned an id cannot be opened.
    href: Option<String>,
}

impl<'a> From<&'a ClinicalRecord> for Row<'a> {
    fn from(record: &'a ClinicalRecord) -> Self {
        Row {
            id: &record.id,
            cedula: &record.cedula,
            nombre: &record.nombre,
            edad: record.edad_display(),
            diagnostico: &record.diagnostico,
            fecha: record.fecha_display(),
            href: record.has_id().then(|| format!("/historias/{}", record.id)),
        }
    }
}

pub async fn historias_page(
    State(state): State<SharedState>,
    Query(query): Query<TableQuery>,
) -> Result<Html<String>, PageError> {
    let (view_state, view) = state.with_dashboard(|d| d.table(query.view_state())).await?;
    Ok(render_table(&view_state, &view, query.guardado.is_some())?)
}

fn render_table(state: &ViewState, view: &TableView, saved: bool) -> Result<Html<String>, minijinja::Error> {
    let previous = state.clone().previous_page();
    let next = state.clone().next_page(view.total_pages);
    let rows: Vec<Row> = view.rows.iter().map(Row::from).collect();

    templates::render(
        "historias.html",
        context! {
            active => "historias",
            q => &state.filter_text,
            rows => rows,
            view => view,
            previous_page => (previous.current_page != state.current_page).then_some(previous.current_page),
            next_page => (next.current_page != state.current_page).then_some(next.current_page),
            saved => saved,
        },
    )
}

/// Restart the backend load in the background.
pub async fn recargar(State(state): State<SharedState>) -> Redirect {
    info!("Reload requested");
    tokio::spawn(async move {
        state.reload().await;
    });
    Redirect::to("/")
}
