//! Detail/edit form: open, create and save clinical records.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use historias_view::form::{FieldErrors, RecordForm};
use minijinja::context;
use tracing::{info, warn};

use crate::error::{ApiError, PageError};
use crate::state::SharedState;
use crate::templates;

pub async fn nueva_historia() -> Result<Html<String>, PageError> {
    Ok(render_form(&RecordForm::default(), &FieldErrors::default(), None)?)
}

pub async fn detalle_historia(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Html<String>, PageError> {
    let form = state
        .with_dashboard(|d| d.find(&id).map(RecordForm::from))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("historia {}", id)))?;
    Ok(render_form(&form, &FieldErrors::default(), None)?)
}

/// Validate and coerce locally, then send to the backend. Any failure
/// re-renders the form with the typed values kept.
pub async fn guardar_historia(
    State(state): State<SharedState>,
    Form(form): Form<RecordForm>,
) -> Result<Response, PageError> {
    let record = match form.to_record() {
        Ok(record) => record,
        Err(e) => {
            warn!(error = %e, "Form rejected before save");
            let errors = form.validate();
            let html = render_form(&form, &errors, Some(&e.to_string()))?;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, html).into_response());
        }
    };

    let generation = state.generation();
    match state.backend.guardar_paciente(&record).await {
        Ok(stored) => {
            info!(id = %stored.id, "Record saved");
            if !state.store_saved(stored, generation).await {
                info!("Load changed during save, reloading");
                let state = state.clone();
                tokio::spawn(async move {
                    state.reload().await;
                });
            }
            Ok(Redirect::to("/?guardado=1").into_response())
        }
        Err(e) => {
            warn!(error = %e, "Backend refused the record");
            let message = format!("Error al guardar: {}", e);
            let html = render_form(&form, &FieldErrors::default(), Some(&message))?;
            Ok((ApiError::from(e).status(), html).into_response())
        }
    }
}

pub(crate) fn render_form(
    form: &RecordForm,
    errors: &FieldErrors,
    banner: Option<&str>,
) -> Result<Html<String>, minijinja::Error> {
    templates::render(
        "detalle.html",
        context! {
            active => "historias",
            form => form,
            errors => errors,
            is_new => form.id.trim().is_empty(),
            banner => banner,
        },
    )
}
