//! Correction feedback opened from the detail form.

use axum::{
    extract::State,
    response::{Html, IntoResponse, Response},
    Form,
};
use historias_view::feedback::FeedbackForm;
use historias_view::form::RecordForm;
use minijinja::context;
use tracing::{info, warn};

use crate::error::{ApiError, PageError};
use crate::state::SharedState;
use crate::templates;

/// Open the feedback form over the detail form's current values.
pub async fn preparar_feedback(Form(form): Form<RecordForm>) -> Result<Html<String>, PageError> {
    let feedback = FeedbackForm::from_record_form(&form)?;
    Ok(render_feedback(&feedback, None, false)?)
}

/// Submit the reviewed labels. On failure the form stays open with the values kept.
pub async fn enviar_feedback(
    State(state): State<SharedState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, PageError> {
    let feedback = FeedbackForm::from_submission(pairs);
    match state.backend.enviar_feedback(&feedback.request()).await {
        Ok(()) => {
            info!(labels = feedback.fields.len(), "Feedback sent");
            Ok(render_feedback(&feedback, None, true)?.into_response())
        }
        Err(e) => {
            warn!(error = %e, "Feedback rejected");
            let message = format!("Error al enviar feedback: {}", e);
            let html = render_feedback(&feedback, Some(&message), false)?;
            Ok((ApiError::from(e).status(), html).into_response())
        }
    }
}

fn render_feedback(
    feedback: &FeedbackForm,
    banner: Option<&str>,
    sent: bool,
) -> Result<Html<String>, minijinja::Error> {
    templates::render(
        "feedback.html",
        context! {
            active => "historias",
            feedback => feedback,
            label_prefix => historias_view::feedback::LABEL_PREFIX,
            banner => banner,
            sent => sent,
        },
    )
}
