//! Web-level errors with HTTP status mapping.
//!
//! `ApiError` answers JSON endpoints; `PageError` renders the same failure as
//! an HTML status page.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use historias_common::DashboardError;
use serde::Serialize;
use tracing::error;

use crate::templates;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Cargando datos del backend...")]
    Loading,
    #[error("{0}")]
    LoadFailed(String),
    #[error("No encontrado: {0}")]
    NotFound(String),
    #[error("{0}")]
    Invalid(String),
    #[error("{0}")]
    Backend(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Loading | ApiError::LoadFailed(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Backend(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Loading => "LOADING",
            ApiError::LoadFailed(_) => "LOAD_FAILED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Invalid(_) => "INVALID",
            ApiError::Backend(_) => "BACKEND",
            ApiError::Internal(_) => "INTERNAL",
        }
    }

    /// Message safe to show to the user. Internal details stay in the log.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Internal(detail) => {
                error!(detail, "Internal error");
                "Ocurrió un error interno".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail { code: self.code(), message: self.public_message() },
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<DashboardError> for ApiError {
    fn from(err: DashboardError) -> Self {
        if err.is_remote() {
            return ApiError::Backend(err.to_string());
        }
        match err {
            DashboardError::Config(detail) => ApiError::Internal(detail),
            local => ApiError::Invalid(local.to_string()),
        }
    }
}

impl From<minijinja::Error> for ApiError {
    fn from(err: minijinja::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

/// An [`ApiError`] answered with the HTML status page.
#[derive(Debug)]
pub struct PageError(pub ApiError);

impl From<ApiError> for PageError {
    fn from(err: ApiError) -> Self {
        PageError(err)
    }
}

impl From<DashboardError> for PageError {
    fn from(err: DashboardError) -> Self {
        PageError(err.into())
    }
}

impl From<minijinja::Error> for PageError {
    fn from(err: minijinja::Error) -> Self {
        PageError(err.into())
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = self.0.status();
        let page = templates::render(
            "estado.html",
            minijinja::context! {
                code => self.0.code(),
                message => self.0.public_message(),
                loading => matches!(self.0, ApiError::Loading),
                failed => matches!(self.0, ApiError::LoadFailed(_)),
            },
        );
        match page {
            Ok(html) => (status, html).into_response(),
            Err(e) => {
                error!(error = %e, "Could not render status page");
                (status, Html(self.0.to_string())).into_response()
            }
        }
    }
}
