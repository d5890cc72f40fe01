use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use tracing::{error, warn};

use super::domain::QualificationRequest;
use super::service::{QualificationError, QualificationService};
use crate::integrations::ProviderError;
use crate::settings::{Settings, SettingsError, SettingsStore};

pub struct QualificationState<S> {
    pub service: Arc<QualificationService>,
    pub settings: Arc<S>,
}

impl<S> Clone for QualificationState<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            settings: Arc::clone(&self.settings),
        }
    }
}

/// Router exposing the qualification check and the settings record.
pub fn qualification_router<S>(service: Arc<QualificationService>, settings: Arc<S>) -> Router
where
    S: SettingsStore + 'static,
{
    Router::new()
        .route("/api/qualify", post(qualify_handler::<S>))
        .route(
            "/api/settings",
            get(get_settings_handler::<S>).post(update_settings_handler::<S>),
        )
        .with_state(QualificationState { service, settings })
}

pub(crate) async fn qualify_handler<S>(
    State(state): State<QualificationState<S>>,
    payload: Result<axum::Json<QualificationRequest>, JsonRejection>,
) -> Response
where
    S: SettingsStore + 'static,
{
    let axum::Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };
    let settings = match state.settings.get() {
        Ok(settings) => settings,
        Err(err) => return settings_error_response(err),
    };

    match state.service.qualify(&request.address, &settings).await {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(err) => {
            let status = qualification_error_status(&err);
            if status.is_server_error() {
                error!(error = %err, status = status.as_u16(), "qualification failed");
            } else {
                warn!(error = %err, "qualification request rejected");
            }
            error_response(status, err.to_string())
        }
    }
}

pub(crate) async fn get_settings_handler<S>(State(state): State<QualificationState<S>>) -> Response
where
    S: SettingsStore + 'static,
{
    match state.settings.get() {
        Ok(settings) => (StatusCode::OK, axum::Json(settings)).into_response(),
        Err(err) => settings_error_response(err),
    }
}

pub(crate) async fn update_settings_handler<S>(
    State(state): State<QualificationState<S>>,
    payload: Result<axum::Json<Settings>, JsonRejection>,
) -> Response
where
    S: SettingsStore + 'static,
{
    let axum::Json(settings) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };
    match state.settings.update(settings) {
        Ok(updated) => (StatusCode::OK, axum::Json(updated)).into_response(),
        Err(err) => settings_error_response(err),
    }
}

pub(crate) fn qualification_error_status(err: &QualificationError) -> StatusCode {
    match err {
        QualificationError::EmptyAddress => StatusCode::BAD_REQUEST,
        QualificationError::Settings(err) => settings_error_status(err),
        QualificationError::Geocoding(source)
        | QualificationError::PlaceDetails(source)
        | QualificationError::Population { source, .. } => provider_error_status(source),
    }
}

fn provider_error_status(err: &ProviderError) -> StatusCode {
    match err {
        ProviderError::MissingApiKey { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        err if err.is_user_facing() => StatusCode::BAD_REQUEST,
        _ => StatusCode::BAD_GATEWAY,
    }
}

fn settings_error_status(err: &SettingsError) -> StatusCode {
    match err {
        SettingsError::NegativeDensity(_) | SettingsError::RadiusOutOfRange(_) => {
            StatusCode::BAD_REQUEST
        }
        SettingsError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn settings_error_response(err: SettingsError) -> Response {
    error_response(settings_error_status(&err), err.to_string())
}

/// Malformed or mistyped bodies are client errors, reported like any other.
fn rejection_response(rejection: JsonRejection) -> Response {
    warn!(error = %rejection.body_text(), "request body rejected");
    error_response(StatusCode::BAD_REQUEST, rejection.body_text())
}

fn error_response(status: StatusCode, message: String) -> Response {
    let payload = json!({
        "error": message,
    });
    (status, axum::Json(payload)).into_response()
}
