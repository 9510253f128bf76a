use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use super::domain::{PatientEnrollment, PatientId};
use super::intake::AdherenceEntryRequest;
use super::repository::{PatientRepository, RepositoryError};
use super::service::{AdherenceService, AdherenceServiceError};

/// Router builder exposing enrollment, check-in, and reporting endpoints.
pub fn adherence_router<R>(service: Arc<AdherenceService<R>>) -> Router
where
    R: PatientRepository + 'static,
{
    Router::new()
        .route("/api/v1/patients", post(enroll_handler::<R>))
        .route("/api/v1/patients/:patient_id", get(patient_handler::<R>))
        .route(
            "/api/v1/patients/:patient_id/adherence",
            get(summary_handler::<R>),
        )
        .route(
            "/api/v1/adherence-entries/:patient_id",
            post(record_entry_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn enroll_handler<R>(
    State(service): State<Arc<AdherenceService<R>>>,
    payload: Result<Json<PatientEnrollment>, JsonRejection>,
) -> Response
where
    R: PatientRepository + 'static,
{
    let Json(enrollment) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };

    match service.enroll(enrollment, Utc::now()) {
        Ok(record) => (StatusCode::CREATED, Json(record.view())).into_response(),
        Err(AdherenceServiceError::Intake(error)) => {
            error_response(StatusCode::UNPROCESSABLE_ENTITY, error.to_string())
        }
        Err(AdherenceServiceError::Repository(RepositoryError::Conflict)) => error_response(
            StatusCode::CONFLICT,
            "patient with this contact already exists".to_string(),
        ),
        Err(other) => error_response(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    }
}

pub(crate) async fn record_entry_handler<R>(
    State(service): State<Arc<AdherenceService<R>>>,
    Path(patient_id): Path<String>,
    payload: Result<Json<AdherenceEntryRequest>, JsonRejection>,
) -> Response
where
    R: PatientRepository + 'static,
{
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };

    match service.record_entry(&PatientId(patient_id), request, Utc::now()) {
        Ok(recorded) => (StatusCode::CREATED, Json(recorded.response())).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn summary_handler<R>(
    State(service): State<Arc<AdherenceService<R>>>,
    Path(patient_id): Path<String>,
) -> Response
where
    R: PatientRepository + 'static,
{
    match service.summary(&PatientId(patient_id), Utc::now()) {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn patient_handler<R>(
    State(service): State<Arc<AdherenceService<R>>>,
    Path(patient_id): Path<String>,
) -> Response
where
    R: PatientRepository + 'static,
{
    match service.details(&PatientId(patient_id), Utc::now()) {
        Ok(details) => (StatusCode::OK, Json(details)).into_response(),
        Err(error) => service_error_response(error),
    }
}

fn service_error_response(error: AdherenceServiceError) -> Response {
    let status = match &error {
        AdherenceServiceError::Intake(_) => StatusCode::BAD_REQUEST,
        AdherenceServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        AdherenceServiceError::Repository(RepositoryError::Conflict)
        | AdherenceServiceError::Repository(RepositoryError::StaleRevision { .. })
        | AdherenceServiceError::ConcurrentModification { .. } => StatusCode::CONFLICT,
        AdherenceServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_response(status, error.to_string())
}

fn rejection_response(rejection: JsonRejection) -> Response {
    error_response(StatusCode::BAD_REQUEST, rejection.body_text())
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
