use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use super::{json_body, parse_id, AppState};
use crate::db::models::{AppointmentDetail, Patient, Prescription, PrescriptionInput};
use crate::error::ClinicError;
use crate::services::AuthenticatedActor;
use crate::store::ClinicStore;
use crate::utils::parse_query_date;

#[derive(Serialize)]
pub struct PatientsResponse {
    pub patients: Vec<Patient>,
}

#[derive(Serialize)]
pub struct PrescriptionResponse {
    pub message: &'static str,
    pub prescription: Prescription,
}

#[derive(Serialize)]
pub struct PrescriptionsResponse {
    pub message: &'static str,
    pub prescriptions: Vec<Prescription>,
}

#[derive(Serialize)]
pub struct AppointmentsResponse {
    pub appointments: Vec<AppointmentDetail>,
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

/// `GET /api/doctor/patients`
///
/// Lists the patients assigned to the calling doctor.
pub async fn list_patients<S: ClinicStore>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<AuthenticatedActor>,
) -> Result<Json<PatientsResponse>, ClinicError> {
    let patients = state.patients.list_for_doctor(actor.id).await?;
    Ok(Json(PatientsResponse { patients }))
}

/// `POST /api/doctor/prescriptions/:patient_id`
pub async fn create_prescription<S: ClinicStore>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<AuthenticatedActor>,
    Path(patient_id): Path<String>,
    body: Result<Json<PrescriptionInput>, JsonRejection>,
) -> Result<(StatusCode, Json<PrescriptionResponse>), ClinicError> {
    let patient_id = parse_id(&patient_id, "patient")?;
    let input = json_body(body)?;
    let prescription = state
        .prescriptions
        .create(patient_id, actor.id, input)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(PrescriptionResponse {
            message: "Prescription created successfully",
            prescription,
        }),
    ))
}

/// `PUT /api/doctor/prescriptions/:patient_id`
pub async fn update_prescription<S: ClinicStore>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<AuthenticatedActor>,
    Path(patient_id): Path<String>,
    body: Result<Json<PrescriptionInput>, JsonRejection>,
) -> Result<Json<PrescriptionsResponse>, ClinicError> {
    let patient_id = parse_id(&patient_id, "patient")?;
    let input = json_body(body)?;
    let prescriptions = state
        .prescriptions
        .update(patient_id, actor.id, input)
        .await?;
    Ok(Json(PrescriptionsResponse {
        message: "Prescription updated successfully",
        prescriptions,
    }))
}

/// `GET /api/doctor/appointments`
pub async fn list_appointments<S: ClinicStore>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<AuthenticatedActor>,
) -> Result<Json<AppointmentsResponse>, ClinicError> {
    let appointments = state.scheduler.list_for_doctor(actor.id).await?;
    Ok(Json(AppointmentsResponse { appointments }))
}

/// `GET /api/doctor/appointments/by-date?date=YYYY-MM-DD`
pub async fn appointments_by_date<S: ClinicStore>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<AuthenticatedActor>,
    Query(query): Query<DateQuery>,
) -> Result<Json<AppointmentsResponse>, ClinicError> {
    let raw = query
        .date
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| {
            ClinicError::validation("date parameter is required (format: YYYY-MM-DD)")
        })?;
    let date = parse_query_date(raw)
        .ok_or_else(|| ClinicError::validation("invalid date format, expected YYYY-MM-DD"))?;

    let appointments = state.scheduler.list_for_doctor_on(actor.id, date).await?;
    Ok(Json(AppointmentsResponse { appointments }))
}
