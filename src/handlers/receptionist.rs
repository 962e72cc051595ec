use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use super::{json_body, parse_id, AppState, MessageResponse, PageQuery, PaginationMeta};
use crate::db::models::{Appointment, AppointmentDetail, AppointmentInput, Patient, PatientInput};
use crate::error::ClinicError;
use crate::store::ClinicStore;

#[derive(Serialize)]
pub struct PatientResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub patient: Patient,
}

#[derive(Serialize)]
pub struct PatientPageResponse {
    pub patients: Vec<Patient>,
    pub pagination: PaginationMeta,
}

#[derive(Serialize)]
pub struct AppointmentResponse {
    pub message: &'static str,
    pub appointment: Appointment,
}

#[derive(Serialize)]
pub struct AppointmentDetailResponse {
    pub appointment: AppointmentDetail,
}

#[derive(Serialize)]
pub struct AppointmentPageResponse<T> {
    pub appointments: Vec<T>,
    pub pagination: PaginationMeta,
}

/// `POST /api/receptionist/patients`
pub async fn create_patient<S: ClinicStore>(
    State(state): State<AppState<S>>,
    body: Result<Json<PatientInput>, JsonRejection>,
) -> Result<(StatusCode, Json<PatientResponse>), ClinicError> {
    let patient = state.patients.create(json_body(body)?).await?;
    Ok((
        StatusCode::CREATED,
        Json(PatientResponse {
            message: Some("Patient created successfully"),
            patient,
        }),
    ))
}

/// `GET /api/receptionist/patients?page&limit`
pub async fn list_patients<S: ClinicStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PatientPageResponse>, ClinicError> {
    let page = state.patients.list(query.pagination()).await?;
    let pagination = PaginationMeta::from(&page);
    Ok(Json(PatientPageResponse {
        patients: page.items,
        pagination,
    }))
}

/// `GET /api/receptionist/patients/:patient_id`
pub async fn get_patient<S: ClinicStore>(
    State(state): State<AppState<S>>,
    Path(patient_id): Path<String>,
) -> Result<Json<PatientResponse>, ClinicError> {
    let patient = state
        .patients
        .get(parse_id(&patient_id, "patient")?)
        .await?;
    Ok(Json(PatientResponse {
        message: None,
        patient,
    }))
}

/// `PUT /api/receptionist/patients/:patient_id`
pub async fn update_patient<S: ClinicStore>(
    State(state): State<AppState<S>>,
    Path(patient_id): Path<String>,
    body: Result<Json<PatientInput>, JsonRejection>,
) -> Result<Json<PatientResponse>, ClinicError> {
    let patient_id = parse_id(&patient_id, "patient")?;
    let patient = state.patients.update(patient_id, json_body(body)?).await?;
    Ok(Json(PatientResponse {
        message: Some("Patient updated successfully"),
        patient,
    }))
}

/// `DELETE /api/receptionist/patients/:patient_id`
pub async fn delete_patient<S: ClinicStore>(
    State(state): State<AppState<S>>,
    Path(patient_id): Path<String>,
) -> Result<Json<MessageResponse>, ClinicError> {
    state
        .patients
        .delete(parse_id(&patient_id, "patient")?)
        .await?;
    Ok(Json(MessageResponse {
        message: "Patient deleted successfully",
    }))
}

/// `POST /api/receptionist/patients/:patient_id/appointments`
pub async fn create_appointment<S: ClinicStore>(
    State(state): State<AppState<S>>,
    Path(patient_id): Path<String>,
    body: Result<Json<AppointmentInput>, JsonRejection>,
) -> Result<(StatusCode, Json<AppointmentResponse>), ClinicError> {
    let patient_id = parse_id(&patient_id, "patient")?;
    let appointment = state
        .scheduler
        .create(patient_id, json_body(body)?)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(AppointmentResponse {
            message: "Appointment created successfully",
            appointment,
        }),
    ))
}

/// `GET /api/receptionist/patients/:patient_id/appointments?page&limit`
pub async fn list_patient_appointments<S: ClinicStore>(
    State(state): State<AppState<S>>,
    Path(patient_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<AppointmentPageResponse<Appointment>>, ClinicError> {
    let patient_id = parse_id(&patient_id, "patient")?;
    let page = state
        .scheduler
        .list_for_patient(patient_id, query.pagination())
        .await?;
    let pagination = PaginationMeta::from(&page);
    Ok(Json(AppointmentPageResponse {
        appointments: page.items,
        pagination,
    }))
}

/// `GET /api/receptionist/patients/:patient_id/appointments/:appointment_id`
///
/// Looked up by appointment id alone.
pub async fn get_appointment<S: ClinicStore>(
    State(state): State<AppState<S>>,
    Path((patient_id, appointment_id)): Path<(String, String)>,
) -> Result<Json<AppointmentDetailResponse>, ClinicError> {
    parse_id(&patient_id, "patient")?;
    let appointment = state
        .scheduler
        .get(parse_id(&appointment_id, "appointment")?)
        .await?;
    Ok(Json(AppointmentDetailResponse { appointment }))
}

/// `PUT /api/receptionist/patients/:patient_id/appointments/:appointment_id`
pub async fn update_appointment<S: ClinicStore>(
    State(state): State<AppState<S>>,
    Path((patient_id, appointment_id)): Path<(String, String)>,
    body: Result<Json<AppointmentInput>, JsonRejection>,
) -> Result<Json<AppointmentResponse>, ClinicError> {
    let patient_id = parse_id(&patient_id, "patient")?;
    let appointment_id = parse_id(&appointment_id, "appointment")?;
    let appointment = state
        .scheduler
        .update(patient_id, appointment_id, json_body(body)?)
        .await?;
    Ok(Json(AppointmentResponse {
        message: "Appointment updated successfully",
        appointment,
    }))
}

/// `DELETE /api/receptionist/patients/:patient_id/appointments/:appointment_id`
pub async fn delete_appointment<S: ClinicStore>(
    State(state): State<AppState<S>>,
    Path((patient_id, appointment_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, ClinicError> {
    parse_id(&patient_id, "patient")?;
    state
        .scheduler
        .delete(parse_id(&appointment_id, "appointment")?)
        .await?;
    Ok(Json(MessageResponse {
        message: "Appointment deleted successfully",
    }))
}

/// `GET /api/receptionist/appointments?page&limit`
pub async fn list_appointments<S: ClinicStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<AppointmentPageResponse<AppointmentDetail>>, ClinicError> {
    let page = state.scheduler.list(query.pagination()).await?;
    let pagination = PaginationMeta::from(&page);
    Ok(Json(AppointmentPageResponse {
        appointments: page.items,
        pagination,
    }))
}
