//! HTTP endpoints, grouped by the role allowed to call them.
//!
//! Handlers stay thin: parse the path, query and body, call one service
//! method, shape the JSON. Every failure goes out through `ClinicError`.

use axum::extract::rejection::JsonRejection;
use axum::http::{header, HeaderMap};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::credentials::TokenSigner;
use crate::error::ClinicError;
use crate::services::{
    AppointmentScheduler, AuthService, Page, PatientRegistry, PrescriptionLedger,
};
use crate::store::ClinicStore;
use crate::utils::Pagination;

pub mod auth;
pub mod doctor;
pub mod middleware;
pub mod receptionist;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState<S> {
    pub scheduler: AppointmentScheduler<S>,
    pub patients: PatientRegistry<S>,
    pub prescriptions: PrescriptionLedger<S>,
    pub auth: AuthService<S>,
}

impl<S: ClinicStore> AppState<S> {
    pub fn new(store: S, signer: TokenSigner) -> Self {
        Self {
            scheduler: AppointmentScheduler::new(store.clone()),
            patients: PatientRegistry::new(store.clone()),
            prescriptions: PrescriptionLedger::new(store.clone()),
            auth: AuthService::new(store, signer),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PageQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::from_query(self.page.as_deref(), self.limit.as_deref())
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct PaginationMeta {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_count: i64,
    pub per_page: i64,
}

impl<T> From<&Page<T>> for PaginationMeta {
    fn from(page: &Page<T>) -> Self {
        Self {
            current_page: page.pagination.page,
            total_pages: page.total_pages(),
            total_count: page.total,
            per_page: page.pagination.limit,
        }
    }
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, ClinicError> {
    Uuid::parse_str(raw)
        .map_err(|_| ClinicError::validation(format!("invalid {} ID format", what)))
}

/// Unwraps a JSON body, reporting malformed payloads as validation errors.
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ClinicError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        ClinicError::validation(format!("invalid request body: {}", rejection.body_text()))
    })
}

/// The token from an `Authorization: Bearer <token>` header, if any.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
