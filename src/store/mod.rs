//! Storage capabilities used by the services.
//!
//! Each service is generic over the subset of traits it needs and receives
//! its store at construction. `PgStore` is the production backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::db::models::{Appointment, AppointmentDetail, Patient, Prescription, User};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Appointment slot already taken")]
    SlotTaken,
    #[error("Email already registered")]
    DuplicateEmail,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Fields a prescription update may overwrite.
#[derive(Debug, Clone)]
pub struct PrescriptionChanges {
    pub medication: String,
    pub dosage: String,
    pub instructions: String,
}

pub trait UserStore {
    fn find_user_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = StoreResult<Option<User>>> + Send;

    fn find_user(&self, id: Uuid) -> impl Future<Output = StoreResult<Option<User>>> + Send;

    /// The doctor new patients are assigned to.
    fn first_doctor(&self) -> impl Future<Output = StoreResult<Option<User>>> + Send;

    /// Inserts unless the email is already present. Returns whether a row was written.
    fn insert_user(&self, user: &User) -> impl Future<Output = StoreResult<bool>> + Send;
}

pub trait PatientStore {
    fn insert_patient(
        &self,
        patient: &Patient,
    ) -> impl Future<Output = StoreResult<Patient>> + Send;

    fn find_patient(&self, id: Uuid) -> impl Future<Output = StoreResult<Option<Patient>>> + Send;

    fn email_taken(
        &self,
        email: &str,
        exclude: Option<Uuid>,
    ) -> impl Future<Output = StoreResult<bool>> + Send;

    fn list_patients(
        &self,
        limit: i64,
        offset: i64,
    ) -> impl Future<Output = StoreResult<Vec<Patient>>> + Send;

    fn count_patients(&self) -> impl Future<Output = StoreResult<i64>> + Send;

    fn list_patients_for_doctor(
        &self,
        doctor_id: Uuid,
    ) -> impl Future<Output = StoreResult<Vec<Patient>>> + Send;

    /// Overwrites the mutable fields. `None` when the row no longer exists.
    fn update_patient(
        &self,
        patient: &Patient,
    ) -> impl Future<Output = StoreResult<Option<Patient>>> + Send;

    /// Returns the number of rows removed.
    fn delete_patient(&self, id: Uuid) -> impl Future<Output = StoreResult<u64>> + Send;
}

pub trait AppointmentStore {
    /// Fails with `StoreError::SlotTaken` when the doctor already holds a
    /// non-cancelled booking at the same instant.
    fn insert_appointment(
        &self,
        appointment: &Appointment,
    ) -> impl Future<Output = StoreResult<Appointment>> + Send;

    fn find_appointment_for_patient(
        &self,
        id: Uuid,
        patient_id: Uuid,
    ) -> impl Future<Output = StoreResult<Option<Appointment>>> + Send;

    fn find_appointment_detail(
        &self,
        id: Uuid,
    ) -> impl Future<Output = StoreResult<Option<AppointmentDetail>>> + Send;

    /// A non-cancelled booking for `doctor_id` at exactly `at`, other than `exclude`.
    fn find_slot_conflict(
        &self,
        doctor_id: Uuid,
        at: DateTime<Utc>,
        exclude: Option<Uuid>,
    ) -> impl Future<Output = StoreResult<Option<Appointment>>> + Send;

    /// Overwrites date, status and notes. Same slot rule as insert.
    fn update_appointment(
        &self,
        appointment: &Appointment,
    ) -> impl Future<Output = StoreResult<Option<Appointment>>> + Send;

    fn delete_appointment(&self, id: Uuid) -> impl Future<Output = StoreResult<u64>> + Send;

    /// Newest first.
    fn list_appointments(
        &self,
        limit: i64,
        offset: i64,
    ) -> impl Future<Output = StoreResult<Vec<AppointmentDetail>>> + Send;

    fn count_appointments(&self) -> impl Future<Output = StoreResult<i64>> + Send;

    /// Newest first.
    fn list_patient_appointments(
        &self,
        patient_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> impl Future<Output = StoreResult<Vec<Appointment>>> + Send;

    fn count_patient_appointments(
        &self,
        patient_id: Uuid,
    ) -> impl Future<Output = StoreResult<i64>> + Send;

    /// Oldest first, optionally restricted to the half-open range `[from, to)`.
    fn list_doctor_appointments(
        &self,
        doctor_id: Uuid,
        range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> impl Future<Output = StoreResult<Vec<AppointmentDetail>>> + Send;
}

pub trait PrescriptionStore {
    fn insert_prescription(
        &self,
        prescription: &Prescription,
    ) -> impl Future<Output = StoreResult<Prescription>> + Send;

    /// Updates every prescription of the (patient, doctor) pair and returns them.
    fn update_prescriptions(
        &self,
        patient_id: Uuid,
        doctor_id: Uuid,
        changes: &PrescriptionChanges,
    ) -> impl Future<Output = StoreResult<Vec<Prescription>>> + Send;
}

pub trait SessionStore {
    fn revoke_token(
        &self,
        fingerprint: &str,
        expires_at: DateTime<Utc>,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    fn is_token_revoked(&self, fingerprint: &str)
        -> impl Future<Output = StoreResult<bool>> + Send;
}

/// Everything the HTTP layer needs from one backend.
pub trait ClinicStore:
    UserStore
    + PatientStore
    + AppointmentStore
    + PrescriptionStore
    + SessionStore
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> ClinicStore for T where
    T: UserStore
        + PatientStore
        + AppointmentStore
        + PrescriptionStore
        + SessionStore
        + Clone
        + Send
        + Sync
        + 'static
{
}
