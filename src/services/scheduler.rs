use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::db::models::{Appointment, AppointmentDetail, AppointmentInput, AppointmentStatus};
use crate::error::ClinicError;
use crate::store::{AppointmentStore, PatientStore};
use crate::utils::{day_bounds, parse_appointment_date, Pagination};

use super::Page;

const CONFLICT_MESSAGE: &str = "doctor already has an appointment at this time";

/// Owns appointment records and their scheduling rules.
///
/// The doctor on an appointment is always copied from the patient's
/// assigned doctor. A doctor never holds two non-cancelled appointments at
/// the same instant; the store enforces that too, so a booking that races
/// past the pre-check still surfaces as a conflict.
#[derive(Clone)]
pub struct AppointmentScheduler<S> {
    store: S,
}

impl<S> AppointmentScheduler<S>
where
    S: PatientStore + AppointmentStore + Send + Sync,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        patient_id: Uuid,
        input: AppointmentInput,
    ) -> Result<Appointment, ClinicError> {
        let now = Utc::now();
        let date = parse_future_date(&input.appointment_date, now)?;
        let status = parse_status(input.status.as_deref())?.unwrap_or_default();

        let patient = self
            .store
            .find_patient(patient_id)
            .await?
            .ok_or_else(|| ClinicError::not_found("patient not found"))?;
        let doctor_id = patient.doctor_id;

        if status.holds_slot()
            && self
                .store
                .find_slot_conflict(doctor_id, date, None)
                .await?
                .is_some()
        {
            return Err(ClinicError::Conflict(CONFLICT_MESSAGE.into()));
        }

        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id,
            doctor_id,
            appointment_date: date,
            status,
            notes: input.notes.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };
        let stored = self.store.insert_appointment(&appointment).await?;
        log::info!(
            "Created appointment {} for patient {} with doctor {}",
            stored.id,
            patient_id,
            doctor_id
        );
        Ok(stored)
    }

    pub async fn update(
        &self,
        patient_id: Uuid,
        appointment_id: Uuid,
        input: AppointmentInput,
    ) -> Result<Appointment, ClinicError> {
        let date = parse_future_date(&input.appointment_date, Utc::now())?;
        let status = parse_status(input.status.as_deref())?;

        let mut appointment = self
            .store
            .find_appointment_for_patient(appointment_id, patient_id)
            .await?
            .ok_or_else(|| ClinicError::not_found("appointment not found"))?;

        if let Some(next) = status {
            if !appointment.status.can_become(next) {
                return Err(ClinicError::validation(format!(
                    "cannot change a {} appointment to {}",
                    appointment.status, next
                )));
            }
            appointment.status = next;
        }

        if appointment.appointment_date != date
            && appointment.status.holds_slot()
            && self
                .store
                .find_slot_conflict(appointment.doctor_id, date, Some(appointment.id))
                .await?
                .is_some()
        {
            return Err(ClinicError::Conflict(CONFLICT_MESSAGE.into()));
        }

        appointment.appointment_date = date;
        if let Some(notes) = input.notes {
            appointment.notes = notes;
        }

        let updated = self
            .store
            .update_appointment(&appointment)
            .await?
            .ok_or_else(|| ClinicError::not_found("appointment not found"))?;
        log::info!("Updated appointment {}", updated.id);
        Ok(updated)
    }

    pub async fn delete(&self, appointment_id: Uuid) -> Result<(), ClinicError> {
        if self.store.delete_appointment(appointment_id).await? == 0 {
            return Err(ClinicError::not_found("appointment not found"));
        }
        log::info!("Deleted appointment {}", appointment_id);
        Ok(())
    }

    pub async fn get(&self, appointment_id: Uuid) -> Result<AppointmentDetail, ClinicError> {
        self.store
            .find_appointment_detail(appointment_id)
            .await?
            .ok_or_else(|| ClinicError::not_found("appointment not found"))
    }

    pub async fn list(
        &self,
        pagination: Pagination,
    ) -> Result<Page<AppointmentDetail>, ClinicError> {
        let (items, total) = futures::try_join!(
            self.store
                .list_appointments(pagination.limit, pagination.offset()),
            self.store.count_appointments()
        )?;
        Ok(Page {
            items,
            total,
            pagination,
        })
    }

    pub async fn list_for_patient(
        &self,
        patient_id: Uuid,
        pagination: Pagination,
    ) -> Result<Page<Appointment>, ClinicError> {
        if self.store.find_patient(patient_id).await?.is_none() {
            return Err(ClinicError::not_found("patient not found"));
        }
        let (items, total) = futures::try_join!(
            self.store
                .list_patient_appointments(patient_id, pagination.limit, pagination.offset()),
            self.store.count_patient_appointments(patient_id)
        )?;
        Ok(Page {
            items,
            total,
            pagination,
        })
    }

    pub async fn list_for_doctor(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<AppointmentDetail>, ClinicError> {
        Ok(self.store.list_doctor_appointments(doctor_id, None).await?)
    }

    pub async fn list_for_doctor_on(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<AppointmentDetail>, ClinicError> {
        Ok(self
            .store
            .list_doctor_appointments(doctor_id, Some(day_bounds(date)))
            .await?)
    }
}

fn parse_future_date(raw: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, ClinicError> {
    let date = parse_appointment_date(raw).ok_or_else(|| {
        ClinicError::validation("invalid appointment date format, expected DD/MM/YYYY HH:MM")
    })?;
    if date <= now {
        return Err(ClinicError::validation("date must be in the future"));
    }
    Ok(date)
}

/// `None` for an absent or blank status.
fn parse_status(raw: Option<&str>) -> Result<Option<AppointmentStatus>, ClinicError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<AppointmentStatus>()
            .map(Some)
            .map_err(|e| ClinicError::Validation(e.to_string())),
    }
}
