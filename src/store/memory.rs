//! In-memory backend for tests. Mirrors the uniqueness rules of `schema.sql`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{
    AppointmentStore, PatientStore, PrescriptionChanges, PrescriptionStore, SessionStore,
    StoreError, StoreResult, UserStore,
};
use crate::db::models::{
    Appointment, AppointmentDetail, DoctorSummary, Patient, PatientSummary, Prescription, Role,
    User,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    patients: Vec<Patient>,
    appointments: Vec<Appointment>,
    prescriptions: Vec<Prescription>,
    revoked: HashMap<String, DateTime<Utc>>,
}

impl Tables {
    fn slot_taken(&self, candidate: &Appointment) -> bool {
        candidate.status.holds_slot()
            && self.appointments.iter().any(|a| {
                a.id != candidate.id
                    && a.doctor_id == candidate.doctor_id
                    && a.appointment_date == candidate.appointment_date
                    && a.status.holds_slot()
            })
    }

    fn patient_email_taken(&self, email: &str, exclude: Option<Uuid>) -> bool {
        self.patients
            .iter()
            .any(|p| p.email == email && Some(p.id) != exclude)
    }

    fn detail(&self, appointment: &Appointment) -> Option<AppointmentDetail> {
        let patient = self
            .patients
            .iter()
            .find(|p| p.id == appointment.patient_id)?;
        let doctor = self.users.iter().find(|u| u.id == appointment.doctor_id)?;
        Some(AppointmentDetail {
            appointment: appointment.clone(),
            patient: PatientSummary {
                id: patient.id,
                name: patient.name.clone(),
                email: patient.email.clone(),
                phone: patient.phone.clone(),
            },
            doctor: DoctorSummary {
                id: doctor.id,
                name: doctor.name.clone(),
                email: doctor.email.clone(),
            },
        })
    }
}

fn page<T: Clone>(items: &[T], limit: i64, offset: i64) -> Vec<T> {
    items
        .iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .cloned()
        .collect()
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }

    pub fn add_user(&self, name: &str, email: &str, role: Role, password_hash: &str) -> User {
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            role,
            password_hash: password_hash.to_string(),
        };
        self.tables().users.push(user.clone());
        user
    }

    pub fn appointments(&self) -> Vec<Appointment> {
        self.tables().appointments.clone()
    }

    pub fn prescriptions(&self) -> Vec<Prescription> {
        self.tables().prescriptions.clone()
    }
}

impl UserStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.tables().users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables().users.iter().find(|u| u.id == id).cloned())
    }

    async fn first_doctor(&self) -> StoreResult<Option<User>> {
        let tables = self.tables();
        let mut doctors: Vec<&User> = tables
            .users
            .iter()
            .filter(|u| u.role == Role::Doctor)
            .collect();
        doctors.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(doctors.first().map(|u| (*u).clone()))
    }

    async fn insert_user(&self, user: &User) -> StoreResult<bool> {
        let mut tables = self.tables();
        if tables.users.iter().any(|u| u.email == user.email) {
            return Ok(false);
        }
        tables.users.push(user.clone());
        Ok(true)
    }
}

impl PatientStore for MemoryStore {
    async fn insert_patient(&self, patient: &Patient) -> StoreResult<Patient> {
        let mut tables = self.tables();
        if tables.patient_email_taken(&patient.email, None) {
            return Err(StoreError::DuplicateEmail);
        }
        tables.patients.push(patient.clone());
        Ok(patient.clone())
    }

    async fn find_patient(&self, id: Uuid) -> StoreResult<Option<Patient>> {
        Ok(self.tables().patients.iter().find(|p| p.id == id).cloned())
    }

    async fn email_taken(&self, email: &str, exclude: Option<Uuid>) -> StoreResult<bool> {
        Ok(self.tables().patient_email_taken(email, exclude))
    }

    async fn list_patients(&self, limit: i64, offset: i64) -> StoreResult<Vec<Patient>> {
        let mut patients = self.tables().patients.clone();
        patients.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(page(&patients, limit, offset))
    }

    async fn count_patients(&self) -> StoreResult<i64> {
        Ok(self.tables().patients.len() as i64)
    }

    async fn list_patients_for_doctor(&self, doctor_id: Uuid) -> StoreResult<Vec<Patient>> {
        let mut patients: Vec<Patient> = self
            .tables()
            .patients
            .iter()
            .filter(|p| p.doctor_id == doctor_id)
            .cloned()
            .collect();
        patients.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(patients)
    }

    async fn update_patient(&self, patient: &Patient) -> StoreResult<Option<Patient>> {
        let mut tables = self.tables();
        if tables.patient_email_taken(&patient.email, Some(patient.id)) {
            return Err(StoreError::DuplicateEmail);
        }
        let Some(existing) = tables.patients.iter_mut().find(|p| p.id == patient.id) else {
            return Ok(None);
        };
        existing.name = patient.name.clone();
        existing.email = patient.email.clone();
        existing.phone = patient.phone.clone();
        existing.address = patient.address.clone();
        existing.updated_at = Utc::now();
        Ok(Some(existing.clone()))
    }

    async fn delete_patient(&self, id: Uuid) -> StoreResult<u64> {
        let mut tables = self.tables();
        let before = tables.patients.len();
        tables.patients.retain(|p| p.id != id);
        let removed = (before - tables.patients.len()) as u64;
        if removed > 0 {
            tables.appointments.retain(|a| a.patient_id != id);
            tables.prescriptions.retain(|p| p.patient_id != id);
        }
        Ok(removed)
    }
}

impl AppointmentStore for MemoryStore {
    async fn insert_appointment(&self, appointment: &Appointment) -> StoreResult<Appointment> {
        let mut tables = self.tables();
        if tables.slot_taken(appointment) {
            return Err(StoreError::SlotTaken);
        }
        tables.appointments.push(appointment.clone());
        Ok(appointment.clone())
    }

    async fn find_appointment_for_patient(
        &self,
        id: Uuid,
        patient_id: Uuid,
    ) -> StoreResult<Option<Appointment>> {
        Ok(self
            .tables()
            .appointments
            .iter()
            .find(|a| a.id == id && a.patient_id == patient_id)
            .cloned())
    }

    async fn find_appointment_detail(&self, id: Uuid) -> StoreResult<Option<AppointmentDetail>> {
        let tables = self.tables();
        Ok(tables
            .appointments
            .iter()
            .find(|a| a.id == id)
            .and_then(|a| tables.detail(a)))
    }

    async fn find_slot_conflict(
        &self,
        doctor_id: Uuid,
        at: DateTime<Utc>,
        exclude: Option<Uuid>,
    ) -> StoreResult<Option<Appointment>> {
        Ok(self
            .tables()
            .appointments
            .iter()
            .find(|a| {
                a.doctor_id == doctor_id
                    && a.appointment_date == at
                    && a.status.holds_slot()
                    && Some(a.id) != exclude
            })
            .cloned())
    }

    async fn update_appointment(&self, appointment: &Appointment) -> StoreResult<Option<Appointment>> {
        let mut tables = self.tables();
        if tables.slot_taken(appointment) {
            return Err(StoreError::SlotTaken);
        }
        let Some(existing) = tables
            .appointments
            .iter_mut()
            .find(|a| a.id == appointment.id && a.patient_id == appointment.patient_id)
        else {
            return Ok(None);
        };
        existing.appointment_date = appointment.appointment_date;
        existing.status = appointment.status;
        existing.notes = appointment.notes.clone();
        existing.updated_at = Utc::now();
        Ok(Some(existing.clone()))
    }

    async fn delete_appointment(&self, id: Uuid) -> StoreResult<u64> {
        let mut tables = self.tables();
        let before = tables.appointments.len();
        tables.appointments.retain(|a| a.id != id);
        Ok((before - tables.appointments.len()) as u64)
    }

    async fn list_appointments(&self, limit: i64, offset: i64) -> StoreResult<Vec<AppointmentDetail>> {
        let tables = self.tables();
        let mut appointments = tables.appointments.clone();
        appointments.sort_by(|a, b| {
            b.appointment_date
                .cmp(&a.appointment_date)
                .then(a.id.cmp(&b.id))
        });
        Ok(page(&appointments, limit, offset)
            .iter()
            .filter_map(|a| tables.detail(a))
            .collect())
    }

    async fn count_appointments(&self) -> StoreResult<i64> {
        Ok(self.tables().appointments.len() as i64)
    }

    async fn list_patient_appointments(
        &self,
        patient_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Appointment>> {
        let mut appointments: Vec<Appointment> = self
            .tables()
            .appointments
            .iter()
            .filter(|a| a.patient_id == patient_id)
            .cloned()
            .collect();
        appointments.sort_by(|a, b| {
            b.appointment_date
                .cmp(&a.appointment_date)
                .then(a.id.cmp(&b.id))
        });
        Ok(page(&appointments, limit, offset))
    }

    async fn count_patient_appointments(&self, patient_id: Uuid) -> StoreResult<i64> {
        Ok(self
            .tables()
            .appointments
            .iter()
            .filter(|a| a.patient_id == patient_id)
            .count() as i64)
    }

    async fn list_doctor_appointments(
        &self,
        doctor_id: Uuid,
        range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> StoreResult<Vec<AppointmentDetail>> {
        let tables = self.tables();
        let mut appointments: Vec<&Appointment> = tables
            .appointments
            .iter()
            .filter(|a| a.doctor_id == doctor_id)
            .filter(|a| match range {
                Some((from, to)) => a.appointment_date >= from && a.appointment_date < to,
                None => true,
            })
            .collect();
        appointments.sort_by(|a, b| {
            a.appointment_date
                .cmp(&b.appointment_date)
                .then(a.id.cmp(&b.id))
        });
        Ok(appointments
            .into_iter()
            .filter_map(|a| tables.detail(a))
            .collect())
    }
}

impl PrescriptionStore for MemoryStore {
    async fn insert_prescription(&self, prescription: &Prescription) -> StoreResult<Prescription> {
        self.tables().prescriptions.push(prescription.clone());
        Ok(prescription.clone())
    }

    async fn update_prescriptions(
        &self,
        patient_id: Uuid,
        doctor_id: Uuid,
        changes: &PrescriptionChanges,
    ) -> StoreResult<Vec<Prescription>> {
        let now = Utc::now();
        let mut tables = self.tables();
        let mut updated = Vec::new();
        for p in tables
            .prescriptions
            .iter_mut()
            .filter(|p| p.patient_id == patient_id && p.doctor_id == doctor_id)
        {
            p.medication = changes.medication.clone();
            p.dosage = changes.dosage.clone();
            p.instructions = changes.instructions.clone();
            p.updated_at = now;
            updated.push(p.clone());
        }
        Ok(updated)
    }
}

impl SessionStore for MemoryStore {
    async fn revoke_token(&self, fingerprint: &str, expires_at: DateTime<Utc>) -> StoreResult<()> {
        let mut tables = self.tables();
        let now = Utc::now();
        tables.revoked.retain(|_, exp| *exp > now);
        tables.revoked.insert(fingerprint.to_string(), expires_at);
        Ok(())
    }

    async fn is_token_revoked(&self, fingerprint: &str) -> StoreResult<bool> {
        Ok(self.tables().revoked.contains_key(fingerprint))
    }
}
