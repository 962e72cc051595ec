use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    AppointmentStore, PatientStore, PrescriptionChanges, PrescriptionStore, SessionStore,
    StoreError, StoreResult, UserStore,
};
use crate::db::models::{
    Appointment, AppointmentDetail, AppointmentDetailRow, Patient, Prescription, User,
};

const SLOT_INDEX: &str = "appointments_doctor_slot_idx";
const PATIENT_EMAIL_KEY: &str = "patients_email_key";

const DETAIL_SELECT: &str = "SELECT a.*, \
     p.name AS patient_name, p.email AS patient_email, p.phone AS patient_phone, \
     d.name AS doctor_name, d.email AS doctor_email \
     FROM appointments a \
     JOIN patients p ON p.id = a.patient_id \
     JOIN users d ON d.id = a.doctor_id";

/// PostgreSQL backend sharing one connection pool.
#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Turns constraint violations the services care about into typed errors.
fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.constraint() {
            Some(SLOT_INDEX) => return StoreError::SlotTaken,
            Some(PATIENT_EMAIL_KEY) => return StoreError::DuplicateEmail,
            _ => {}
        }
    }
    StoreError::Database(err)
}

impl UserStore for PgStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn first_doctor(&self) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE role = 'doctor' ORDER BY name, id LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn insert_user(&self, user: &User) -> StoreResult<bool> {
        let result = sqlx::query(
            "INSERT INTO users (id, name, email, role, password_hash) \
             VALUES ($1, $2, $3, $4, $5) ON CONFLICT (email) DO NOTHING",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(&user.password_hash)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

impl PatientStore for PgStore {
    async fn insert_patient(&self, patient: &Patient) -> StoreResult<Patient> {
        sqlx::query_as::<_, Patient>(
            "INSERT INTO patients (id, name, email, phone, address, doctor_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(patient.id)
        .bind(&patient.name)
        .bind(&patient.email)
        .bind(&patient.phone)
        .bind(&patient.address)
        .bind(patient.doctor_id)
        .bind(patient.created_at)
        .bind(patient.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn find_patient(&self, id: Uuid) -> StoreResult<Option<Patient>> {
        let patient = sqlx::query_as::<_, Patient>("SELECT * FROM patients WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(patient)
    }

    async fn email_taken(&self, email: &str, exclude: Option<Uuid>) -> StoreResult<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM patients WHERE email = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn list_patients(&self, limit: i64, offset: i64) -> StoreResult<Vec<Patient>> {
        let patients = sqlx::query_as::<_, Patient>(
            "SELECT * FROM patients ORDER BY name, id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(patients)
    }

    async fn count_patients(&self) -> StoreResult<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM patients")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn list_patients_for_doctor(&self, doctor_id: Uuid) -> StoreResult<Vec<Patient>> {
        let patients = sqlx::query_as::<_, Patient>(
            "SELECT * FROM patients WHERE doctor_id = $1 ORDER BY name, id",
        )
        .bind(doctor_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(patients)
    }

    async fn update_patient(&self, patient: &Patient) -> StoreResult<Option<Patient>> {
        sqlx::query_as::<_, Patient>(
            "UPDATE patients SET name = $1, email = $2, phone = $3, address = $4, updated_at = NOW() \
             WHERE id = $5 RETURNING *",
        )
        .bind(&patient.name)
        .bind(&patient.email)
        .bind(&patient.phone)
        .bind(&patient.address)
        .bind(patient.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)
    }

    async fn delete_patient(&self, id: Uuid) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM patients WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

impl AppointmentStore for PgStore {
    async fn insert_appointment(&self, appointment: &Appointment) -> StoreResult<Appointment> {
        sqlx::query_as::<_, Appointment>(
            "INSERT INTO appointments \
             (id, patient_id, doctor_id, appointment_date, status, notes, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(appointment.id)
        .bind(appointment.patient_id)
        .bind(appointment.doctor_id)
        .bind(appointment.appointment_date)
        .bind(appointment.status.as_str())
        .bind(&appointment.notes)
        .bind(appointment.created_at)
        .bind(appointment.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn find_appointment_for_patient(
        &self,
        id: Uuid,
        patient_id: Uuid,
    ) -> StoreResult<Option<Appointment>> {
        let appointment = sqlx::query_as::<_, Appointment>(
            "SELECT * FROM appointments WHERE id = $1 AND patient_id = $2",
        )
        .bind(id)
        .bind(patient_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(appointment)
    }

    async fn find_appointment_detail(&self, id: Uuid) -> StoreResult<Option<AppointmentDetail>> {
        let row = sqlx::query_as::<_, AppointmentDetailRow>(&format!(
            "{} WHERE a.id = $1",
            DETAIL_SELECT
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(AppointmentDetail::from))
    }

    async fn find_slot_conflict(
        &self,
        doctor_id: Uuid,
        at: DateTime<Utc>,
        exclude: Option<Uuid>,
    ) -> StoreResult<Option<Appointment>> {
        let appointment = sqlx::query_as::<_, Appointment>(
            "SELECT * FROM appointments \
             WHERE doctor_id = $1 AND appointment_date = $2 AND status <> 'cancelled' \
             AND ($3::uuid IS NULL OR id <> $3) LIMIT 1",
        )
        .bind(doctor_id)
        .bind(at)
        .bind(exclude)
        .fetch_optional(&self.pool)
        .await?;
        Ok(appointment)
    }

    async fn update_appointment(&self, appointment: &Appointment) -> StoreResult<Option<Appointment>> {
        sqlx::query_as::<_, Appointment>(
            "UPDATE appointments SET appointment_date = $1, status = $2, notes = $3, updated_at = NOW() \
             WHERE id = $4 AND patient_id = $5 RETURNING *",
        )
        .bind(appointment.appointment_date)
        .bind(appointment.status.as_str())
        .bind(&appointment.notes)
        .bind(appointment.id)
        .bind(appointment.patient_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)
    }

    async fn delete_appointment(&self, id: Uuid) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn list_appointments(&self, limit: i64, offset: i64) -> StoreResult<Vec<AppointmentDetail>> {
        let rows = sqlx::query_as::<_, AppointmentDetailRow>(&format!(
            "{} ORDER BY a.appointment_date DESC, a.id LIMIT $1 OFFSET $2",
            DETAIL_SELECT
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(AppointmentDetail::from).collect())
    }

    async fn count_appointments(&self) -> StoreResult<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM appointments")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn list_patient_appointments(
        &self,
        patient_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Appointment>> {
        let appointments = sqlx::query_as::<_, Appointment>(
            "SELECT * FROM appointments WHERE patient_id = $1 \
             ORDER BY appointment_date DESC, id LIMIT $2 OFFSET $3",
        )
        .bind(patient_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(appointments)
    }

    async fn count_patient_appointments(&self, patient_id: Uuid) -> StoreResult<i64> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM appointments WHERE patient_id = $1")
                .bind(patient_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(total)
    }

    async fn list_doctor_appointments(
        &self,
        doctor_id: Uuid,
        range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> StoreResult<Vec<AppointmentDetail>> {
        let rows = match range {
            Some((from, to)) => {
                sqlx::query_as::<_, AppointmentDetailRow>(&format!(
                    "{} WHERE a.doctor_id = $1 AND a.appointment_date >= $2 AND a.appointment_date < $3 \
                     ORDER BY a.appointment_date, a.id",
                    DETAIL_SELECT
                ))
                .bind(doctor_id)
                .bind(from)
                .bind(to)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, AppointmentDetailRow>(&format!(
                    "{} WHERE a.doctor_id = $1 ORDER BY a.appointment_date, a.id",
                    DETAIL_SELECT
                ))
                .bind(doctor_id)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows.into_iter().map(AppointmentDetail::from).collect())
    }
}

impl PrescriptionStore for PgStore {
    async fn insert_prescription(&self, prescription: &Prescription) -> StoreResult<Prescription> {
        let prescription = sqlx::query_as::<_, Prescription>(
            "INSERT INTO prescriptions \
             (id, patient_id, doctor_id, medication, dosage, instructions, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(prescription.id)
        .bind(prescription.patient_id)
        .bind(prescription.doctor_id)
        .bind(&prescription.medication)
        .bind(&prescription.dosage)
        .bind(&prescription.instructions)
        .bind(prescription.created_at)
        .bind(prescription.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(prescription)
    }

    async fn update_prescriptions(
        &self,
        patient_id: Uuid,
        doctor_id: Uuid,
        changes: &PrescriptionChanges,
    ) -> StoreResult<Vec<Prescription>> {
        let prescriptions = sqlx::query_as::<_, Prescription>(
            "UPDATE prescriptions SET medication = $1, dosage = $2, instructions = $3, updated_at = NOW() \
             WHERE patient_id = $4 AND doctor_id = $5 RETURNING *",
        )
        .bind(&changes.medication)
        .bind(&changes.dosage)
        .bind(&changes.instructions)
        .bind(patient_id)
        .bind(doctor_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(prescriptions)
    }
}

impl SessionStore for PgStore {
    async fn revoke_token(&self, fingerprint: &str, expires_at: DateTime<Utc>) -> StoreResult<()> {
        sqlx::query("DELETE FROM revoked_tokens WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;
        sqlx::query(
            "INSERT INTO revoked_tokens (token_hash, expires_at) VALUES ($1, $2) \
             ON CONFLICT (token_hash) DO NOTHING",
        )
        .bind(fingerprint)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn is_token_revoked(&self, fingerprint: &str) -> StoreResult<bool> {
        let revoked: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM revoked_tokens WHERE token_hash = $1)")
                .bind(fingerprint)
                .fetch_one(&self.pool)
                .await?;
        Ok(revoked)
    }
}
