use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Doctor,
    Receptionist,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Doctor => "doctor",
            Role::Receptionist => "receptionist",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "doctor" => Ok(Role::Doctor),
            "receptionist" => Ok(Role::Receptionist),
            other => Err(UnknownVariant {
                kind: "role",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Appointment lifecycle. `Completed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled
        )
    }

    /// Whether an appointment in `self` may be moved to `next`.
    pub fn can_become(&self, next: AppointmentStatus) -> bool {
        *self == next || !self.is_terminal()
    }

    /// Cancelled appointments release their slot.
    pub fn holds_slot(&self) -> bool {
        *self != AppointmentStatus::Cancelled
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(AppointmentStatus::Scheduled),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            other => Err(UnknownVariant {
                kind: "status",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for AppointmentStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(sqlx::FromRow, Serialize, Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct Patient {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub doctor_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub appointment_date: DateTime<Utc>,
    #[sqlx(try_from = "String")]
    pub status: AppointmentStatus,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PatientSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DoctorSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// An appointment with its patient and doctor attached for reads.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AppointmentDetail {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub patient: PatientSummary,
    pub doctor: DoctorSummary,
}

/// Row shape of the appointment/patient/doctor join.
#[derive(sqlx::FromRow, Debug)]
pub struct AppointmentDetailRow {
    #[sqlx(flatten)]
    pub appointment: Appointment,
    pub patient_name: String,
    pub patient_email: String,
    pub patient_phone: String,
    pub doctor_name: String,
    pub doctor_email: String,
}

impl From<AppointmentDetailRow> for AppointmentDetail {
    fn from(row: AppointmentDetailRow) -> Self {
        let patient = PatientSummary {
            id: row.appointment.patient_id,
            name: row.patient_name,
            email: row.patient_email,
            phone: row.patient_phone,
        };
        let doctor = DoctorSummary {
            id: row.appointment.doctor_id,
            name: row.doctor_name,
            email: row.doctor_email,
        };
        AppointmentDetail {
            appointment: row.appointment,
            patient,
            doctor,
        }
    }
}

#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct Prescription {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub medication: String,
    pub dosage: String,
    pub instructions: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-supplied patient fields. The owning doctor is never accepted here.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct PatientInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct AppointmentInput {
    #[serde(default)]
    pub appointment_date: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct PrescriptionInput {
    #[serde(default)]
    pub medication: String,
    #[serde(default)]
    pub dosage: String,
    #[serde(default)]
    pub instructions: String,
}
