use chrono::Utc;
use uuid::Uuid;

use crate::db::models::{Prescription, PrescriptionInput};
use crate::error::ClinicError;
use crate::store::{PatientStore, PrescriptionChanges, PrescriptionStore};

#[derive(Clone)]
pub struct PrescriptionLedger<S> {
    store: S,
}

impl<S> PrescriptionLedger<S>
where
    S: PatientStore + PrescriptionStore + Send + Sync,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        patient_id: Uuid,
        doctor_id: Uuid,
        input: PrescriptionInput,
    ) -> Result<Prescription, ClinicError> {
        let changes = validate(input)?;
        self.ensure_patient(patient_id).await?;

        let now = Utc::now();
        let prescription = Prescription {
            id: Uuid::new_v4(),
            patient_id,
            doctor_id,
            medication: changes.medication,
            dosage: changes.dosage,
            instructions: changes.instructions,
            created_at: now,
            updated_at: now,
        };
        let stored = self.store.insert_prescription(&prescription).await?;
        log::info!(
            "Doctor {} prescribed {} for patient {}",
            doctor_id,
            stored.medication,
            patient_id
        );
        Ok(stored)
    }

    /// Rewrites every prescription this doctor holds for the patient.
    pub async fn update(
        &self,
        patient_id: Uuid,
        doctor_id: Uuid,
        input: PrescriptionInput,
    ) -> Result<Vec<Prescription>, ClinicError> {
        let changes = validate(input)?;
        self.ensure_patient(patient_id).await?;

        let updated = self
            .store
            .update_prescriptions(patient_id, doctor_id, &changes)
            .await?;
        if updated.is_empty() {
            return Err(ClinicError::not_found(
                "prescription not found for this patient and doctor",
            ));
        }
        log::info!(
            "Doctor {} updated {} prescription(s) for patient {}",
            doctor_id,
            updated.len(),
            patient_id
        );
        Ok(updated)
    }

    async fn ensure_patient(&self, patient_id: Uuid) -> Result<(), ClinicError> {
        match self.store.find_patient(patient_id).await? {
            Some(_) => Ok(()),
            None => Err(ClinicError::not_found("patient not found")),
        }
    }
}

fn validate(input: PrescriptionInput) -> Result<PrescriptionChanges, ClinicError> {
    let changes = PrescriptionChanges {
        medication: input.medication.trim().to_string(),
        dosage: input.dosage.trim().to_string(),
        instructions: input.instructions.trim().to_string(),
    };
    if changes.medication.is_empty() || changes.dosage.is_empty() {
        return Err(ClinicError::validation(
            "medication and dosage are required fields",
        ));
    }
    Ok(changes)
}
