use chrono::Utc;
use uuid::Uuid;

use crate::db::models::{Patient, PatientInput};
use crate::error::ClinicError;
use crate::store::{PatientStore, StoreError, UserStore};
use crate::utils::Pagination;

use super::Page;

/// Patient records, each owned by exactly one doctor.
#[derive(Clone)]
pub struct PatientRegistry<S> {
    store: S,
}

impl<S> PatientRegistry<S>
where
    S: PatientStore + UserStore + Send + Sync,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Registers a patient and assigns them to the clinic's doctor.
    pub async fn create(&self, input: PatientInput) -> Result<Patient, ClinicError> {
        let input = validate(input)?;
        if self.store.email_taken(&input.email, None).await? {
            return Err(StoreError::DuplicateEmail.into());
        }

        let doctor = self
            .store
            .first_doctor()
            .await?
            .ok_or_else(|| ClinicError::validation("no doctor available to assign"))?;

        let now = Utc::now();
        let patient = Patient {
            id: Uuid::new_v4(),
            name: input.name,
            email: input.email,
            phone: input.phone,
            address: input.address,
            doctor_id: doctor.id,
            created_at: now,
            updated_at: now,
        };
        let stored = self.store.insert_patient(&patient).await?;
        log::info!("Registered patient {} under doctor {}", stored.id, doctor.id);
        Ok(stored)
    }

    pub async fn get(&self, patient_id: Uuid) -> Result<Patient, ClinicError> {
        self.store
            .find_patient(patient_id)
            .await?
            .ok_or_else(|| ClinicError::not_found("patient not found"))
    }

    pub async fn list(&self, pagination: Pagination) -> Result<Page<Patient>, ClinicError> {
        let (items, total) = futures::try_join!(
            self.store
                .list_patients(pagination.limit, pagination.offset()),
            self.store.count_patients()
        )?;
        Ok(Page {
            items,
            total,
            pagination,
        })
    }

    pub async fn list_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<Patient>, ClinicError> {
        Ok(self.store.list_patients_for_doctor(doctor_id).await?)
    }

    /// Overwrites contact details. The owning doctor is kept as is.
    pub async fn update(
        &self,
        patient_id: Uuid,
        input: PatientInput,
    ) -> Result<Patient, ClinicError> {
        let input = validate(input)?;
        let mut patient = self.get(patient_id).await?;

        if patient.email != input.email
            && self.store.email_taken(&input.email, Some(patient_id)).await?
        {
            return Err(StoreError::DuplicateEmail.into());
        }

        patient.name = input.name;
        patient.email = input.email;
        patient.phone = input.phone;
        patient.address = input.address;

        let updated = self
            .store
            .update_patient(&patient)
            .await?
            .ok_or_else(|| ClinicError::not_found("patient not found"))?;
        log::info!("Updated patient {}", patient_id);
        Ok(updated)
    }

    pub async fn delete(&self, patient_id: Uuid) -> Result<(), ClinicError> {
        if self.store.delete_patient(patient_id).await? == 0 {
            return Err(ClinicError::not_found("patient not found"));
        }
        log::info!("Deleted patient {}", patient_id);
        Ok(())
    }
}

fn validate(input: PatientInput) -> Result<PatientInput, ClinicError> {
    let input = PatientInput {
        name: input.name.trim().to_string(),
        email: input.email.trim().to_string(),
        phone: input.phone.trim().to_string(),
        address: input.address.trim().to_string(),
    };
    if input.name.is_empty()
        || input.email.is_empty()
        || input.phone.is_empty()
        || input.address.is_empty()
    {
        return Err(ClinicError::validation(
            "name, email, phone, and address are required fields",
        ));
    }
    if !input.email.contains('@') {
        return Err(ClinicError::validation("email is not valid"));
    }
    Ok(input)
}
