use crate::utils::Pagination;

pub mod auth;
pub mod patients;
pub mod prescriptions;
pub mod scheduler;

pub use auth::{AuthService, AuthenticatedActor};
pub use patients::PatientRegistry;
pub use prescriptions::PrescriptionLedger;
pub use scheduler::AppointmentScheduler;

/// A page of results plus the unpaged total.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> i64 {
        self.pagination.total_pages(self.total)
    }
}
