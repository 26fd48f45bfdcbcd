// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod appointment_status;
mod error;
mod stock;
mod types;
mod validation;
mod visit_day;

#[cfg(test)]
mod tests;

pub use appointment_status::AppointmentStatus;
pub use error::DomainError;
pub use stock::{BatchStatus, StockLevel, derive_batch_status};

// Re-export public types
pub use types::{
    Appointment, BatchCorrection, BatchNumber, Center, Child, InventoryBatch, Staff, VaccinationRecord,
    Vaccine,
};
pub use validation::{
    validate_batch_fields, validate_cancellation_reason, validate_dose_number_override,
    validate_vaccine_fields,
};
pub use visit_day::{check_visit_day, local_today};
