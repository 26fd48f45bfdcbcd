// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::types::{BatchNumber, Vaccine};

/// Validates a vaccine's basic field constraints.
///
/// # Arguments
///
/// * `vaccine` - The vaccine to validate
///
/// # Errors
///
/// Returns an error if:
/// - The vaccine name is empty
/// - The per-administration dose count is zero
pub fn validate_vaccine_fields(vaccine: &Vaccine) -> Result<(), DomainError> {
    // Rule: name must not be empty
    if vaccine.name().trim().is_empty() {
        return Err(DomainError::InvalidName(String::from(
            "Vaccine name cannot be empty",
        )));
    }

    // Rule: one administration must draw at least one dose
    if vaccine.doses_per_administration() == 0 {
        return Err(DomainError::InvalidDosesPerAdministration {
            value: vaccine.doses_per_administration(),
        });
    }

    Ok(())
}

/// Validates the fields of a batch receipt before counters are derived.
///
/// # Arguments
///
/// * `batch_number` - The manufacturer batch number
/// * `quantity` - Vials received
/// * `doses_per_vial` - Doses each vial holds
///
/// # Errors
///
/// Returns an error if the batch number is empty or either count is zero.
pub fn validate_batch_fields(
    batch_number: &BatchNumber,
    quantity: u32,
    doses_per_vial: u32,
) -> Result<(), DomainError> {
    if batch_number.value().is_empty() {
        return Err(DomainError::InvalidBatchNumber(String::from(
            "Batch number cannot be empty",
        )));
    }

    if quantity == 0 {
        return Err(DomainError::InvalidQuantity { value: quantity });
    }

    if doses_per_vial == 0 {
        return Err(DomainError::InvalidDosesPerVial {
            value: doses_per_vial,
        });
    }

    Ok(())
}

/// Validates the reason supplied with a cancellation.
///
/// # Errors
///
/// Returns `DomainError::MissingCancellationReason` if the reason is empty
/// or whitespace.
pub fn validate_cancellation_reason(reason: &str) -> Result<(), DomainError> {
    if reason.trim().is_empty() {
        return Err(DomainError::MissingCancellationReason);
    }

    Ok(())
}

/// Validates an explicit dose-number override against the count-derived value.
///
/// An override below the computed next dose would collide with an ordinal
/// that already exists in the child's history. Overrides at or above the
/// computed value are accepted to allow for doses administered outside this
/// system.
///
/// # Arguments
///
/// * `supplied` - The dose number supplied by the caller, if any
/// * `computed` - `1 + count of prior records` for the child and vaccine
///
/// # Returns
///
/// The dose number to record.
///
/// # Errors
///
/// Returns `DomainError::DoseNumberConflict` if the override is below the
/// computed value, or rejects a zero override (dose numbers are 1-based).
pub fn validate_dose_number_override(
    supplied: Option<u32>,
    computed: u32,
) -> Result<u32, DomainError> {
    match supplied {
        None => Ok(computed),
        Some(n) if n >= computed && n > 0 => Ok(n),
        Some(n) => Err(DomainError::DoseNumberConflict {
            supplied: n,
            computed,
        }),
    }
}
