// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{
    BatchNumber, DomainError, Vaccine, validate_batch_fields, validate_cancellation_reason,
    validate_dose_number_override, validate_vaccine_fields,
};

#[test]
fn test_validate_vaccine_fields_accepts_valid() {
    let vaccine: Vaccine = Vaccine::new(String::from("BCG"), 1, true);
    assert!(validate_vaccine_fields(&vaccine).is_ok());
}

#[test]
fn test_validate_vaccine_fields_rejects_empty_name() {
    let vaccine: Vaccine = Vaccine::new(String::from("   "), 1, true);
    let result = validate_vaccine_fields(&vaccine);

    assert!(matches!(result, Err(DomainError::InvalidName(_))));
}

#[test]
fn test_validate_vaccine_fields_rejects_zero_doses() {
    let vaccine: Vaccine = Vaccine::new(String::from("BCG"), 0, true);

    assert_eq!(
        validate_vaccine_fields(&vaccine).unwrap_err(),
        DomainError::InvalidDosesPerAdministration { value: 0 }
    );
}

#[test]
fn test_validate_batch_fields_accepts_valid() {
    let batch_number: BatchNumber = BatchNumber::new("BCG-7");
    assert!(validate_batch_fields(&batch_number, 10, 10).is_ok());
}

#[test]
fn test_validate_batch_fields_rejects_empty_number() {
    let batch_number: BatchNumber = BatchNumber::new("   ");
    let result = validate_batch_fields(&batch_number, 10, 10);

    assert!(matches!(result, Err(DomainError::InvalidBatchNumber(_))));
}

#[test]
fn test_validate_batch_fields_rejects_zero_counts() {
    let batch_number: BatchNumber = BatchNumber::new("BCG-7");

    assert_eq!(
        validate_batch_fields(&batch_number, 0, 10).unwrap_err(),
        DomainError::InvalidQuantity { value: 0 }
    );
    assert_eq!(
        validate_batch_fields(&batch_number, 10, 0).unwrap_err(),
        DomainError::InvalidDosesPerVial { value: 0 }
    );
}

#[test]
fn test_validate_cancellation_reason_accepts_text() {
    assert!(validate_cancellation_reason("Child is unwell").is_ok());
}

#[test]
fn test_validate_cancellation_reason_rejects_empty() {
    assert_eq!(
        validate_cancellation_reason("").unwrap_err(),
        DomainError::MissingCancellationReason
    );
    assert_eq!(
        validate_cancellation_reason("   ").unwrap_err(),
        DomainError::MissingCancellationReason
    );
}

#[test]
fn test_dose_number_defaults_to_computed() {
    assert_eq!(validate_dose_number_override(None, 3).unwrap(), 3);
}

#[test]
fn test_dose_number_override_at_computed_accepted() {
    assert_eq!(validate_dose_number_override(Some(3), 3).unwrap(), 3);
}

#[test]
fn test_dose_number_override_above_computed_accepted() {
    // Doses administered outside this system may push the ordinal forward
    assert_eq!(validate_dose_number_override(Some(5), 3).unwrap(), 5);
}

#[test]
fn test_dose_number_override_below_computed_rejected() {
    let result = validate_dose_number_override(Some(2), 3);
    assert_eq!(
        result.unwrap_err(),
        DomainError::DoseNumberConflict {
            supplied: 2,
            computed: 3
        }
    );
}

#[test]
fn test_dose_number_zero_override_rejected() {
    let result = validate_dose_number_override(Some(0), 1);
    assert!(result.is_err());
}
