// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{
    Appointment, AppointmentStatus, BatchCorrection, BatchNumber, BatchStatus, Center, Child,
    DomainError, InventoryBatch, Staff, Vaccine,
};
use time::macros::{date, time};

fn create_test_batch() -> InventoryBatch {
    InventoryBatch::receive(
        1,
        1,
        BatchNumber::new("MR-2026-014"),
        10,
        10,
        date!(2026 - 09 - 30),
        date!(2025 - 11 - 01),
        date!(2026 - 01 - 15),
    )
    .unwrap()
}

#[test]
fn test_batch_number_creation() {
    let batch_number: BatchNumber = BatchNumber::new("MR-2026-014");
    assert_eq!(batch_number.value(), "MR-2026-014");
}

#[test]
fn test_batch_number_normalized_to_uppercase() {
    let lower: BatchNumber = BatchNumber::new("mr-2026-014");
    let mixed: BatchNumber = BatchNumber::new("Mr-2026-014");
    let upper: BatchNumber = BatchNumber::new("MR-2026-014");

    assert_eq!(lower.value(), "MR-2026-014");
    assert_eq!(mixed.value(), "MR-2026-014");
    assert_eq!(upper.value(), "MR-2026-014");
}

#[test]
fn test_batch_number_trims_whitespace() {
    let padded: BatchNumber = BatchNumber::new("  bcg-7 ");
    assert_eq!(padded.value(), "BCG-7");
}

#[test]
fn test_batch_number_case_insensitive_equality() {
    let lower: BatchNumber = BatchNumber::new("bcg-7");
    let upper: BatchNumber = BatchNumber::new("BCG-7");

    assert_eq!(lower, upper);
}

#[test]
fn test_vaccine_creation() {
    let vaccine: Vaccine = Vaccine::new(String::from("BCG"), 1, true);

    assert_eq!(vaccine.vaccine_id(), None);
    assert_eq!(vaccine.name(), "BCG");
    assert_eq!(vaccine.doses_per_administration(), 1);
    assert!(vaccine.is_active());
}

#[test]
fn test_vaccine_with_id() {
    let vaccine: Vaccine = Vaccine::with_id(7, String::from("Measles-Rubella"), 1, false);

    assert_eq!(vaccine.vaccine_id(), Some(7));
    assert!(!vaccine.is_active());
}

#[test]
fn test_center_creation() {
    let center: Center = Center::with_id(3, String::from("Ward 12 PHC"));

    assert_eq!(center.center_id(), Some(3));
    assert_eq!(center.name(), "Ward 12 PHC");
}

#[test]
fn test_child_creation() {
    let child: Child = Child::with_id(9, String::from("Asha"), 21, date!(2025 - 06 - 01));

    assert_eq!(child.child_id(), Some(9));
    assert_eq!(child.name(), "Asha");
    assert_eq!(child.parent_id(), 21);
    assert_eq!(child.date_of_birth(), date!(2025 - 06 - 01));
}

#[test]
fn test_staff_creation() {
    let staff: Staff = Staff::with_id(4, String::from("Nurse Devi"), 3);

    assert_eq!(staff.staff_id(), Some(4));
    assert_eq!(staff.name(), "Nurse Devi");
    assert_eq!(staff.center_id(), 3);
}

#[test]
fn test_appointment_starts_scheduled_and_unbound() {
    let appointment: Appointment = Appointment::new(
        9,
        21,
        1,
        3,
        date!(2026 - 03 - 10),
        time!(10:30),
        String::from("hash"),
    );

    assert_eq!(appointment.appointment_id, None);
    assert_eq!(appointment.status, AppointmentStatus::Scheduled);
    assert_eq!(appointment.staff_id, None);
    assert_eq!(appointment.batch_id, None);
    assert_eq!(appointment.cancellation_reason, None);
}

#[test]
fn test_batch_receive_derives_counters() {
    let batch: InventoryBatch = create_test_batch();

    assert_eq!(batch.stock.remaining_doses(), 100);
    assert_eq!(batch.stock.remaining_full_vials(), 10);
    assert_eq!(batch.stock.open_vial_doses(), 0);
    assert_eq!(batch.doses_consumed(), 0);
    assert_eq!(batch.status, BatchStatus::Active);
}

#[test]
fn test_batch_receive_rejects_zero_quantity() {
    let result = InventoryBatch::receive(
        1,
        1,
        BatchNumber::new("MR-2026-014"),
        10,
        0,
        date!(2026 - 09 - 30),
        date!(2025 - 11 - 01),
        date!(2026 - 01 - 15),
    );

    assert!(result.is_err());
}

#[test]
fn test_batch_receive_rejects_overflowing_shape() {
    let result = InventoryBatch::receive(
        1,
        1,
        BatchNumber::new("MR-2026-014"),
        100_000,
        100_000,
        date!(2026 - 09 - 30),
        date!(2025 - 11 - 01),
        date!(2026 - 01 - 15),
    );

    assert_eq!(
        result.unwrap_err(),
        DomainError::CapacityOverflow {
            quantity: 100_000,
            doses_per_vial: 100_000
        }
    );
}

#[test]
fn test_batch_received_past_expiry_is_expired() {
    let batch: InventoryBatch = InventoryBatch::receive(
        1,
        1,
        BatchNumber::new("OLD-LOT"),
        10,
        10,
        date!(2026 - 01 - 01),
        date!(2025 - 01 - 01),
        date!(2026 - 01 - 15),
    )
    .unwrap();

    assert_eq!(batch.status, BatchStatus::Expired);
}

#[test]
fn test_batch_usability() {
    let batch: InventoryBatch = create_test_batch();

    assert!(batch.is_usable(1, date!(2026 - 03 - 10)));
    assert!(batch.is_usable(100, date!(2026 - 03 - 10)));
    assert!(!batch.is_usable(101, date!(2026 - 03 - 10)));
    // Usable on the expiry day itself, not after
    assert!(batch.is_usable(1, date!(2026 - 09 - 30)));
    assert!(!batch.is_usable(1, date!(2026 - 10 - 01)));
}

#[test]
fn test_correction_empty_changes_nothing() {
    let batch: InventoryBatch = create_test_batch();
    let correction: BatchCorrection = BatchCorrection::default();

    assert!(correction.is_empty());

    let corrected: InventoryBatch = correction.apply(&batch, date!(2026 - 01 - 15)).unwrap();
    assert_eq!(corrected, batch);
}

#[test]
fn test_correction_preserves_consumed_doses() {
    // 100-dose batch with 40 consumed, corrected down to 5 vials
    let batch: InventoryBatch = create_test_batch();
    let correction: BatchCorrection = BatchCorrection {
        quantity: Some(5),
        ..BatchCorrection::default()
    };

    let partially_consumed: InventoryBatch = InventoryBatch {
        stock: crate::StockLevel::derive(10, 10, 40).unwrap(),
        ..batch
    };
    assert_eq!(partially_consumed.doses_consumed(), 40);

    let corrected: InventoryBatch = correction
        .apply(&partially_consumed, date!(2026 - 01 - 15))
        .unwrap();

    assert_eq!(corrected.quantity, 5);
    assert_eq!(corrected.doses_consumed(), 40);
    assert_eq!(corrected.stock.remaining_doses(), 10);
    assert_eq!(corrected.status, BatchStatus::LowStock);
}

#[test]
fn test_correction_cannot_shrink_below_consumed() {
    let batch: InventoryBatch = create_test_batch();
    let partially_consumed: InventoryBatch = InventoryBatch {
        stock: crate::StockLevel::derive(10, 10, 40).unwrap(),
        ..batch
    };

    let correction: BatchCorrection = BatchCorrection {
        quantity: Some(3),
        ..BatchCorrection::default()
    };

    let result = correction.apply(&partially_consumed, date!(2026 - 01 - 15));
    assert_eq!(
        result.unwrap_err(),
        DomainError::StockExceedsCapacity {
            consumed: 40,
            capacity: 30
        }
    );
}

#[test]
fn test_correction_expiry_rederives_status() {
    let batch: InventoryBatch = create_test_batch();
    let correction: BatchCorrection = BatchCorrection {
        expiry_date: Some(date!(2026 - 01 - 01)),
        ..BatchCorrection::default()
    };

    let corrected: InventoryBatch = correction.apply(&batch, date!(2026 - 01 - 15)).unwrap();
    assert_eq!(corrected.status, BatchStatus::Expired);
}

#[test]
fn test_correction_vial_size_rederives_counters() {
    let batch: InventoryBatch = create_test_batch();
    let partially_consumed: InventoryBatch = InventoryBatch {
        stock: crate::StockLevel::derive(10, 10, 3).unwrap(),
        ..batch
    };

    let correction: BatchCorrection = BatchCorrection {
        doses_per_vial: Some(20),
        ..BatchCorrection::default()
    };

    let corrected: InventoryBatch = correction
        .apply(&partially_consumed, date!(2026 - 01 - 15))
        .unwrap();

    assert_eq!(corrected.stock.remaining_doses(), 197);
    assert_eq!(corrected.stock.remaining_full_vials(), 9);
    assert_eq!(corrected.stock.open_vial_doses(), 17);
}
