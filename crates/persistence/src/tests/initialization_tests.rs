// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Database initialization and constraint enforcement tests.

use crate::error::PersistenceError;
use crate::tests::{seed_reference, setup};
use time::macros::date;

#[test]
fn test_in_memory_initialization() {
    let mut persistence = setup();
    assert!(persistence.verify_foreign_key_enforcement().is_ok());
}

#[test]
fn test_in_memory_databases_are_isolated() {
    let mut first = setup();
    let mut second = setup();

    let center_id = first.create_center("Ward 12 PHC").expect("create center");

    assert!(first.get_center(center_id).is_ok());
    assert!(matches!(
        second.get_center(center_id),
        Err(PersistenceError::NotFound(_))
    ));
}

#[test]
fn test_foreign_keys_rejected_for_missing_parent() {
    let mut persistence = setup();

    let result = persistence.create_child("Orphan Row", 9999, date!(2025 - 11 - 02));

    assert!(
        matches!(result, Err(PersistenceError::DatabaseError(_))),
        "Child insert with missing parent must be rejected, got {result:?}"
    );
}

#[test]
fn test_foreign_keys_rejected_for_missing_center() {
    let mut persistence = setup();

    let result = persistence.create_staff("Nobody", 9999);

    assert!(
        matches!(result, Err(PersistenceError::DatabaseError(_))),
        "Staff insert with missing center must be rejected, got {result:?}"
    );
}

#[test]
fn test_seeded_reference_entities_are_retrievable() {
    let mut persistence = setup();
    let world = seed_reference(&mut persistence);

    assert_eq!(
        persistence.get_center(world.center_id).expect("center").name(),
        "Ward 12 PHC"
    );
    assert_eq!(
        persistence
            .get_vaccine(world.vaccine_id)
            .expect("vaccine")
            .name(),
        "BCG"
    );
    assert_eq!(
        persistence.get_child(world.child_id).expect("child").name(),
        "Ishaan Rao"
    );
    assert_eq!(
        persistence.get_staff(world.staff_id).expect("staff").name(),
        "Nurse Devi"
    );
    assert!(persistence.parent_exists(world.parent_id).expect("parent"));
    assert!(!persistence.parent_exists(world.parent_id + 100).expect("parent"));
}
