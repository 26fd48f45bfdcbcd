// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Inventory batch receipt, lookup, and correction tests.

use time::macros::date;
use vax_domain::{BatchCorrection, BatchNumber, BatchStatus};

use crate::error::PersistenceError;
use crate::tests::{receive_test_batch, seed_reference, setup};

#[test]
fn test_receive_and_get_batch() {
    let mut persistence = setup();
    let world = seed_reference(&mut persistence);

    let batch_id = receive_test_batch(&mut persistence, &world, "BCG-2026-X", 5);
    let batch = persistence.get_batch(batch_id).expect("get batch");

    assert_eq!(batch.batch_id, Some(batch_id));
    assert_eq!(batch.batch_number.value(), "BCG-2026-X");
    assert_eq!(batch.quantity, 5);
    assert_eq!(batch.doses_per_vial, 10);
    assert_eq!(batch.stock.remaining_doses(), 50);
    assert_eq!(batch.stock.remaining_full_vials(), 5);
    assert_eq!(batch.stock.open_vial_doses(), 0);
    assert_eq!(batch.status, BatchStatus::Active);
}

#[test]
fn test_get_batch_not_found() {
    let mut persistence = setup();

    assert!(matches!(
        persistence.get_batch(11),
        Err(PersistenceError::NotFound(_))
    ));
}

#[test]
fn test_duplicate_batch_number_rejected() {
    let mut persistence = setup();
    let world = seed_reference(&mut persistence);

    receive_test_batch(&mut persistence, &world, "BCG-2026-X", 5);

    let batch = vax_domain::InventoryBatch::receive(
        world.vaccine_id,
        world.center_id,
        BatchNumber::new("bcg-2026-x"),
        10,
        3,
        date!(2026 - 09 - 30),
        date!(2025 - 12 - 01),
        date!(2026 - 03 - 01),
    )
    .expect("build batch");

    let result = persistence.receive_batch(&batch);

    match result {
        Err(PersistenceError::DuplicateBatch { batch_number }) => {
            assert_eq!(batch_number, "BCG-2026-X");
        }
        other => panic!("Expected DuplicateBatch, got {other:?}"),
    }
}

#[test]
fn test_find_batch_by_number_is_case_insensitive() {
    let mut persistence = setup();
    let world = seed_reference(&mut persistence);

    let batch_id = receive_test_batch(&mut persistence, &world, "BCG-2026-X", 5);

    let found = persistence
        .find_batch_by_number(world.vaccine_id, world.center_id, &BatchNumber::new("bcg-2026-x"))
        .expect("lookup");

    assert_eq!(found.expect("batch present").batch_id, Some(batch_id));
}

#[test]
fn test_find_batch_by_number_missing() {
    let mut persistence = setup();
    let world = seed_reference(&mut persistence);

    let found = persistence
        .find_batch_by_number(world.vaccine_id, world.center_id, &BatchNumber::new("NOPE"))
        .expect("lookup");

    assert!(found.is_none());
}

#[test]
fn test_list_batches_most_depleted_first() {
    let mut persistence = setup();
    let world = seed_reference(&mut persistence);

    receive_test_batch(&mut persistence, &world, "BCG-BIG", 5);
    receive_test_batch(&mut persistence, &world, "BCG-SMALL", 2);

    let batches = persistence
        .list_batches_for_vaccine_center(world.vaccine_id, world.center_id)
        .expect("list batches");

    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].batch_number.value(), "BCG-SMALL");
    assert_eq!(batches[1].batch_number.value(), "BCG-BIG");
}

#[test]
fn test_correction_rewrites_counters() {
    let mut persistence = setup();
    let world = seed_reference(&mut persistence);

    let batch_id = receive_test_batch(&mut persistence, &world, "BCG-2026-X", 5);
    let batch = persistence.get_batch(batch_id).expect("get batch");

    let correction = BatchCorrection {
        quantity: Some(3),
        ..BatchCorrection::default()
    };
    let corrected = correction
        .apply(&batch, date!(2026 - 03 - 05))
        .expect("apply correction");

    persistence
        .update_batch(batch_id, &corrected)
        .expect("update batch");

    let reloaded = persistence.get_batch(batch_id).expect("reload batch");
    assert_eq!(reloaded.quantity, 3);
    assert_eq!(reloaded.stock.remaining_doses(), 30);
    assert_eq!(reloaded.stock.remaining_full_vials(), 3);
}

#[test]
fn test_correction_missing_batch() {
    let mut persistence = setup();
    let world = seed_reference(&mut persistence);

    let batch_id = receive_test_batch(&mut persistence, &world, "BCG-2026-X", 5);
    let batch = persistence.get_batch(batch_id).expect("get batch");

    let result = persistence.update_batch(batch_id + 50, &batch);

    assert!(matches!(result, Err(PersistenceError::NotFound(_))));
}

#[test]
fn test_list_batches_for_center_spans_vaccines() {
    let mut persistence = setup();
    let world = seed_reference(&mut persistence);

    let polio_id = persistence
        .create_vaccine("Polio", 1, true)
        .expect("create vaccine");
    receive_test_batch(&mut persistence, &world, "BCG-2026-X", 5);

    let polio_batch = vax_domain::InventoryBatch::receive(
        polio_id,
        world.center_id,
        BatchNumber::new("POL-2026-A"),
        20,
        2,
        date!(2026 - 12 - 31),
        date!(2026 - 01 - 15),
        date!(2026 - 03 - 01),
    )
    .expect("build batch");
    persistence.receive_batch(&polio_batch).expect("receive");

    let batches = persistence
        .list_batches_for_center(world.center_id)
        .expect("list batches");

    assert_eq!(batches.len(), 2);
}
