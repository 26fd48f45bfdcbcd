// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod initialization_tests;
mod inventory_tests;
mod lifecycle_tests;

use time::macros::{date, time};
use time::{Date, Time};
use vax_audit::{Actor, Cause};
use vax_domain::{Appointment, BatchNumber, InventoryBatch};

use crate::Persistence;

/// The visit day most tests schedule and act on.
pub const VISIT_DATE: Date = date!(2026 - 03 - 10);
pub const VISIT_TIME: Time = time!(09:30);

/// Canonical IDs of the seeded reference entities.
pub struct TestWorld {
    pub parent_id: i64,
    pub center_id: i64,
    pub vaccine_id: i64,
    pub child_id: i64,
    pub staff_id: i64,
}

pub fn setup() -> Persistence {
    Persistence::new_in_memory().expect("Failed to create in-memory database")
}

/// Seeds one parent, center, vaccine, child, and staff member.
pub fn seed_reference(persistence: &mut Persistence) -> TestWorld {
    let parent_id = persistence
        .create_parent("Asha Rao")
        .expect("Failed to create parent");
    let center_id = persistence
        .create_center("Ward 12 PHC")
        .expect("Failed to create center");
    let vaccine_id = persistence
        .create_vaccine("BCG", 1, true)
        .expect("Failed to create vaccine");
    let child_id = persistence
        .create_child("Ishaan Rao", parent_id, date!(2025 - 11 - 02))
        .expect("Failed to create child");
    let staff_id = persistence
        .create_staff("Nurse Devi", center_id)
        .expect("Failed to create staff");

    TestWorld {
        parent_id,
        center_id,
        vaccine_id,
        child_id,
        staff_id,
    }
}

pub fn create_test_actor(staff_id: i64) -> Actor {
    Actor::with_staff(
        format!("staff-{staff_id}"),
        String::from("staff"),
        staff_id,
        String::from("Nurse Devi"),
    )
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("req-test"), String::from("Test operation"))
}

/// Receives a 10-doses-per-vial batch and returns its ID.
pub fn receive_test_batch(
    persistence: &mut Persistence,
    world: &TestWorld,
    batch_number: &str,
    quantity: u32,
) -> i64 {
    let batch = InventoryBatch::receive(
        world.vaccine_id,
        world.center_id,
        BatchNumber::new(batch_number),
        10,
        quantity,
        date!(2026 - 09 - 30),
        date!(2025 - 12 - 01),
        date!(2026 - 03 - 01),
    )
    .expect("Failed to build batch");

    persistence
        .receive_batch(&batch)
        .expect("Failed to receive batch")
}

/// Schedules an appointment on the canonical visit day and returns its ID.
pub fn schedule_test_appointment(persistence: &mut Persistence, world: &TestWorld) -> i64 {
    let appointment = Appointment::new(
        world.child_id,
        world.parent_id,
        world.vaccine_id,
        world.center_id,
        VISIT_DATE,
        VISIT_TIME,
        String::from("$2b$12$test-hash"),
    );

    persistence
        .create_appointment(&appointment)
        .expect("Failed to create appointment")
}
