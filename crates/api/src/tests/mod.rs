// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod lifecycle_tests;

use time::macros::{date, datetime};
use time::{Date, OffsetDateTime};
use vax_audit::Cause;
use vax_persistence::Persistence;

use crate::auth::{AuthenticatedActor, Role};
use crate::handlers::{
    create_center, create_child, create_parent, create_staff, create_vaccine, receive_batch,
    schedule_appointment,
};
use crate::request_response::{
    CreateCenterRequest, CreateChildRequest, CreateParentRequest, CreateStaffRequest,
    CreateVaccineRequest, ReceiveBatchRequest, ScheduleAppointmentRequest,
};

/// The visit day most tests schedule and act on.
pub const VISIT_DATE: Date = date!(2026 - 03 - 10);
pub const VISIT_DATE_WIRE: &str = "2026-03-10";
pub const VISIT_TIME_WIRE: &str = "09:30";

/// A mid-visit clock for completion timestamps.
pub const VISIT_CLOCK: OffsetDateTime = datetime!(2026-03-10 10:00 UTC);

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

pub fn admin() -> AuthenticatedActor {
    AuthenticatedActor::new("admin-1", Role::Admin, None)
}

pub fn staff(staff_id: i64) -> AuthenticatedActor {
    AuthenticatedActor::new("staff-4", Role::Staff, Some(staff_id))
}

pub fn cause() -> Cause {
    Cause::new(String::from("req-456"), String::from("Test request"))
}

/// Seeds one parent, center, vaccine, child, and staff member through the
/// provisioning handlers.
pub fn seed_world(persistence: &mut Persistence) -> TestWorld {
    let actor = admin();
    let parent_id = create_parent(
        persistence,
        &CreateParentRequest {
            name: String::from("Asha Rao"),
        },
        &actor,
    )
    .expect("create parent")
    .parent_id;
    let center_id = create_center(
        persistence,
        &CreateCenterRequest {
            name: String::from("Ward 12 PHC"),
        },
        &actor,
    )
    .expect("create center")
    .center_id;
    let vaccine_id = create_vaccine(
        persistence,
        &CreateVaccineRequest {
            name: String::from("BCG"),
            doses_per_administration: 1,
        },
        &actor,
    )
    .expect("create vaccine")
    .vaccine_id;
    let child_id = create_child(
        persistence,
        &CreateChildRequest {
            name: String::from("Ishaan Rao"),
            parent_id,
            date_of_birth: String::from("2025-11-02"),
        },
        &actor,
    )
    .expect("create child")
    .child_id;
    let staff_id = create_staff(
        persistence,
        &CreateStaffRequest {
            name: String::from("Nurse Devi"),
            center_id,
        },
        &actor,
    )
    .expect("create staff")
    .staff_id;

    TestWorld {
        parent_id,
        center_id,
        vaccine_id,
        child_id,
        staff_id,
    }
}

/// Books an appointment on the canonical visit day, returning its ID and
/// the one-time verification code.
pub fn schedule(persistence: &mut Persistence, world: &TestWorld) -> (i64, String) {
    schedule_for_vaccine(persistence, world, world.vaccine_id)
}

pub fn schedule_for_vaccine(
    persistence: &mut Persistence,
    world: &TestWorld,
    vaccine_id: i64,
) -> (i64, String) {
    let response = schedule_appointment(
        persistence,
        &ScheduleAppointmentRequest {
            child_id: world.child_id,
            vaccine_id,
            center_id: world.center_id,
            scheduled_date: String::from(VISIT_DATE_WIRE),
            scheduled_time: String::from(VISIT_TIME_WIRE),
        },
        &admin(),
        cause(),
    )
    .expect("schedule appointment");
    (response.appointment_id, response.verification_code)
}

/// Records a batch received ahead of the visit day.
pub fn receive(
    persistence: &mut Persistence,
    world: &TestWorld,
    vaccine_id: i64,
    batch_number: &str,
    doses_per_vial: u32,
    quantity: u32,
) -> i64 {
    receive_batch(
        persistence,
        &ReceiveBatchRequest {
            vaccine_id,
            center_id: world.center_id,
            batch_number: batch_number.to_string(),
            doses_per_vial,
            quantity,
            expiry_date: String::from("2027-01-01"),
            manufacturing_date: String::from("2025-09-01"),
        },
        &admin(),
        cause(),
        date!(2026 - 03 - 01),
    )
    .expect("receive batch")
    .batch
    .batch_id
    .expect("batch id")
}
