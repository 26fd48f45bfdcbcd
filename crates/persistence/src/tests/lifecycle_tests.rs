// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Appointment lifecycle tests against the store.
//!
//! These tests drive the planning functions end to end through
//! `apply_transition`, including the status compare-and-set that rejects
//! transitions raced by a concurrent writer.

use time::macros::{date, time};
use vax_domain::{AppointmentStatus, DomainError};
use vaxtrack::{TransitionResult, plan_cancellation, plan_check_in, plan_confirmation, plan_reschedule, plan_start_visit};

use crate::error::PersistenceError;
use crate::tests::{
    VISIT_DATE, create_test_actor, create_test_cause, receive_test_batch, schedule_test_appointment,
    seed_reference, setup,
};

#[test]
fn test_create_and_get_appointment() {
    let mut persistence = setup();
    let world = seed_reference(&mut persistence);

    let appointment_id = schedule_test_appointment(&mut persistence, &world);
    let appointment = persistence
        .get_appointment(appointment_id)
        .expect("get appointment");

    assert_eq!(appointment.appointment_id, Some(appointment_id));
    assert_eq!(appointment.status, AppointmentStatus::Scheduled);
    assert_eq!(appointment.child_id, world.child_id);
    assert!(appointment.batch_id.is_none());
    assert!(appointment.staff_id.is_none());
}

#[test]
fn test_confirmation_transition() {
    let mut persistence = setup();
    let world = seed_reference(&mut persistence);

    let appointment_id = schedule_test_appointment(&mut persistence, &world);
    let appointment = persistence.get_appointment(appointment_id).expect("get");

    let result: TransitionResult =
        plan_confirmation(&appointment, create_test_actor(world.staff_id), create_test_cause())
            .expect("plan confirmation");
    let persisted = persistence
        .apply_transition(&result, AppointmentStatus::Scheduled)
        .expect("apply transition");

    assert!(persisted.event_id > 0);
    assert!(persisted.replacement_appointment_id.is_none());
    assert_eq!(
        persistence
            .get_appointment_status(appointment_id)
            .expect("status"),
        AppointmentStatus::Confirmed
    );
}

#[test]
fn test_stale_transition_rejected_by_status_guard() {
    let mut persistence = setup();
    let world = seed_reference(&mut persistence);

    let appointment_id = schedule_test_appointment(&mut persistence, &world);
    let stale = persistence.get_appointment(appointment_id).expect("get");

    // Another actor cancels first.
    let cancel = plan_cancellation(
        &stale,
        "Family travelling",
        None,
        create_test_actor(world.staff_id),
        create_test_cause(),
    )
    .expect("plan cancellation");
    persistence
        .apply_transition(&cancel, AppointmentStatus::Scheduled)
        .expect("apply cancellation");

    // The stale confirmation was planned against the scheduled snapshot.
    let confirm = plan_confirmation(&stale, create_test_actor(world.staff_id), create_test_cause())
        .expect("plan confirmation");
    let result = persistence.apply_transition(&confirm, AppointmentStatus::Scheduled);

    match result {
        Err(PersistenceError::Domain(DomainError::InvalidStatusTransition { from, .. })) => {
            assert_eq!(from, "cancelled");
        }
        other => panic!("Expected status-guard rejection, got {other:?}"),
    }

    // The raced write left no mark.
    assert_eq!(
        persistence
            .get_appointment_status(appointment_id)
            .expect("status"),
        AppointmentStatus::Cancelled
    );
}

#[test]
fn test_start_visit_assigns_staff() {
    let mut persistence = setup();
    let world = seed_reference(&mut persistence);

    let appointment_id = schedule_test_appointment(&mut persistence, &world);
    let appointment = persistence.get_appointment(appointment_id).expect("get");

    let result = plan_start_visit(
        &appointment,
        world.staff_id,
        create_test_actor(world.staff_id),
        create_test_cause(),
        VISIT_DATE,
    )
    .expect("plan start visit");
    persistence
        .apply_transition(&result, AppointmentStatus::Scheduled)
        .expect("apply transition");

    let reloaded = persistence.get_appointment(appointment_id).expect("reload");
    assert_eq!(reloaded.status, AppointmentStatus::StartVisit);
    assert_eq!(reloaded.staff_id, Some(world.staff_id));
}

#[test]
fn test_check_in_binds_batch() {
    let mut persistence = setup();
    let world = seed_reference(&mut persistence);

    let batch_id = receive_test_batch(&mut persistence, &world, "BCG-2026-X", 5);
    let appointment_id = schedule_test_appointment(&mut persistence, &world);

    let appointment = persistence.get_appointment(appointment_id).expect("get");
    let vaccine = persistence.get_vaccine(world.vaccine_id).expect("vaccine");
    let batch = persistence.get_batch(batch_id).expect("batch");

    let result = plan_check_in(
        &appointment,
        &vaccine,
        &batch,
        world.staff_id,
        create_test_actor(world.staff_id),
        create_test_cause(),
        VISIT_DATE,
    )
    .expect("plan check-in");
    persistence
        .apply_transition(&result, AppointmentStatus::Scheduled)
        .expect("apply transition");

    let reloaded = persistence.get_appointment(appointment_id).expect("reload");
    assert_eq!(reloaded.status, AppointmentStatus::CheckIn);
    assert_eq!(reloaded.batch_id, Some(batch_id));

    // Check-in binds but never consumes.
    let batch_after = persistence.get_batch(batch_id).expect("batch after");
    assert_eq!(batch_after.stock.remaining_doses(), 50);
}

#[test]
fn test_cancellation_records_reason() {
    let mut persistence = setup();
    let world = seed_reference(&mut persistence);

    let appointment_id = schedule_test_appointment(&mut persistence, &world);
    let appointment = persistence.get_appointment(appointment_id).expect("get");

    let result = plan_cancellation(
        &appointment,
        "Family travelling",
        None,
        create_test_actor(world.staff_id),
        create_test_cause(),
    )
    .expect("plan cancellation");
    persistence
        .apply_transition(&result, AppointmentStatus::Scheduled)
        .expect("apply transition");

    let reloaded = persistence.get_appointment(appointment_id).expect("reload");
    assert_eq!(reloaded.status, AppointmentStatus::Cancelled);
    assert_eq!(reloaded.cancellation_reason.as_deref(), Some("Family travelling"));
}

#[test]
fn test_reschedule_inserts_replacement() {
    let mut persistence = setup();
    let world = seed_reference(&mut persistence);

    let appointment_id = schedule_test_appointment(&mut persistence, &world);
    let appointment = persistence.get_appointment(appointment_id).expect("get");

    let new_date = date!(2026 - 03 - 17);
    let result = plan_reschedule(
        &appointment,
        new_date,
        time!(11:00),
        "Clinic closed for fumigation",
        String::from("$2b$12$replacement-hash"),
        create_test_actor(world.staff_id),
        create_test_cause(),
    )
    .expect("plan reschedule");
    let persisted = persistence
        .apply_transition(&result, AppointmentStatus::Scheduled)
        .expect("apply transition");
    let replacement_id = persisted
        .replacement_appointment_id
        .expect("replacement id");

    assert_eq!(
        persistence
            .get_appointment_status(appointment_id)
            .expect("status"),
        AppointmentStatus::Rescheduled
    );

    let replacements = persistence
        .list_appointments_for_center_date(world.center_id, new_date)
        .expect("worklist");
    assert_eq!(replacements.len(), 1);
    let replacement = &replacements[0];
    assert_eq!(replacement.status, AppointmentStatus::Scheduled);
    assert_eq!(replacement.child_id, world.child_id);
    assert_eq!(replacement.verification_code_hash, "$2b$12$replacement-hash");
    assert_eq!(replacement.appointment_id, Some(replacement_id));
}

#[test]
fn test_worklist_ordered_by_time() {
    let mut persistence = setup();
    let world = seed_reference(&mut persistence);

    let first = schedule_test_appointment(&mut persistence, &world);

    let mut later = persistence.get_appointment(first).expect("get");
    later.appointment_id = None;
    later.scheduled_time = time!(08:00);
    let second = persistence
        .create_appointment(&later)
        .expect("create second");

    let worklist = persistence
        .list_appointments_for_center_date(world.center_id, VISIT_DATE)
        .expect("worklist");

    assert_eq!(worklist.len(), 2);
    assert_eq!(worklist[0].appointment_id, Some(second));
    assert_eq!(worklist[1].appointment_id, Some(first));
}

#[test]
fn test_appointment_timeline_accumulates_events() {
    let mut persistence = setup();
    let world = seed_reference(&mut persistence);

    let appointment_id = schedule_test_appointment(&mut persistence, &world);
    let appointment = persistence.get_appointment(appointment_id).expect("get");

    let confirm =
        plan_confirmation(&appointment, create_test_actor(world.staff_id), create_test_cause())
            .expect("plan confirmation");
    persistence
        .apply_transition(&confirm, AppointmentStatus::Scheduled)
        .expect("apply confirmation");

    let confirmed = persistence.get_appointment(appointment_id).expect("reload");
    let start = plan_start_visit(
        &confirmed,
        world.staff_id,
        create_test_actor(world.staff_id),
        create_test_cause(),
        VISIT_DATE,
    )
    .expect("plan start visit");
    persistence
        .apply_transition(&start, AppointmentStatus::Confirmed)
        .expect("apply start visit");

    let timeline = persistence
        .get_appointment_timeline(appointment_id)
        .expect("timeline");

    assert_eq!(timeline.len(), 2);
    assert_eq!(timeline[0].action.name, "ConfirmAppointment");
    assert_eq!(timeline[1].action.name, "StartVisit");
    assert_eq!(timeline[1].actor.staff_id, Some(world.staff_id));
    assert_eq!(timeline[1].appointment_id, Some(appointment_id));
}

#[test]
fn test_get_audit_event_not_found() {
    let mut persistence = setup();

    assert!(matches!(
        persistence.get_audit_event(404),
        Err(PersistenceError::EventNotFound(404))
    ));
}
