// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! End-to-end appointment lifecycle through the handlers.

use time::macros::date;

use crate::error::ApiError;
use crate::handlers::{
    cancel_appointment, check_in, complete_appointment, confirm_appointment, get_appointment,
    list_vaccine_batches, reschedule_appointment, start_visit, update_appointment_status,
};
use crate::request_response::{
    CancelAppointmentRequest, CheckInRequest, CompleteAppointmentRequest,
    ConfirmAppointmentRequest, RescheduleAppointmentRequest, StartVisitRequest,
    UpdateAppointmentStatusRequest, UpdateAppointmentStatusResponse,
};
use crate::tests::{
    VISIT_CLOCK, VISIT_DATE, cause, receive, schedule, seed_world, setup, staff,
};

#[test]
fn test_schedule_returns_one_time_code() {
    let mut persistence = setup();
    let world = seed_world(&mut persistence);

    let (appointment_id, code) = schedule(&mut persistence, &world);

    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_digit()));

    let info = get_appointment(&mut persistence, appointment_id).expect("get appointment");
    assert_eq!(info.status, "scheduled");
    assert_eq!(info.child_id, world.child_id);
    assert_eq!(info.scheduled_date, "2026-03-10");
    assert_eq!(info.scheduled_time, "09:30");
    assert!(info.batch_id.is_none());
}

#[test]
fn test_full_happy_path_consumes_stock() {
    let mut persistence = setup();
    let world = seed_world(&mut persistence);
    receive(&mut persistence, &world, world.vaccine_id, "BCG-7", 10, 2);

    let (appointment_id, code) = schedule(&mut persistence, &world);
    let acting = staff(world.staff_id);

    confirm_appointment(
        &mut persistence,
        &ConfirmAppointmentRequest { appointment_id },
        &acting,
        cause(),
    )
    .expect("confirm");
    start_visit(
        &mut persistence,
        &StartVisitRequest { appointment_id },
        &acting,
        cause(),
        VISIT_DATE,
    )
    .expect("start visit");
    let checked_in = check_in(
        &mut persistence,
        &CheckInRequest {
            appointment_id,
            batch_number: String::from("bcg-7"),
        },
        &acting,
        cause(),
        VISIT_DATE,
    )
    .expect("check in");
    assert_eq!(checked_in.status, "check_in");

    let completed = complete_appointment(
        &mut persistence,
        &CompleteAppointmentRequest {
            appointment_id,
            verification_code: code,
            reactions: None,
            notes: Some(String::from("No observations")),
            dose_number: None,
            batch_number: None,
        },
        &acting,
        cause(),
        VISIT_DATE,
        VISIT_CLOCK,
    )
    .expect("complete");

    assert_eq!(completed.status, "completed");
    assert_eq!(completed.record.dose_number, 1);
    assert_eq!(completed.record.batch_number, "BCG-7");
    assert_eq!(completed.record.staff_id, world.staff_id);

    let batches =
        list_vaccine_batches(&mut persistence, world.vaccine_id, world.center_id).expect("list");
    assert_eq!(batches.batches.len(), 1);
    assert_eq!(batches.batches[0].remaining_doses, 19);
    assert_eq!(batches.batches[0].remaining_full_vials, 1);
    assert_eq!(batches.batches[0].open_vial_doses, 9);
}

#[test]
fn test_wrong_verification_code_rejected() {
    let mut persistence = setup();
    let world = seed_world(&mut persistence);
    receive(&mut persistence, &world, world.vaccine_id, "BCG-7", 10, 2);

    let (appointment_id, code) = schedule(&mut persistence, &world);
    let acting = staff(world.staff_id);
    start_visit(
        &mut persistence,
        &StartVisitRequest { appointment_id },
        &acting,
        cause(),
        VISIT_DATE,
    )
    .expect("start visit");
    check_in(
        &mut persistence,
        &CheckInRequest {
            appointment_id,
            batch_number: String::from("BCG-7"),
        },
        &acting,
        cause(),
        VISIT_DATE,
    )
    .expect("check in");

    let wrong = if code == "000000" { "000001" } else { "000000" };
    let err = complete_appointment(
        &mut persistence,
        &CompleteAppointmentRequest {
            appointment_id,
            verification_code: wrong.to_string(),
            reactions: None,
            notes: None,
            dose_number: None,
            batch_number: None,
        },
        &acting,
        cause(),
        VISIT_DATE,
        VISIT_CLOCK,
    )
    .expect_err("wrong code must be rejected");

    match err {
        ApiError::DomainRuleViolation { rule, .. } => assert_eq!(rule, "verification_code"),
        other => panic!("expected rule violation, got {other:?}"),
    }
    // The visit keeps its state; the parent can retry with the right code.
    let info = get_appointment(&mut persistence, appointment_id).expect("get");
    assert_eq!(info.status, "check_in");
}

#[test]
fn test_visit_day_guard_on_staff_actions() {
    let mut persistence = setup();
    let world = seed_world(&mut persistence);

    let (appointment_id, _) = schedule(&mut persistence, &world);
    let err = start_visit(
        &mut persistence,
        &StartVisitRequest { appointment_id },
        &staff(world.staff_id),
        cause(),
        date!(2026 - 03 - 09),
    )
    .expect_err("early start must be rejected");

    match err {
        ApiError::DomainRuleViolation { rule, .. } => assert_eq!(rule, "visit_day"),
        other => panic!("expected rule violation, got {other:?}"),
    }
}

#[test]
fn test_confirmation_is_not_day_guarded() {
    let mut persistence = setup();
    let world = seed_world(&mut persistence);

    let (appointment_id, _) = schedule(&mut persistence, &world);
    // Confirmation happens ahead of the visit, from anywhere.
    let response = confirm_appointment(
        &mut persistence,
        &ConfirmAppointmentRequest { appointment_id },
        &staff(world.staff_id),
        cause(),
    )
    .expect("confirm");
    assert_eq!(response.status, "confirmed");
}

#[test]
fn test_cancellation_requires_reason() {
    let mut persistence = setup();
    let world = seed_world(&mut persistence);
    let (appointment_id, _) = schedule(&mut persistence, &world);

    let err = cancel_appointment(
        &mut persistence,
        &CancelAppointmentRequest {
            appointment_id,
            reason: String::from("   "),
            notes: None,
        },
        &staff(world.staff_id),
        cause(),
    )
    .expect_err("blank reason must be rejected");
    assert!(matches!(err, ApiError::InvalidInput { .. }));
}

#[test]
fn test_cancellation_records_reason() {
    let mut persistence = setup();
    let world = seed_world(&mut persistence);
    let (appointment_id, _) = schedule(&mut persistence, &world);

    let response = cancel_appointment(
        &mut persistence,
        &CancelAppointmentRequest {
            appointment_id,
            reason: String::from("Family travelling"),
            notes: None,
        },
        &staff(world.staff_id),
        cause(),
    )
    .expect("cancel");
    assert_eq!(response.status, "cancelled");

    let info = get_appointment(&mut persistence, appointment_id).expect("get");
    assert_eq!(
        info.cancellation_reason.as_deref(),
        Some("Family travelling")
    );
}

#[test]
fn test_completed_appointment_cannot_be_cancelled() {
    let mut persistence = setup();
    let world = seed_world(&mut persistence);
    receive(&mut persistence, &world, world.vaccine_id, "BCG-7", 10, 2);
    let (appointment_id, code) = schedule(&mut persistence, &world);
    let acting = staff(world.staff_id);

    start_visit(
        &mut persistence,
        &StartVisitRequest { appointment_id },
        &acting,
        cause(),
        VISIT_DATE,
    )
    .expect("start visit");
    check_in(
        &mut persistence,
        &CheckInRequest {
            appointment_id,
            batch_number: String::from("BCG-7"),
        },
        &acting,
        cause(),
        VISIT_DATE,
    )
    .expect("check in");
    complete_appointment(
        &mut persistence,
        &CompleteAppointmentRequest {
            appointment_id,
            verification_code: code,
            reactions: None,
            notes: None,
            dose_number: None,
            batch_number: None,
        },
        &acting,
        cause(),
        VISIT_DATE,
        VISIT_CLOCK,
    )
    .expect("complete");

    let err = cancel_appointment(
        &mut persistence,
        &CancelAppointmentRequest {
            appointment_id,
            reason: String::from("Too late"),
            notes: None,
        },
        &acting,
        cause(),
    )
    .expect_err("terminal state must reject cancellation");
    assert!(matches!(err, ApiError::StateConflict { .. }));
}

#[test]
fn test_reschedule_creates_replacement_with_fresh_code() {
    let mut persistence = setup();
    let world = seed_world(&mut persistence);
    let (appointment_id, _) = schedule(&mut persistence, &world);

    let response = reschedule_appointment(
        &mut persistence,
        &RescheduleAppointmentRequest {
            appointment_id,
            new_date: String::from("2026-03-17"),
            new_time: String::from("11:00"),
            reason: String::from("Child unwell"),
        },
        &staff(world.staff_id),
        cause(),
    )
    .expect("reschedule");

    assert_eq!(response.status, "rescheduled");
    assert_eq!(response.verification_code.len(), 6);
    assert_ne!(response.replacement_appointment_id, appointment_id);

    let old = get_appointment(&mut persistence, appointment_id).expect("old");
    assert_eq!(old.status, "rescheduled");

    let replacement =
        get_appointment(&mut persistence, response.replacement_appointment_id).expect("new");
    assert_eq!(replacement.status, "scheduled");
    assert_eq!(replacement.scheduled_date, "2026-03-17");
    assert_eq!(replacement.scheduled_time, "11:00");
    assert_eq!(replacement.child_id, world.child_id);
}

#[test]
fn test_status_facade_dispatches_start_visit() {
    let mut persistence = setup();
    let world = seed_world(&mut persistence);
    let (appointment_id, _) = schedule(&mut persistence, &world);

    let response = update_appointment_status(
        &mut persistence,
        &UpdateAppointmentStatusRequest {
            appointment_id,
            action: String::from("start_visit"),
            batch_number: None,
            verification_code: None,
            reactions: None,
            notes: None,
            dose_number: None,
        },
        &staff(world.staff_id),
        cause(),
        VISIT_DATE,
        VISIT_CLOCK,
    )
    .expect("facade start_visit");

    match response {
        UpdateAppointmentStatusResponse::Transition(transition) => {
            assert_eq!(transition.status, "start_visit");
        }
        UpdateAppointmentStatusResponse::Completion(_) => panic!("expected a transition"),
    }
}

#[test]
fn test_status_facade_check_out_completes() {
    let mut persistence = setup();
    let world = seed_world(&mut persistence);
    receive(&mut persistence, &world, world.vaccine_id, "BCG-7", 10, 2);
    let (appointment_id, code) = schedule(&mut persistence, &world);
    let acting = staff(world.staff_id);

    for action in ["start_visit", "check_in"] {
        update_appointment_status(
            &mut persistence,
            &UpdateAppointmentStatusRequest {
                appointment_id,
                action: action.to_string(),
                batch_number: Some(String::from("BCG-7")),
                verification_code: None,
                reactions: None,
                notes: None,
                dose_number: None,
            },
            &acting,
            cause(),
            VISIT_DATE,
            VISIT_CLOCK,
        )
        .expect(action);
    }

    let response = update_appointment_status(
        &mut persistence,
        &UpdateAppointmentStatusRequest {
            appointment_id,
            action: String::from("check_out"),
            batch_number: None,
            verification_code: Some(code),
            reactions: None,
            notes: None,
            dose_number: None,
        },
        &acting,
        cause(),
        VISIT_DATE,
        VISIT_CLOCK,
    )
    .expect("facade check_out");

    match response {
        UpdateAppointmentStatusResponse::Completion(completion) => {
            assert_eq!(completion.status, "completed");
            assert_eq!(completion.record.dose_number, 1);
        }
        UpdateAppointmentStatusResponse::Transition(_) => panic!("expected a completion"),
    }
}

#[test]
fn test_status_facade_rejects_unknown_action() {
    let mut persistence = setup();
    let world = seed_world(&mut persistence);
    let (appointment_id, _) = schedule(&mut persistence, &world);

    let err = update_appointment_status(
        &mut persistence,
        &UpdateAppointmentStatusRequest {
            appointment_id,
            action: String::from("checkout"),
            batch_number: None,
            verification_code: None,
            reactions: None,
            notes: None,
            dose_number: None,
        },
        &staff(world.staff_id),
        cause(),
        VISIT_DATE,
        VISIT_CLOCK,
    )
    .expect_err("unknown action must be rejected");
    assert!(matches!(err, ApiError::InvalidInput { ref field, .. } if field == "action"));
}

#[test]
fn test_status_facade_rejects_parent_actions() {
    let mut persistence = setup();
    let world = seed_world(&mut persistence);
    let (appointment_id, _) = schedule(&mut persistence, &world);

    // Parent-facing transitions have dedicated handlers; the visit-floor
    // facade only speaks start_visit, check_in, and check_out.
    for action in ["confirm", "cancel", "reschedule"] {
        let err = update_appointment_status(
            &mut persistence,
            &UpdateAppointmentStatusRequest {
                appointment_id,
                action: action.to_string(),
                batch_number: None,
                verification_code: None,
                reactions: None,
                notes: None,
                dose_number: None,
            },
            &staff(world.staff_id),
            cause(),
            VISIT_DATE,
            VISIT_CLOCK,
        )
        .expect_err("parent action must not dispatch through the facade");
        assert!(matches!(err, ApiError::InvalidInput { ref field, .. } if field == "action"));
    }
}

#[test]
fn test_status_facade_check_out_requires_code() {
    let mut persistence = setup();
    let world = seed_world(&mut persistence);
    let (appointment_id, _) = schedule(&mut persistence, &world);

    let err = update_appointment_status(
        &mut persistence,
        &UpdateAppointmentStatusRequest {
            appointment_id,
            action: String::from("check_out"),
            batch_number: None,
            verification_code: None,
            reactions: None,
            notes: None,
            dose_number: None,
        },
        &staff(world.staff_id),
        cause(),
        VISIT_DATE,
        VISIT_CLOCK,
    )
    .expect_err("check_out without a code must be rejected");
    assert!(matches!(err, ApiError::InvalidInput { ref field, .. } if field == "verification_code"));
}

#[test]
fn test_missing_appointment_is_not_found() {
    let mut persistence = setup();
    let world = seed_world(&mut persistence);

    let err = confirm_appointment(
        &mut persistence,
        &ConfirmAppointmentRequest {
            appointment_id: 999,
        },
        &staff(world.staff_id),
        cause(),
    )
    .expect_err("missing appointment");
    assert!(matches!(err, ApiError::ResourceNotFound { .. }));
}
