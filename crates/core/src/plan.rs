// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Pure transition planning for the appointment lifecycle.
//!
//! Each planner validates one requested transition against the lifecycle
//! rules and, on success, returns the updated entities plus the audit event
//! describing the change. Planners never touch storage; the persistence
//! layer executes the returned plan inside a transaction and re-checks the
//! stock decrement there.

use crate::error::CoreError;
use serde::Serialize;
use time::Date;
use vax_audit::{Action, Actor, AuditEvent, Cause, StateSnapshot};
use vax_domain::{
    Appointment, AppointmentStatus, InventoryBatch, StockLevel, VaccinationRecord, Vaccine,
    check_visit_day, derive_batch_status, validate_cancellation_reason,
    validate_dose_number_override,
};

/// The outcome of planning a transition.
///
/// The appointment carries its new status; the remaining fields are set only
/// when the transition produces them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    /// The appointment with the transition applied.
    pub appointment: Appointment,
    /// The inventory batch with consumption applied, if stock moved.
    pub batch: Option<InventoryBatch>,
    /// The vaccination record to insert, if a dose was administered.
    pub record: Option<VaccinationRecord>,
    /// The replacement appointment to insert, if the visit was rescheduled.
    pub replacement: Option<Appointment>,
    /// The audit event describing the transition.
    pub audit_event: AuditEvent,
}

fn snapshot<T: Serialize>(value: &T) -> Result<StateSnapshot, CoreError> {
    serde_json::to_string(value)
        .map(StateSnapshot::new)
        .map_err(|e| CoreError::SnapshotSerialization(e.to_string()))
}

/// Paired appointment and batch state captured around a completion.
#[derive(Serialize)]
struct CompletionSnapshot<'a> {
    appointment: &'a Appointment,
    batch: &'a InventoryBatch,
}

/// Plans a parent confirmation ahead of the visit.
///
/// Confirmation is a parent action and is not subject to the visit-day
/// guard.
///
/// # Errors
///
/// Returns an error if the appointment is not in a state that can be
/// confirmed or the audit snapshot cannot be serialized.
pub fn plan_confirmation(
    appointment: &Appointment,
    actor: Actor,
    cause: Cause,
) -> Result<TransitionResult, CoreError> {
    appointment
        .status
        .validate_transition(AppointmentStatus::Confirmed)?;

    let before: StateSnapshot = snapshot(appointment)?;
    let mut updated: Appointment = appointment.clone();
    updated.status = AppointmentStatus::Confirmed;
    let after: StateSnapshot = snapshot(&updated)?;

    let audit_event: AuditEvent = AuditEvent::scoped(
        actor,
        cause,
        Action::new(String::from("ConfirmAppointment"), None),
        before,
        after,
        appointment.center_id,
        appointment.appointment_id,
    );

    Ok(TransitionResult {
        appointment: updated,
        batch: None,
        record: None,
        replacement: None,
        audit_event,
    })
}

/// Plans a staff member opening the visit and taking ownership.
///
/// # Arguments
///
/// * `appointment` - The appointment to act on
/// * `staff_id` - The staff member taking ownership
/// * `actor` - The acting identity for the audit trail
/// * `cause` - Why the transition was requested
/// * `today` - The current local calendar date
///
/// # Errors
///
/// Returns an error if the transition is not permitted, the action is
/// happening on a day other than the scheduled visit day, or the audit
/// snapshot cannot be serialized.
pub fn plan_start_visit(
    appointment: &Appointment,
    staff_id: i64,
    actor: Actor,
    cause: Cause,
    today: Date,
) -> Result<TransitionResult, CoreError> {
    appointment
        .status
        .validate_transition(AppointmentStatus::StartVisit)?;
    check_visit_day(appointment.scheduled_date, today)?;

    let before: StateSnapshot = snapshot(appointment)?;
    let mut updated: Appointment = appointment.clone();
    updated.status = AppointmentStatus::StartVisit;
    updated.staff_id = Some(staff_id);
    let after: StateSnapshot = snapshot(&updated)?;

    let audit_event: AuditEvent = AuditEvent::scoped(
        actor,
        cause,
        Action::new(String::from("StartVisit"), None),
        before,
        after,
        appointment.center_id,
        appointment.appointment_id,
    );

    Ok(TransitionResult {
        appointment: updated,
        batch: None,
        record: None,
        replacement: None,
        audit_event,
    })
}

/// Plans a check-in, binding an approved inventory batch to the visit.
///
/// The batch must already have passed selection; check-in binds it without
/// consuming stock. The subsequent decrement happens only at completion.
///
/// # Arguments
///
/// * `appointment` - The appointment to act on
/// * `vaccine` - The vaccine the visit administers
/// * `batch` - The batch approved by selection
/// * `staff_id` - The acting staff member
/// * `actor` - The acting identity for the audit trail
/// * `cause` - Why the transition was requested
/// * `today` - The current local calendar date
///
/// # Errors
///
/// Returns an error if the transition is not permitted, the visit-day guard
/// fails, the vaccine is inactive, or the audit snapshot cannot be
/// serialized.
pub fn plan_check_in(
    appointment: &Appointment,
    vaccine: &Vaccine,
    batch: &InventoryBatch,
    staff_id: i64,
    actor: Actor,
    cause: Cause,
    today: Date,
) -> Result<TransitionResult, CoreError> {
    appointment
        .status
        .validate_transition(AppointmentStatus::CheckIn)?;
    check_visit_day(appointment.scheduled_date, today)?;

    if !vaccine.is_active() {
        return Err(vax_domain::DomainError::VaccineInactive {
            vaccine: vaccine.name().to_string(),
        }
        .into());
    }

    let before: StateSnapshot = snapshot(appointment)?;
    let mut updated: Appointment = appointment.clone();
    updated.status = AppointmentStatus::CheckIn;
    updated.staff_id = Some(staff_id);
    updated.batch_id = batch.batch_id;
    let after: StateSnapshot = snapshot(&updated)?;

    let audit_event: AuditEvent = AuditEvent::scoped(
        actor,
        cause,
        Action::new(
            String::from("CheckIn"),
            Some(format!("Bound batch {}", batch.batch_number)),
        ),
        before,
        after,
        appointment.center_id,
        appointment.appointment_id,
    );

    Ok(TransitionResult {
        appointment: updated,
        batch: None,
        record: None,
        replacement: None,
        audit_event,
    })
}

/// Plans a completion: the dose is administered, stock is consumed, and an
/// immutable vaccination record is produced.
///
/// The verification code must be checked before planning; this function
/// assumes the presented code already matched. The returned batch carries
/// the post-consumption counters, but the persistence layer re-checks the
/// decrement against live stock inside the transaction.
///
/// # Arguments
///
/// * `appointment` - The appointment to complete
/// * `vaccine` - The vaccine administered
/// * `batch` - The batch to consume (bound at check-in or approved now)
/// * `staff_id` - The administering staff member
/// * `prior_dose_count` - Existing records for this child and vaccine
/// * `dose_number` - Explicit dose-number override, if any
/// * `reactions` - Observed adverse reactions
/// * `notes` - Free-form administration notes
/// * `administered_at` - Administration timestamp, ISO 8601
/// * `actor` - The acting identity for the audit trail
/// * `cause` - Why the transition was requested
/// * `today` - The current local calendar date
///
/// # Errors
///
/// Returns an error if the transition is not permitted, the visit-day guard
/// fails, the vaccine is inactive, the batch is short of doses, the dose
/// number conflicts with recorded history, or the audit snapshot cannot be
/// serialized.
#[allow(clippy::too_many_arguments)]
pub fn plan_completion(
    appointment: &Appointment,
    vaccine: &Vaccine,
    batch: &InventoryBatch,
    staff_id: i64,
    prior_dose_count: u32,
    dose_number: Option<u32>,
    reactions: Option<String>,
    notes: Option<String>,
    administered_at: String,
    actor: Actor,
    cause: Cause,
    today: Date,
) -> Result<TransitionResult, CoreError> {
    appointment
        .status
        .validate_transition(AppointmentStatus::Completed)?;
    check_visit_day(appointment.scheduled_date, today)?;

    if !vaccine.is_active() {
        return Err(vax_domain::DomainError::VaccineInactive {
            vaccine: vaccine.name().to_string(),
        }
        .into());
    }

    let required: u32 = vaccine.doses_per_administration();
    if batch.stock.remaining_doses() < required {
        return Err(vax_domain::DomainError::InventoryDepletedSinceCheckIn {
            batch_number: batch.batch_number.clone(),
            remaining_doses: batch.stock.remaining_doses(),
            required_doses: required,
        }
        .into());
    }

    let dose_number: u32 = validate_dose_number_override(dose_number, 1 + prior_dose_count)?;

    // Counters are rederived from total consumption, never adjusted in place.
    let consumed: u32 = batch.doses_consumed() + required;
    let stock: StockLevel = StockLevel::derive(batch.quantity, batch.doses_per_vial, consumed)?;
    let mut consumed_batch: InventoryBatch = batch.clone();
    consumed_batch.stock = stock;
    consumed_batch.status =
        derive_batch_status(&stock, batch.doses_per_vial, batch.expiry_date, today);

    let before: StateSnapshot = snapshot(&CompletionSnapshot {
        appointment,
        batch,
    })?;

    let mut updated: Appointment = appointment.clone();
    updated.status = AppointmentStatus::Completed;
    updated.staff_id = Some(staff_id);
    updated.batch_id = batch.batch_id;

    let after: StateSnapshot = snapshot(&CompletionSnapshot {
        appointment: &updated,
        batch: &consumed_batch,
    })?;

    let record: VaccinationRecord = VaccinationRecord {
        record_id: None,
        child_id: appointment.child_id,
        vaccine_id: appointment.vaccine_id,
        appointment_id: appointment.appointment_id.unwrap_or_default(),
        staff_id,
        administered_at,
        dose_number,
        batch_number: batch.batch_number.clone(),
        reactions,
        notes,
    };

    let audit_event: AuditEvent = AuditEvent::scoped(
        actor,
        cause,
        Action::new(
            String::from("CompleteAppointment"),
            Some(format!(
                "Consumed {required} dose(s) from batch {}",
                batch.batch_number
            )),
        ),
        before,
        after,
        appointment.center_id,
        appointment.appointment_id,
    );

    Ok(TransitionResult {
        appointment: updated,
        batch: Some(consumed_batch),
        record: Some(record),
        replacement: None,
        audit_event,
    })
}

/// Plans a cancellation with a recorded reason.
///
/// Cancellation is reachable from every non-terminal state and is exempt
/// from the visit-day guard; a parent can call off a future visit at any
/// time.
///
/// # Errors
///
/// Returns an error if the reason is empty, the appointment is already
/// terminal, or the audit snapshot cannot be serialized.
pub fn plan_cancellation(
    appointment: &Appointment,
    reason: &str,
    notes: Option<String>,
    actor: Actor,
    cause: Cause,
) -> Result<TransitionResult, CoreError> {
    validate_cancellation_reason(reason)?;
    appointment
        .status
        .validate_transition(AppointmentStatus::Cancelled)?;

    let before: StateSnapshot = snapshot(appointment)?;
    let mut updated: Appointment = appointment.clone();
    updated.status = AppointmentStatus::Cancelled;
    updated.cancellation_reason = Some(reason.trim().to_string());
    let after: StateSnapshot = snapshot(&updated)?;

    let audit_event: AuditEvent = AuditEvent::scoped(
        actor,
        cause,
        Action::new(String::from("CancelAppointment"), notes),
        before,
        after,
        appointment.center_id,
        appointment.appointment_id,
    );

    Ok(TransitionResult {
        appointment: updated,
        batch: None,
        record: None,
        replacement: None,
        audit_event,
    })
}

/// Plans a reschedule: the current appointment is superseded and a fresh
/// replacement is created for the new date and time.
///
/// The replacement starts over in `Scheduled` with its own verification
/// code; the superseded row remains for the audit trail and can only be
/// cancelled.
///
/// # Arguments
///
/// * `appointment` - The appointment to supersede
/// * `new_date` - The replacement visit date
/// * `new_time` - The replacement visit time
/// * `reason` - Why the visit moved
/// * `replacement_code_hash` - Hash of the fresh code issued for the
///   replacement
/// * `actor` - The acting identity for the audit trail
/// * `cause` - Why the transition was requested
///
/// # Errors
///
/// Returns an error if the reason is empty, the appointment cannot be
/// rescheduled from its current state, or the audit snapshot cannot be
/// serialized.
pub fn plan_reschedule(
    appointment: &Appointment,
    new_date: Date,
    new_time: time::Time,
    reason: &str,
    replacement_code_hash: String,
    actor: Actor,
    cause: Cause,
) -> Result<TransitionResult, CoreError> {
    validate_cancellation_reason(reason)?;
    appointment
        .status
        .validate_transition(AppointmentStatus::Rescheduled)?;

    let before: StateSnapshot = snapshot(appointment)?;
    let mut updated: Appointment = appointment.clone();
    updated.status = AppointmentStatus::Rescheduled;
    let after: StateSnapshot = snapshot(&updated)?;

    let replacement: Appointment = Appointment::new(
        appointment.child_id,
        appointment.parent_id,
        appointment.vaccine_id,
        appointment.center_id,
        new_date,
        new_time,
        replacement_code_hash,
    );

    let audit_event: AuditEvent = AuditEvent::scoped(
        actor,
        cause,
        Action::new(
            String::from("RescheduleAppointment"),
            Some(format!("Moved to {new_date} {new_time}: {}", reason.trim())),
        ),
        before,
        after,
        appointment.center_id,
        appointment.appointment_id,
    );

    Ok(TransitionResult {
        appointment: updated,
        batch: None,
        record: None,
        replacement: Some(replacement),
        audit_event,
    })
}
