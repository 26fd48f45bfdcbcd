// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Appointment mutations and transition orchestration.
//!
//! The two orchestration functions (`apply_transition` and
//! `complete_appointment`) each run inside a single database transaction.
//! Both guard the status write with a compare-and-set on the expected
//! status, so a transition raced by a concurrent writer rolls back instead
//! of clobbering the other writer's outcome. Completion additionally guards
//! the stock decrement with a compare-and-set on the remaining dose count
//! and re-validates the planned dose number against the committed record
//! history.
//!
//! These functions are hand-written per backend rather than generated by
//! `backend_fn!` because their transaction bodies call other
//! backend-suffixed functions.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use time::Date;
use tracing::{debug, info};
use vax_audit::AuditEvent;
use vax_domain::{
    Appointment, AppointmentStatus, BatchNumber, BatchStatus, DomainError, StockLevel,
    VaccinationRecord, derive_batch_status, validate_dose_number_override,
};
use vaxtrack::TransitionResult;

use crate::backend::PersistenceBackend;
use crate::data_models::{encode_date, encode_time};
use crate::diesel_schema::{appointments, inventory_batches, vaccination_records};
use crate::error::PersistenceError;
use crate::mutations::audit::{persist_audit_event_mysql, persist_audit_event_sqlite};
use crate::queries::records::{
    count_records_for_child_vaccine_mysql, count_records_for_child_vaccine_sqlite,
};

backend_fn! {
/// Inserts a new appointment row.
///
/// # Returns
///
/// The appointment ID assigned by the database.
///
/// # Errors
///
/// Returns an error if the row cannot be inserted.
pub fn create_appointment(
    conn: &mut _,
    appointment: &Appointment,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(appointments::table)
        .values((
            appointments::child_id.eq(appointment.child_id),
            appointments::parent_id.eq(appointment.parent_id),
            appointments::vaccine_id.eq(appointment.vaccine_id),
            appointments::center_id.eq(appointment.center_id),
            appointments::staff_id.eq(appointment.staff_id),
            appointments::scheduled_date.eq(encode_date(appointment.scheduled_date)),
            appointments::scheduled_time.eq(encode_time(appointment.scheduled_time)?),
            appointments::status.eq(appointment.status.as_str()),
            appointments::batch_id.eq(appointment.batch_id),
            appointments::verification_code_hash.eq(&appointment.verification_code_hash),
            appointments::cancellation_reason.eq(appointment.cancellation_reason.as_deref()),
        ))
        .execute(conn)?;

    let appointment_id: i64 = conn.get_last_insert_rowid()?;

    info!(
        appointment_id,
        child_id = appointment.child_id,
        center_id = appointment.center_id,
        "Created appointment"
    );

    Ok(appointment_id)
}
}

backend_fn! {
/// Compare-and-set update of one appointment's mutable columns.
///
/// The update only lands if the stored status still equals `expected`; a
/// zero row count means a concurrent writer moved the appointment first.
///
/// # Errors
///
/// Returns a status-transition domain error when the appointment is no
/// longer in the expected state, or a database error if the update fails.
pub fn cas_update_appointment(
    conn: &mut _,
    appointment: &Appointment,
    expected: AppointmentStatus,
) -> Result<(), PersistenceError> {
    let appointment_id: i64 = appointment
        .appointment_id
        .ok_or_else(|| PersistenceError::Other("Appointment has no ID".to_string()))?;

    let updated: usize = diesel::update(appointments::table)
        .filter(appointments::appointment_id.eq(appointment_id))
        .filter(appointments::status.eq(expected.as_str()))
        .set((
            appointments::status.eq(appointment.status.as_str()),
            appointments::staff_id.eq(appointment.staff_id),
            appointments::batch_id.eq(appointment.batch_id),
            appointments::cancellation_reason.eq(appointment.cancellation_reason.as_deref()),
        ))
        .execute(conn)?;

    if updated == 0 {
        let current: String = appointments::table
            .select(appointments::status)
            .filter(appointments::appointment_id.eq(appointment_id))
            .first::<String>(conn)
            .map_err(|_| {
                PersistenceError::NotFound(format!("Appointment {appointment_id} does not exist"))
            })?;

        return Err(PersistenceError::Domain(
            DomainError::InvalidStatusTransition {
                from: current,
                to: appointment.status.as_str().to_string(),
                reason: "appointment changed concurrently".to_string(),
            },
        ));
    }

    Ok(())
}
}

backend_fn! {
/// Decrements a batch's remaining doses and rederives its counters and
/// status from the new consumption total.
///
/// The decrement only lands if the batch still holds `required_doses`; a
/// zero row count means a concurrent completion drained the batch first.
///
/// # Errors
///
/// Returns a depleted-inventory domain error when the batch can no longer
/// supply the required doses, or a database error if the update fails.
pub fn consume_batch_doses(
    conn: &mut _,
    batch_id: i64,
    required_doses: u32,
    today: Date,
) -> Result<(), PersistenceError> {
    let required: i32 = i32::try_from(required_doses).map_err(|_| {
        PersistenceError::Other(format!("required_doses out of range: {required_doses}"))
    })?;

    let updated: usize = diesel::update(inventory_batches::table)
        .filter(inventory_batches::batch_id.eq(batch_id))
        .filter(inventory_batches::remaining_doses.ge(required))
        .set(
            inventory_batches::remaining_doses
                .eq(inventory_batches::remaining_doses - required),
        )
        .execute(conn)?;

    type BatchStockRow = (String, i32, i32, i32, String);

    let (batch_number, doses_per_vial, quantity, remaining, expiry_date): BatchStockRow =
        inventory_batches::table
            .select((
                inventory_batches::batch_number,
                inventory_batches::doses_per_vial,
                inventory_batches::quantity,
                inventory_batches::remaining_doses,
                inventory_batches::expiry_date,
            ))
            .filter(inventory_batches::batch_id.eq(batch_id))
            .first::<BatchStockRow>(conn)
            .map_err(|_| {
                PersistenceError::NotFound(format!("Batch {batch_id} does not exist"))
            })?;

    let remaining: u32 = u32::try_from(remaining).map_err(|_| {
        PersistenceError::ReconstructionError(format!("remaining_doses out of range: {remaining}"))
    })?;

    if updated == 0 {
        return Err(PersistenceError::Domain(
            DomainError::InventoryDepletedSinceCheckIn {
                batch_number: BatchNumber::new(&batch_number),
                remaining_doses: remaining,
                required_doses,
            },
        ));
    }

    let doses_per_vial: u32 = u32::try_from(doses_per_vial).map_err(|_| {
        PersistenceError::ReconstructionError(format!(
            "doses_per_vial out of range: {doses_per_vial}"
        ))
    })?;
    let quantity: u32 = u32::try_from(quantity).map_err(|_| {
        PersistenceError::ReconstructionError(format!("quantity out of range: {quantity}"))
    })?;
    let expiry: Date = crate::data_models::decode_date(&expiry_date)?;

    let capacity: u32 = StockLevel::capacity(quantity, doses_per_vial)
        .map_err(PersistenceError::from)?;
    let consumed: u32 = capacity.checked_sub(remaining).ok_or_else(|| {
        PersistenceError::ReconstructionError(format!(
            "remaining_doses {remaining} exceeds capacity {capacity}"
        ))
    })?;
    let stock: StockLevel = StockLevel::derive(quantity, doses_per_vial, consumed)
        .map_err(PersistenceError::from)?;
    let status: BatchStatus = derive_batch_status(&stock, doses_per_vial, expiry, today);

    diesel::update(inventory_batches::table)
        .filter(inventory_batches::batch_id.eq(batch_id))
        .set((
            inventory_batches::remaining_full_vials
                .eq(i32::try_from(stock.remaining_full_vials()).unwrap_or(i32::MAX)),
            inventory_batches::open_vial_doses
                .eq(i32::try_from(stock.open_vial_doses()).unwrap_or(i32::MAX)),
            inventory_batches::status.eq(status.as_str()),
        ))
        .execute(conn)?;

    debug!(
        batch_id,
        remaining_doses = stock.remaining_doses(),
        status = status.as_str(),
        "Consumed batch doses"
    );

    Ok(())
}
}

backend_fn! {
/// Inserts the immutable vaccination record a completion produces.
///
/// # Errors
///
/// Returns an error if the row cannot be inserted.
pub fn insert_vaccination_record(
    conn: &mut _,
    record: &VaccinationRecord,
) -> Result<i64, PersistenceError> {
    let dose_number: i32 = i32::try_from(record.dose_number).map_err(|_| {
        PersistenceError::Other(format!("dose_number out of range: {}", record.dose_number))
    })?;

    diesel::insert_into(vaccination_records::table)
        .values((
            vaccination_records::appointment_id.eq(record.appointment_id),
            vaccination_records::child_id.eq(record.child_id),
            vaccination_records::vaccine_id.eq(record.vaccine_id),
            vaccination_records::staff_id.eq(record.staff_id),
            vaccination_records::administered_at.eq(&record.administered_at),
            vaccination_records::dose_number.eq(dose_number),
            vaccination_records::batch_number.eq(record.batch_number.value()),
            vaccination_records::reactions.eq(record.reactions.as_deref()),
            vaccination_records::notes.eq(record.notes.as_deref()),
        ))
        .execute(conn)?;

    let record_id: i64 = conn.get_last_insert_rowid()?;

    Ok(record_id)
}
}

/// Result of persisting a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistTransitionResult {
    /// The event ID assigned to the persisted audit event.
    pub event_id: i64,
    /// The replacement appointment's ID, for reschedule transitions.
    pub replacement_appointment_id: Option<i64>,
}

/// Applies a non-consuming transition result atomically (`SQLite` version).
///
/// Covers confirmation, start-visit, check-in, cancellation, and
/// reschedule. The appointment update is status-guarded; a replacement
/// appointment (reschedule) is inserted in the same transaction; the audit
/// event is persisted last.
///
/// # Errors
///
/// Returns an error if the appointment is no longer in the expected state
/// or if any write fails; the transaction rolls back.
pub fn apply_transition_sqlite(
    conn: &mut SqliteConnection,
    result: &TransitionResult,
    expected: AppointmentStatus,
) -> Result<PersistTransitionResult, PersistenceError> {
    conn.transaction::<PersistTransitionResult, PersistenceError, _>(|conn| {
        cas_update_appointment_sqlite(conn, &result.appointment, expected)?;

        let mut replacement_appointment_id: Option<i64> = None;
        if let Some(replacement) = &result.replacement {
            let replacement_id: i64 = create_appointment_sqlite(conn, replacement)?;
            debug!(replacement_id, "Inserted replacement appointment");
            replacement_appointment_id = Some(replacement_id);
        }

        let event_id: i64 = persist_audit_event_sqlite(conn, &result.audit_event)?;

        info!(
            event_id,
            action = %result.audit_event.action.name,
            "Applied appointment transition"
        );

        Ok(PersistTransitionResult {
            event_id,
            replacement_appointment_id,
        })
    })
}

/// Applies a non-consuming transition result atomically (`MySQL` version).
///
/// Covers confirmation, start-visit, check-in, cancellation, and
/// reschedule. The appointment update is status-guarded; a replacement
/// appointment (reschedule) is inserted in the same transaction; the audit
/// event is persisted last.
///
/// # Errors
///
/// Returns an error if the appointment is no longer in the expected state
/// or if any write fails; the transaction rolls back.
pub fn apply_transition_mysql(
    conn: &mut MysqlConnection,
    result: &TransitionResult,
    expected: AppointmentStatus,
) -> Result<PersistTransitionResult, PersistenceError> {
    conn.transaction::<PersistTransitionResult, PersistenceError, _>(|conn| {
        cas_update_appointment_mysql(conn, &result.appointment, expected)?;

        let mut replacement_appointment_id: Option<i64> = None;
        if let Some(replacement) = &result.replacement {
            let replacement_id: i64 = create_appointment_mysql(conn, replacement)?;
            debug!(replacement_id, "Inserted replacement appointment");
            replacement_appointment_id = Some(replacement_id);
        }

        let event_id: i64 = persist_audit_event_mysql(conn, &result.audit_event)?;

        info!(
            event_id,
            action = %result.audit_event.action.name,
            "Applied appointment transition"
        );

        Ok(PersistTransitionResult {
            event_id,
            replacement_appointment_id,
        })
    })
}

/// Completes an appointment atomically (`SQLite` version).
///
/// One transaction covers the status-guarded appointment update, the
/// stock-guarded dose decrement with counter rederivation, a dose-number
/// re-check against the committed record history, the vaccination record
/// insert, and the audit event. Any guard failure rolls the whole
/// transaction back, so a raced completion never double-consumes or
/// double-numbers a dose.
///
/// # Returns
///
/// The event ID assigned to the persisted audit event.
///
/// # Errors
///
/// Returns an error if the appointment moved, the batch was drained, the
/// planned dose number went stale, or any write fails.
pub fn complete_appointment_sqlite(
    conn: &mut SqliteConnection,
    result: &TransitionResult,
    expected: AppointmentStatus,
    required_doses: u32,
    today: Date,
) -> Result<i64, PersistenceError> {
    let batch_id: i64 = completion_batch_id(result)?;
    let record: &VaccinationRecord = completion_record(result)?;

    conn.transaction::<i64, PersistenceError, _>(|conn| {
        cas_update_appointment_sqlite(conn, &result.appointment, expected)?;
        consume_batch_doses_sqlite(conn, batch_id, required_doses, today)?;

        // The dose number was planned from a count taken outside this
        // transaction; re-validate it against the committed history so a
        // concurrent completion for the same child and vaccine cannot
        // record the same ordinal twice.
        let committed: u32 =
            count_records_for_child_vaccine_sqlite(conn, record.child_id, record.vaccine_id)?;
        validate_dose_number_override(Some(record.dose_number), committed + 1)
            .map_err(PersistenceError::from)?;

        let record_id: i64 = insert_vaccination_record_sqlite(conn, record)?;
        let event_id: i64 = persist_audit_event_sqlite(conn, &result.audit_event)?;

        info!(
            event_id,
            record_id,
            batch_id,
            required_doses,
            "Completed appointment"
        );

        Ok(event_id)
    })
}

/// Completes an appointment atomically (`MySQL` version).
///
/// One transaction covers the status-guarded appointment update, the
/// stock-guarded dose decrement with counter rederivation, a dose-number
/// re-check against the committed record history, the vaccination record
/// insert, and the audit event. Any guard failure rolls the whole
/// transaction back, so a raced completion never double-consumes or
/// double-numbers a dose.
///
/// # Returns
///
/// The event ID assigned to the persisted audit event.
///
/// # Errors
///
/// Returns an error if the appointment moved, the batch was drained, the
/// planned dose number went stale, or any write fails.
pub fn complete_appointment_mysql(
    conn: &mut MysqlConnection,
    result: &TransitionResult,
    expected: AppointmentStatus,
    required_doses: u32,
    today: Date,
) -> Result<i64, PersistenceError> {
    let batch_id: i64 = completion_batch_id(result)?;
    let record: &VaccinationRecord = completion_record(result)?;

    conn.transaction::<i64, PersistenceError, _>(|conn| {
        cas_update_appointment_mysql(conn, &result.appointment, expected)?;
        consume_batch_doses_mysql(conn, batch_id, required_doses, today)?;

        // The dose number was planned from a count taken outside this
        // transaction; re-validate it against the committed history so a
        // concurrent completion for the same child and vaccine cannot
        // record the same ordinal twice.
        let committed: u32 =
            count_records_for_child_vaccine_mysql(conn, record.child_id, record.vaccine_id)?;
        validate_dose_number_override(Some(record.dose_number), committed + 1)
            .map_err(PersistenceError::from)?;

        let record_id: i64 = insert_vaccination_record_mysql(conn, record)?;
        let event_id: i64 = persist_audit_event_mysql(conn, &result.audit_event)?;

        info!(
            event_id,
            record_id,
            batch_id,
            required_doses,
            "Completed appointment"
        );

        Ok(event_id)
    })
}

/// Inserts a freshly scheduled appointment and its audit event atomically
/// (`SQLite` version).
///
/// The persisted event is scoped to the appointment ID the insert assigns.
///
/// # Returns
///
/// The appointment ID and event ID assigned by the database.
///
/// # Errors
///
/// Returns an error if either write fails; the transaction rolls back.
pub fn schedule_appointment_sqlite(
    conn: &mut SqliteConnection,
    appointment: &Appointment,
    event: &AuditEvent,
) -> Result<(i64, i64), PersistenceError> {
    conn.transaction::<(i64, i64), PersistenceError, _>(|conn| {
        let appointment_id: i64 = create_appointment_sqlite(conn, appointment)?;

        let mut scoped: AuditEvent = event.clone();
        scoped.appointment_id = Some(appointment_id);
        let event_id: i64 = persist_audit_event_sqlite(conn, &scoped)?;

        Ok((appointment_id, event_id))
    })
}

/// Inserts a freshly scheduled appointment and its audit event atomically
/// (`MySQL` version).
///
/// The persisted event is scoped to the appointment ID the insert assigns.
///
/// # Returns
///
/// The appointment ID and event ID assigned by the database.
///
/// # Errors
///
/// Returns an error if either write fails; the transaction rolls back.
pub fn schedule_appointment_mysql(
    conn: &mut MysqlConnection,
    appointment: &Appointment,
    event: &AuditEvent,
) -> Result<(i64, i64), PersistenceError> {
    conn.transaction::<(i64, i64), PersistenceError, _>(|conn| {
        let appointment_id: i64 = create_appointment_mysql(conn, appointment)?;

        let mut scoped: AuditEvent = event.clone();
        scoped.appointment_id = Some(appointment_id);
        let event_id: i64 = persist_audit_event_mysql(conn, &scoped)?;

        Ok((appointment_id, event_id))
    })
}

fn completion_batch_id(result: &TransitionResult) -> Result<i64, PersistenceError> {
    result
        .appointment
        .batch_id
        .ok_or_else(|| PersistenceError::Other("Completion result has no bound batch".to_string()))
}

fn completion_record(result: &TransitionResult) -> Result<&VaccinationRecord, PersistenceError> {
    result.record.as_ref().ok_or_else(|| {
        PersistenceError::Other("Completion result has no vaccination record".to_string())
    })
}
