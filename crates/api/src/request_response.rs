// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde::{Deserialize, Serialize};
use time::{Date, Time};
use vax_audit::AuditEvent;
use vax_domain::{Appointment, DomainError, InventoryBatch, VaccinationRecord};

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

const DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");
const TIME_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[hour]:[minute]");

/// Parses a `YYYY-MM-DD` wire date.
///
/// # Errors
///
/// Returns `DateParseError` if the string is not a valid calendar date.
pub fn parse_wire_date(value: &str) -> Result<Date, DomainError> {
    Date::parse(value, DATE_FORMAT).map_err(|err| DomainError::DateParseError {
        date_string: value.to_string(),
        error: err.to_string(),
    })
}

/// Parses an `HH:MM` wire time.
///
/// # Errors
///
/// Returns `DateParseError` if the string is not a valid time of day.
pub fn parse_wire_time(value: &str) -> Result<Time, DomainError> {
    Time::parse(value, TIME_FORMAT).map_err(|err| DomainError::DateParseError {
        date_string: value.to_string(),
        error: err.to_string(),
    })
}

/// Formats a date for the wire as `YYYY-MM-DD`.
#[must_use]
pub fn format_wire_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Formats a time for the wire as `HH:MM`.
#[must_use]
pub fn format_wire_time(time: Time) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

// ---------------------------------------------------------------------------
// Appointment lifecycle
// ---------------------------------------------------------------------------

/// Request to book a new appointment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScheduleAppointmentRequest {
    /// The child receiving the dose.
    pub child_id: i64,
    /// The vaccine to administer.
    pub vaccine_id: i64,
    /// The center where the visit takes place.
    pub center_id: i64,
    /// The visit date (`YYYY-MM-DD`).
    pub scheduled_date: String,
    /// The visit time (`HH:MM`).
    pub scheduled_time: String,
}

/// Response to a successful booking.
///
/// Carries the plaintext verification code exactly once; it is never
/// retrievable again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleAppointmentResponse {
    /// The new appointment's identifier.
    pub appointment_id: i64,
    /// The appointment status after booking.
    pub status: String,
    /// The one-time verification code for the parent.
    pub verification_code: String,
    /// The audit event recorded for the booking.
    pub event_id: i64,
}

/// Request to confirm attendance ahead of the visit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConfirmAppointmentRequest {
    /// The appointment to confirm.
    pub appointment_id: i64,
}

/// Request for staff to open the visit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StartVisitRequest {
    /// The appointment to act on.
    pub appointment_id: i64,
}

/// Request to check the child in, binding an inventory batch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckInRequest {
    /// The appointment to act on.
    pub appointment_id: i64,
    /// The operator-chosen batch number.
    pub batch_number: String,
}

/// Request to administer the dose and complete the visit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompleteAppointmentRequest {
    /// The appointment to act on.
    pub appointment_id: i64,
    /// The one-time code presented by the parent.
    pub verification_code: String,
    /// Observed adverse reactions, if any.
    pub reactions: Option<String>,
    /// Free-form administration notes.
    pub notes: Option<String>,
    /// Explicit dose-number override.
    pub dose_number: Option<u32>,
    /// Batch to consume when none was bound at check-in.
    pub batch_number: Option<String>,
}

/// Request to call the visit off.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CancelAppointmentRequest {
    /// The appointment to cancel.
    pub appointment_id: i64,
    /// Why the visit is cancelled.
    pub reason: String,
    /// Additional context, if any.
    pub notes: Option<String>,
}

/// Request to move the visit to a replacement appointment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RescheduleAppointmentRequest {
    /// The appointment to supersede.
    pub appointment_id: i64,
    /// The replacement visit date (`YYYY-MM-DD`).
    pub new_date: String,
    /// The replacement visit time (`HH:MM`).
    pub new_time: String,
    /// Why the visit moved.
    pub reason: String,
}

/// Response to a reschedule.
///
/// The replacement appointment gets a fresh verification code, returned
/// once here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RescheduleAppointmentResponse {
    /// The superseded appointment.
    pub appointment_id: i64,
    /// The superseded appointment's status (`rescheduled`).
    pub status: String,
    /// The replacement appointment's identifier.
    pub replacement_appointment_id: i64,
    /// The one-time verification code for the replacement.
    pub verification_code: String,
    /// The audit event recorded for the move.
    pub event_id: i64,
}

/// Single-endpoint status facade request.
///
/// `action` is one of `start_visit`, `check_in`, or `check_out`; fields
/// that only apply to some actions are optional and validated by the
/// dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateAppointmentStatusRequest {
    /// The appointment to act on.
    pub appointment_id: i64,
    /// The staff action to perform.
    pub action: String,
    /// Batch number, required for `check_in` and optional for `check_out`.
    pub batch_number: Option<String>,
    /// Verification code, required for `check_out`.
    pub verification_code: Option<String>,
    /// Observed adverse reactions, `check_out` only.
    pub reactions: Option<String>,
    /// Free-form notes, `check_out` only.
    pub notes: Option<String>,
    /// Explicit dose-number override, `check_out` only.
    pub dose_number: Option<u32>,
}

/// Response to a lifecycle transition that does not create new entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentTransitionResponse {
    /// The appointment acted on.
    pub appointment_id: i64,
    /// The status after the transition.
    pub status: String,
    /// The audit event recorded for the transition.
    pub event_id: i64,
}

/// Response to a completed visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteAppointmentResponse {
    /// The appointment acted on.
    pub appointment_id: i64,
    /// The status after the transition (`completed`).
    pub status: String,
    /// The audit event recorded for the administration.
    pub event_id: i64,
    /// The vaccination record written for the dose.
    pub record: VaccinationRecordInfo,
}

/// Response to the status facade.
///
/// `check_out` produces a completion with its vaccination record; the
/// other actions produce a plain transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UpdateAppointmentStatusResponse {
    /// The visit was completed and a dose recorded.
    Completion(CompleteAppointmentResponse),
    /// The appointment moved to a new non-terminal status.
    Transition(AppointmentTransitionResponse),
}

/// Public view of one appointment.
///
/// The verification code hash is deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentInfo {
    /// The appointment's identifier.
    pub appointment_id: Option<i64>,
    /// The child receiving the dose.
    pub child_id: i64,
    /// The booking parent or guardian.
    pub parent_id: i64,
    /// The vaccine to administer.
    pub vaccine_id: i64,
    /// The center where the visit takes place.
    pub center_id: i64,
    /// The staff member who owns the visit, once opened.
    pub staff_id: Option<i64>,
    /// The visit date (`YYYY-MM-DD`).
    pub scheduled_date: String,
    /// The visit time (`HH:MM`).
    pub scheduled_time: String,
    /// The current lifecycle status.
    pub status: String,
    /// The inventory batch bound at check-in, if any.
    pub batch_id: Option<i64>,
    /// The recorded cancellation reason, if cancelled.
    pub cancellation_reason: Option<String>,
}

impl From<&Appointment> for AppointmentInfo {
    fn from(appointment: &Appointment) -> Self {
        Self {
            appointment_id: appointment.appointment_id,
            child_id: appointment.child_id,
            parent_id: appointment.parent_id,
            vaccine_id: appointment.vaccine_id,
            center_id: appointment.center_id,
            staff_id: appointment.staff_id,
            scheduled_date: format_wire_date(appointment.scheduled_date),
            scheduled_time: format_wire_time(appointment.scheduled_time),
            status: appointment.status.as_str().to_string(),
            batch_id: appointment.batch_id,
            cancellation_reason: appointment.cancellation_reason.clone(),
        }
    }
}

/// Request for a center's appointments on one date.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorklistRequest {
    /// The center to list.
    pub center_id: i64,
    /// The visit date (`YYYY-MM-DD`).
    pub date: String,
}

/// A center's appointments for one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorklistResponse {
    /// Appointments scheduled for the date, all statuses.
    pub appointments: Vec<AppointmentInfo>,
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

/// Request to record a received batch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReceiveBatchRequest {
    /// The vaccine the batch holds.
    pub vaccine_id: i64,
    /// The center that received the batch.
    pub center_id: i64,
    /// The manufacturer batch number.
    pub batch_number: String,
    /// Doses each vial holds.
    pub doses_per_vial: u32,
    /// Vials received.
    pub quantity: u32,
    /// Expiry date (`YYYY-MM-DD`).
    pub expiry_date: String,
    /// Manufacturing date (`YYYY-MM-DD`).
    pub manufacturing_date: String,
}

/// Request to correct a recorded batch.
///
/// Fields left unset are unchanged; counters and status are recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CorrectBatchRequest {
    /// The batch to correct.
    pub batch_id: i64,
    /// Corrected vial quantity.
    pub quantity: Option<u32>,
    /// Corrected doses-per-vial.
    pub doses_per_vial: Option<u32>,
    /// Corrected expiry date (`YYYY-MM-DD`).
    pub expiry_date: Option<String>,
    /// Corrected manufacturing date (`YYYY-MM-DD`).
    pub manufacturing_date: Option<String>,
}

/// Public view of one inventory batch with derived counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchInfo {
    /// The batch's identifier.
    pub batch_id: Option<i64>,
    /// The vaccine the batch holds.
    pub vaccine_id: i64,
    /// The center holding the batch.
    pub center_id: i64,
    /// The manufacturer batch number.
    pub batch_number: String,
    /// Doses each vial holds.
    pub doses_per_vial: u32,
    /// Vials originally received.
    pub quantity: u32,
    /// Total doses still on hand.
    pub remaining_doses: u32,
    /// Unopened vials still on hand.
    pub remaining_full_vials: u32,
    /// Doses left in the currently open vial.
    pub open_vial_doses: u32,
    /// Expiry date (`YYYY-MM-DD`).
    pub expiry_date: String,
    /// Manufacturing date (`YYYY-MM-DD`).
    pub manufacturing_date: String,
    /// Derived stock status.
    pub status: String,
}

impl From<&InventoryBatch> for BatchInfo {
    fn from(batch: &InventoryBatch) -> Self {
        Self {
            batch_id: batch.batch_id,
            vaccine_id: batch.vaccine_id,
            center_id: batch.center_id,
            batch_number: batch.batch_number.value().to_string(),
            doses_per_vial: batch.doses_per_vial,
            quantity: batch.quantity,
            remaining_doses: batch.stock.remaining_doses(),
            remaining_full_vials: batch.stock.remaining_full_vials(),
            open_vial_doses: batch.stock.open_vial_doses(),
            expiry_date: format_wire_date(batch.expiry_date),
            manufacturing_date: format_wire_date(batch.manufacturing_date),
            status: batch.status.as_str().to_string(),
        }
    }
}

/// Response to a batch receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveBatchResponse {
    /// The recorded batch.
    pub batch: BatchInfo,
    /// The audit event recorded for the receipt.
    pub event_id: i64,
}

/// Response to a batch correction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectBatchResponse {
    /// The batch after the correction.
    pub batch: BatchInfo,
    /// The audit event recorded for the correction.
    pub event_id: i64,
}

/// A center's inventory, optionally narrowed to one vaccine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListBatchesResponse {
    /// Batches known to the center.
    pub batches: Vec<BatchInfo>,
}

// ---------------------------------------------------------------------------
// Reference data
// ---------------------------------------------------------------------------

/// Request to register a parent or guardian.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateParentRequest {
    /// The parent's name.
    pub name: String,
}

/// Response to a parent registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateParentResponse {
    /// The new parent's identifier.
    pub parent_id: i64,
}

/// Request to register a vaccination center.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateCenterRequest {
    /// The center's name.
    pub name: String,
}

/// Response to a center registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCenterResponse {
    /// The new center's identifier.
    pub center_id: i64,
}

/// Request to register a vaccine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateVaccineRequest {
    /// The vaccine name.
    pub name: String,
    /// Doses one administration draws from a vial.
    pub doses_per_administration: u32,
}

/// Response to a vaccine registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateVaccineResponse {
    /// The new vaccine's identifier.
    pub vaccine_id: i64,
}

/// Request to activate or retire a vaccine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SetVaccineActiveRequest {
    /// The vaccine to change.
    pub vaccine_id: i64,
    /// Whether the vaccine may be administered.
    pub is_active: bool,
}

/// Request to register a child.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateChildRequest {
    /// The child's name.
    pub name: String,
    /// The registered parent or guardian.
    pub parent_id: i64,
    /// Date of birth (`YYYY-MM-DD`).
    pub date_of_birth: String,
}

/// Response to a child registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateChildResponse {
    /// The new child's identifier.
    pub child_id: i64,
}

/// Request to register a staff member.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateStaffRequest {
    /// The staff member's name.
    pub name: String,
    /// The center the staff member works at.
    pub center_id: i64,
}

/// Response to a staff registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateStaffResponse {
    /// The new staff member's identifier.
    pub staff_id: i64,
}

// ---------------------------------------------------------------------------
// Records and audit
// ---------------------------------------------------------------------------

/// Public view of one vaccination record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaccinationRecordInfo {
    /// The record's identifier.
    pub record_id: Option<i64>,
    /// The child who received the dose.
    pub child_id: i64,
    /// The vaccine administered.
    pub vaccine_id: i64,
    /// The appointment the dose was given at.
    pub appointment_id: i64,
    /// The administering staff member.
    pub staff_id: i64,
    /// When the dose was administered (RFC 3339).
    pub administered_at: String,
    /// Position of this dose in the child's series for the vaccine.
    pub dose_number: u32,
    /// The batch the dose was drawn from.
    pub batch_number: String,
    /// Observed adverse reactions, if any.
    pub reactions: Option<String>,
    /// Free-form administration notes.
    pub notes: Option<String>,
}

impl From<&VaccinationRecord> for VaccinationRecordInfo {
    fn from(record: &VaccinationRecord) -> Self {
        Self {
            record_id: record.record_id,
            child_id: record.child_id,
            vaccine_id: record.vaccine_id,
            appointment_id: record.appointment_id,
            staff_id: record.staff_id,
            administered_at: record.administered_at.clone(),
            dose_number: record.dose_number,
            batch_number: record.batch_number.value().to_string(),
            reactions: record.reactions.clone(),
            notes: record.notes.clone(),
        }
    }
}

/// A child's full vaccination history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildHistoryResponse {
    /// Records ordered by administration time.
    pub records: Vec<VaccinationRecordInfo>,
}

/// Public view of one audit event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEventInfo {
    /// The acting identity.
    pub actor_id: String,
    /// The actor's type (`admin`, `staff`, `parent`, `system`).
    pub actor_type: String,
    /// The acting staff member, when staff.
    pub staff_id: Option<i64>,
    /// The acting staff member's name, when staff.
    pub staff_name: Option<String>,
    /// The request or event that triggered the change.
    pub cause_id: String,
    /// Why the change happened.
    pub cause_description: String,
    /// The action performed.
    pub action: String,
    /// Additional action details, if any.
    pub details: Option<String>,
    /// Serialized state before the transition.
    pub before: String,
    /// Serialized state after the transition.
    pub after: String,
    /// The center the event concerns, if center-scoped.
    pub center_id: Option<i64>,
    /// The appointment the event concerns, if appointment-scoped.
    pub appointment_id: Option<i64>,
}

impl From<&AuditEvent> for AuditEventInfo {
    fn from(event: &AuditEvent) -> Self {
        Self {
            actor_id: event.actor.id.clone(),
            actor_type: event.actor.actor_type.clone(),
            staff_id: event.actor.staff_id,
            staff_name: event.actor.staff_name.clone(),
            cause_id: event.cause.id.clone(),
            cause_description: event.cause.description.clone(),
            action: event.action.name.clone(),
            details: event.action.details.clone(),
            before: event.before.data.clone(),
            after: event.after.data.clone(),
            center_id: event.center_id,
            appointment_id: event.appointment_id,
        }
    }
}

/// The audit timeline for one appointment or one center.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineResponse {
    /// Events in insertion order.
    pub events: Vec<AuditEventInfo>,
}
