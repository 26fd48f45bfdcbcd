// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use time::format_description::well_known::Rfc3339;
use time::{Date, OffsetDateTime};
use tracing::info;
use vax_audit::{Action, Actor, AuditEvent, Cause, StateSnapshot};
use vax_domain::{
    Appointment, BatchCorrection, BatchNumber, DomainError, InventoryBatch, Vaccine,
    validate_batch_fields,
};
use vax_persistence::{Persistence, PersistenceError};
use vaxtrack::{
    Command, StatusAction, plan_cancellation, plan_check_in, plan_completion, plan_confirmation,
    plan_reschedule, plan_start_visit, select_batch,
};

use crate::auth::{AuthenticatedActor, AuthorizationService};
use crate::codes::{generate_verification_code, hash_verification_code, verify_verification_code};
use crate::error::{ApiError, translate_domain_error};
use crate::request_response::{
    AppointmentInfo, AppointmentTransitionResponse, AuditEventInfo, BatchInfo,
    CancelAppointmentRequest, CheckInRequest, ChildHistoryResponse, CompleteAppointmentRequest,
    CompleteAppointmentResponse, ConfirmAppointmentRequest, CorrectBatchRequest,
    CorrectBatchResponse, CreateCenterRequest, CreateCenterResponse, CreateChildRequest,
    CreateChildResponse, CreateParentRequest, CreateParentResponse, CreateStaffRequest,
    CreateStaffResponse, CreateVaccineRequest, CreateVaccineResponse, ListBatchesResponse,
    ReceiveBatchRequest, ReceiveBatchResponse, RescheduleAppointmentRequest,
    RescheduleAppointmentResponse, ScheduleAppointmentRequest, ScheduleAppointmentResponse,
    SetVaccineActiveRequest, StartVisitRequest, TimelineResponse, UpdateAppointmentStatusRequest,
    UpdateAppointmentStatusResponse, VaccinationRecordInfo, WorklistRequest, WorklistResponse,
    parse_wire_date, parse_wire_time,
};

fn lookup<T>(
    result: Result<T, PersistenceError>,
    resource_type: &str,
    id: i64,
) -> Result<T, ApiError> {
    result.map_err(|err| match err {
        PersistenceError::NotFound(_) => ApiError::ResourceNotFound {
            resource_type: resource_type.to_string(),
            message: format!("{resource_type} {id} does not exist"),
        },
        other => other.into(),
    })
}

fn snapshot<T: serde::Serialize>(value: &T) -> Result<StateSnapshot, ApiError> {
    serde_json::to_string(value)
        .map(StateSnapshot::new)
        .map_err(|err| ApiError::Internal {
            message: format!("failed to serialize audit snapshot: {err}"),
        })
}

/// Builds the audit actor for the caller, enriched with the staff row
/// when the caller carries a staff identity.
fn audit_actor(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
) -> Result<Actor, ApiError> {
    match actor.staff_id {
        Some(staff_id) => {
            let staff = lookup(persistence.get_staff(staff_id), "Staff", staff_id)?;
            Ok(Actor::with_staff(
                actor.id.clone(),
                actor.role.as_str().to_string(),
                staff_id,
                staff.name().to_string(),
            ))
        }
        None => Ok(actor.audit_actor()),
    }
}

/// Resolves the staff identity a visit-floor action runs under.
fn staff_context(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
) -> Result<(i64, Actor), ApiError> {
    let staff_id = actor.staff_id.ok_or_else(|| ApiError::AuthenticationFailed {
        reason: String::from("this action requires a staff identity"),
    })?;
    let staff = match persistence.get_staff(staff_id) {
        Ok(staff) => staff,
        Err(PersistenceError::NotFound(_)) => {
            return Err(ApiError::AuthenticationFailed {
                reason: format!("staff {staff_id} is not registered"),
            });
        }
        Err(other) => return Err(other.into()),
    };
    Ok((
        staff_id,
        Actor::with_staff(
            actor.id.clone(),
            actor.role.as_str().to_string(),
            staff_id,
            staff.name().to_string(),
        ),
    ))
}

fn active_vaccine(persistence: &mut Persistence, vaccine_id: i64) -> Result<Vaccine, ApiError> {
    let vaccine = lookup(persistence.get_vaccine(vaccine_id), "Vaccine", vaccine_id)?;
    if vaccine.is_active() {
        Ok(vaccine)
    } else {
        Err(translate_domain_error(DomainError::VaccineInactive {
            vaccine: vaccine.name().to_string(),
        }))
    }
}

/// Resolves the batch a check-in or completion should consume from.
///
/// The supplied number is only a candidate; the open-vial-first policy may
/// redirect the operator to a more depleted batch.
fn resolve_batch_by_number(
    persistence: &mut Persistence,
    appointment: &Appointment,
    vaccine: &Vaccine,
    batch_number: &BatchNumber,
) -> Result<InventoryBatch, ApiError> {
    let center = lookup(
        persistence.get_center(appointment.center_id),
        "Center",
        appointment.center_id,
    )?;
    let candidate =
        persistence.find_batch_by_number(appointment.vaccine_id, appointment.center_id, batch_number)?;
    let siblings =
        persistence.list_batches_for_vaccine_center(appointment.vaccine_id, appointment.center_id)?;
    select_batch(
        candidate,
        &siblings,
        vaccine,
        &center,
        appointment.scheduled_date,
    )
    .map_err(Into::into)
}

// ===========================================================================
// Appointment lifecycle
// ===========================================================================

/// Books a new appointment and issues its one-time verification code.
///
/// The plaintext code appears only in this response; the appointment
/// stores a bcrypt hash.
///
/// # Errors
///
/// Returns an error if the caller is not allowed, a referenced entity is
/// missing, the vaccine is retired, or a field fails validation.
pub fn schedule_appointment(
    persistence: &mut Persistence,
    request: &ScheduleAppointmentRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<ScheduleAppointmentResponse, ApiError> {
    AuthorizationService::authorize_appointment_lifecycle(actor)?;

    let child = lookup(persistence.get_child(request.child_id), "Child", request.child_id)?;
    let vaccine = active_vaccine(persistence, request.vaccine_id)?;
    lookup(persistence.get_center(request.center_id), "Center", request.center_id)?;

    let scheduled_date = parse_wire_date(&request.scheduled_date).map_err(translate_domain_error)?;
    let scheduled_time = parse_wire_time(&request.scheduled_time).map_err(translate_domain_error)?;

    let code = generate_verification_code();
    let code_hash = hash_verification_code(&code)?;
    let appointment = Appointment::new(
        request.child_id,
        child.parent_id(),
        request.vaccine_id,
        request.center_id,
        scheduled_date,
        scheduled_time,
        code_hash,
    );

    let event = AuditEvent::scoped(
        audit_actor(persistence, actor)?,
        cause,
        Action::new(
            String::from("ScheduleAppointment"),
            Some(format!(
                "Booked {} for {} {}",
                vaccine.name(),
                request.scheduled_date,
                request.scheduled_time
            )),
        ),
        StateSnapshot::new(String::from("null")),
        snapshot(&appointment)?,
        request.center_id,
        None,
    );

    let (appointment_id, event_id) = persistence.schedule_appointment(&appointment, &event)?;
    info!(appointment_id, event_id, "appointment scheduled");

    Ok(ScheduleAppointmentResponse {
        appointment_id,
        status: appointment.status.as_str().to_string(),
        verification_code: code,
        event_id,
    })
}

/// Confirms attendance ahead of the visit.
///
/// # Errors
///
/// Returns an error if the appointment is missing or cannot be confirmed
/// from its current state.
pub fn confirm_appointment(
    persistence: &mut Persistence,
    request: &ConfirmAppointmentRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<AppointmentTransitionResponse, ApiError> {
    AuthorizationService::authorize_appointment_lifecycle(actor)?;

    let appointment = lookup(
        persistence.get_appointment(request.appointment_id),
        "Appointment",
        request.appointment_id,
    )?;
    let acting = audit_actor(persistence, actor)?;
    let result = plan_confirmation(&appointment, acting, cause)?;
    let persisted = persistence.apply_transition(&result, appointment.status)?;

    Ok(AppointmentTransitionResponse {
        appointment_id: request.appointment_id,
        status: result.appointment.status.as_str().to_string(),
        event_id: persisted.event_id,
    })
}

/// Opens the visit, assigning it to the acting staff member.
///
/// # Errors
///
/// Returns an error if the caller has no staff identity, the appointment
/// is missing, the transition is not permitted, or the action happens on
/// the wrong day.
pub fn start_visit(
    persistence: &mut Persistence,
    request: &StartVisitRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
    today: Date,
) -> Result<AppointmentTransitionResponse, ApiError> {
    AuthorizationService::authorize_appointment_lifecycle(actor)?;

    let (staff_id, acting) = staff_context(persistence, actor)?;
    let appointment = lookup(
        persistence.get_appointment(request.appointment_id),
        "Appointment",
        request.appointment_id,
    )?;
    let result = plan_start_visit(&appointment, staff_id, acting, cause, today)?;
    let persisted = persistence.apply_transition(&result, appointment.status)?;

    Ok(AppointmentTransitionResponse {
        appointment_id: request.appointment_id,
        status: result.appointment.status.as_str().to_string(),
        event_id: persisted.event_id,
    })
}

/// Checks the child in, binding a batch chosen by the open-vial-first
/// policy. Stock is not consumed until completion.
///
/// # Errors
///
/// Returns an error if a batch is already bound, the supplied batch is
/// unusable, a more depleted batch must be used first, or the transition
/// is not permitted.
pub fn check_in(
    persistence: &mut Persistence,
    request: &CheckInRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
    today: Date,
) -> Result<AppointmentTransitionResponse, ApiError> {
    AuthorizationService::authorize_appointment_lifecycle(actor)?;

    let (staff_id, acting) = staff_context(persistence, actor)?;
    let appointment = lookup(
        persistence.get_appointment(request.appointment_id),
        "Appointment",
        request.appointment_id,
    )?;

    if let Some(bound_id) = appointment.batch_id {
        let bound = lookup(persistence.get_batch(bound_id), "Batch", bound_id)?;
        return Err(translate_domain_error(DomainError::BatchAlreadyBound {
            batch_number: bound.batch_number,
        }));
    }

    let vaccine = lookup(
        persistence.get_vaccine(appointment.vaccine_id),
        "Vaccine",
        appointment.vaccine_id,
    )?;
    let batch_number = BatchNumber::new(&request.batch_number);
    let chosen = resolve_batch_by_number(persistence, &appointment, &vaccine, &batch_number)?;

    let result = plan_check_in(&appointment, &vaccine, &chosen, staff_id, acting, cause, today)?;
    let persisted = persistence.apply_transition(&result, appointment.status)?;

    Ok(AppointmentTransitionResponse {
        appointment_id: request.appointment_id,
        status: result.appointment.status.as_str().to_string(),
        event_id: persisted.event_id,
    })
}

/// Administers the dose: verifies the parent's code, consumes stock from
/// the bound batch, and writes the vaccination record.
///
/// When no batch was bound at check-in the request must name one, and the
/// open-vial-first policy runs here instead.
///
/// # Errors
///
/// Returns an error if the code does not match, no batch can be resolved,
/// the batch was depleted since check-in, or the transition is not
/// permitted.
pub fn complete_appointment(
    persistence: &mut Persistence,
    request: &CompleteAppointmentRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
    today: Date,
    now: OffsetDateTime,
) -> Result<CompleteAppointmentResponse, ApiError> {
    AuthorizationService::authorize_appointment_lifecycle(actor)?;

    let (staff_id, acting) = staff_context(persistence, actor)?;
    let appointment = lookup(
        persistence.get_appointment(request.appointment_id),
        "Appointment",
        request.appointment_id,
    )?;
    verify_verification_code(&request.verification_code, &appointment.verification_code_hash)?;

    let vaccine = lookup(
        persistence.get_vaccine(appointment.vaccine_id),
        "Vaccine",
        appointment.vaccine_id,
    )?;

    let supplied = request.batch_number.as_deref().map(BatchNumber::new);
    let batch = match (appointment.batch_id, supplied) {
        (Some(bound_id), None) => lookup(persistence.get_batch(bound_id), "Batch", bound_id)?,
        (Some(bound_id), Some(number)) => {
            let bound = lookup(persistence.get_batch(bound_id), "Batch", bound_id)?;
            if number == bound.batch_number {
                bound
            } else {
                return Err(translate_domain_error(DomainError::BatchMismatch {
                    supplied: number,
                    bound: bound.batch_number,
                }));
            }
        }
        (None, Some(number)) => {
            resolve_batch_by_number(persistence, &appointment, &vaccine, &number)?
        }
        (None, None) => return Err(translate_domain_error(DomainError::NoBatchBound)),
    };

    let prior_dose_count =
        persistence.count_records_for_child_vaccine(appointment.child_id, appointment.vaccine_id)?;
    let administered_at = now.format(&Rfc3339).map_err(|err| ApiError::Internal {
        message: format!("failed to format administration timestamp: {err}"),
    })?;

    let result = plan_completion(
        &appointment,
        &vaccine,
        &batch,
        staff_id,
        prior_dose_count,
        request.dose_number,
        request.reactions.clone(),
        request.notes.clone(),
        administered_at,
        acting,
        cause,
        today,
    )?;
    let event_id = persistence.complete_appointment(
        &result,
        appointment.status,
        vaccine.doses_per_administration(),
        today,
    )?;
    info!(
        appointment_id = request.appointment_id,
        event_id, "appointment completed"
    );

    let record = result.record.as_ref().ok_or_else(|| ApiError::Internal {
        message: String::from("completion produced no vaccination record"),
    })?;

    Ok(CompleteAppointmentResponse {
        appointment_id: request.appointment_id,
        status: result.appointment.status.as_str().to_string(),
        event_id,
        record: VaccinationRecordInfo::from(record),
    })
}

/// Calls the visit off with a recorded reason.
///
/// # Errors
///
/// Returns an error if the reason is empty or the appointment is already
/// terminal.
pub fn cancel_appointment(
    persistence: &mut Persistence,
    request: &CancelAppointmentRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<AppointmentTransitionResponse, ApiError> {
    AuthorizationService::authorize_appointment_lifecycle(actor)?;

    let appointment = lookup(
        persistence.get_appointment(request.appointment_id),
        "Appointment",
        request.appointment_id,
    )?;
    let acting = audit_actor(persistence, actor)?;
    let result = plan_cancellation(&appointment, &request.reason, request.notes.clone(), acting, cause)?;
    let persisted = persistence.apply_transition(&result, appointment.status)?;

    Ok(AppointmentTransitionResponse {
        appointment_id: request.appointment_id,
        status: result.appointment.status.as_str().to_string(),
        event_id: persisted.event_id,
    })
}

/// Moves the visit to a replacement appointment with a fresh verification
/// code. The superseded row stays behind for the audit trail.
///
/// # Errors
///
/// Returns an error if the reason is empty, the date or time is invalid,
/// or the appointment cannot be rescheduled from its current state.
pub fn reschedule_appointment(
    persistence: &mut Persistence,
    request: &RescheduleAppointmentRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<RescheduleAppointmentResponse, ApiError> {
    AuthorizationService::authorize_appointment_lifecycle(actor)?;

    let appointment = lookup(
        persistence.get_appointment(request.appointment_id),
        "Appointment",
        request.appointment_id,
    )?;
    let new_date = parse_wire_date(&request.new_date).map_err(translate_domain_error)?;
    let new_time = parse_wire_time(&request.new_time).map_err(translate_domain_error)?;

    let code = generate_verification_code();
    let code_hash = hash_verification_code(&code)?;
    let acting = audit_actor(persistence, actor)?;
    let result = plan_reschedule(
        &appointment,
        new_date,
        new_time,
        &request.reason,
        code_hash,
        acting,
        cause,
    )?;
    let persisted = persistence.apply_transition(&result, appointment.status)?;
    let replacement_appointment_id =
        persisted
            .replacement_appointment_id
            .ok_or_else(|| ApiError::Internal {
                message: String::from("reschedule produced no replacement appointment"),
            })?;
    info!(
        appointment_id = request.appointment_id,
        replacement_appointment_id, "appointment rescheduled"
    );

    Ok(RescheduleAppointmentResponse {
        appointment_id: request.appointment_id,
        status: result.appointment.status.as_str().to_string(),
        replacement_appointment_id,
        verification_code: code,
        event_id: persisted.event_id,
    })
}

/// Single-endpoint facade over the staff visit-floor actions.
///
/// Parses the action string, builds the matching command, and dispatches
/// to the dedicated handler.
///
/// # Errors
///
/// Returns `InvalidInput` for unknown actions or missing action-specific
/// fields, otherwise whatever the dispatched handler returns.
pub fn update_appointment_status(
    persistence: &mut Persistence,
    request: &UpdateAppointmentStatusRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
    today: Date,
    now: OffsetDateTime,
) -> Result<UpdateAppointmentStatusResponse, ApiError> {
    let action = StatusAction::parse(&request.action).ok_or_else(|| ApiError::InvalidInput {
        field: String::from("action"),
        message: format!(
            "unknown action '{}': expected start_visit, check_in, or check_out",
            request.action
        ),
    })?;
    let staff_id = actor.staff_id.ok_or_else(|| ApiError::AuthenticationFailed {
        reason: String::from("this action requires a staff identity"),
    })?;

    let command = match action {
        StatusAction::StartVisit => Command::StartVisit {
            appointment_id: request.appointment_id,
            staff_id,
        },
        StatusAction::CheckIn => {
            let batch_number = request.batch_number.as_deref().ok_or_else(|| {
                ApiError::InvalidInput {
                    field: String::from("batch_number"),
                    message: String::from("check_in requires a batch number"),
                }
            })?;
            Command::CheckIn {
                appointment_id: request.appointment_id,
                staff_id,
                batch_number: BatchNumber::new(batch_number),
            }
        }
        StatusAction::CheckOut => {
            let verification_code = request.verification_code.clone().ok_or_else(|| {
                ApiError::InvalidInput {
                    field: String::from("verification_code"),
                    message: String::from("check_out requires the verification code"),
                }
            })?;
            Command::Complete {
                appointment_id: request.appointment_id,
                staff_id,
                verification_code,
                reactions: request.reactions.clone(),
                notes: request.notes.clone(),
                dose_number: request.dose_number,
                batch_number: request.batch_number.as_deref().map(BatchNumber::new),
            }
        }
    };

    match command {
        Command::StartVisit { appointment_id, .. } => {
            let response = start_visit(
                persistence,
                &StartVisitRequest { appointment_id },
                actor,
                cause,
                today,
            )?;
            Ok(UpdateAppointmentStatusResponse::Transition(response))
        }
        Command::CheckIn {
            appointment_id,
            batch_number,
            ..
        } => {
            let response = check_in(
                persistence,
                &CheckInRequest {
                    appointment_id,
                    batch_number: batch_number.value().to_string(),
                },
                actor,
                cause,
                today,
            )?;
            Ok(UpdateAppointmentStatusResponse::Transition(response))
        }
        Command::Complete {
            appointment_id,
            verification_code,
            reactions,
            notes,
            dose_number,
            batch_number,
            ..
        } => {
            let response = complete_appointment(
                persistence,
                &CompleteAppointmentRequest {
                    appointment_id,
                    verification_code,
                    reactions,
                    notes,
                    dose_number,
                    batch_number: batch_number.map(|n| n.value().to_string()),
                },
                actor,
                cause,
                today,
                now,
            )?;
            Ok(UpdateAppointmentStatusResponse::Completion(response))
        }
    }
}

// ===========================================================================
// Inventory
// ===========================================================================

/// Records a received batch and its audit event atomically.
///
/// # Errors
///
/// Returns an error if the caller is not an admin, a field fails
/// validation, or the batch number already exists for the vaccine and
/// center.
pub fn receive_batch(
    persistence: &mut Persistence,
    request: &ReceiveBatchRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
    today: Date,
) -> Result<ReceiveBatchResponse, ApiError> {
    AuthorizationService::authorize_receive_batch(actor)?;

    let vaccine = lookup(persistence.get_vaccine(request.vaccine_id), "Vaccine", request.vaccine_id)?;
    lookup(persistence.get_center(request.center_id), "Center", request.center_id)?;

    let batch_number = BatchNumber::new(&request.batch_number);
    validate_batch_fields(&batch_number, request.quantity, request.doses_per_vial)
        .map_err(translate_domain_error)?;
    let expiry_date = parse_wire_date(&request.expiry_date).map_err(translate_domain_error)?;
    let manufacturing_date =
        parse_wire_date(&request.manufacturing_date).map_err(translate_domain_error)?;

    let batch = InventoryBatch::receive(
        request.vaccine_id,
        request.center_id,
        batch_number,
        request.doses_per_vial,
        request.quantity,
        expiry_date,
        manufacturing_date,
        today,
    )
    .map_err(translate_domain_error)?;

    let event = AuditEvent::scoped(
        audit_actor(persistence, actor)?,
        cause,
        Action::new(
            String::from("ReceiveBatch"),
            Some(format!(
                "Received {} vial(s) of {} as batch {}",
                request.quantity,
                vaccine.name(),
                batch.batch_number
            )),
        ),
        StateSnapshot::new(String::from("null")),
        snapshot(&batch)?,
        request.center_id,
        None,
    );

    let (batch_id, event_id) = persistence.record_batch_receipt(&batch, &event)?;
    info!(batch_id, event_id, "inventory batch received");

    let stored = persistence.get_batch(batch_id)?;
    Ok(ReceiveBatchResponse {
        batch: BatchInfo::from(&stored),
        event_id,
    })
}

/// Applies an administrative correction to a recorded batch.
///
/// Counters and status are recomputed from the corrected capacity and the
/// doses already consumed; a correction can never shrink a batch below
/// what has been administered from it.
///
/// # Errors
///
/// Returns an error if the caller is not an admin, no field is being
/// corrected, or the corrected capacity is below consumption.
pub fn correct_batch(
    persistence: &mut Persistence,
    request: &CorrectBatchRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
    today: Date,
) -> Result<CorrectBatchResponse, ApiError> {
    AuthorizationService::authorize_correct_batch(actor)?;

    let batch = lookup(persistence.get_batch(request.batch_id), "Batch", request.batch_id)?;
    let expiry_date = request
        .expiry_date
        .as_deref()
        .map(parse_wire_date)
        .transpose()
        .map_err(translate_domain_error)?;
    let manufacturing_date = request
        .manufacturing_date
        .as_deref()
        .map(parse_wire_date)
        .transpose()
        .map_err(translate_domain_error)?;

    let correction = BatchCorrection {
        quantity: request.quantity,
        doses_per_vial: request.doses_per_vial,
        expiry_date,
        manufacturing_date,
    };
    if correction.is_empty() {
        return Err(ApiError::InvalidInput {
            field: String::from("correction"),
            message: String::from("at least one field must be corrected"),
        });
    }

    let corrected = correction.apply(&batch, today).map_err(translate_domain_error)?;

    let event = AuditEvent::scoped(
        audit_actor(persistence, actor)?,
        cause,
        Action::new(
            String::from("CorrectBatch"),
            Some(format!("Corrected batch {}", batch.batch_number)),
        ),
        snapshot(&batch)?,
        snapshot(&corrected)?,
        batch.center_id,
        None,
    );

    let event_id = persistence.record_batch_correction(request.batch_id, &corrected, &event)?;
    info!(batch_id = request.batch_id, event_id, "inventory batch corrected");

    Ok(CorrectBatchResponse {
        batch: BatchInfo::from(&corrected),
        event_id,
    })
}

/// Lists every batch a center holds.
///
/// # Errors
///
/// Returns an error if the center is missing or the query fails.
pub fn list_center_batches(
    persistence: &mut Persistence,
    center_id: i64,
) -> Result<ListBatchesResponse, ApiError> {
    lookup(persistence.get_center(center_id), "Center", center_id)?;
    let batches = persistence.list_batches_for_center(center_id)?;
    Ok(ListBatchesResponse {
        batches: batches.iter().map(BatchInfo::from).collect(),
    })
}

/// Looks up a single batch with its derived counters.
///
/// # Errors
///
/// Returns an error if the batch is missing.
pub fn get_batch(persistence: &mut Persistence, batch_id: i64) -> Result<BatchInfo, ApiError> {
    let batch = lookup(persistence.get_batch(batch_id), "Batch", batch_id)?;
    Ok(BatchInfo::from(&batch))
}

/// Lists a center's batches for one vaccine.
///
/// # Errors
///
/// Returns an error if the center or vaccine is missing or the query
/// fails.
pub fn list_vaccine_batches(
    persistence: &mut Persistence,
    vaccine_id: i64,
    center_id: i64,
) -> Result<ListBatchesResponse, ApiError> {
    lookup(persistence.get_vaccine(vaccine_id), "Vaccine", vaccine_id)?;
    lookup(persistence.get_center(center_id), "Center", center_id)?;
    let batches = persistence.list_batches_for_vaccine_center(vaccine_id, center_id)?;
    Ok(ListBatchesResponse {
        batches: batches.iter().map(BatchInfo::from).collect(),
    })
}

// ===========================================================================
// Reference data
// ===========================================================================

/// Registers a parent or guardian.
///
/// # Errors
///
/// Returns an error if the caller is not an admin or the name is empty.
pub fn create_parent(
    persistence: &mut Persistence,
    request: &CreateParentRequest,
    actor: &AuthenticatedActor,
) -> Result<CreateParentResponse, ApiError> {
    AuthorizationService::authorize_manage_reference_data(actor)?;
    require_name(&request.name)?;
    let parent_id = persistence.create_parent(request.name.trim())?;
    Ok(CreateParentResponse { parent_id })
}

/// Registers a vaccination center.
///
/// # Errors
///
/// Returns an error if the caller is not an admin or the name is empty.
pub fn create_center(
    persistence: &mut Persistence,
    request: &CreateCenterRequest,
    actor: &AuthenticatedActor,
) -> Result<CreateCenterResponse, ApiError> {
    AuthorizationService::authorize_manage_reference_data(actor)?;
    require_name(&request.name)?;
    let center_id = persistence.create_center(request.name.trim())?;
    Ok(CreateCenterResponse { center_id })
}

/// Registers a vaccine, active by default.
///
/// # Errors
///
/// Returns an error if the caller is not an admin or a field fails
/// validation.
pub fn create_vaccine(
    persistence: &mut Persistence,
    request: &CreateVaccineRequest,
    actor: &AuthenticatedActor,
) -> Result<CreateVaccineResponse, ApiError> {
    AuthorizationService::authorize_manage_reference_data(actor)?;
    let vaccine = Vaccine::new(
        request.name.trim().to_string(),
        request.doses_per_administration,
        true,
    );
    vax_domain::validate_vaccine_fields(&vaccine).map_err(translate_domain_error)?;
    let vaccine_id = persistence.create_vaccine(
        vaccine.name(),
        vaccine.doses_per_administration(),
        vaccine.is_active(),
    )?;
    Ok(CreateVaccineResponse { vaccine_id })
}

/// Activates or retires a vaccine.
///
/// Retiring a vaccine stops new check-ins and completions; existing
/// records are untouched.
///
/// # Errors
///
/// Returns an error if the caller is not an admin or the vaccine is
/// missing.
pub fn set_vaccine_active(
    persistence: &mut Persistence,
    request: &SetVaccineActiveRequest,
    actor: &AuthenticatedActor,
) -> Result<(), ApiError> {
    AuthorizationService::authorize_manage_reference_data(actor)?;
    lookup(persistence.get_vaccine(request.vaccine_id), "Vaccine", request.vaccine_id)?;
    persistence.set_vaccine_active(request.vaccine_id, request.is_active)?;
    Ok(())
}

/// Registers a child under an existing parent.
///
/// # Errors
///
/// Returns an error if the caller is not an admin, the parent is missing,
/// or a field fails validation.
pub fn create_child(
    persistence: &mut Persistence,
    request: &CreateChildRequest,
    actor: &AuthenticatedActor,
) -> Result<CreateChildResponse, ApiError> {
    AuthorizationService::authorize_manage_reference_data(actor)?;
    require_name(&request.name)?;
    if !persistence.parent_exists(request.parent_id)? {
        return Err(ApiError::ResourceNotFound {
            resource_type: String::from("Parent"),
            message: format!("Parent {} does not exist", request.parent_id),
        });
    }
    let date_of_birth = parse_wire_date(&request.date_of_birth).map_err(translate_domain_error)?;
    let child_id = persistence.create_child(request.name.trim(), request.parent_id, date_of_birth)?;
    Ok(CreateChildResponse { child_id })
}

/// Registers a staff member at an existing center.
///
/// # Errors
///
/// Returns an error if the caller is not an admin, the center is missing,
/// or the name is empty.
pub fn create_staff(
    persistence: &mut Persistence,
    request: &CreateStaffRequest,
    actor: &AuthenticatedActor,
) -> Result<CreateStaffResponse, ApiError> {
    AuthorizationService::authorize_manage_reference_data(actor)?;
    require_name(&request.name)?;
    lookup(persistence.get_center(request.center_id), "Center", request.center_id)?;
    let staff_id = persistence.create_staff(request.name.trim(), request.center_id)?;
    Ok(CreateStaffResponse { staff_id })
}

fn require_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::InvalidInput {
            field: String::from("name"),
            message: String::from("name cannot be empty"),
        });
    }
    Ok(())
}

// ===========================================================================
// Reads
// ===========================================================================

/// Fetches one appointment.
///
/// The verification code hash never leaves the persistence layer through
/// this view.
///
/// # Errors
///
/// Returns an error if the appointment is missing.
pub fn get_appointment(
    persistence: &mut Persistence,
    appointment_id: i64,
) -> Result<AppointmentInfo, ApiError> {
    let appointment = lookup(
        persistence.get_appointment(appointment_id),
        "Appointment",
        appointment_id,
    )?;
    Ok(AppointmentInfo::from(&appointment))
}

/// Lists a center's appointments for one date, all statuses.
///
/// # Errors
///
/// Returns an error if the center is missing or the date is invalid.
pub fn center_worklist(
    persistence: &mut Persistence,
    request: &WorklistRequest,
) -> Result<WorklistResponse, ApiError> {
    lookup(persistence.get_center(request.center_id), "Center", request.center_id)?;
    let date = parse_wire_date(&request.date).map_err(translate_domain_error)?;
    let appointments = persistence.list_appointments_for_center_date(request.center_id, date)?;
    Ok(WorklistResponse {
        appointments: appointments.iter().map(AppointmentInfo::from).collect(),
    })
}

/// Lists a child's vaccination records.
///
/// # Errors
///
/// Returns an error if the child is missing or the query fails.
pub fn child_history(
    persistence: &mut Persistence,
    child_id: i64,
) -> Result<ChildHistoryResponse, ApiError> {
    lookup(persistence.get_child(child_id), "Child", child_id)?;
    let records = persistence.list_records_for_child(child_id)?;
    Ok(ChildHistoryResponse {
        records: records.iter().map(VaccinationRecordInfo::from).collect(),
    })
}

/// Reconstructs the audit timeline for one appointment.
///
/// # Errors
///
/// Returns an error if the appointment is missing or the query fails.
pub fn appointment_timeline(
    persistence: &mut Persistence,
    appointment_id: i64,
) -> Result<TimelineResponse, ApiError> {
    lookup(
        persistence.get_appointment_status(appointment_id),
        "Appointment",
        appointment_id,
    )?;
    let events = persistence.get_appointment_timeline(appointment_id)?;
    Ok(TimelineResponse {
        events: events.iter().map(AuditEventInfo::from).collect(),
    })
}

/// Reconstructs the audit timeline for one center.
///
/// # Errors
///
/// Returns an error if the center is missing or the query fails.
pub fn center_timeline(
    persistence: &mut Persistence,
    center_id: i64,
) -> Result<TimelineResponse, ApiError> {
    lookup(persistence.get_center(center_id), "Center", center_id)?;
    let events = persistence.get_center_events(center_id)?;
    Ok(TimelineResponse {
        events: events.iter().map(AuditEventInfo::from).collect(),
    })
}
