// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod auth;
mod codes;
mod csv_preview;
mod error;
mod handlers;
mod request_response;

#[cfg(test)]
mod tests;

pub use auth::{AuthError, AuthenticatedActor, AuthorizationService, Role};
pub use codes::{generate_verification_code, hash_verification_code, verify_verification_code};
pub use csv_preview::{
    CsvImportResult, CsvPreviewResult, CsvRowResult, CsvRowStatus, ImportManifestRequest,
    ImportRowResult, ImportRowStatus, PreviewManifestRequest, REQUIRED_HEADERS, import_manifest,
    preview_manifest,
};
pub use error::{ApiError, translate_core_error, translate_domain_error};
pub use handlers::{
    appointment_timeline, cancel_appointment, center_timeline, center_worklist, check_in,
    child_history, complete_appointment, confirm_appointment, correct_batch, create_center,
    create_child, create_parent, create_staff, create_vaccine, get_appointment, get_batch,
    list_center_batches, list_vaccine_batches, receive_batch, reschedule_appointment,
    schedule_appointment, set_vaccine_active, start_visit, update_appointment_status,
};
pub use request_response::{
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
    format_wire_date, format_wire_time, parse_wire_date, parse_wire_time,
};
