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
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

use axum::{
    Json, Router,
    extract::{Path, Query, State as AxumState},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::{Date, OffsetDateTime};
use tokio::sync::Mutex;
use tracing::{error, info};
use vax_api::{
    ApiError, AppointmentInfo, AppointmentTransitionResponse, AuthenticatedActor, BatchInfo,
    CancelAppointmentRequest, CheckInRequest, ChildHistoryResponse, CompleteAppointmentRequest,
    CompleteAppointmentResponse, ConfirmAppointmentRequest, CorrectBatchRequest,
    CorrectBatchResponse, CreateCenterRequest, CreateCenterResponse, CreateChildRequest,
    CreateChildResponse, CreateParentRequest, CreateParentResponse, CreateStaffRequest,
    CreateStaffResponse, CreateVaccineRequest, CreateVaccineResponse, CsvImportResult,
    CsvPreviewResult, ImportManifestRequest, ListBatchesResponse, PreviewManifestRequest,
    ReceiveBatchRequest, ReceiveBatchResponse, RescheduleAppointmentRequest,
    RescheduleAppointmentResponse, Role, ScheduleAppointmentRequest, ScheduleAppointmentResponse,
    SetVaccineActiveRequest, StartVisitRequest, TimelineResponse, UpdateAppointmentStatusRequest,
    UpdateAppointmentStatusResponse, WorklistRequest, WorklistResponse,
};
use vax_audit::Cause;
use vax_persistence::Persistence;

/// Vaxtrack Server - HTTP server for the vaxtrack immunization backend
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file, or a `mysql://` URL. If not
    /// provided, uses an in-memory database.
    #[arg(short, long)]
    database: Option<String>,

    /// Port to bind the server to
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// IANA timezone used to resolve the clinic's local calendar day
    #[arg(short, long, default_value = "UTC")]
    timezone: String,
}

/// Application state shared across handlers.
///
/// This contains the persistence layer wrapped in a Mutex to allow
/// safe concurrent access.
#[derive(Clone)]
struct AppState {
    /// The persistence layer for appointments, inventory, and audit events.
    persistence: Arc<Mutex<Persistence>>,
    /// The clinic timezone for visit-day checks.
    timezone: String,
}

/// Caller identity and request cause, supplied by the upstream gateway
/// that already authenticated the user.
#[derive(Debug, Clone, Deserialize)]
struct Caller {
    /// The actor ID performing this action.
    actor_id: String,
    /// The role of the actor (`admin` or `staff`).
    actor_role: String,
    /// The staff row backing this actor, required for visit-floor actions.
    staff_id: Option<i64>,
    /// The cause ID for this action.
    cause_id: String,
    /// The cause description.
    cause_description: String,
}

/// A request body carrying caller identity alongside the operation
/// payload, both flattened into one JSON object.
#[derive(Debug, Deserialize)]
struct Scoped<T> {
    #[serde(flatten)]
    caller: Caller,
    #[serde(flatten)]
    request: T,
}

/// Query parameters for the center worklist endpoint.
#[derive(Debug, Deserialize)]
struct WorklistQuery {
    /// The center to list.
    center_id: i64,
    /// The visit date (`YYYY-MM-DD`).
    date: String,
}

/// Query parameters for listing batches.
#[derive(Debug, Deserialize)]
struct BatchesQuery {
    /// The center whose stock to list.
    center_id: i64,
    /// Restrict to one vaccine when present.
    vaccine_id: Option<i64>,
}

/// Error response type.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorResponse {
    /// Error indicator.
    error: bool,
    /// Error message.
    message: String,
}

/// HTTP error wrapper that implements `IntoResponse`.
struct HttpError {
    /// The HTTP status code.
    status: StatusCode,
    /// The error message.
    message: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let status: StatusCode = match err {
            ApiError::AuthenticationFailed { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Unauthorized { .. } => StatusCode::FORBIDDEN,
            ApiError::InvalidInput { .. } | ApiError::InvalidCsvFormat { .. } => {
                StatusCode::BAD_REQUEST
            }
            ApiError::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::StateConflict { .. } => StatusCode::CONFLICT,
            ApiError::DomainRuleViolation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal { .. } => {
                error!(error = %err, "Internal error while handling request");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

/// Resolves the caller into an authenticated actor and an audit cause.
///
/// Identity is supplied by the upstream gateway; this layer only parses
/// the role and threads the attribution through.
fn resolve_caller(caller: Caller) -> Result<(AuthenticatedActor, Cause), HttpError> {
    let role: Role = Role::parse(&caller.actor_role).map_err(|_| HttpError {
        status: StatusCode::BAD_REQUEST,
        message: format!(
            "Invalid role: '{}'. Must be 'admin' or 'staff'",
            caller.actor_role
        ),
    })?;
    let actor: AuthenticatedActor = AuthenticatedActor::new(caller.actor_id, role, caller.staff_id);
    let cause: Cause = Cause::new(caller.cause_id, caller.cause_description);
    Ok((actor, cause))
}

/// Resolves "today" on the clinic's local calendar.
fn clinic_clock(timezone: &str) -> Result<(Date, OffsetDateTime), HttpError> {
    let now: OffsetDateTime = OffsetDateTime::now_utc();
    let today: Date = vax_domain::local_today(timezone, now).map_err(|err| HttpError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: format!("Clock error: {err}"),
    })?;
    Ok((today, now))
}

/// Handler for POST `/appointments` endpoint.
///
/// Books a new appointment and returns the one-time verification code.
async fn handle_schedule_appointment(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<Scoped<ScheduleAppointmentRequest>>,
) -> Result<Json<ScheduleAppointmentResponse>, HttpError> {
    info!(
        actor_id = %req.caller.actor_id,
        child_id = req.request.child_id,
        vaccine_id = req.request.vaccine_id,
        "Handling schedule_appointment request"
    );

    let (actor, cause) = resolve_caller(req.caller)?;

    let mut persistence = app_state.persistence.lock().await;
    let response: ScheduleAppointmentResponse =
        vax_api::schedule_appointment(&mut persistence, &req.request, &actor, cause)?;
    drop(persistence);

    info!(
        appointment_id = response.appointment_id,
        event_id = response.event_id,
        "Successfully scheduled appointment"
    );

    Ok(Json(response))
}

/// Handler for POST `/appointments/confirm` endpoint.
async fn handle_confirm_appointment(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<Scoped<ConfirmAppointmentRequest>>,
) -> Result<Json<AppointmentTransitionResponse>, HttpError> {
    info!(
        actor_id = %req.caller.actor_id,
        appointment_id = req.request.appointment_id,
        "Handling confirm_appointment request"
    );

    let (actor, cause) = resolve_caller(req.caller)?;

    let mut persistence = app_state.persistence.lock().await;
    let response: AppointmentTransitionResponse =
        vax_api::confirm_appointment(&mut persistence, &req.request, &actor, cause)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/appointments/start_visit` endpoint.
///
/// Opens the visit, assigning it to the acting staff member. Only valid
/// on the scheduled day.
async fn handle_start_visit(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<Scoped<StartVisitRequest>>,
) -> Result<Json<AppointmentTransitionResponse>, HttpError> {
    info!(
        actor_id = %req.caller.actor_id,
        appointment_id = req.request.appointment_id,
        "Handling start_visit request"
    );

    let (actor, cause) = resolve_caller(req.caller)?;
    let (today, _) = clinic_clock(&app_state.timezone)?;

    let mut persistence = app_state.persistence.lock().await;
    let response: AppointmentTransitionResponse =
        vax_api::start_visit(&mut persistence, &req.request, &actor, cause, today)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/appointments/check_in` endpoint.
///
/// Binds an inventory batch to the visit without consuming stock.
async fn handle_check_in(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<Scoped<CheckInRequest>>,
) -> Result<Json<AppointmentTransitionResponse>, HttpError> {
    info!(
        actor_id = %req.caller.actor_id,
        appointment_id = req.request.appointment_id,
        batch_number = %req.request.batch_number,
        "Handling check_in request"
    );

    let (actor, cause) = resolve_caller(req.caller)?;
    let (today, _) = clinic_clock(&app_state.timezone)?;

    let mut persistence = app_state.persistence.lock().await;
    let response: AppointmentTransitionResponse =
        vax_api::check_in(&mut persistence, &req.request, &actor, cause, today)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/appointments/complete` endpoint.
///
/// Administers the dose, consuming stock and writing the vaccination
/// record.
async fn handle_complete_appointment(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<Scoped<CompleteAppointmentRequest>>,
) -> Result<Json<CompleteAppointmentResponse>, HttpError> {
    info!(
        actor_id = %req.caller.actor_id,
        appointment_id = req.request.appointment_id,
        "Handling complete_appointment request"
    );

    let (actor, cause) = resolve_caller(req.caller)?;
    let (today, now) = clinic_clock(&app_state.timezone)?;

    let mut persistence = app_state.persistence.lock().await;
    let response: CompleteAppointmentResponse =
        vax_api::complete_appointment(&mut persistence, &req.request, &actor, cause, today, now)?;
    drop(persistence);

    info!(
        appointment_id = response.appointment_id,
        event_id = response.event_id,
        "Successfully completed appointment"
    );

    Ok(Json(response))
}

/// Handler for POST `/appointments/cancel` endpoint.
async fn handle_cancel_appointment(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<Scoped<CancelAppointmentRequest>>,
) -> Result<Json<AppointmentTransitionResponse>, HttpError> {
    info!(
        actor_id = %req.caller.actor_id,
        appointment_id = req.request.appointment_id,
        "Handling cancel_appointment request"
    );

    let (actor, cause) = resolve_caller(req.caller)?;

    let mut persistence = app_state.persistence.lock().await;
    let response: AppointmentTransitionResponse =
        vax_api::cancel_appointment(&mut persistence, &req.request, &actor, cause)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/appointments/reschedule` endpoint.
///
/// Creates a replacement appointment with a fresh verification code.
async fn handle_reschedule_appointment(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<Scoped<RescheduleAppointmentRequest>>,
) -> Result<Json<RescheduleAppointmentResponse>, HttpError> {
    info!(
        actor_id = %req.caller.actor_id,
        appointment_id = req.request.appointment_id,
        new_date = %req.request.new_date,
        "Handling reschedule_appointment request"
    );

    let (actor, cause) = resolve_caller(req.caller)?;

    let mut persistence = app_state.persistence.lock().await;
    let response: RescheduleAppointmentResponse =
        vax_api::reschedule_appointment(&mut persistence, &req.request, &actor, cause)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/appointments/status` endpoint.
///
/// Single visit-floor entry point that dispatches `start_visit`,
/// `check_in`, and `check_out` by action name.
async fn handle_update_appointment_status(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<Scoped<UpdateAppointmentStatusRequest>>,
) -> Result<Json<UpdateAppointmentStatusResponse>, HttpError> {
    info!(
        actor_id = %req.caller.actor_id,
        appointment_id = req.request.appointment_id,
        action = %req.request.action,
        "Handling update_appointment_status request"
    );

    let (actor, cause) = resolve_caller(req.caller)?;
    let (today, now) = clinic_clock(&app_state.timezone)?;

    let mut persistence = app_state.persistence.lock().await;
    let response: UpdateAppointmentStatusResponse = vax_api::update_appointment_status(
        &mut persistence,
        &req.request,
        &actor,
        cause,
        today,
        now,
    )?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/appointments/{appointment_id}` endpoint.
async fn handle_get_appointment(
    AxumState(app_state): AxumState<AppState>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<AppointmentInfo>, HttpError> {
    info!(
        appointment_id = appointment_id,
        "Handling get_appointment request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response: AppointmentInfo = vax_api::get_appointment(&mut persistence, appointment_id)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/worklist` endpoint.
///
/// Lists a center's appointments for one date, all statuses.
async fn handle_center_worklist(
    AxumState(app_state): AxumState<AppState>,
    Query(query): Query<WorklistQuery>,
) -> Result<Json<WorklistResponse>, HttpError> {
    info!(
        center_id = query.center_id,
        date = %query.date,
        "Handling center_worklist request"
    );

    let request: WorklistRequest = WorklistRequest {
        center_id: query.center_id,
        date: query.date,
    };

    let mut persistence = app_state.persistence.lock().await;
    let response: WorklistResponse = vax_api::center_worklist(&mut persistence, &request)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/batches` endpoint.
///
/// Receives a new inventory batch into a center's stock.
async fn handle_receive_batch(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<Scoped<ReceiveBatchRequest>>,
) -> Result<Json<ReceiveBatchResponse>, HttpError> {
    info!(
        actor_id = %req.caller.actor_id,
        vaccine_id = req.request.vaccine_id,
        center_id = req.request.center_id,
        batch_number = %req.request.batch_number,
        "Handling receive_batch request"
    );

    let (actor, cause) = resolve_caller(req.caller)?;
    let (today, _) = clinic_clock(&app_state.timezone)?;

    let mut persistence = app_state.persistence.lock().await;
    let response: ReceiveBatchResponse =
        vax_api::receive_batch(&mut persistence, &req.request, &actor, cause, today)?;
    drop(persistence);

    info!(
        batch_id = response.batch.batch_id,
        event_id = response.event_id,
        "Successfully received batch"
    );

    Ok(Json(response))
}

/// Handler for POST `/batches/correct` endpoint.
async fn handle_correct_batch(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<Scoped<CorrectBatchRequest>>,
) -> Result<Json<CorrectBatchResponse>, HttpError> {
    info!(
        actor_id = %req.caller.actor_id,
        batch_id = req.request.batch_id,
        "Handling correct_batch request"
    );

    let (actor, cause) = resolve_caller(req.caller)?;
    let (today, _) = clinic_clock(&app_state.timezone)?;

    let mut persistence = app_state.persistence.lock().await;
    let response: CorrectBatchResponse =
        vax_api::correct_batch(&mut persistence, &req.request, &actor, cause, today)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/batches/{batch_id}` endpoint.
async fn handle_get_batch(
    AxumState(app_state): AxumState<AppState>,
    Path(batch_id): Path<i64>,
) -> Result<Json<BatchInfo>, HttpError> {
    info!(batch_id = batch_id, "Handling get_batch request");

    let mut persistence = app_state.persistence.lock().await;
    let response: BatchInfo = vax_api::get_batch(&mut persistence, batch_id)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/batches` endpoint.
///
/// Lists a center's stock, optionally restricted to one vaccine.
async fn handle_list_batches(
    AxumState(app_state): AxumState<AppState>,
    Query(query): Query<BatchesQuery>,
) -> Result<Json<ListBatchesResponse>, HttpError> {
    info!(
        center_id = query.center_id,
        vaccine_id = ?query.vaccine_id,
        "Handling list_batches request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response: ListBatchesResponse = match query.vaccine_id {
        Some(vaccine_id) => {
            vax_api::list_vaccine_batches(&mut persistence, vaccine_id, query.center_id)?
        }
        None => vax_api::list_center_batches(&mut persistence, query.center_id)?,
    };
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/manifest/preview` endpoint.
///
/// Validates a delivery manifest CSV without committing anything.
async fn handle_preview_manifest(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<Scoped<PreviewManifestRequest>>,
) -> Result<Json<CsvPreviewResult>, HttpError> {
    info!(
        actor_id = %req.caller.actor_id,
        center_id = req.request.center_id,
        "Handling preview_manifest request"
    );

    let (actor, _) = resolve_caller(req.caller)?;

    let mut persistence = app_state.persistence.lock().await;
    let response: CsvPreviewResult =
        vax_api::preview_manifest(&mut persistence, &req.request, &actor)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/manifest/import` endpoint.
///
/// Commits the valid rows of a delivery manifest CSV as batch receipts.
async fn handle_import_manifest(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<Scoped<ImportManifestRequest>>,
) -> Result<Json<CsvImportResult>, HttpError> {
    info!(
        actor_id = %req.caller.actor_id,
        center_id = req.request.center_id,
        "Handling import_manifest request"
    );

    let (actor, cause) = resolve_caller(req.caller)?;
    let (today, _) = clinic_clock(&app_state.timezone)?;

    let mut persistence = app_state.persistence.lock().await;
    let response: CsvImportResult =
        vax_api::import_manifest(&mut persistence, &req.request, &actor, &cause, today)?;
    drop(persistence);

    info!(
        imported = response.imported_count,
        skipped = response.skipped_count,
        "Finished manifest import"
    );

    Ok(Json(response))
}

/// Handler for POST `/parents` endpoint.
async fn handle_create_parent(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<Scoped<CreateParentRequest>>,
) -> Result<Json<CreateParentResponse>, HttpError> {
    info!(
        actor_id = %req.caller.actor_id,
        "Handling create_parent request"
    );

    let (actor, _) = resolve_caller(req.caller)?;

    let mut persistence = app_state.persistence.lock().await;
    let response: CreateParentResponse =
        vax_api::create_parent(&mut persistence, &req.request, &actor)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/centers` endpoint.
async fn handle_create_center(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<Scoped<CreateCenterRequest>>,
) -> Result<Json<CreateCenterResponse>, HttpError> {
    info!(
        actor_id = %req.caller.actor_id,
        "Handling create_center request"
    );

    let (actor, _) = resolve_caller(req.caller)?;

    let mut persistence = app_state.persistence.lock().await;
    let response: CreateCenterResponse =
        vax_api::create_center(&mut persistence, &req.request, &actor)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/vaccines` endpoint.
async fn handle_create_vaccine(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<Scoped<CreateVaccineRequest>>,
) -> Result<Json<CreateVaccineResponse>, HttpError> {
    info!(
        actor_id = %req.caller.actor_id,
        name = %req.request.name,
        "Handling create_vaccine request"
    );

    let (actor, _) = resolve_caller(req.caller)?;

    let mut persistence = app_state.persistence.lock().await;
    let response: CreateVaccineResponse =
        vax_api::create_vaccine(&mut persistence, &req.request, &actor)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/vaccines/active` endpoint.
///
/// Activates or retires a vaccine.
async fn handle_set_vaccine_active(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<Scoped<SetVaccineActiveRequest>>,
) -> Result<StatusCode, HttpError> {
    info!(
        actor_id = %req.caller.actor_id,
        vaccine_id = req.request.vaccine_id,
        is_active = req.request.is_active,
        "Handling set_vaccine_active request"
    );

    let (actor, _) = resolve_caller(req.caller)?;

    let mut persistence = app_state.persistence.lock().await;
    vax_api::set_vaccine_active(&mut persistence, &req.request, &actor)?;
    drop(persistence);

    Ok(StatusCode::NO_CONTENT)
}

/// Handler for POST `/children` endpoint.
async fn handle_create_child(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<Scoped<CreateChildRequest>>,
) -> Result<Json<CreateChildResponse>, HttpError> {
    info!(
        actor_id = %req.caller.actor_id,
        parent_id = req.request.parent_id,
        "Handling create_child request"
    );

    let (actor, _) = resolve_caller(req.caller)?;

    let mut persistence = app_state.persistence.lock().await;
    let response: CreateChildResponse =
        vax_api::create_child(&mut persistence, &req.request, &actor)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/staff` endpoint.
async fn handle_create_staff(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<Scoped<CreateStaffRequest>>,
) -> Result<Json<CreateStaffResponse>, HttpError> {
    info!(
        actor_id = %req.caller.actor_id,
        center_id = req.request.center_id,
        "Handling create_staff request"
    );

    let (actor, _) = resolve_caller(req.caller)?;

    let mut persistence = app_state.persistence.lock().await;
    let response: CreateStaffResponse =
        vax_api::create_staff(&mut persistence, &req.request, &actor)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/children/{child_id}/history` endpoint.
async fn handle_child_history(
    AxumState(app_state): AxumState<AppState>,
    Path(child_id): Path<i64>,
) -> Result<Json<ChildHistoryResponse>, HttpError> {
    info!(child_id = child_id, "Handling child_history request");

    let mut persistence = app_state.persistence.lock().await;
    let response: ChildHistoryResponse = vax_api::child_history(&mut persistence, child_id)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/appointments/{appointment_id}/timeline` endpoint.
///
/// Reconstructs the ordered audit timeline for one appointment.
async fn handle_appointment_timeline(
    AxumState(app_state): AxumState<AppState>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<TimelineResponse>, HttpError> {
    info!(
        appointment_id = appointment_id,
        "Handling appointment_timeline request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response: TimelineResponse =
        vax_api::appointment_timeline(&mut persistence, appointment_id)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/centers/{center_id}/timeline` endpoint.
async fn handle_center_timeline(
    AxumState(app_state): AxumState<AppState>,
    Path(center_id): Path<i64>,
) -> Result<Json<TimelineResponse>, HttpError> {
    info!(center_id = center_id, "Handling center_timeline request");

    let mut persistence = app_state.persistence.lock().await;
    let response: TimelineResponse = vax_api::center_timeline(&mut persistence, center_id)?;
    drop(persistence);

    Ok(Json(response))
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/appointments", post(handle_schedule_appointment))
        .route("/appointments/confirm", post(handle_confirm_appointment))
        .route("/appointments/start_visit", post(handle_start_visit))
        .route("/appointments/check_in", post(handle_check_in))
        .route("/appointments/complete", post(handle_complete_appointment))
        .route("/appointments/cancel", post(handle_cancel_appointment))
        .route(
            "/appointments/reschedule",
            post(handle_reschedule_appointment),
        )
        .route(
            "/appointments/status",
            post(handle_update_appointment_status),
        )
        .route("/appointments/{appointment_id}", get(handle_get_appointment))
        .route(
            "/appointments/{appointment_id}/timeline",
            get(handle_appointment_timeline),
        )
        .route("/worklist", get(handle_center_worklist))
        .route("/batches", post(handle_receive_batch))
        .route("/batches", get(handle_list_batches))
        .route("/batches/correct", post(handle_correct_batch))
        .route("/batches/{batch_id}", get(handle_get_batch))
        .route("/manifest/preview", post(handle_preview_manifest))
        .route("/manifest/import", post(handle_import_manifest))
        .route("/parents", post(handle_create_parent))
        .route("/centers", post(handle_create_center))
        .route("/centers/{center_id}/timeline", get(handle_center_timeline))
        .route("/vaccines", post(handle_create_vaccine))
        .route("/vaccines/active", post(handle_set_vaccine_active))
        .route("/children", post(handle_create_child))
        .route("/children/{child_id}/history", get(handle_child_history))
        .route("/staff", post(handle_create_staff))
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args: Args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing Vaxtrack Server");

    // Fail fast on a bad timezone rather than at the first visit-day check
    vax_domain::local_today(&args.timezone, OffsetDateTime::now_utc())?;

    // Initialize persistence (in-memory, file, or MySQL based on CLI argument)
    let persistence: Persistence = match &args.database {
        Some(url) if url.starts_with("mysql://") => {
            info!("Using MySQL database");
            Persistence::new_with_mysql(url)?
        }
        Some(path) => {
            info!("Using file-based database at: {}", path);
            Persistence::new_with_file(path)?
        }
        None => {
            info!("Using in-memory database");
            Persistence::new_in_memory()?
        }
    };

    let app_state: AppState = AppState {
        persistence: Arc::new(Mutex::new(persistence)),
        timezone: args.timezone,
    };

    // Build router
    let app: Router = build_router(app_state);

    // Bind to address
    let addr: std::net::SocketAddr = format!("127.0.0.1:{}", args.port).parse()?;
    info!("Server listening on {}", addr);

    // Run server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode as HttpStatusCode},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use vax_api::format_wire_date;

    /// Helper to create a test router over in-memory persistence.
    fn test_app() -> Router {
        let persistence: Persistence =
            Persistence::new_in_memory().expect("Failed to create in-memory persistence");
        build_router(AppState {
            persistence: Arc::new(Mutex::new(persistence)),
            timezone: String::from("UTC"),
        })
    }

    /// Sends a JSON POST and returns the status and parsed body.
    async fn post_json(app: &Router, uri: &str, body: &Value) -> (HttpStatusCode, Value) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: Value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// Sends a GET and returns the status and parsed body.
    async fn get_json(app: &Router, uri: &str) -> (HttpStatusCode, Value) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        (status, value)
    }

    /// Caller fields for an admin request body.
    fn admin_caller() -> Value {
        json!({
            "actor_id": "admin-1",
            "actor_role": "admin",
            "cause_id": "req-1",
            "cause_description": "Test request",
        })
    }

    /// Caller fields for a staff request body.
    fn staff_caller(staff_id: i64) -> Value {
        json!({
            "actor_id": "staff-4",
            "actor_role": "staff",
            "staff_id": staff_id,
            "cause_id": "req-2",
            "cause_description": "Test request",
        })
    }

    /// Merges caller fields into a request payload.
    fn scoped(caller: Value, payload: Value) -> Value {
        let mut merged = caller;
        for (key, value) in payload.as_object().unwrap() {
            merged[key] = value.clone();
        }
        merged
    }

    /// Provisioned reference data for a test clinic.
    struct Seeded {
        center_id: i64,
        vaccine_id: i64,
        child_id: i64,
        staff_id: i64,
    }

    /// Provisions a center, a single-dose vaccine, a family, and a nurse
    /// through the HTTP surface.
    async fn seed(app: &Router) -> Seeded {
        let (status, center) = post_json(
            app,
            "/centers",
            &scoped(admin_caller(), json!({"name": "Ward 12 PHC"})),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);

        let (status, vaccine) = post_json(
            app,
            "/vaccines",
            &scoped(
                admin_caller(),
                json!({"name": "BCG", "doses_per_administration": 1}),
            ),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);

        let (status, parent) = post_json(
            app,
            "/parents",
            &scoped(admin_caller(), json!({"name": "Asha Rao"})),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);

        let (status, child) = post_json(
            app,
            "/children",
            &scoped(
                admin_caller(),
                json!({
                    "name": "Ishaan Rao",
                    "parent_id": parent["parent_id"],
                    "date_of_birth": "2025-11-02",
                }),
            ),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);

        let (status, staff) = post_json(
            app,
            "/staff",
            &scoped(
                admin_caller(),
                json!({"name": "Nurse Devi", "center_id": center["center_id"]}),
            ),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);

        Seeded {
            center_id: center["center_id"].as_i64().unwrap(),
            vaccine_id: vaccine["vaccine_id"].as_i64().unwrap(),
            child_id: child["child_id"].as_i64().unwrap(),
            staff_id: staff["staff_id"].as_i64().unwrap(),
        }
    }

    /// Today on the test clock, in wire format. The visit-day guard makes
    /// staff transitions valid only on the scheduled day.
    fn today_wire() -> String {
        format_wire_date(OffsetDateTime::now_utc().date())
    }

    /// Books an appointment for today and returns its id and code.
    async fn schedule_today(app: &Router, seeded: &Seeded) -> (i64, String) {
        let (status, body) = post_json(
            app,
            "/appointments",
            &scoped(
                admin_caller(),
                json!({
                    "child_id": seeded.child_id,
                    "vaccine_id": seeded.vaccine_id,
                    "center_id": seeded.center_id,
                    "scheduled_date": today_wire(),
                    "scheduled_time": "09:30",
                }),
            ),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);
        (
            body["appointment_id"].as_i64().unwrap(),
            body["verification_code"].as_str().unwrap().to_string(),
        )
    }

    /// Receives a batch generous enough for any single test.
    async fn receive_batch(app: &Router, seeded: &Seeded) {
        let (status, _) = post_json(
            app,
            "/batches",
            &scoped(
                admin_caller(),
                json!({
                    "vaccine_id": seeded.vaccine_id,
                    "center_id": seeded.center_id,
                    "batch_number": "BCG-7",
                    "doses_per_vial": 10,
                    "quantity": 2,
                    "expiry_date": "2030-01-01",
                    "manufacturing_date": "2025-09-01",
                }),
            ),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);
    }

    /// Walks an appointment up to `check_in`.
    async fn check_in_flow(app: &Router, seeded: &Seeded, appointment_id: i64) {
        let (status, _) = post_json(
            app,
            "/appointments/start_visit",
            &scoped(
                staff_caller(seeded.staff_id),
                json!({"appointment_id": appointment_id}),
            ),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);

        let (status, _) = post_json(
            app,
            "/appointments/check_in",
            &scoped(
                staff_caller(seeded.staff_id),
                json!({"appointment_id": appointment_id, "batch_number": "BCG-7"}),
            ),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);
    }

    #[tokio::test]
    async fn test_schedule_returns_verification_code() {
        let app: Router = test_app();
        let seeded: Seeded = seed(&app).await;

        let (appointment_id, code) = schedule_today(&app, &seeded).await;

        assert!(appointment_id > 0);
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));

        let (status, body) = get_json(&app, &format!("/appointments/{appointment_id}")).await;
        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(body["status"], "scheduled");
    }

    #[tokio::test]
    async fn test_staff_cannot_provision_vaccine() {
        let app: Router = test_app();

        let (status, body) = post_json(
            &app,
            "/vaccines",
            &scoped(
                staff_caller(1),
                json!({"name": "BCG", "doses_per_administration": 1}),
            ),
        )
        .await;

        assert_eq!(status, HttpStatusCode::FORBIDDEN);
        assert_eq!(body["error"], true);
    }

    #[tokio::test]
    async fn test_invalid_role_returns_bad_request() {
        let app: Router = test_app();

        let (status, _) = post_json(
            &app,
            "/centers",
            &json!({
                "actor_id": "someone",
                "actor_role": "nurse",
                "cause_id": "req-9",
                "cause_description": "Test request",
                "name": "Ward 12 PHC",
            }),
        )
        .await;

        assert_eq!(status, HttpStatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_appointment_is_not_found() {
        let app: Router = test_app();
        seed(&app).await;

        let (status, body) = post_json(
            &app,
            "/appointments/confirm",
            &scoped(admin_caller(), json!({"appointment_id": 999})),
        )
        .await;

        assert_eq!(status, HttpStatusCode::NOT_FOUND);
        assert_eq!(body["error"], true);
    }

    #[tokio::test]
    async fn test_wrong_verification_code_is_unprocessable() {
        let app: Router = test_app();
        let seeded: Seeded = seed(&app).await;
        receive_batch(&app, &seeded).await;
        let (appointment_id, code) = schedule_today(&app, &seeded).await;
        check_in_flow(&app, &seeded, appointment_id).await;

        let wrong_code: &str = if code == "000000" { "000001" } else { "000000" };
        let (status, body) = post_json(
            &app,
            "/appointments/complete",
            &scoped(
                staff_caller(seeded.staff_id),
                json!({"appointment_id": appointment_id, "verification_code": wrong_code}),
            ),
        )
        .await;

        assert_eq!(status, HttpStatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], true);
    }

    #[tokio::test]
    async fn test_full_visit_records_administration() {
        let app: Router = test_app();
        let seeded: Seeded = seed(&app).await;
        receive_batch(&app, &seeded).await;
        let (appointment_id, code) = schedule_today(&app, &seeded).await;
        check_in_flow(&app, &seeded, appointment_id).await;

        let (status, body) = post_json(
            &app,
            "/appointments/complete",
            &scoped(
                staff_caller(seeded.staff_id),
                json!({"appointment_id": appointment_id, "verification_code": code}),
            ),
        )
        .await;

        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(body["status"], "completed");
        assert_eq!(body["record"]["dose_number"], 1);
        assert_eq!(body["record"]["batch_number"], "BCG-7");

        let (status, history) =
            get_json(&app, &format!("/children/{}/history", seeded.child_id)).await;
        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(history["records"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_double_check_in_conflicts() {
        let app: Router = test_app();
        let seeded: Seeded = seed(&app).await;
        receive_batch(&app, &seeded).await;
        let (appointment_id, _) = schedule_today(&app, &seeded).await;
        check_in_flow(&app, &seeded, appointment_id).await;

        let (status, body) = post_json(
            &app,
            "/appointments/check_in",
            &scoped(
                staff_caller(seeded.staff_id),
                json!({"appointment_id": appointment_id, "batch_number": "BCG-7"}),
            ),
        )
        .await;

        assert_eq!(status, HttpStatusCode::CONFLICT);
        assert_eq!(body["error"], true);
    }

    #[tokio::test]
    async fn test_blank_cancel_reason_is_bad_request() {
        let app: Router = test_app();
        let seeded: Seeded = seed(&app).await;
        let (appointment_id, _) = schedule_today(&app, &seeded).await;

        let (status, _) = post_json(
            &app,
            "/appointments/cancel",
            &scoped(
                admin_caller(),
                json!({"appointment_id": appointment_id, "reason": "   "}),
            ),
        )
        .await;

        assert_eq!(status, HttpStatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_worklist_lists_scheduled_appointment() {
        let app: Router = test_app();
        let seeded: Seeded = seed(&app).await;
        let (appointment_id, _) = schedule_today(&app, &seeded).await;

        let (status, body) = get_json(
            &app,
            &format!(
                "/worklist?center_id={}&date={}",
                seeded.center_id,
                today_wire()
            ),
        )
        .await;

        assert_eq!(status, HttpStatusCode::OK);
        let appointments = body["appointments"].as_array().unwrap();
        assert_eq!(appointments.len(), 1);
        assert_eq!(appointments[0]["appointment_id"], appointment_id);
    }

    #[tokio::test]
    async fn test_timeline_records_booking_attribution() {
        let app: Router = test_app();
        let seeded: Seeded = seed(&app).await;
        let (appointment_id, _) = schedule_today(&app, &seeded).await;

        let (status, body) =
            get_json(&app, &format!("/appointments/{appointment_id}/timeline")).await;

        assert_eq!(status, HttpStatusCode::OK);
        let events = body["events"].as_array().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["action"], "ScheduleAppointment");
        assert_eq!(events[0]["actor_id"], "admin-1");
    }

    #[tokio::test]
    async fn test_status_facade_dispatches_start_visit() {
        let app: Router = test_app();
        let seeded: Seeded = seed(&app).await;
        let (appointment_id, _) = schedule_today(&app, &seeded).await;

        let (status, body) = post_json(
            &app,
            "/appointments/status",
            &scoped(
                staff_caller(seeded.staff_id),
                json!({"appointment_id": appointment_id, "action": "start_visit"}),
            ),
        )
        .await;

        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(body["status"], "start_visit");
    }

    #[tokio::test]
    async fn test_manifest_import_commits_valid_rows() {
        let app: Router = test_app();
        let seeded: Seeded = seed(&app).await;

        let csv = format!(
            "vaccine_id,batch_number,doses_per_vial,quantity,expiry_date,manufacturing_date\n\
             {0},BCG-1,10,2,2030-01-01,2025-09-01\n\
             {0},BCG-2,0,1,2030-01-01,2025-09-01\n",
            seeded.vaccine_id
        );
        let (status, body) = post_json(
            &app,
            "/manifest/import",
            &scoped(
                admin_caller(),
                json!({"center_id": seeded.center_id, "csv_content": csv}),
            ),
        )
        .await;

        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(body["imported_count"], 1);
        assert_eq!(body["skipped_count"], 1);

        let (status, batches) =
            get_json(&app, &format!("/batches?center_id={}", seeded.center_id)).await;
        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(batches["batches"].as_array().unwrap().len(), 1);
    }
}
