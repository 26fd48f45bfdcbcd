// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Audit event queries.
//!
//! This module contains backend-agnostic queries for retrieving audit
//! events, the per-appointment timeline, and per-center event listings.
//! All queries use Diesel DSL and work across all supported database
//! backends.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use vax_audit::{Action, Actor, AuditEvent, Cause, StateSnapshot};

use crate::data_models::{ActionData, ActorData, CauseData};
use crate::diesel_schema::audit_events;
use crate::error::PersistenceError;

/// Diesel Queryable struct for full audit event rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = audit_events)]
struct AuditEventFullRow {
    #[allow(dead_code)]
    event_id: i64,
    center_id: Option<i64>,
    appointment_id: Option<i64>,
    #[allow(dead_code)]
    actor_staff_id: i64,
    #[allow(dead_code)]
    actor_name: String,
    actor_json: String,
    cause_json: String,
    action_json: String,
    before_snapshot_json: String,
    after_snapshot_json: String,
    #[allow(dead_code)]
    created_at: Option<String>,
}

fn event_from_row(row: AuditEventFullRow) -> Result<AuditEvent, PersistenceError> {
    let actor_data: ActorData = serde_json::from_str(&row.actor_json)?;
    let cause_data: CauseData = serde_json::from_str(&row.cause_json)?;
    let action_data: ActionData = serde_json::from_str(&row.action_json)?;

    let actor: Actor = match (actor_data.staff_id, actor_data.staff_name) {
        (Some(staff_id), Some(staff_name)) => {
            Actor::with_staff(actor_data.id, actor_data.actor_type, staff_id, staff_name)
        }
        _ => Actor::new(actor_data.id, actor_data.actor_type),
    };

    let mut event: AuditEvent = AuditEvent::new(
        actor,
        Cause::new(cause_data.id, cause_data.description),
        Action::new(action_data.name, action_data.details),
        StateSnapshot::new(row.before_snapshot_json),
        StateSnapshot::new(row.after_snapshot_json),
    );
    event.center_id = row.center_id;
    event.appointment_id = row.appointment_id;

    Ok(event)
}

backend_fn! {
/// Retrieves an audit event by ID.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `event_id` - The event ID to retrieve
///
/// # Errors
///
/// Returns an error if the event is not found or cannot be deserialized.
pub fn get_audit_event(conn: &mut _, event_id: i64) -> Result<AuditEvent, PersistenceError> {
    let result = audit_events::table
        .filter(audit_events::event_id.eq(event_id))
        .select(AuditEventFullRow::as_select())
        .first::<AuditEventFullRow>(conn);

    match result {
        Ok(row) => event_from_row(row),
        Err(diesel::result::Error::NotFound) => Err(PersistenceError::EventNotFound(event_id)),
        Err(e) => Err(PersistenceError::from(e)),
    }
}
}

backend_fn! {
/// Retrieves the complete event timeline for one appointment, oldest first.
///
/// # Errors
///
/// Returns an error if the database cannot be queried or an event cannot
/// be deserialized.
pub fn get_appointment_timeline(
    conn: &mut _,
    appointment_id: i64,
) -> Result<Vec<AuditEvent>, PersistenceError> {
    let rows: Vec<AuditEventFullRow> = audit_events::table
        .filter(audit_events::appointment_id.eq(appointment_id))
        .select(AuditEventFullRow::as_select())
        .order(audit_events::event_id.asc())
        .load::<AuditEventFullRow>(conn)?;

    rows.into_iter().map(event_from_row).collect()
}
}

backend_fn! {
/// Retrieves every event scoped to one center, oldest first.
///
/// # Errors
///
/// Returns an error if the database cannot be queried or an event cannot
/// be deserialized.
pub fn get_center_events(
    conn: &mut _,
    center_id: i64,
) -> Result<Vec<AuditEvent>, PersistenceError> {
    let rows: Vec<AuditEventFullRow> = audit_events::table
        .filter(audit_events::center_id.eq(center_id))
        .select(AuditEventFullRow::as_select())
        .order(audit_events::event_id.asc())
        .load::<AuditEventFullRow>(conn)?;

    rows.into_iter().map(event_from_row).collect()
}
}
