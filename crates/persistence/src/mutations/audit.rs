// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Audit event persistence.
//!
//! Audit events are append-only. Most mutations use Diesel DSL, with
//! minimal backend-specific helpers abstracted via the
//! `PersistenceBackend` trait.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use tracing::debug;
use vax_audit::AuditEvent;

use crate::backend::PersistenceBackend;
use crate::data_models::{ActionData, ActorData, CauseData};
use crate::diesel_schema::audit_events;
use crate::error::PersistenceError;

backend_fn! {
/// Persists an audit event.
///
/// The actor, cause, and action are stored as JSON payloads; the actor's
/// staff identity and the event's center/appointment scope are denormalized
/// into their own columns for querying.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `event` - The audit event to persist
///
/// # Returns
///
/// The event ID assigned by the database.
///
/// # Errors
///
/// Returns an error if persistence or serialization fails.
pub fn persist_audit_event(
    conn: &mut _,
    event: &AuditEvent,
) -> Result<i64, PersistenceError> {
    let actor_data: ActorData = ActorData {
        id: event.actor.id.clone(),
        actor_type: event.actor.actor_type.clone(),
        staff_id: event.actor.staff_id,
        staff_name: event.actor.staff_name.clone(),
    };

    let cause_data: CauseData = CauseData {
        id: event.cause.id.clone(),
        description: event.cause.description.clone(),
    };

    let action_data: ActionData = ActionData {
        name: event.action.name.clone(),
        details: event.action.details.clone(),
    };

    let actor_staff_id: i64 = event.actor.staff_id.unwrap_or(0);
    let actor_name: String = event
        .actor
        .staff_name
        .as_deref()
        .unwrap_or("system")
        .to_string();

    let actor_json: String = serde_json::to_string(&actor_data)?;
    let cause_json: String = serde_json::to_string(&cause_data)?;
    let action_json: String = serde_json::to_string(&action_data)?;

    diesel::insert_into(audit_events::table)
        .values((
            audit_events::center_id.eq(event.center_id),
            audit_events::appointment_id.eq(event.appointment_id),
            audit_events::actor_staff_id.eq(actor_staff_id),
            audit_events::actor_name.eq(actor_name),
            audit_events::actor_json.eq(actor_json),
            audit_events::cause_json.eq(cause_json),
            audit_events::action_json.eq(action_json),
            audit_events::before_snapshot_json.eq(&event.before.data),
            audit_events::after_snapshot_json.eq(&event.after.data),
        ))
        .execute(conn)?;

    let event_id: i64 = conn.get_last_insert_rowid()?;

    debug!(event_id, action = %event.action.name, "Persisted audit event");

    Ok(event_id)
}
}
