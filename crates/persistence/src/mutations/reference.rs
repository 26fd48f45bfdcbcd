// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Reference entity mutations: parents, centers, vaccines, children, staff.
//!
//! These are the administrative provisioning operations. Validation of
//! field contents happens in the domain layer before rows are written.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use time::Date;
use tracing::info;

use crate::backend::PersistenceBackend;
use crate::data_models::encode_date;
use crate::diesel_schema::{centers, children, parents, staff, vaccines};
use crate::error::PersistenceError;

backend_fn! {
/// Creates a parent or guardian.
///
/// # Errors
///
/// Returns an error if the row cannot be inserted.
pub fn create_parent(conn: &mut _, name: &str) -> Result<i64, PersistenceError> {
    diesel::insert_into(parents::table)
        .values(parents::name.eq(name))
        .execute(conn)?;

    let parent_id: i64 = conn.get_last_insert_rowid()?;

    info!(parent_id, "Created parent");

    Ok(parent_id)
}
}

backend_fn! {
/// Creates a vaccination center.
///
/// # Errors
///
/// Returns an error if the row cannot be inserted.
pub fn create_center(conn: &mut _, name: &str) -> Result<i64, PersistenceError> {
    diesel::insert_into(centers::table)
        .values(centers::name.eq(name))
        .execute(conn)?;

    let center_id: i64 = conn.get_last_insert_rowid()?;

    info!(center_id, "Created center");

    Ok(center_id)
}
}

backend_fn! {
/// Creates a vaccine.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `name` - The vaccine name
/// * `doses_per_administration` - Doses one administration draws from a vial
/// * `active` - Whether the vaccine may currently be administered
///
/// # Errors
///
/// Returns an error if the row cannot be inserted.
pub fn create_vaccine(
    conn: &mut _,
    name: &str,
    doses_per_administration: u32,
    active: bool,
) -> Result<i64, PersistenceError> {
    let doses: i32 = i32::try_from(doses_per_administration).map_err(|_| {
        PersistenceError::Other(format!(
            "doses_per_administration out of range: {doses_per_administration}"
        ))
    })?;

    diesel::insert_into(vaccines::table)
        .values((
            vaccines::name.eq(name),
            vaccines::doses_per_administration.eq(doses),
            vaccines::is_active.eq(i32::from(active)),
        ))
        .execute(conn)?;

    let vaccine_id: i64 = conn.get_last_insert_rowid()?;

    info!(vaccine_id, name, "Created vaccine");

    Ok(vaccine_id)
}
}

backend_fn! {
/// Activates or deactivates a vaccine.
///
/// # Errors
///
/// Returns an error if the vaccine does not exist or the update fails.
pub fn set_vaccine_active(
    conn: &mut _,
    vaccine_id: i64,
    active: bool,
) -> Result<(), PersistenceError> {
    let updated: usize = diesel::update(vaccines::table)
        .filter(vaccines::vaccine_id.eq(vaccine_id))
        .set(vaccines::is_active.eq(i32::from(active)))
        .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::NotFound(format!(
            "Vaccine {vaccine_id} does not exist"
        )));
    }

    info!(vaccine_id, active, "Updated vaccine active flag");

    Ok(())
}
}

backend_fn! {
/// Registers a child under an existing parent.
///
/// # Errors
///
/// Returns an error if the parent does not exist or the row cannot be
/// inserted.
pub fn create_child(
    conn: &mut _,
    name: &str,
    parent_id: i64,
    date_of_birth: Date,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(children::table)
        .values((
            children::name.eq(name),
            children::parent_id.eq(parent_id),
            children::date_of_birth.eq(encode_date(date_of_birth)),
        ))
        .execute(conn)?;

    let child_id: i64 = conn.get_last_insert_rowid()?;

    info!(child_id, parent_id, "Registered child");

    Ok(child_id)
}
}

backend_fn! {
/// Creates a staff member at an existing center.
///
/// # Errors
///
/// Returns an error if the center does not exist or the row cannot be
/// inserted.
pub fn create_staff(
    conn: &mut _,
    name: &str,
    center_id: i64,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(staff::table)
        .values((staff::name.eq(name), staff::center_id.eq(center_id)))
        .execute(conn)?;

    let staff_id: i64 = conn.get_last_insert_rowid()?;

    info!(staff_id, center_id, "Created staff member");

    Ok(staff_id)
}
}
