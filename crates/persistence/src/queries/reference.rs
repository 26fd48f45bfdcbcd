// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Reference entity queries: centers, vaccines, children, staff, parents.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use vax_domain::{Center, Child, Staff, Vaccine};

use crate::data_models::decode_date;
use crate::diesel_schema::{centers, children, parents, staff, vaccines};
use crate::error::PersistenceError;

backend_fn! {
/// Retrieves a vaccine by ID.
///
/// # Errors
///
/// Returns an error if the vaccine does not exist.
pub fn get_vaccine(conn: &mut _, vaccine_id: i64) -> Result<Vaccine, PersistenceError> {
    let result = vaccines::table
        .select((
            vaccines::vaccine_id,
            vaccines::name,
            vaccines::doses_per_administration,
            vaccines::is_active,
        ))
        .filter(vaccines::vaccine_id.eq(vaccine_id))
        .first::<(i64, String, i32, i32)>(conn);

    match result {
        Ok((id, name, doses, active)) => {
            let doses: u32 = u32::try_from(doses).map_err(|_| {
                PersistenceError::ReconstructionError(format!(
                    "doses_per_administration out of range: {doses}"
                ))
            })?;
            Ok(Vaccine::with_id(id, name, doses, active != 0))
        }
        Err(diesel::result::Error::NotFound) => Err(PersistenceError::NotFound(format!(
            "Vaccine {vaccine_id} does not exist"
        ))),
        Err(e) => Err(PersistenceError::from(e)),
    }
}
}

backend_fn! {
/// Lists all vaccines, ordered by name.
///
/// # Errors
///
/// Returns an error if the database cannot be queried.
pub fn list_vaccines(conn: &mut _) -> Result<Vec<Vaccine>, PersistenceError> {
    let rows: Vec<(i64, String, i32, i32)> = vaccines::table
        .select((
            vaccines::vaccine_id,
            vaccines::name,
            vaccines::doses_per_administration,
            vaccines::is_active,
        ))
        .order(vaccines::name.asc())
        .load::<(i64, String, i32, i32)>(conn)?;

    let mut result: Vec<Vaccine> = Vec::with_capacity(rows.len());
    for (id, name, doses, active) in rows {
        let doses: u32 = u32::try_from(doses).map_err(|_| {
            PersistenceError::ReconstructionError(format!(
                "doses_per_administration out of range: {doses}"
            ))
        })?;
        result.push(Vaccine::with_id(id, name, doses, active != 0));
    }

    Ok(result)
}
}

backend_fn! {
/// Retrieves a center by ID.
///
/// # Errors
///
/// Returns an error if the center does not exist.
pub fn get_center(conn: &mut _, center_id: i64) -> Result<Center, PersistenceError> {
    let result = centers::table
        .select((centers::center_id, centers::name))
        .filter(centers::center_id.eq(center_id))
        .first::<(i64, String)>(conn);

    match result {
        Ok((id, name)) => Ok(Center::with_id(id, name)),
        Err(diesel::result::Error::NotFound) => Err(PersistenceError::NotFound(format!(
            "Center {center_id} does not exist"
        ))),
        Err(e) => Err(PersistenceError::from(e)),
    }
}
}

backend_fn! {
/// Lists all centers, ordered by name.
///
/// # Errors
///
/// Returns an error if the database cannot be queried.
pub fn list_centers(conn: &mut _) -> Result<Vec<Center>, PersistenceError> {
    let rows: Vec<(i64, String)> = centers::table
        .select((centers::center_id, centers::name))
        .order(centers::name.asc())
        .load::<(i64, String)>(conn)?;

    Ok(rows
        .into_iter()
        .map(|(id, name)| Center::with_id(id, name))
        .collect())
}
}

backend_fn! {
/// Retrieves a child by ID.
///
/// # Errors
///
/// Returns an error if the child does not exist.
pub fn get_child(conn: &mut _, child_id: i64) -> Result<Child, PersistenceError> {
    let result = children::table
        .select((
            children::child_id,
            children::name,
            children::parent_id,
            children::date_of_birth,
        ))
        .filter(children::child_id.eq(child_id))
        .first::<(i64, String, i64, String)>(conn);

    match result {
        Ok((id, name, parent_id, date_of_birth)) => Ok(Child::with_id(
            id,
            name,
            parent_id,
            decode_date(&date_of_birth)?,
        )),
        Err(diesel::result::Error::NotFound) => Err(PersistenceError::NotFound(format!(
            "Child {child_id} does not exist"
        ))),
        Err(e) => Err(PersistenceError::from(e)),
    }
}
}

backend_fn! {
/// Retrieves a staff member by ID.
///
/// # Errors
///
/// Returns an error if the staff member does not exist.
pub fn get_staff(conn: &mut _, staff_id: i64) -> Result<Staff, PersistenceError> {
    let result = staff::table
        .select((staff::staff_id, staff::name, staff::center_id))
        .filter(staff::staff_id.eq(staff_id))
        .first::<(i64, String, i64)>(conn);

    match result {
        Ok((id, name, center_id)) => Ok(Staff::with_id(id, name, center_id)),
        Err(diesel::result::Error::NotFound) => Err(PersistenceError::NotFound(format!(
            "Staff member {staff_id} does not exist"
        ))),
        Err(e) => Err(PersistenceError::from(e)),
    }
}
}

backend_fn! {
/// Returns true if a parent row exists.
///
/// # Errors
///
/// Returns an error if the database cannot be queried.
pub fn parent_exists(conn: &mut _, parent_id: i64) -> Result<bool, PersistenceError> {
    let count: i64 = parents::table
        .filter(parents::parent_id.eq(parent_id))
        .count()
        .get_result::<i64>(conn)?;

    Ok(count > 0)
}
}
