// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Vaccination record queries and per-child dose history.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use vax_domain::VaccinationRecord;

use crate::data_models::{RecordRow, record_from_row};
use crate::diesel_schema::vaccination_records;
use crate::error::PersistenceError;

type RecordColumns = (
    vaccination_records::record_id,
    vaccination_records::appointment_id,
    vaccination_records::child_id,
    vaccination_records::vaccine_id,
    vaccination_records::staff_id,
    vaccination_records::administered_at,
    vaccination_records::dose_number,
    vaccination_records::batch_number,
    vaccination_records::reactions,
    vaccination_records::notes,
);

const RECORD_COLUMNS: RecordColumns = (
    vaccination_records::record_id,
    vaccination_records::appointment_id,
    vaccination_records::child_id,
    vaccination_records::vaccine_id,
    vaccination_records::staff_id,
    vaccination_records::administered_at,
    vaccination_records::dose_number,
    vaccination_records::batch_number,
    vaccination_records::reactions,
    vaccination_records::notes,
);

backend_fn! {
/// Counts the doses of one vaccine already administered to one child.
///
/// The completion flow uses this count to compute the next dose number.
///
/// # Errors
///
/// Returns an error if the database cannot be queried.
pub fn count_records_for_child_vaccine(
    conn: &mut _,
    child_id: i64,
    vaccine_id: i64,
) -> Result<u32, PersistenceError> {
    let count: i64 = vaccination_records::table
        .filter(vaccination_records::child_id.eq(child_id))
        .filter(vaccination_records::vaccine_id.eq(vaccine_id))
        .count()
        .get_result::<i64>(conn)?;

    u32::try_from(count).map_err(|_| {
        PersistenceError::ReconstructionError(format!("record count out of range: {count}"))
    })
}
}

backend_fn! {
/// Retrieves the record created when an appointment was completed, if any.
///
/// # Errors
///
/// Returns an error if the database cannot be queried or the stored row
/// cannot be reconstructed.
pub fn get_record_for_appointment(
    conn: &mut _,
    appointment_id: i64,
) -> Result<Option<VaccinationRecord>, PersistenceError> {
    let result = vaccination_records::table
        .select(RECORD_COLUMNS)
        .filter(vaccination_records::appointment_id.eq(appointment_id))
        .first::<RecordRow>(conn);

    match result {
        Ok(row) => Ok(Some(record_from_row(row)?)),
        Err(diesel::result::Error::NotFound) => Ok(None),
        Err(e) => Err(PersistenceError::from(e)),
    }
}
}

backend_fn! {
/// Lists a child's full vaccination history, oldest dose first.
///
/// # Errors
///
/// Returns an error if the database cannot be queried or a stored row
/// cannot be reconstructed.
pub fn list_records_for_child(
    conn: &mut _,
    child_id: i64,
) -> Result<Vec<VaccinationRecord>, PersistenceError> {
    let rows: Vec<RecordRow> = vaccination_records::table
        .select(RECORD_COLUMNS)
        .filter(vaccination_records::child_id.eq(child_id))
        .order((
            vaccination_records::administered_at.asc(),
            vaccination_records::record_id.asc(),
        ))
        .load::<RecordRow>(conn)?;

    rows.into_iter().map(record_from_row).collect()
}
}
