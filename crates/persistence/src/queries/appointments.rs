// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Appointment queries, including the per-center staff worklist.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use std::str::FromStr;
use time::Date;
use vax_domain::{Appointment, AppointmentStatus};

use crate::data_models::{AppointmentRow, appointment_from_row, encode_date};
use crate::diesel_schema::appointments;
use crate::error::PersistenceError;

type AppointmentColumns = (
    appointments::appointment_id,
    appointments::child_id,
    appointments::parent_id,
    appointments::vaccine_id,
    appointments::center_id,
    appointments::staff_id,
    appointments::scheduled_date,
    appointments::scheduled_time,
    appointments::status,
    appointments::batch_id,
    appointments::verification_code_hash,
    appointments::cancellation_reason,
);

const APPOINTMENT_COLUMNS: AppointmentColumns = (
    appointments::appointment_id,
    appointments::child_id,
    appointments::parent_id,
    appointments::vaccine_id,
    appointments::center_id,
    appointments::staff_id,
    appointments::scheduled_date,
    appointments::scheduled_time,
    appointments::status,
    appointments::batch_id,
    appointments::verification_code_hash,
    appointments::cancellation_reason,
);

backend_fn! {
/// Retrieves an appointment by ID.
///
/// # Errors
///
/// Returns an error if the appointment does not exist or cannot be
/// reconstructed.
pub fn get_appointment(
    conn: &mut _,
    appointment_id: i64,
) -> Result<Appointment, PersistenceError> {
    let result = appointments::table
        .select(APPOINTMENT_COLUMNS)
        .filter(appointments::appointment_id.eq(appointment_id))
        .first::<AppointmentRow>(conn);

    match result {
        Ok(row) => appointment_from_row(row),
        Err(diesel::result::Error::NotFound) => Err(PersistenceError::NotFound(format!(
            "Appointment {appointment_id} does not exist"
        ))),
        Err(e) => Err(PersistenceError::from(e)),
    }
}
}

backend_fn! {
/// Retrieves only the current status of an appointment.
///
/// # Errors
///
/// Returns an error if the appointment does not exist or its stored status
/// is not a recognized lifecycle state.
pub fn get_appointment_status(
    conn: &mut _,
    appointment_id: i64,
) -> Result<AppointmentStatus, PersistenceError> {
    let result = appointments::table
        .select(appointments::status)
        .filter(appointments::appointment_id.eq(appointment_id))
        .first::<String>(conn);

    match result {
        Ok(status) => AppointmentStatus::from_str(&status)
            .map_err(|e| PersistenceError::ReconstructionError(e.to_string())),
        Err(diesel::result::Error::NotFound) => Err(PersistenceError::NotFound(format!(
            "Appointment {appointment_id} does not exist"
        ))),
        Err(e) => Err(PersistenceError::from(e)),
    }
}
}

backend_fn! {
/// Lists the appointments at one center on one calendar date, ordered by
/// scheduled time.
///
/// This is the staff worklist for a working day; it includes terminal
/// appointments so the day's history stays visible.
///
/// # Errors
///
/// Returns an error if the database cannot be queried or a stored row
/// cannot be reconstructed.
pub fn list_appointments_for_center_date(
    conn: &mut _,
    center_id: i64,
    date: Date,
) -> Result<Vec<Appointment>, PersistenceError> {
    let rows: Vec<AppointmentRow> = appointments::table
        .select(APPOINTMENT_COLUMNS)
        .filter(appointments::center_id.eq(center_id))
        .filter(appointments::scheduled_date.eq(encode_date(date)))
        .order(appointments::scheduled_time.asc())
        .load::<AppointmentRow>(conn)?;

    rows.into_iter().map(appointment_from_row).collect()
}
}
