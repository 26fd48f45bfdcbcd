// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Serializable audit payloads and row-to-domain conversion helpers.
//!
//! Dates and times are stored as ISO 8601 text; stock counters are stored
//! denormalized but always reconstructed through the dose-accounting
//! function so the ledger invariant holds on every read.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::format_description::well_known::Iso8601;
use time::format_description::well_known::iso8601::{Config, EncodedConfig, FormattedComponents};
use time::{Date, Time};
use vax_domain::{
    Appointment, AppointmentStatus, BatchNumber, BatchStatus, InventoryBatch, StockLevel,
    VaccinationRecord,
};

use crate::error::PersistenceError;

/// Serializable representation of an Actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorData {
    pub id: String,
    pub actor_type: String,
    pub staff_id: Option<i64>,
    pub staff_name: Option<String>,
}

/// Serializable representation of a Cause.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CauseData {
    pub id: String,
    pub description: String,
}

/// Serializable representation of an Action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionData {
    pub name: String,
    pub details: Option<String>,
}

/// Serializable representation of a `StateSnapshot`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshotData {
    pub data: String,
}

/// Raw `inventory_batches` row.
pub type BatchRow = (
    i64,    // batch_id
    i64,    // vaccine_id
    i64,    // center_id
    String, // batch_number
    i32,    // doses_per_vial
    i32,    // quantity
    i32,    // remaining_doses
    String, // expiry_date
    String, // manufacturing_date
    String, // status
);

/// Raw `appointments` row.
pub type AppointmentRow = (
    i64,            // appointment_id
    i64,            // child_id
    i64,            // parent_id
    i64,            // vaccine_id
    i64,            // center_id
    Option<i64>,    // staff_id
    String,         // scheduled_date
    String,         // scheduled_time
    String,         // status
    Option<i64>,    // batch_id
    String,         // verification_code_hash
    Option<String>, // cancellation_reason
);

/// Raw `vaccination_records` row.
pub type RecordRow = (
    i64,            // record_id
    i64,            // appointment_id
    i64,            // child_id
    i64,            // vaccine_id
    i64,            // staff_id
    String,         // administered_at
    i32,            // dose_number
    String,         // batch_number
    Option<String>, // reactions
    Option<String>, // notes
);

/// Formats a calendar date for text storage.
#[must_use]
pub fn encode_date(date: Date) -> String {
    date.to_string()
}

/// Formats a wall-clock time for text storage.
///
/// # Errors
///
/// Returns an error if the time cannot be formatted.
pub fn encode_time(time: Time) -> Result<String, PersistenceError> {
    const TIME_ONLY: EncodedConfig = Config::DEFAULT
        .set_formatted_components(FormattedComponents::Time)
        .encode();
    time.format(&Iso8601::<TIME_ONLY>)
        .map_err(|e| PersistenceError::SerializationError(format!("Failed to format time: {e}")))
}

/// Parses a stored calendar date.
///
/// # Errors
///
/// Returns an error if the stored text is not a valid ISO 8601 date.
pub fn decode_date(text: &str) -> Result<Date, PersistenceError> {
    Date::parse(text, &Iso8601::DEFAULT).map_err(|e| {
        PersistenceError::ReconstructionError(format!("Failed to parse date '{text}': {e}"))
    })
}

/// Parses a stored wall-clock time.
///
/// # Errors
///
/// Returns an error if the stored text is not a valid ISO 8601 time.
pub fn decode_time(text: &str) -> Result<Time, PersistenceError> {
    Time::parse(text, &Iso8601::DEFAULT).map_err(|e| {
        PersistenceError::ReconstructionError(format!("Failed to parse time '{text}': {e}"))
    })
}

fn to_u32(value: i32, what: &str) -> Result<u32, PersistenceError> {
    u32::try_from(value).map_err(|_| {
        PersistenceError::ReconstructionError(format!("{what} out of range: {value}"))
    })
}

/// Rebuilds an `InventoryBatch` from its stored row.
///
/// Counters are rederived from total consumption rather than trusted from
/// the denormalized columns.
///
/// # Errors
///
/// Returns an error if any stored value cannot be converted back to its
/// domain representation.
pub fn batch_from_row(row: BatchRow) -> Result<InventoryBatch, PersistenceError> {
    let (
        batch_id,
        vaccine_id,
        center_id,
        batch_number,
        doses_per_vial,
        quantity,
        remaining_doses,
        expiry_date,
        manufacturing_date,
        status,
    ) = row;

    let doses_per_vial: u32 = to_u32(doses_per_vial, "doses_per_vial")?;
    let quantity: u32 = to_u32(quantity, "quantity")?;
    let remaining: u32 = to_u32(remaining_doses, "remaining_doses")?;

    let capacity: u32 = StockLevel::capacity(quantity, doses_per_vial)
        .map_err(|e| PersistenceError::ReconstructionError(e.to_string()))?;
    let consumed: u32 = capacity.checked_sub(remaining).ok_or_else(|| {
        PersistenceError::ReconstructionError(format!(
            "remaining_doses {remaining} exceeds capacity {capacity}"
        ))
    })?;

    let stock: StockLevel = StockLevel::derive(quantity, doses_per_vial, consumed)
        .map_err(|e| PersistenceError::ReconstructionError(e.to_string()))?;
    let status: BatchStatus = BatchStatus::from_str(&status)
        .map_err(|e| PersistenceError::ReconstructionError(e.to_string()))?;

    Ok(InventoryBatch {
        batch_id: Some(batch_id),
        vaccine_id,
        center_id,
        batch_number: BatchNumber::new(&batch_number),
        doses_per_vial,
        quantity,
        stock,
        expiry_date: decode_date(&expiry_date)?,
        manufacturing_date: decode_date(&manufacturing_date)?,
        status,
    })
}

/// Rebuilds an `Appointment` from its stored row.
///
/// # Errors
///
/// Returns an error if any stored value cannot be converted back to its
/// domain representation.
pub fn appointment_from_row(row: AppointmentRow) -> Result<Appointment, PersistenceError> {
    let (
        appointment_id,
        child_id,
        parent_id,
        vaccine_id,
        center_id,
        staff_id,
        scheduled_date,
        scheduled_time,
        status,
        batch_id,
        verification_code_hash,
        cancellation_reason,
    ) = row;

    Ok(Appointment {
        appointment_id: Some(appointment_id),
        child_id,
        parent_id,
        vaccine_id,
        center_id,
        staff_id,
        scheduled_date: decode_date(&scheduled_date)?,
        scheduled_time: decode_time(&scheduled_time)?,
        status: AppointmentStatus::from_str(&status)
            .map_err(|e| PersistenceError::ReconstructionError(e.to_string()))?,
        batch_id,
        verification_code_hash,
        cancellation_reason,
    })
}

/// Rebuilds a `VaccinationRecord` from its stored row.
///
/// # Errors
///
/// Returns an error if any stored value cannot be converted back to its
/// domain representation.
pub fn record_from_row(row: RecordRow) -> Result<VaccinationRecord, PersistenceError> {
    let (
        record_id,
        appointment_id,
        child_id,
        vaccine_id,
        staff_id,
        administered_at,
        dose_number,
        batch_number,
        reactions,
        notes,
    ) = row;

    Ok(VaccinationRecord {
        record_id: Some(record_id),
        child_id,
        vaccine_id,
        appointment_id,
        staff_id,
        administered_at,
        dose_number: to_u32(dose_number, "dose_number")?,
        batch_number: BatchNumber::new(&batch_number),
        reactions,
        notes,
    })
}
