// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Inventory batch mutations.
//!
//! Batch rows store the derived stock counters denormalized alongside the
//! capacity fields; both inserts and corrections write counters that were
//! derived in the domain layer, never caller-supplied numbers.

use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::{MysqlConnection, SqliteConnection};
use tracing::info;
use vax_audit::AuditEvent;
use vax_domain::InventoryBatch;

use crate::backend::PersistenceBackend;
use crate::data_models::encode_date;
use crate::diesel_schema::inventory_batches;
use crate::error::PersistenceError;
use crate::mutations::audit::{persist_audit_event_mysql, persist_audit_event_sqlite};

fn to_i32(value: u32, what: &str) -> Result<i32, PersistenceError> {
    i32::try_from(value)
        .map_err(|_| PersistenceError::Other(format!("{what} out of range: {value}")))
}

backend_fn! {
/// Inserts a freshly received inventory batch.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `batch` - The batch to insert, with counters already derived
///
/// # Returns
///
/// The batch ID assigned by the database.
///
/// # Errors
///
/// Returns `DuplicateBatch` if a batch with the same number already exists
/// for the vaccine and center, or another error if the insert fails.
pub fn insert_batch(
    conn: &mut _,
    batch: &InventoryBatch,
) -> Result<i64, PersistenceError> {
    let result = diesel::insert_into(inventory_batches::table)
        .values((
            inventory_batches::vaccine_id.eq(batch.vaccine_id),
            inventory_batches::center_id.eq(batch.center_id),
            inventory_batches::batch_number.eq(batch.batch_number.value()),
            inventory_batches::doses_per_vial.eq(to_i32(batch.doses_per_vial, "doses_per_vial")?),
            inventory_batches::quantity.eq(to_i32(batch.quantity, "quantity")?),
            inventory_batches::remaining_doses
                .eq(to_i32(batch.stock.remaining_doses(), "remaining_doses")?),
            inventory_batches::remaining_full_vials
                .eq(to_i32(batch.stock.remaining_full_vials(), "remaining_full_vials")?),
            inventory_batches::open_vial_doses
                .eq(to_i32(batch.stock.open_vial_doses(), "open_vial_doses")?),
            inventory_batches::expiry_date.eq(encode_date(batch.expiry_date)),
            inventory_batches::manufacturing_date.eq(encode_date(batch.manufacturing_date)),
            inventory_batches::status.eq(batch.status.as_str()),
        ))
        .execute(conn);

    match result {
        Ok(_) => {}
        Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
            return Err(PersistenceError::DuplicateBatch {
                batch_number: batch.batch_number.value().to_string(),
            });
        }
        Err(e) => return Err(PersistenceError::from(e)),
    }

    let batch_id: i64 = conn.get_last_insert_rowid()?;

    info!(
        batch_id,
        batch_number = %batch.batch_number,
        vaccine_id = batch.vaccine_id,
        center_id = batch.center_id,
        "Received inventory batch"
    );

    Ok(batch_id)
}
}

backend_fn! {
/// Rewrites a batch's capacity fields, counters, and status after an
/// administrative correction.
///
/// # Errors
///
/// Returns an error if the batch does not exist or the update fails.
pub fn update_batch(
    conn: &mut _,
    batch_id: i64,
    batch: &InventoryBatch,
) -> Result<(), PersistenceError> {
    let updated: usize = diesel::update(inventory_batches::table)
        .filter(inventory_batches::batch_id.eq(batch_id))
        .set((
            inventory_batches::doses_per_vial.eq(to_i32(batch.doses_per_vial, "doses_per_vial")?),
            inventory_batches::quantity.eq(to_i32(batch.quantity, "quantity")?),
            inventory_batches::remaining_doses
                .eq(to_i32(batch.stock.remaining_doses(), "remaining_doses")?),
            inventory_batches::remaining_full_vials
                .eq(to_i32(batch.stock.remaining_full_vials(), "remaining_full_vials")?),
            inventory_batches::open_vial_doses
                .eq(to_i32(batch.stock.open_vial_doses(), "open_vial_doses")?),
            inventory_batches::expiry_date.eq(encode_date(batch.expiry_date)),
            inventory_batches::manufacturing_date.eq(encode_date(batch.manufacturing_date)),
            inventory_batches::status.eq(batch.status.as_str()),
        ))
        .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::NotFound(format!(
            "Batch {batch_id} does not exist"
        )));
    }

    info!(batch_id, batch_number = %batch.batch_number, "Corrected inventory batch");

    Ok(())
}
}

/// Inserts a received batch and its audit event atomically (`SQLite`
/// version).
///
/// # Returns
///
/// The batch ID and event ID assigned by the database.
///
/// # Errors
///
/// Returns `DuplicateBatch` on a batch-number collision, or another error
/// if either write fails; the transaction rolls back.
pub fn record_batch_receipt_sqlite(
    conn: &mut SqliteConnection,
    batch: &InventoryBatch,
    event: &AuditEvent,
) -> Result<(i64, i64), PersistenceError> {
    conn.transaction::<(i64, i64), PersistenceError, _>(|conn| {
        let batch_id: i64 = insert_batch_sqlite(conn, batch)?;
        let event_id: i64 = persist_audit_event_sqlite(conn, event)?;
        Ok((batch_id, event_id))
    })
}

/// Inserts a received batch and its audit event atomically (`MySQL`
/// version).
///
/// # Returns
///
/// The batch ID and event ID assigned by the database.
///
/// # Errors
///
/// Returns `DuplicateBatch` on a batch-number collision, or another error
/// if either write fails; the transaction rolls back.
pub fn record_batch_receipt_mysql(
    conn: &mut MysqlConnection,
    batch: &InventoryBatch,
    event: &AuditEvent,
) -> Result<(i64, i64), PersistenceError> {
    conn.transaction::<(i64, i64), PersistenceError, _>(|conn| {
        let batch_id: i64 = insert_batch_mysql(conn, batch)?;
        let event_id: i64 = persist_audit_event_mysql(conn, event)?;
        Ok((batch_id, event_id))
    })
}

/// Applies a batch correction and its audit event atomically (`SQLite`
/// version).
///
/// # Returns
///
/// The event ID assigned by the database.
///
/// # Errors
///
/// Returns an error if the batch does not exist or either write fails; the
/// transaction rolls back.
pub fn record_batch_correction_sqlite(
    conn: &mut SqliteConnection,
    batch_id: i64,
    batch: &InventoryBatch,
    event: &AuditEvent,
) -> Result<i64, PersistenceError> {
    conn.transaction::<i64, PersistenceError, _>(|conn| {
        update_batch_sqlite(conn, batch_id, batch)?;
        persist_audit_event_sqlite(conn, event)
    })
}

/// Applies a batch correction and its audit event atomically (`MySQL`
/// version).
///
/// # Returns
///
/// The event ID assigned by the database.
///
/// # Errors
///
/// Returns an error if the batch does not exist or either write fails; the
/// transaction rolls back.
pub fn record_batch_correction_mysql(
    conn: &mut MysqlConnection,
    batch_id: i64,
    batch: &InventoryBatch,
    event: &AuditEvent,
) -> Result<i64, PersistenceError> {
    conn.transaction::<i64, PersistenceError, _>(|conn| {
        update_batch_mysql(conn, batch_id, batch)?;
        persist_audit_event_mysql(conn, event)
    })
}
