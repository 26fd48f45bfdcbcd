// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Inventory batch queries.
//!
//! Batch rows carry denormalized stock counters, but every read rederives
//! the counters from total consumption before handing a batch to callers.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use vax_domain::{BatchNumber, InventoryBatch};

use crate::data_models::{BatchRow, batch_from_row};
use crate::diesel_schema::inventory_batches;
use crate::error::PersistenceError;

type BatchColumns = (
    inventory_batches::batch_id,
    inventory_batches::vaccine_id,
    inventory_batches::center_id,
    inventory_batches::batch_number,
    inventory_batches::doses_per_vial,
    inventory_batches::quantity,
    inventory_batches::remaining_doses,
    inventory_batches::expiry_date,
    inventory_batches::manufacturing_date,
    inventory_batches::status,
);

const BATCH_COLUMNS: BatchColumns = (
    inventory_batches::batch_id,
    inventory_batches::vaccine_id,
    inventory_batches::center_id,
    inventory_batches::batch_number,
    inventory_batches::doses_per_vial,
    inventory_batches::quantity,
    inventory_batches::remaining_doses,
    inventory_batches::expiry_date,
    inventory_batches::manufacturing_date,
    inventory_batches::status,
);

backend_fn! {
/// Retrieves an inventory batch by ID.
///
/// # Errors
///
/// Returns an error if the batch does not exist or cannot be reconstructed.
pub fn get_batch(conn: &mut _, batch_id: i64) -> Result<InventoryBatch, PersistenceError> {
    let result = inventory_batches::table
        .select(BATCH_COLUMNS)
        .filter(inventory_batches::batch_id.eq(batch_id))
        .first::<BatchRow>(conn);

    match result {
        Ok(row) => batch_from_row(row),
        Err(diesel::result::Error::NotFound) => Err(PersistenceError::NotFound(format!(
            "Batch {batch_id} does not exist"
        ))),
        Err(e) => Err(PersistenceError::from(e)),
    }
}
}

backend_fn! {
/// Looks up a batch by its batch number within a vaccine and center.
///
/// Returns `None` when no batch with that number has been received.
///
/// # Errors
///
/// Returns an error if the database cannot be queried or the stored row
/// cannot be reconstructed.
pub fn find_batch_by_number(
    conn: &mut _,
    vaccine_id: i64,
    center_id: i64,
    batch_number: &BatchNumber,
) -> Result<Option<InventoryBatch>, PersistenceError> {
    let result = inventory_batches::table
        .select(BATCH_COLUMNS)
        .filter(inventory_batches::vaccine_id.eq(vaccine_id))
        .filter(inventory_batches::center_id.eq(center_id))
        .filter(inventory_batches::batch_number.eq(batch_number.value()))
        .first::<BatchRow>(conn);

    match result {
        Ok(row) => Ok(Some(batch_from_row(row)?)),
        Err(diesel::result::Error::NotFound) => Ok(None),
        Err(e) => Err(PersistenceError::from(e)),
    }
}
}

backend_fn! {
/// Lists every batch of one vaccine held at one center.
///
/// Ordering is most-depleted-first by the same key the administration-time
/// batch selection uses, so callers can surface the preferred batch without
/// re-sorting.
///
/// # Errors
///
/// Returns an error if the database cannot be queried or a stored row
/// cannot be reconstructed.
pub fn list_batches_for_vaccine_center(
    conn: &mut _,
    vaccine_id: i64,
    center_id: i64,
) -> Result<Vec<InventoryBatch>, PersistenceError> {
    let rows: Vec<BatchRow> = inventory_batches::table
        .select(BATCH_COLUMNS)
        .filter(inventory_batches::vaccine_id.eq(vaccine_id))
        .filter(inventory_batches::center_id.eq(center_id))
        .load::<BatchRow>(conn)?;

    let mut batches: Vec<InventoryBatch> = rows
        .into_iter()
        .map(batch_from_row)
        .collect::<Result<Vec<InventoryBatch>, PersistenceError>>()?;

    batches.sort_by_key(|b| {
        (
            b.stock.remaining_full_vials(),
            b.stock.remaining_doses(),
            b.expiry_date,
        )
    });

    Ok(batches)
}
}

backend_fn! {
/// Lists every batch held at one center, across all vaccines.
///
/// # Errors
///
/// Returns an error if the database cannot be queried or a stored row
/// cannot be reconstructed.
pub fn list_batches_for_center(
    conn: &mut _,
    center_id: i64,
) -> Result<Vec<InventoryBatch>, PersistenceError> {
    let rows: Vec<BatchRow> = inventory_batches::table
        .select(BATCH_COLUMNS)
        .filter(inventory_batches::center_id.eq(center_id))
        .order((
            inventory_batches::vaccine_id.asc(),
            inventory_batches::expiry_date.asc(),
        ))
        .load::<BatchRow>(conn)?;

    rows.into_iter().map(batch_from_row).collect()
}
}
