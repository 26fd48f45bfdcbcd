// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Batch selection and the open-vial policy guard.
//!
//! Selection is exact-match on the operator-chosen batch; the guard is what
//! enforces expiry and spoilage discipline. The guard rejects a candidate
//! whenever a strictly more depleted usable sibling exists, so partially
//! consumed vials are exhausted before a fresh batch is opened.

use crate::error::CoreError;
use time::Date;
use vax_domain::{Center, DomainError, InventoryBatch, Vaccine};

/// Validates the operator-chosen batch against stock on hand.
///
/// The candidate is the batch matching the staff-supplied batch number at the
/// appointment's center, or `None` if no such batch exists. `siblings` are
/// the other batches of the same vaccine at the same center.
///
/// # Arguments
///
/// * `candidate` - The batch matching the supplied batch number, if any
/// * `siblings` - Other batches for the same vaccine and center
/// * `vaccine` - The vaccine to administer
/// * `center` - The center the visit takes place at
/// * `visit_date` - The scheduled visit date, used for expiry checks
///
/// # Returns
///
/// The approved batch.
///
/// # Errors
///
/// Returns `InsufficientInventory` if the candidate is missing, expired for
/// the visit date, or short of doses; `PreferOtherBatch` naming the most
/// depleted usable sibling if one should be consumed first.
pub fn select_batch(
    candidate: Option<InventoryBatch>,
    siblings: &[InventoryBatch],
    vaccine: &Vaccine,
    center: &Center,
    visit_date: Date,
) -> Result<InventoryBatch, CoreError> {
    let required: u32 = vaccine.doses_per_administration();

    let candidate: InventoryBatch = candidate
        .filter(|batch| batch.is_usable(required, visit_date))
        .ok_or_else(|| DomainError::InsufficientInventory {
            vaccine: vaccine.name().to_string(),
            center: center.name().to_string(),
        })?;

    // The guard compares depletion, not expiry: a usable sibling that is
    // strictly more depleted must be consumed before this one is opened.
    let preferred: Option<&InventoryBatch> = siblings
        .iter()
        .filter(|sibling| {
            sibling.batch_number != candidate.batch_number
                && sibling.is_usable(required, visit_date)
                && sibling.stock.more_depleted_than(&candidate.stock)
        })
        .min_by_key(|sibling| {
            (
                sibling.stock.remaining_full_vials(),
                sibling.stock.remaining_doses(),
                sibling.expiry_date,
            )
        });

    if let Some(batch) = preferred {
        return Err(DomainError::PreferOtherBatch {
            batch_number: batch.batch_number.clone(),
        }
        .into());
    }

    Ok(candidate)
}
