// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Dose accounting for vaccine inventory batches.
//!
//! All derived stock counters in the system come from one pure calculation
//! over the total-doses model: every mutation site derives counters here
//! instead of adjusting them in place, so the ledger invariant
//! `remaining_doses == remaining_full_vials * doses_per_vial + open_vial_doses`
//! holds by construction.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::Date;

/// Derived stock counters for a single inventory batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    /// Total doses still on hand.
    remaining_doses: u32,
    /// Unopened vials still on hand.
    remaining_full_vials: u32,
    /// Doses left in the currently open vial, if any.
    open_vial_doses: u32,
}

impl StockLevel {
    /// Derives the stock counters from the total-doses model.
    ///
    /// # Arguments
    ///
    /// * `quantity` - Vials originally received
    /// * `doses_per_vial` - Doses each vial holds
    /// * `doses_consumed` - Doses drawn from the batch so far
    ///
    /// # Returns
    ///
    /// The derived counters.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `quantity` or `doses_per_vial` is zero
    /// - the batch capacity overflows the dose counter
    /// - `doses_consumed` exceeds the batch capacity
    pub fn derive(
        quantity: u32,
        doses_per_vial: u32,
        doses_consumed: u32,
    ) -> Result<Self, DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity { value: quantity });
        }
        if doses_per_vial == 0 {
            return Err(DomainError::InvalidDosesPerVial {
                value: doses_per_vial,
            });
        }

        let capacity: u32 = match Self::capacity(quantity, doses_per_vial) {
            Ok(capacity) => capacity,
            Err(e) => return Err(e),
        };
        if doses_consumed > capacity {
            return Err(DomainError::StockExceedsCapacity {
                consumed: doses_consumed,
                capacity,
            });
        }

        let remaining_doses: u32 = capacity - doses_consumed;

        Ok(Self {
            remaining_doses,
            remaining_full_vials: remaining_doses / doses_per_vial,
            open_vial_doses: remaining_doses % doses_per_vial,
        })
    }

    /// Returns the total doses a batch of this shape can hold.
    ///
    /// Every capacity computation in the system goes through this check, so
    /// a batch whose shape does not fit a `u32` dose counter is rejected at
    /// the edge instead of wrapping silently.
    ///
    /// # Errors
    ///
    /// Returns an error if `quantity * doses_per_vial` overflows.
    pub const fn capacity(quantity: u32, doses_per_vial: u32) -> Result<u32, DomainError> {
        match quantity.checked_mul(doses_per_vial) {
            Some(capacity) => Ok(capacity),
            None => Err(DomainError::CapacityOverflow {
                quantity,
                doses_per_vial,
            }),
        }
    }

    /// Returns the total doses still on hand.
    #[must_use]
    pub const fn remaining_doses(&self) -> u32 {
        self.remaining_doses
    }

    /// Returns the count of unopened vials.
    #[must_use]
    pub const fn remaining_full_vials(&self) -> u32 {
        self.remaining_full_vials
    }

    /// Returns the doses left in the currently open vial.
    #[must_use]
    pub const fn open_vial_doses(&self) -> u32 {
        self.open_vial_doses
    }

    /// Returns true if any vial has been opened but not exhausted.
    #[must_use]
    pub const fn has_open_vial(&self) -> bool {
        self.open_vial_doses > 0
    }

    /// Returns true if the batch has no doses left.
    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        self.remaining_doses == 0
    }

    /// Returns true if this stock level is strictly more depleted than `other`.
    ///
    /// Ordering is lexicographic: fewer remaining full vials, or equal full
    /// vials and fewer remaining doses. A batch with more full vials is never
    /// considered more depleted, regardless of loose doses.
    #[must_use]
    pub const fn more_depleted_than(&self, other: &Self) -> bool {
        self.remaining_full_vials < other.remaining_full_vials
            || (self.remaining_full_vials == other.remaining_full_vials
                && self.remaining_doses < other.remaining_doses)
    }
}

/// Stock status for an inventory batch.
///
/// Status is always derived from the counters and expiry date; it is never
/// settable independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Usable stock on hand
    Active,
    /// At most one vial's worth of doses left
    LowStock,
    /// No doses left
    OutOfStock,
    /// Past the expiry date
    Expired,
}

impl BatchStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::LowStock => "low_stock",
            Self::OutOfStock => "out_of_stock",
            Self::Expired => "expired",
        }
    }

    /// Parses a status from its string representation.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStatus` if the string is not a valid status.
    fn parse_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "active" => Ok(Self::Active),
            "low_stock" => Ok(Self::LowStock),
            "out_of_stock" => Ok(Self::OutOfStock),
            "expired" => Ok(Self::Expired),
            _ => Err(DomainError::InvalidStatus {
                status: s.to_string(),
            }),
        }
    }
}

impl FromStr for BatchStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Derives the batch status from stock counters and the expiry date.
///
/// Expiry dominates the stock counters; a batch past its expiry date is
/// `Expired` even with doses on hand.
///
/// # Arguments
///
/// * `stock` - The derived stock counters
/// * `doses_per_vial` - Doses each vial holds
/// * `expiry_date` - The batch expiry date
/// * `as_of` - The date to evaluate expiry against
#[must_use]
pub fn derive_batch_status(
    stock: &StockLevel,
    doses_per_vial: u32,
    expiry_date: Date,
    as_of: Date,
) -> BatchStatus {
    if expiry_date < as_of {
        BatchStatus::Expired
    } else if stock.is_depleted() {
        BatchStatus::OutOfStock
    } else if stock.remaining_doses() <= doses_per_vial {
        BatchStatus::LowStock
    } else {
        BatchStatus::Active
    }
}
