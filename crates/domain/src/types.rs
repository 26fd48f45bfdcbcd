// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::appointment_status::AppointmentStatus;
use crate::error::DomainError;
use crate::stock::{BatchStatus, StockLevel, derive_batch_status};
use serde::{Deserialize, Serialize};
use time::{Date, Time};

/// Represents a vaccine batch number.
///
/// Batch numbers identify one received lot within a vaccine and center.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchNumber {
    /// The batch number value.
    value: String,
}

impl BatchNumber {
    /// Creates a new `BatchNumber`.
    ///
    /// Batch numbers are normalized to uppercase to ensure case-insensitive
    /// uniqueness within a vaccine and center.
    ///
    /// # Arguments
    ///
    /// * `value` - The batch number (will be normalized to uppercase)
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self {
            value: value.trim().to_uppercase(),
        }
    }

    /// Returns the batch number value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Display for BatchNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Represents a vaccine in the immunization schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vaccine {
    /// The canonical numeric identifier assigned by the database.
    /// `None` indicates the vaccine has not been persisted yet.
    vaccine_id: Option<i64>,
    /// The vaccine name (e.g., "BCG", "Measles-Rubella").
    name: String,
    /// Doses drawn from a vial for one administration.
    doses_per_administration: u32,
    /// Whether the vaccine may currently be administered.
    active: bool,
}

impl Vaccine {
    /// Creates a new `Vaccine` without a persisted ID.
    #[must_use]
    pub const fn new(name: String, doses_per_administration: u32, active: bool) -> Self {
        Self {
            vaccine_id: None,
            name,
            doses_per_administration,
            active,
        }
    }

    /// Creates a `Vaccine` with an existing persisted ID.
    #[must_use]
    pub const fn with_id(
        vaccine_id: i64,
        name: String,
        doses_per_administration: u32,
        active: bool,
    ) -> Self {
        Self {
            vaccine_id: Some(vaccine_id),
            name,
            doses_per_administration,
            active,
        }
    }

    /// Returns the canonical numeric identifier if persisted.
    #[must_use]
    pub const fn vaccine_id(&self) -> Option<i64> {
        self.vaccine_id
    }

    /// Returns the vaccine name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the doses one administration draws from a vial.
    #[must_use]
    pub const fn doses_per_administration(&self) -> u32 {
        self.doses_per_administration
    }

    /// Returns whether the vaccine may currently be administered.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }
}

/// Represents a vaccination center.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Center {
    /// The canonical numeric identifier assigned by the database.
    center_id: Option<i64>,
    /// The center name.
    name: String,
}

impl Center {
    /// Creates a new `Center` without a persisted ID.
    #[must_use]
    pub const fn new(name: String) -> Self {
        Self {
            center_id: None,
            name,
        }
    }

    /// Creates a `Center` with an existing persisted ID.
    #[must_use]
    pub const fn with_id(center_id: i64, name: String) -> Self {
        Self {
            center_id: Some(center_id),
            name,
        }
    }

    /// Returns the canonical numeric identifier if persisted.
    #[must_use]
    pub const fn center_id(&self) -> Option<i64> {
        self.center_id
    }

    /// Returns the center name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Represents a child in the immunization registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Child {
    /// The canonical numeric identifier assigned by the database.
    child_id: Option<i64>,
    /// The child's name.
    name: String,
    /// The registered parent or guardian.
    parent_id: i64,
    /// Date of birth.
    date_of_birth: Date,
}

impl Child {
    /// Creates a new `Child` without a persisted ID.
    #[must_use]
    pub const fn new(name: String, parent_id: i64, date_of_birth: Date) -> Self {
        Self {
            child_id: None,
            name,
            parent_id,
            date_of_birth,
        }
    }

    /// Creates a `Child` with an existing persisted ID.
    #[must_use]
    pub const fn with_id(child_id: i64, name: String, parent_id: i64, date_of_birth: Date) -> Self {
        Self {
            child_id: Some(child_id),
            name,
            parent_id,
            date_of_birth,
        }
    }

    /// Returns the canonical numeric identifier if persisted.
    #[must_use]
    pub const fn child_id(&self) -> Option<i64> {
        self.child_id
    }

    /// Returns the child's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the registered parent or guardian.
    #[must_use]
    pub const fn parent_id(&self) -> i64 {
        self.parent_id
    }

    /// Returns the date of birth.
    #[must_use]
    pub const fn date_of_birth(&self) -> Date {
        self.date_of_birth
    }
}

/// Represents a staff member at a vaccination center.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staff {
    /// The canonical numeric identifier assigned by the database.
    staff_id: Option<i64>,
    /// The staff member's name.
    name: String,
    /// The center the staff member works at.
    center_id: i64,
}

impl Staff {
    /// Creates a new `Staff` without a persisted ID.
    #[must_use]
    pub const fn new(name: String, center_id: i64) -> Self {
        Self {
            staff_id: None,
            name,
            center_id,
        }
    }

    /// Creates a `Staff` with an existing persisted ID.
    #[must_use]
    pub const fn with_id(staff_id: i64, name: String, center_id: i64) -> Self {
        Self {
            staff_id: Some(staff_id),
            name,
            center_id,
        }
    }

    /// Returns the canonical numeric identifier if persisted.
    #[must_use]
    pub const fn staff_id(&self) -> Option<i64> {
        self.staff_id
    }

    /// Returns the staff member's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the center the staff member works at.
    #[must_use]
    pub const fn center_id(&self) -> i64 {
        self.center_id
    }
}

/// Represents one scheduled dose visit.
///
/// The verification code issued at booking is stored only as a hash; the
/// plaintext is communicated to the parent out-of-band and compared at
/// completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    /// The canonical numeric identifier assigned by the database.
    pub appointment_id: Option<i64>,
    /// The child receiving the dose.
    pub child_id: i64,
    /// The parent or guardian who booked the visit.
    pub parent_id: i64,
    /// The vaccine to administer.
    pub vaccine_id: i64,
    /// The center where the visit takes place.
    pub center_id: i64,
    /// Staff member who owns the visit. Assigned at start-visit or check-in.
    pub staff_id: Option<i64>,
    /// The scheduled visit date.
    pub scheduled_date: Date,
    /// The scheduled visit time.
    pub scheduled_time: Time,
    /// Current lifecycle status.
    pub status: AppointmentStatus,
    /// Inventory batch bound at check-in. Set exactly once.
    pub batch_id: Option<i64>,
    /// Hash of the one-time verification code issued at booking.
    pub verification_code_hash: String,
    /// Reason recorded when the appointment is cancelled.
    pub cancellation_reason: Option<String>,
}

impl Appointment {
    /// Creates a new `Appointment` in the `Scheduled` state.
    ///
    /// # Arguments
    ///
    /// * `child_id` - The child receiving the dose
    /// * `parent_id` - The booking parent or guardian
    /// * `vaccine_id` - The vaccine to administer
    /// * `center_id` - The center where the visit takes place
    /// * `scheduled_date` - The visit date
    /// * `scheduled_time` - The visit time
    /// * `verification_code_hash` - Hash of the code issued at booking
    #[must_use]
    pub const fn new(
        child_id: i64,
        parent_id: i64,
        vaccine_id: i64,
        center_id: i64,
        scheduled_date: Date,
        scheduled_time: Time,
        verification_code_hash: String,
    ) -> Self {
        Self {
            appointment_id: None,
            child_id,
            parent_id,
            vaccine_id,
            center_id,
            staff_id: None,
            scheduled_date,
            scheduled_time,
            status: AppointmentStatus::Scheduled,
            batch_id: None,
            verification_code_hash,
            cancellation_reason: None,
        }
    }
}

/// Represents one physically received lot of a vaccine at one center.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryBatch {
    /// The canonical numeric identifier assigned by the database.
    pub batch_id: Option<i64>,
    /// The vaccine this batch holds.
    pub vaccine_id: i64,
    /// The center that received the batch.
    pub center_id: i64,
    /// The manufacturer batch number, unique within vaccine and center.
    pub batch_number: BatchNumber,
    /// Doses each vial holds.
    pub doses_per_vial: u32,
    /// Vials originally received.
    pub quantity: u32,
    /// Derived stock counters.
    pub stock: StockLevel,
    /// Expiry date.
    pub expiry_date: Date,
    /// Manufacturing date.
    pub manufacturing_date: Date,
    /// Derived status.
    pub status: BatchStatus,
}

impl InventoryBatch {
    /// Creates a freshly received `InventoryBatch` with no doses consumed.
    ///
    /// Counters and status are derived, never supplied.
    ///
    /// # Errors
    ///
    /// Returns an error if `quantity` or `doses_per_vial` is zero.
    #[allow(clippy::too_many_arguments)]
    pub fn receive(
        vaccine_id: i64,
        center_id: i64,
        batch_number: BatchNumber,
        doses_per_vial: u32,
        quantity: u32,
        expiry_date: Date,
        manufacturing_date: Date,
        received_on: Date,
    ) -> Result<Self, DomainError> {
        let stock: StockLevel = StockLevel::derive(quantity, doses_per_vial, 0)?;
        let status: BatchStatus =
            derive_batch_status(&stock, doses_per_vial, expiry_date, received_on);

        Ok(Self {
            batch_id: None,
            vaccine_id,
            center_id,
            batch_number,
            doses_per_vial,
            quantity,
            stock,
            expiry_date,
            manufacturing_date,
            status,
        })
    }

    /// Returns the doses drawn from this batch so far.
    ///
    /// A batch constructed through `StockLevel::derive` always has an
    /// in-range capacity; a fabricated shape that overflows reports full
    /// consumption so any rederivation rejects it.
    #[must_use]
    pub fn doses_consumed(&self) -> u32 {
        match StockLevel::capacity(self.quantity, self.doses_per_vial) {
            Ok(capacity) => capacity.saturating_sub(self.stock.remaining_doses()),
            Err(_) => u32::MAX,
        }
    }

    /// Returns true if the batch is expired as of the given date.
    #[must_use]
    pub fn is_expired(&self, as_of: Date) -> bool {
        self.expiry_date < as_of
    }

    /// Returns true if the batch can supply `required_doses` for a visit on
    /// `visit_date`: not expired and enough doses on hand.
    #[must_use]
    pub fn is_usable(&self, required_doses: u32, visit_date: Date) -> bool {
        !self.is_expired(visit_date) && self.stock.remaining_doses() >= required_doses
    }
}

/// Administrative correction for an inventory batch.
///
/// Fields left as `None` are unchanged. Counters and status are always
/// recomputed from the corrected capacity and the doses already consumed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCorrection {
    /// Corrected vial quantity.
    pub quantity: Option<u32>,
    /// Corrected doses-per-vial.
    pub doses_per_vial: Option<u32>,
    /// Corrected expiry date.
    pub expiry_date: Option<Date>,
    /// Corrected manufacturing date.
    pub manufacturing_date: Option<Date>,
}

impl BatchCorrection {
    /// Returns true if the correction changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.quantity.is_none()
            && self.doses_per_vial.is_none()
            && self.expiry_date.is_none()
            && self.manufacturing_date.is_none()
    }

    /// Applies the correction to a batch, rederiving counters and status.
    ///
    /// Doses already consumed are preserved; a correction that shrinks the
    /// batch below what was already consumed is rejected.
    ///
    /// # Arguments
    ///
    /// * `batch` - The batch to correct
    /// * `as_of` - The date to evaluate the corrected status against
    ///
    /// # Errors
    ///
    /// Returns an error if the corrected capacity is invalid or smaller than
    /// the consumed dose count.
    pub fn apply(&self, batch: &InventoryBatch, as_of: Date) -> Result<InventoryBatch, DomainError> {
        let consumed: u32 = batch.doses_consumed();
        let quantity: u32 = self.quantity.unwrap_or(batch.quantity);
        let doses_per_vial: u32 = self.doses_per_vial.unwrap_or(batch.doses_per_vial);
        let expiry_date: Date = self.expiry_date.unwrap_or(batch.expiry_date);
        let manufacturing_date: Date = self.manufacturing_date.unwrap_or(batch.manufacturing_date);

        let stock: StockLevel = StockLevel::derive(quantity, doses_per_vial, consumed)?;
        let status: BatchStatus = derive_batch_status(&stock, doses_per_vial, expiry_date, as_of);

        Ok(InventoryBatch {
            batch_id: batch.batch_id,
            vaccine_id: batch.vaccine_id,
            center_id: batch.center_id,
            batch_number: batch.batch_number.clone(),
            doses_per_vial,
            quantity,
            stock,
            expiry_date,
            manufacturing_date,
            status,
        })
    }
}

/// An immutable record proving a dose was administered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaccinationRecord {
    /// The canonical numeric identifier assigned by the database.
    pub record_id: Option<i64>,
    /// The child who received the dose.
    pub child_id: i64,
    /// The vaccine administered.
    pub vaccine_id: i64,
    /// The appointment this record completes.
    pub appointment_id: i64,
    /// The staff member who administered the dose.
    pub staff_id: i64,
    /// When the dose was administered, ISO 8601.
    pub administered_at: String,
    /// 1-based ordinal of this vaccine's administration for the child.
    pub dose_number: u32,
    /// Snapshot of the consumed batch's number.
    pub batch_number: BatchNumber,
    /// Observed adverse reactions, if any.
    pub reactions: Option<String>,
    /// Free-form administration notes.
    pub notes: Option<String>,
}
