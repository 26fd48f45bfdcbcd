// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::types::BatchNumber;

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Batch number is empty or invalid.
    InvalidBatchNumber(String),
    /// Vaccine name is empty or invalid.
    InvalidName(String),
    /// Doses-per-vial must be positive.
    InvalidDosesPerVial {
        /// The invalid value.
        value: u32,
    },
    /// Doses drawn per administration must be positive.
    InvalidDosesPerAdministration {
        /// The invalid value.
        value: u32,
    },
    /// Vial quantity must be positive.
    InvalidQuantity {
        /// The invalid value.
        value: u32,
    },
    /// The batch shape multiplies past what a dose counter can hold.
    CapacityOverflow {
        /// Vials received.
        quantity: u32,
        /// Doses each vial holds.
        doses_per_vial: u32,
    },
    /// Consumed doses exceed what the batch ever held.
    StockExceedsCapacity {
        /// Doses already consumed from the batch.
        consumed: u32,
        /// Total doses the batch can hold.
        capacity: u32,
    },
    /// Appointment status string is not a valid status.
    InvalidStatus {
        /// The unparseable status value.
        status: String,
    },
    /// The requested status transition is not permitted.
    InvalidStatusTransition {
        /// The current status.
        from: String,
        /// The requested status.
        to: String,
        /// Why the transition is rejected.
        reason: String,
    },
    /// A staff action was attempted on a day other than the scheduled visit day.
    WrongVisitDay {
        /// The date the visit is scheduled for.
        scheduled_date: time::Date,
        /// The date the action was attempted.
        attempted_date: time::Date,
    },
    /// No eligible batch satisfies the request.
    InsufficientInventory {
        /// The vaccine name.
        vaccine: String,
        /// The center name.
        center: String,
    },
    /// A more depleted usable batch exists and should be consumed first.
    PreferOtherBatch {
        /// The batch that should be used instead.
        batch_number: BatchNumber,
    },
    /// The bound batch no longer has enough doses at completion time.
    InventoryDepletedSinceCheckIn {
        /// The bound batch.
        batch_number: BatchNumber,
        /// Doses still on hand.
        remaining_doses: u32,
        /// Doses the administration requires.
        required_doses: u32,
    },
    /// The vaccine is not active for administration.
    VaccineInactive {
        /// The vaccine name.
        vaccine: String,
    },
    /// The presented verification code does not match the booking code.
    InvalidVerificationCode,
    /// Cancellation requires a non-empty reason.
    MissingCancellationReason,
    /// A batch is already bound to the appointment.
    BatchAlreadyBound {
        /// The bound batch.
        batch_number: BatchNumber,
    },
    /// The supplied batch number does not match the batch bound at check-in.
    BatchMismatch {
        /// The batch number supplied with the request.
        supplied: BatchNumber,
        /// The batch bound to the appointment.
        bound: BatchNumber,
    },
    /// No batch is bound and no batch number was supplied.
    NoBatchBound,
    /// An explicit dose number collides with an already-recorded dose.
    DoseNumberConflict {
        /// The dose number supplied by the caller.
        supplied: u32,
        /// The next dose number derived from existing records.
        computed: u32,
    },
    /// Timezone name is not a valid IANA identifier.
    InvalidTimezone(String),
    /// Failed to parse date from string.
    DateParseError {
        /// The invalid date string.
        date_string: String,
        /// The parsing error message.
        error: String,
    },
    /// A calendar value fell outside the representable range.
    DateOutOfRange {
        /// Description of the conversion that failed.
        reason: String,
    },
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBatchNumber(msg) => write!(f, "Invalid batch number: {msg}"),
            Self::InvalidName(msg) => write!(f, "Invalid name: {msg}"),
            Self::InvalidDosesPerVial { value } => {
                write!(f, "Invalid doses per vial: {value}. Must be greater than 0")
            }
            Self::InvalidDosesPerAdministration { value } => {
                write!(
                    f,
                    "Invalid doses per administration: {value}. Must be greater than 0"
                )
            }
            Self::InvalidQuantity { value } => {
                write!(f, "Invalid vial quantity: {value}. Must be greater than 0")
            }
            Self::CapacityOverflow {
                quantity,
                doses_per_vial,
            } => {
                write!(
                    f,
                    "Batch capacity overflows: {quantity} vial(s) of {doses_per_vial} dose(s) exceeds the representable dose count"
                )
            }
            Self::StockExceedsCapacity { consumed, capacity } => {
                write!(
                    f,
                    "Consumed doses ({consumed}) exceed batch capacity ({capacity})"
                )
            }
            Self::InvalidStatus { status } => {
                write!(f, "Invalid appointment status: {status}")
            }
            Self::InvalidStatusTransition { from, to, reason } => {
                write!(f, "Cannot transition from '{from}' to '{to}': {reason}")
            }
            Self::WrongVisitDay {
                scheduled_date,
                attempted_date,
            } => {
                write!(
                    f,
                    "Visit is scheduled for {scheduled_date}, not {attempted_date}"
                )
            }
            Self::InsufficientInventory { vaccine, center } => {
                write!(
                    f,
                    "No eligible batch with sufficient doses for vaccine '{vaccine}' at center '{center}'"
                )
            }
            Self::PreferOtherBatch { batch_number } => {
                write!(
                    f,
                    "Batch '{}' is already open and must be consumed first",
                    batch_number.value()
                )
            }
            Self::InventoryDepletedSinceCheckIn {
                batch_number,
                remaining_doses,
                required_doses,
            } => {
                write!(
                    f,
                    "Batch '{}' has {remaining_doses} dose(s) left but {required_doses} are required; stock moved since check-in",
                    batch_number.value()
                )
            }
            Self::VaccineInactive { vaccine } => {
                write!(f, "Vaccine '{vaccine}' is not active for administration")
            }
            Self::InvalidVerificationCode => {
                write!(f, "Verification code does not match the code issued at booking")
            }
            Self::MissingCancellationReason => {
                write!(f, "Cancellation requires a non-empty reason")
            }
            Self::BatchAlreadyBound { batch_number } => {
                write!(
                    f,
                    "Appointment is already bound to batch '{}'",
                    batch_number.value()
                )
            }
            Self::BatchMismatch { supplied, bound } => {
                write!(
                    f,
                    "Supplied batch '{}' does not match bound batch '{}'",
                    supplied.value(),
                    bound.value()
                )
            }
            Self::NoBatchBound => {
                write!(
                    f,
                    "No batch is bound to the appointment and no batch number was supplied"
                )
            }
            Self::DoseNumberConflict { supplied, computed } => {
                write!(
                    f,
                    "Dose number {supplied} conflicts with recorded history; next dose is {computed}"
                )
            }
            Self::InvalidTimezone(tz) => write!(f, "Invalid timezone: {tz}"),
            Self::DateParseError { date_string, error } => {
                write!(f, "Failed to parse date '{date_string}': {error}")
            }
            Self::DateOutOfRange { reason } => {
                write!(f, "Date out of range while {reason}")
            }
        }
    }
}

impl std::error::Error for DomainError {}
