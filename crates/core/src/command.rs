// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use vax_domain::BatchNumber;

/// The staff actions the update-status facade accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAction {
    /// Staff opens the visit and takes ownership.
    StartVisit,
    /// Child arrived; bind a vaccine batch to the visit.
    CheckIn,
    /// Administer the dose and close the visit.
    CheckOut,
}

impl StatusAction {
    /// Parses an action from its wire representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "start_visit" => Some(Self::StartVisit),
            "check_in" => Some(Self::CheckIn),
            "check_out" => Some(Self::CheckOut),
            _ => None,
        }
    }

    /// Returns the wire representation of the action.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::StartVisit => "start_visit",
            Self::CheckIn => "check_in",
            Self::CheckOut => "check_out",
        }
    }
}

/// A command represents staff visit-floor intent as data only.
///
/// The update-status facade parses its action string into one of these
/// before dispatching; parent-facing transitions (confirm, cancel,
/// reschedule) have dedicated entry points and never pass through here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Staff opens the visit, taking ownership of the appointment.
    StartVisit {
        /// The appointment to act on.
        appointment_id: i64,
        /// The staff member taking ownership.
        staff_id: i64,
    },
    /// Staff checks the child in, binding an inventory batch.
    CheckIn {
        /// The appointment to act on.
        appointment_id: i64,
        /// The acting staff member.
        staff_id: i64,
        /// The operator-chosen batch.
        batch_number: BatchNumber,
    },
    /// Staff administers the dose and completes the visit.
    Complete {
        /// The appointment to act on.
        appointment_id: i64,
        /// The administering staff member.
        staff_id: i64,
        /// The one-time code presented by the parent.
        verification_code: String,
        /// Observed adverse reactions, if any.
        reactions: Option<String>,
        /// Free-form administration notes.
        notes: Option<String>,
        /// Explicit dose-number override.
        dose_number: Option<u32>,
        /// Batch to consume when none was bound at check-in.
        batch_number: Option<BatchNumber>,
    },
}
