// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Appointment status tracking and transition logic.
//!
//! This module defines the appointment lifecycle states and the single
//! transition table every operation consults. Transitions are actor-initiated
//! only; the system never advances status based on time alone.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Appointment lifecycle states for a single scheduled dose visit.
///
/// The success path is scheduled → (confirmed →) start_visit → check_in →
/// completed. Cancellation is reachable from every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    /// Booked, awaiting the visit day
    Scheduled,
    /// Parent confirmed attendance ahead of the visit
    Confirmed,
    /// Staff opened the visit and took ownership
    StartVisit,
    /// Child arrived; a vaccine batch is bound to the visit
    CheckIn,
    /// Dose administered and recorded
    Completed,
    /// Visit called off with a recorded reason
    Cancelled,
    /// Visit moved to a replacement appointment
    Rescheduled,
}

impl AppointmentStatus {
    /// Returns the string representation of the status.
    ///
    /// This is used for persistence and API serialization.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Confirmed => "confirmed",
            Self::StartVisit => "start_visit",
            Self::CheckIn => "check_in",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Rescheduled => "rescheduled",
        }
    }

    /// Parses a status from its string representation.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStatus` if the string is not a valid status.
    fn parse_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "confirmed" => Ok(Self::Confirmed),
            "start_visit" => Ok(Self::StartVisit),
            "check_in" => Ok(Self::CheckIn),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "rescheduled" => Ok(Self::Rescheduled),
            _ => Err(DomainError::InvalidStatus {
                status: s.to_string(),
            }),
        }
    }

    /// Returns true if this status is terminal (cannot transition to another state).
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Returns true if a staff member performs transitions out of this status
    /// during the visit itself, which subjects them to the visit-day guard.
    #[must_use]
    pub const fn requires_visit_day(&self) -> bool {
        matches!(
            self,
            Self::Scheduled | Self::Confirmed | Self::StartVisit | Self::CheckIn
        )
    }

    /// Validates if a transition from this status to another is permitted.
    ///
    /// # Errors
    ///
    /// Returns an error if the transition is not allowed.
    pub fn validate_transition(&self, new_status: Self) -> Result<(), DomainError> {
        // Cannot transition from terminal states
        if self.is_terminal() {
            return Err(DomainError::InvalidStatusTransition {
                from: self.as_str().to_string(),
                to: new_status.as_str().to_string(),
                reason: "cannot transition from terminal state".to_string(),
            });
        }

        // Valid transitions based on current state
        let valid = match self {
            Self::Scheduled => matches!(
                new_status,
                Self::Confirmed
                    | Self::StartVisit
                    | Self::CheckIn
                    | Self::Rescheduled
                    | Self::Cancelled
            ),
            Self::Confirmed => matches!(
                new_status,
                Self::StartVisit | Self::CheckIn | Self::Rescheduled | Self::Cancelled
            ),
            Self::StartVisit => {
                matches!(new_status, Self::CheckIn | Self::Completed | Self::Cancelled)
            }
            Self::CheckIn => matches!(new_status, Self::Completed | Self::Cancelled),
            // A rescheduled visit lives on in its replacement appointment
            Self::Rescheduled => matches!(new_status, Self::Cancelled),
            Self::Completed | Self::Cancelled => false,
        };

        if valid {
            Ok(())
        } else {
            Err(DomainError::InvalidStatusTransition {
                from: self.as_str().to_string(),
                to: new_status.as_str().to_string(),
                reason: "transition not permitted by appointment lifecycle rules".to_string(),
            })
        }
    }
}

impl FromStr for AppointmentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
