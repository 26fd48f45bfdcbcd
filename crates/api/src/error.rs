// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use vax_domain::DomainError;
use vax_persistence::PersistenceError;
use vaxtrack::CoreError;

use crate::auth::AuthError;

/// Errors returned by API handlers.
///
/// Each variant maps to one HTTP status class in the server layer; the
/// handlers themselves stay transport-agnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The caller could not be identified.
    AuthenticationFailed {
        /// Why authentication failed.
        reason: String,
    },
    /// The caller is identified but not allowed to perform the action.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role the action requires.
        required_role: String,
    },
    /// A domain rule rejected the request.
    DomainRuleViolation {
        /// Short machine-readable rule name.
        rule: String,
        /// Human-readable explanation.
        message: String,
    },
    /// A request field failed validation before any rule was evaluated.
    InvalidInput {
        /// The offending field.
        field: String,
        /// What is wrong with it.
        message: String,
    },
    /// The referenced entity does not exist.
    ResourceNotFound {
        /// The kind of entity looked up.
        resource_type: String,
        /// Which lookup failed.
        message: String,
    },
    /// The entity moved while the request was in flight.
    StateConflict {
        /// What changed underneath the caller.
        message: String,
    },
    /// An uploaded CSV manifest is structurally unreadable.
    InvalidCsvFormat {
        /// Why the file could not be parsed.
        reason: String,
    },
    /// An unexpected internal failure.
    Internal {
        /// Diagnostic message.
        message: String,
    },
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Not authorized to {action}: requires {required_role}")
            }
            Self::DomainRuleViolation { rule, message } => {
                write!(f, "Rule '{rule}' violated: {message}")
            }
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for '{field}': {message}")
            }
            Self::ResourceNotFound {
                resource_type,
                message,
            } => {
                write!(f, "{resource_type} not found: {message}")
            }
            Self::StateConflict { message } => write!(f, "State conflict: {message}"),
            Self::InvalidCsvFormat { reason } => write!(f, "Invalid CSV format: {reason}"),
            Self::Internal { message } => write!(f, "Internal error: {message}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Maps a domain rejection onto the API error surface.
///
/// Pre-rule field validation becomes `InvalidInput`, business-rule
/// rejections become `DomainRuleViolation`, and failures caused by
/// concurrent writers become `StateConflict`.
pub fn translate_domain_error(err: DomainError) -> ApiError {
    let message = err.to_string();
    match err {
        DomainError::InvalidBatchNumber(_) => ApiError::InvalidInput {
            field: "batch_number".to_string(),
            message,
        },
        DomainError::InvalidName(_) => ApiError::InvalidInput {
            field: "name".to_string(),
            message,
        },
        DomainError::InvalidDosesPerVial { .. } => ApiError::InvalidInput {
            field: "doses_per_vial".to_string(),
            message,
        },
        DomainError::InvalidDosesPerAdministration { .. } => ApiError::InvalidInput {
            field: "doses_per_administration".to_string(),
            message,
        },
        DomainError::InvalidQuantity { .. } => ApiError::InvalidInput {
            field: "quantity".to_string(),
            message,
        },
        DomainError::CapacityOverflow { .. } => ApiError::InvalidInput {
            field: "quantity".to_string(),
            message,
        },
        DomainError::InvalidStatus { .. } => ApiError::InvalidInput {
            field: "status".to_string(),
            message,
        },
        DomainError::MissingCancellationReason => ApiError::InvalidInput {
            field: "reason".to_string(),
            message,
        },
        DomainError::DoseNumberConflict { .. } => ApiError::InvalidInput {
            field: "dose_number".to_string(),
            message,
        },
        DomainError::InvalidTimezone(_) => ApiError::InvalidInput {
            field: "timezone".to_string(),
            message,
        },
        DomainError::DateParseError { .. } | DomainError::DateOutOfRange { .. } => {
            ApiError::InvalidInput {
                field: "date".to_string(),
                message,
            }
        }
        DomainError::NoBatchBound => ApiError::InvalidInput {
            field: "batch_number".to_string(),
            message,
        },
        DomainError::StockExceedsCapacity { .. } => ApiError::DomainRuleViolation {
            rule: "stock_within_capacity".to_string(),
            message,
        },
        DomainError::WrongVisitDay { .. } => ApiError::DomainRuleViolation {
            rule: "visit_day".to_string(),
            message,
        },
        DomainError::InsufficientInventory { .. } => ApiError::DomainRuleViolation {
            rule: "sufficient_inventory".to_string(),
            message,
        },
        DomainError::PreferOtherBatch { .. } => ApiError::DomainRuleViolation {
            rule: "open_vial_first".to_string(),
            message,
        },
        DomainError::VaccineInactive { .. } => ApiError::DomainRuleViolation {
            rule: "active_vaccine".to_string(),
            message,
        },
        DomainError::InvalidVerificationCode => ApiError::DomainRuleViolation {
            rule: "verification_code".to_string(),
            message,
        },
        DomainError::BatchMismatch { .. } => ApiError::DomainRuleViolation {
            rule: "bound_batch".to_string(),
            message,
        },
        DomainError::InvalidStatusTransition { .. }
        | DomainError::InventoryDepletedSinceCheckIn { .. }
        | DomainError::BatchAlreadyBound { .. } => ApiError::StateConflict { message },
    }
}

/// Maps a planning failure onto the API error surface.
pub fn translate_core_error(err: CoreError) -> ApiError {
    match err {
        CoreError::DomainViolation(domain) => translate_domain_error(domain),
        CoreError::SnapshotSerialization(message) => ApiError::Internal { message },
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AuthenticationFailed { reason } => Self::AuthenticationFailed { reason },
            AuthError::Unauthorized {
                action,
                required_role,
            } => Self::Unauthorized {
                action,
                required_role,
            },
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        translate_core_error(err)
    }
}

impl From<PersistenceError> for ApiError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::NotFound(message) => Self::ResourceNotFound {
                resource_type: "Record".to_string(),
                message,
            },
            PersistenceError::EventNotFound(id) => Self::ResourceNotFound {
                resource_type: "Audit event".to_string(),
                message: format!("event {id} does not exist"),
            },
            PersistenceError::DuplicateBatch { batch_number } => Self::DomainRuleViolation {
                rule: "unique_batch_number".to_string(),
                message: format!(
                    "Batch '{batch_number}' already exists for this vaccine and center"
                ),
            },
            PersistenceError::Domain(domain) => translate_domain_error(domain),
            other => Self::Internal {
                message: other.to_string(),
            },
        }
    }
}
