// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use vax_audit::Actor;

/// Errors raised while identifying or authorizing a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The caller could not be identified.
    AuthenticationFailed {
        /// Why identification failed.
        reason: String,
    },
    /// The caller lacks the role an action requires.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role the action requires.
        required_role: String,
    },
}

impl std::fmt::Display for AuthError {
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
        }
    }
}

impl std::error::Error for AuthError {}

/// Role of a caller, as asserted by the upstream identity layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Manages reference data and inventory.
    Admin,
    /// Runs appointments at a center.
    Staff,
}

impl Role {
    /// Returns the canonical wire string for this role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Staff => "staff",
        }
    }

    /// Parses a role from its wire string.
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationFailed` for unknown role strings.
    pub fn parse(value: &str) -> Result<Self, AuthError> {
        match value {
            "admin" => Ok(Self::Admin),
            "staff" => Ok(Self::Staff),
            other => Err(AuthError::AuthenticationFailed {
                reason: format!("unknown role '{other}'"),
            }),
        }
    }
}

/// A caller whose identity the upstream gateway has already verified.
///
/// The API layer does not manage sessions; it receives the caller's
/// identity and role with every request and enforces authorization
/// per action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedActor {
    /// Stable identifier of the caller.
    pub id: String,
    /// Role asserted by the identity layer.
    pub role: Role,
    /// Staff row backing the caller, when the caller is clinic staff.
    pub staff_id: Option<i64>,
}

impl AuthenticatedActor {
    /// Creates an actor with the given identity and role.
    #[must_use]
    pub fn new(id: impl Into<String>, role: Role, staff_id: Option<i64>) -> Self {
        Self {
            id: id.into(),
            role,
            staff_id,
        }
    }

    /// Builds the audit-trail actor for this caller.
    #[must_use]
    pub fn audit_actor(&self) -> Actor {
        Actor::new(self.id.clone(), self.role.as_str().to_string())
    }
}

/// Role checks for every mutating action the API exposes.
///
/// Reference-data provisioning and inventory intake are admin-only;
/// appointment lifecycle actions are open to both roles.
pub struct AuthorizationService;

impl AuthorizationService {
    fn require_admin(actor: &AuthenticatedActor, action: &str) -> Result<(), AuthError> {
        match actor.role {
            Role::Admin => Ok(()),
            Role::Staff => Err(AuthError::Unauthorized {
                action: action.to_string(),
                required_role: Role::Admin.as_str().to_string(),
            }),
        }
    }

    /// Checks whether the caller may create or modify reference data.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` when the caller is not an admin.
    pub fn authorize_manage_reference_data(actor: &AuthenticatedActor) -> Result<(), AuthError> {
        Self::require_admin(actor, "manage reference data")
    }

    /// Checks whether the caller may record a batch receipt.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` when the caller is not an admin.
    pub fn authorize_receive_batch(actor: &AuthenticatedActor) -> Result<(), AuthError> {
        Self::require_admin(actor, "receive an inventory batch")
    }

    /// Checks whether the caller may correct a recorded batch.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` when the caller is not an admin.
    pub fn authorize_correct_batch(actor: &AuthenticatedActor) -> Result<(), AuthError> {
        Self::require_admin(actor, "correct an inventory batch")
    }

    /// Checks whether the caller may import a batch manifest.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` when the caller is not an admin.
    pub fn authorize_import_manifest(actor: &AuthenticatedActor) -> Result<(), AuthError> {
        Self::require_admin(actor, "import a batch manifest")
    }

    /// Checks whether the caller may drive the appointment lifecycle.
    ///
    /// Both roles may schedule, confirm, run, and cancel appointments.
    ///
    /// # Errors
    ///
    /// Currently infallible; kept fallible so new roles slot in without
    /// changing call sites.
    pub fn authorize_appointment_lifecycle(
        _actor: &AuthenticatedActor,
    ) -> Result<(), AuthError> {
        Ok(())
    }
}
