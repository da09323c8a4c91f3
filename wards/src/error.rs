use thiserror::Error;

pub const OWN_ELDERS_ONLY: &str = "Guardians can only select their own elders.";
pub const OWN_GUARDIANSHIP_ONLY: &str = "You can only add elders for yourself.";
pub const ADMIN_ONLY_ROLE_CHANGE: &str = "Only administrators can change user roles.";
pub const OWN_PROFILE_ONLY: &str = "You can only edit your own profile.";

/// Rejection raised when an actor reaches outside their access scope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("{message}")]
    PermissionDenied {
        /// Form field the rejection is reported against.
        field: &'static str,
        message: &'static str,
    },
}

impl PolicyError {
    pub fn field(&self) -> &'static str {
        match self {
            PolicyError::PermissionDenied { field, .. } => field,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            PolicyError::PermissionDenied { message, .. } => message,
        }
    }

    pub(crate) fn denied(field: &'static str, message: &'static str) -> Self {
        PolicyError::PermissionDenied { field, message }
    }
}
