//! Access policy for eldercare records.
//!
//! Elevated roles (admin, doctor, nurse, caregiver) may reference any elder;
//! everyone else, including users without a profile, only the elders they
//! guard.

pub mod assignment;
pub mod error;
pub mod role;
pub mod scope;

pub use assignment::{
    assign_guardian, authorize_profile_edit, authorize_role_change, reassign_guardian,
    registration_role, GuardianChoices,
};
pub use error::PolicyError;
pub use role::Role;
pub use scope::{
    resolve_scope, validate_elder_choice, AccessScope, Actor, ElderDirectory, ElderId, ElderRef,
    UserId,
};
