//! Ownership and role rules applied when elders and profiles are written.

use serde::Serialize;

use crate::error::{
    PolicyError, ADMIN_ONLY_ROLE_CHANGE, OWN_GUARDIANSHIP_ONLY, OWN_PROFILE_ONLY,
};
use crate::role::Role;
use crate::scope::{Actor, UserId};

/// How the guardian field of the elder form behaves for an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum GuardianChoices {
    AnyUser,
    #[serde(rename_all = "camelCase")]
    OnlySelf { user_id: UserId },
}

impl GuardianChoices {
    pub fn for_actor(actor: &Actor) -> Self {
        if actor.is_admin() {
            GuardianChoices::AnyUser
        } else {
            GuardianChoices::OnlySelf {
                user_id: actor.user_id,
            }
        }
    }

    pub fn editable(&self) -> bool {
        matches!(self, GuardianChoices::AnyUser)
    }

    pub fn help_text(&self) -> Option<&'static str> {
        match self {
            GuardianChoices::AnyUser => None,
            GuardianChoices::OnlySelf { .. } => Some(OWN_GUARDIANSHIP_ONLY),
        }
    }
}

/// Guardian for a new elder. Omitting the field defaults to the actor.
pub fn assign_guardian(actor: &Actor, requested: Option<UserId>) -> Result<UserId, PolicyError> {
    let guardian = requested.unwrap_or(actor.user_id);
    if actor.is_admin() || guardian == actor.user_id {
        Ok(guardian)
    } else {
        Err(PolicyError::denied("guardian", OWN_GUARDIANSHIP_ONLY))
    }
}

/// Guardian for an elder being edited. Only an admin may move an elder to
/// another guardian.
pub fn reassign_guardian(
    actor: &Actor,
    current: UserId,
    requested: Option<UserId>,
) -> Result<UserId, PolicyError> {
    match requested {
        None => Ok(current),
        Some(guardian) if guardian == current || actor.is_admin() => Ok(guardian),
        Some(_) => Err(PolicyError::denied("guardian", OWN_GUARDIANSHIP_ONLY)),
    }
}

/// Non-admins may keep a profile's role but never change it.
pub fn authorize_role_change(
    actor: &Actor,
    current: Role,
    requested: Role,
) -> Result<(), PolicyError> {
    if current == requested || actor.is_admin() {
        Ok(())
    } else {
        Err(PolicyError::denied("role", ADMIN_ONLY_ROLE_CHANGE))
    }
}

pub fn authorize_profile_edit(actor: &Actor, target: UserId) -> Result<(), PolicyError> {
    if actor.user_id == target || actor.is_admin() {
        Ok(())
    } else {
        Err(PolicyError::denied("user", OWN_PROFILE_ONLY))
    }
}

/// Role a self-registering user ends up with. Administrators are provisioned
/// out of band.
pub fn registration_role(requested: Option<Role>) -> Result<Role, PolicyError> {
    match requested.unwrap_or(Role::Caregiver) {
        Role::Admin => Err(PolicyError::denied("role", ADMIN_ONLY_ROLE_CHANGE)),
        role => Ok(role),
    }
}
