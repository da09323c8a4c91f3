//! Role-scoped elder access.
//!
//! Every form that attaches a record to an elder asks the same two questions:
//! which elders may this user pick from, and is the elder they picked one of
//! them. Both answers derive from [`AccessScope::for_actor`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::convert::Infallible;
use std::fmt;

use crate::error::{PolicyError, OWN_ELDERS_ONLY};
use crate::role::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElderId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ElderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The user acting on a request, with the role from their profile if one exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub username: String,
    pub role: Option<Role>,
}

impl Actor {
    pub fn new(user_id: UserId, username: impl Into<String>, role: Option<Role>) -> Self {
        Self {
            user_id,
            username: username.into(),
            role,
        }
    }

    /// A user without a profile is treated as a guardian.
    pub fn effective_role(&self) -> Role {
        self.role.unwrap_or(Role::Guardian)
    }

    pub fn is_admin(&self) -> bool {
        self.effective_role().is_admin()
    }
}

/// The part of an elder record the policy looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElderRef {
    pub id: ElderId,
    pub guardian: UserId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessScope {
    AllElders,
    GuardedBy(UserId),
}

impl AccessScope {
    pub fn for_actor(actor: &Actor) -> Self {
        if actor.effective_role().is_elevated() {
            AccessScope::AllElders
        } else {
            AccessScope::GuardedBy(actor.user_id)
        }
    }

    /// Guardian the store should filter elders by, or `None` for no filter.
    pub fn guardian_filter(&self) -> Option<UserId> {
        match self {
            AccessScope::AllElders => None,
            AccessScope::GuardedBy(user) => Some(*user),
        }
    }

    pub fn contains(&self, elder: &ElderRef) -> bool {
        match self {
            AccessScope::AllElders => true,
            AccessScope::GuardedBy(user) => elder.guardian == *user,
        }
    }

    pub fn check(&self, elder: &ElderRef) -> Result<(), PolicyError> {
        if self.contains(elder) {
            Ok(())
        } else {
            Err(PolicyError::denied("elder", OWN_ELDERS_ONLY))
        }
    }
}

/// Relational lookup of elders, filtered by scope.
pub trait ElderDirectory {
    type Error;

    fn elders_in(&self, scope: &AccessScope) -> Result<Vec<ElderRef>, Self::Error>;
}

impl ElderDirectory for [ElderRef] {
    type Error = Infallible;

    fn elders_in(&self, scope: &AccessScope) -> Result<Vec<ElderRef>, Self::Error> {
        Ok(self.iter().filter(|e| scope.contains(e)).copied().collect())
    }
}

impl ElderDirectory for Vec<ElderRef> {
    type Error = Infallible;

    fn elders_in(&self, scope: &AccessScope) -> Result<Vec<ElderRef>, Self::Error> {
        self.as_slice().elders_in(scope)
    }
}

/// Elders the actor may reference from a dependent record.
pub fn resolve_scope<D>(directory: &D, actor: &Actor) -> Result<BTreeSet<ElderId>, D::Error>
where
    D: ElderDirectory + ?Sized,
{
    let scope = AccessScope::for_actor(actor);
    Ok(directory
        .elders_in(&scope)?
        .into_iter()
        .map(|elder| elder.id)
        .collect())
}

pub fn validate_elder_choice(actor: &Actor, elder: &ElderRef) -> Result<(), PolicyError> {
    AccessScope::for_actor(actor).check(elder)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elder(id: i64, guardian: i64) -> ElderRef {
        ElderRef {
            id: ElderId(id),
            guardian: UserId(guardian),
        }
    }

    #[test]
    fn missing_profile_scopes_like_guardian() {
        let bare = Actor::new(UserId(7), "bare", None);
        let guardian = Actor::new(UserId(7), "bare", Some(Role::Guardian));
        assert_eq!(
            AccessScope::for_actor(&bare),
            AccessScope::for_actor(&guardian)
        );
        assert_eq!(AccessScope::for_actor(&bare), AccessScope::GuardedBy(UserId(7)));
    }

    #[test]
    fn check_reports_elder_field() {
        let err = AccessScope::GuardedBy(UserId(1))
            .check(&elder(5, 2))
            .unwrap_err();
        assert_eq!(err.field(), "elder");
        assert_eq!(err.message(), OWN_ELDERS_ONLY);
    }

    #[test]
    fn slice_directory_filters_by_guardian() {
        let elders = vec![elder(1, 10), elder(2, 20), elder(3, 10)];
        let actor = Actor::new(UserId(10), "g", Some(Role::Guardian));
        let scope = resolve_scope(&elders, &actor).unwrap();
        assert_eq!(scope.into_iter().collect::<Vec<_>>(), vec![ElderId(1), ElderId(3)]);
    }
}
