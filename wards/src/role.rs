use serde::{Deserialize, Serialize};
use std::fmt;

/// Role carried by a user profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Doctor,
    Nurse,
    Caregiver,
    #[default]
    Guardian,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Doctor,
        Role::Nurse,
        Role::Caregiver,
        Role::Guardian,
    ];

    /// Elevated roles see every elder in the system.
    pub fn is_elevated(self) -> bool {
        matches!(
            self,
            Role::Admin | Role::Doctor | Role::Nurse | Role::Caregiver
        )
    }

    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Doctor => "DOCTOR",
            Role::Nurse => "NURSE",
            Role::Caregiver => "CAREGIVER",
            Role::Guardian => "GUARDIAN",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Some(Role::Admin),
            "DOCTOR" => Some(Role::Doctor),
            "NURSE" => Some(Role::Nurse),
            "CAREGIVER" => Some(Role::Caregiver),
            "GUARDIAN" => Some(Role::Guardian),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elevated_set_excludes_only_guardian() {
        let elevated: Vec<Role> = Role::ALL.into_iter().filter(|r| r.is_elevated()).collect();
        assert_eq!(
            elevated,
            vec![Role::Admin, Role::Doctor, Role::Nurse, Role::Caregiver]
        );
        assert!(!Role::Guardian.is_elevated());
    }

    #[test]
    fn parse_is_case_insensitive_and_round_trips_display() {
        for role in Role::ALL {
            assert_eq!(Role::parse(&role.to_string().to_lowercase()), Some(role));
        }
        assert_eq!(Role::parse("superuser"), None);
    }

    #[test]
    fn default_role_is_guardian() {
        assert_eq!(Role::default(), Role::Guardian);
    }
}
