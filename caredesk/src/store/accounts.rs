use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::Argon2;
use chrono::Utc;
use rusqlite::{params, ErrorCode, OptionalExtension, Row};
use tracing::{debug, info};
use wards::{Actor, Role, UserId};

use super::{parse_choice, CareStore, StoreError};
use crate::models::{Account, Profile, User};

const USER_COLUMNS: &str = "id, username, first_name, last_name, email, created_at";

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

fn hash_password(password: &str) -> Result<String, StoreError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| StoreError::PasswordHash(e.to_string()))
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: UserId(row.get(0)?),
        username: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        email: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<Profile> {
    Ok(Profile {
        user_id: UserId(row.get(0)?),
        role: parse_choice(1, row.get(1)?, Role::parse)?,
        phone: row.get(2)?,
        address: row.get(3)?,
        emergency_contact: row.get(4)?,
        emergency_phone: row.get(5)?,
    })
}

impl CareStore {
    /// Create a user, and a profile with `role` when one is given.
    pub fn create_user(
        &self,
        new: &NewUser,
        password: &str,
        role: Option<Role>,
    ) -> Result<User, StoreError> {
        let password_hash = hash_password(password)?;
        let created_at = Utc::now();

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let inserted = tx.execute(
            "INSERT INTO users (username, password_hash, first_name, last_name, email, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                new.username,
                password_hash,
                new.first_name,
                new.last_name,
                new.email,
                created_at
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                return Err(StoreError::DuplicateUsername(new.username.clone()));
            }
            Err(e) => return Err(e.into()),
        }
        let id = UserId(tx.last_insert_rowid());
        if let Some(role) = role {
            tx.execute(
                "INSERT INTO profiles (user_id, role) VALUES (?1, ?2)",
                params![id.0, role.as_str()],
            )?;
        }
        tx.commit()?;

        info!(user_id = %id, username = %new.username, ?role, "Created user");
        Ok(User {
            id,
            username: new.username.clone(),
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
            email: new.email.clone(),
            created_at,
        })
    }

    pub fn user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id.0],
                user_from_row,
            )
            .optional()?)
    }

    pub fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
                params![username],
                user_from_row,
            )
            .optional()?)
    }

    /// All users ordered by username, as offered by the admin guardian picker.
    pub fn users(&self) -> Result<Vec<User>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY username"
        ))?;
        let users = stmt
            .query_map([], user_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    pub fn profile(&self, user: UserId) -> Result<Option<Profile>, StoreError> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                "SELECT user_id, role, phone, address, emergency_contact, emergency_phone
                 FROM profiles WHERE user_id = ?1",
                params![user.0],
                profile_from_row,
            )
            .optional()?)
    }

    pub fn account(&self, user: UserId) -> Result<Option<Account>, StoreError> {
        let Some(user) = self.user(user)? else {
            return Ok(None);
        };
        let profile = self.profile(user.id)?;
        let effective_role = profile.as_ref().map(|p| p.role).unwrap_or_default();
        Ok(Some(Account {
            user,
            profile,
            effective_role,
        }))
    }

    /// Resolve the acting user for a request. The role stays `None` when the
    /// user never got a profile.
    pub fn actor(&self, username: &str) -> Result<Option<Actor>, StoreError> {
        debug!("Resolving actor {}", username);
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT u.id, u.username, p.role
                 FROM users u LEFT JOIN profiles p ON p.user_id = u.id
                 WHERE u.username = ?1",
                params![username],
                |row| {
                    let role = match row.get::<_, Option<String>>(2)? {
                        Some(raw) => Some(parse_choice(2, raw, Role::parse)?),
                        None => None,
                    };
                    Ok(Actor::new(UserId(row.get(0)?), row.get::<_, String>(1)?, role))
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Write the user's name fields and their profile in one transaction.
    pub fn save_profile(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        profile: &Profile,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "UPDATE users SET first_name = ?1, last_name = ?2, email = ?3 WHERE id = ?4",
            params![first_name, last_name, email, profile.user_id.0],
        )?;
        tx.execute(
            "INSERT INTO profiles (user_id, role, phone, address, emergency_contact, emergency_phone)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(user_id) DO UPDATE SET
                role = excluded.role,
                phone = excluded.phone,
                address = excluded.address,
                emergency_contact = excluded.emergency_contact,
                emergency_phone = excluded.emergency_phone",
            params![
                profile.user_id.0,
                profile.role.as_str(),
                profile.phone,
                profile.address,
                profile.emergency_contact,
                profile.emergency_phone
            ],
        )?;
        tx.commit()?;
        info!(user_id = %profile.user_id, role = %profile.role, "Saved profile");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::user;
    use super::*;

    #[test]
    fn actor_without_profile_has_no_role() {
        let store = CareStore::open_in_memory().unwrap();
        let id = user(&store, "bare", None);
        let actor = store.actor("bare").unwrap().unwrap();
        assert_eq!(actor.user_id, id);
        assert_eq!(actor.role, None);
        assert_eq!(actor.effective_role(), Role::Guardian);
        assert!(store.actor("nobody").unwrap().is_none());
    }

    #[test]
    fn duplicate_username_is_reported() {
        let store = CareStore::open_in_memory().unwrap();
        user(&store, "nurse1", Some(Role::Nurse));
        let err = store
            .create_user(
                &NewUser {
                    username: "nurse1".into(),
                    first_name: String::new(),
                    last_name: String::new(),
                    email: String::new(),
                },
                "password123",
                None,
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateUsername(name) if name == "nurse1"));
    }

    #[test]
    fn passwords_are_stored_as_argon2_hashes() {
        let store = CareStore::open_in_memory().unwrap();
        let id = user(&store, "hashme", None);
        let conn = store.conn().unwrap();
        let hash: String = conn
            .query_row(
                "SELECT password_hash FROM users WHERE id = ?1",
                params![id.0],
                |row| row.get(0),
            )
            .unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(!hash.contains("password123"));
    }

    #[test]
    fn save_profile_creates_then_updates() {
        let store = CareStore::open_in_memory().unwrap();
        let id = user(&store, "family1", None);
        let mut profile = Profile {
            user_id: id,
            role: Role::Guardian,
            phone: Some("+1234567890".into()),
            address: None,
            emergency_contact: None,
            emergency_phone: None,
        };
        store.save_profile("Jane", "Doe", "jane@example.com", &profile).unwrap();
        profile.role = Role::Doctor;
        store.save_profile("Jane", "Doe", "jane@example.com", &profile).unwrap();

        let account = store.account(id).unwrap().unwrap();
        assert_eq!(account.user.first_name, "Jane");
        assert_eq!(account.effective_role, Role::Doctor);
    }
}
