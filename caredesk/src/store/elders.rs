use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use tracing::info;
use wards::{AccessScope, ElderId, UserId};

use super::{parse_choice, CareStore, StoreError};
use crate::models::{Elder, ElderForm, Gender, Medication, MedicationForm, MedicationType};

const ELDER_COLUMNS: &str = "id, guardian_id, full_name, date_of_birth, gender, address, phone, \
     email, medical_conditions, allergies, blood_type, emergency_notes, created_at, updated_at";

const MEDICATION_COLUMNS: &str =
    "id, name, description, medication_type, strength, manufacturer, created_at";

fn elder_from_row(row: &Row<'_>) -> rusqlite::Result<Elder> {
    let gender = match row.get::<_, Option<String>>(4)? {
        Some(raw) => Some(parse_choice(4, raw, Gender::parse)?),
        None => None,
    };
    Ok(Elder {
        id: ElderId(row.get(0)?),
        guardian: UserId(row.get(1)?),
        full_name: row.get(2)?,
        date_of_birth: row.get(3)?,
        gender,
        address: row.get(5)?,
        phone: row.get(6)?,
        email: row.get(7)?,
        medical_conditions: row.get(8)?,
        allergies: row.get(9)?,
        blood_type: row.get(10)?,
        emergency_notes: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

fn medication_from_row(row: &Row<'_>) -> rusqlite::Result<Medication> {
    Ok(Medication {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        medication_type: parse_choice(3, row.get(3)?, MedicationType::parse)?,
        strength: row.get(4)?,
        manufacturer: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// `LIKE` pattern matching `term` anywhere, with wildcards in the term escaped.
pub(super) fn contains_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

impl CareStore {
    /// Insert an elder under `guardian`. The guardian on the form is ignored;
    /// callers resolve it through the assignment policy first.
    pub fn insert_elder(&self, guardian: UserId, form: &ElderForm) -> Result<Elder, StoreError> {
        let now = Utc::now();
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO elders (guardian_id, full_name, date_of_birth, gender, address, phone,
                 email, medical_conditions, allergies, blood_type, emergency_notes,
                 created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)",
            params![
                guardian.0,
                form.full_name.trim(),
                form.date_of_birth,
                form.gender.map(Gender::as_str),
                form.address,
                form.phone,
                form.email,
                form.medical_conditions,
                form.allergies,
                form.blood_type,
                form.emergency_notes,
                now
            ],
        )?;
        let id = ElderId(conn.last_insert_rowid());
        info!(elder_id = %id, guardian = %guardian, "Inserted elder");

        Ok(Elder {
            id,
            guardian,
            full_name: form.full_name.trim().to_string(),
            date_of_birth: form.date_of_birth,
            gender: form.gender,
            address: form.address.clone(),
            phone: form.phone.clone(),
            email: form.email.clone(),
            medical_conditions: form.medical_conditions.clone(),
            allergies: form.allergies.clone(),
            blood_type: form.blood_type.clone(),
            emergency_notes: form.emergency_notes.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn elder(&self, id: ElderId) -> Result<Option<Elder>, StoreError> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                &format!("SELECT {ELDER_COLUMNS} FROM elders WHERE id = ?1"),
                params![id.0],
                elder_from_row,
            )
            .optional()?)
    }

    /// Elders inside `scope`, ordered by name.
    pub fn elders(&self, scope: &AccessScope) -> Result<Vec<Elder>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ELDER_COLUMNS} FROM elders
             WHERE ?1 IS NULL OR guardian_id = ?1
             ORDER BY full_name, id"
        ))?;
        let elders = stmt
            .query_map(params![scope.guardian_filter().map(|g| g.0)], elder_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(elders)
    }

    /// Elders inside `scope` whose name contains `term`, case-insensitively.
    pub fn search_elders(&self, scope: &AccessScope, term: &str) -> Result<Vec<Elder>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ELDER_COLUMNS} FROM elders
             WHERE (?1 IS NULL OR guardian_id = ?1)
               AND full_name LIKE ?2 ESCAPE '\\'
             ORDER BY full_name, id"
        ))?;
        let elders = stmt
            .query_map(
                params![scope.guardian_filter().map(|g| g.0), contains_pattern(term)],
                elder_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(elders)
    }

    /// Overwrite an elder's fields. Returns `None` when the elder does not exist.
    pub fn update_elder(
        &self,
        id: ElderId,
        guardian: UserId,
        form: &ElderForm,
    ) -> Result<Option<Elder>, StoreError> {
        let changed = {
            let conn = self.conn()?;
            conn.execute(
                "UPDATE elders SET guardian_id = ?2, full_name = ?3, date_of_birth = ?4,
                     gender = ?5, address = ?6, phone = ?7, email = ?8,
                     medical_conditions = ?9, allergies = ?10, blood_type = ?11,
                     emergency_notes = ?12, updated_at = ?13
                 WHERE id = ?1",
                params![
                    id.0,
                    guardian.0,
                    form.full_name.trim(),
                    form.date_of_birth,
                    form.gender.map(Gender::as_str),
                    form.address,
                    form.phone,
                    form.email,
                    form.medical_conditions,
                    form.allergies,
                    form.blood_type,
                    form.emergency_notes,
                    Utc::now()
                ],
            )?
        };
        if changed == 0 {
            return Ok(None);
        }
        info!(elder_id = %id, guardian = %guardian, "Updated elder");
        self.elder(id)
    }

    /// Delete an elder and, through the foreign key, every record attached to it.
    pub fn delete_elder(&self, id: ElderId) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM elders WHERE id = ?1", params![id.0])?;
        if deleted > 0 {
            info!(elder_id = %id, "Deleted elder");
        }
        Ok(deleted > 0)
    }

    pub fn insert_medication(&self, form: &MedicationForm) -> Result<Medication, StoreError> {
        let now = Utc::now();
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO medications (name, description, medication_type, strength,
                 manufacturer, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                form.name.trim(),
                form.description,
                form.medication_type.as_str(),
                form.strength,
                form.manufacturer,
                now
            ],
        )?;
        let id = conn.last_insert_rowid();
        info!(medication_id = id, name = %form.name, "Inserted medication");
        Ok(Medication {
            id,
            name: form.name.trim().to_string(),
            description: form.description.clone(),
            medication_type: form.medication_type,
            strength: form.strength.clone(),
            manufacturer: form.manufacturer.clone(),
            created_at: now,
        })
    }

    pub fn medication(&self, id: i64) -> Result<Option<Medication>, StoreError> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                &format!("SELECT {MEDICATION_COLUMNS} FROM medications WHERE id = ?1"),
                params![id],
                medication_from_row,
            )
            .optional()?)
    }

    /// The medication catalogue is shared and not scoped to elders.
    pub fn medications(&self) -> Result<Vec<Medication>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {MEDICATION_COLUMNS} FROM medications ORDER BY name, id"
        ))?;
        let medications = stmt
            .query_map([], medication_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(medications)
    }

    pub fn search_medications(&self, term: &str) -> Result<Vec<Medication>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {MEDICATION_COLUMNS} FROM medications
             WHERE name LIKE ?1 ESCAPE '\\'
             ORDER BY name, id"
        ))?;
        let medications = stmt
            .query_map(params![contains_pattern(term)], medication_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(medications)
    }
}
