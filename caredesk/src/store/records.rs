use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tracing::{debug, info};
use wards::{AccessScope, ElderId, UserId};

use super::elders::contains_pattern;
use super::{CareStore, StoreError};
use crate::models::{CareRecord, MedicationLog, RecordKind, StoredRecord};

const RECORD_COLUMNS: &str = "r.id, r.elder_id, r.created_by, r.created_at, r.updated_at, r.payload";

/// A `care_records` row before its payload is decoded.
struct RawRecord {
    id: i64,
    elder: ElderId,
    created_by: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    payload: String,
}

impl RawRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            elder: ElderId(row.get(1)?),
            created_by: UserId(row.get(2)?),
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
            payload: row.get(5)?,
        })
    }

    fn decode<T: CareRecord>(self) -> Result<StoredRecord<T>, StoreError> {
        Ok(StoredRecord {
            id: self.id,
            elder: self.elder,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
            body: serde_json::from_str(&self.payload)?,
        })
    }
}

fn decode_all<T: CareRecord>(raw: Vec<RawRecord>) -> Result<Vec<StoredRecord<T>>, StoreError> {
    raw.into_iter().map(RawRecord::decode).collect()
}

impl CareStore {
    pub fn insert_record<T: CareRecord>(
        &self,
        elder: ElderId,
        created_by: UserId,
        body: &T,
    ) -> Result<StoredRecord<T>, StoreError> {
        let payload = serde_json::to_string(body)?;
        let now = Utc::now();
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO care_records (kind, elder_id, payload, created_by, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![T::KIND.as_str(), elder.0, payload, created_by.0, now],
        )?;
        let id = conn.last_insert_rowid();
        info!(kind = T::KIND.as_str(), id, elder_id = %elder, created_by = %created_by, "Inserted record");
        Ok(StoredRecord {
            id,
            elder,
            created_by,
            created_at: now,
            updated_at: now,
            body: body.clone(),
        })
    }

    pub fn record<T: CareRecord>(&self, id: i64) -> Result<Option<StoredRecord<T>>, StoreError> {
        let raw = {
            let conn = self.conn()?;
            conn.query_row(
                &format!("SELECT {RECORD_COLUMNS} FROM care_records r WHERE r.kind = ?1 AND r.id = ?2"),
                params![T::KIND.as_str(), id],
                RawRecord::from_row,
            )
            .optional()?
        };
        raw.map(RawRecord::decode).transpose()
    }

    /// Records of kind `T` attached to elders inside `scope`, newest first,
    /// optionally narrowed to one elder.
    pub fn records<T: CareRecord>(
        &self,
        scope: &AccessScope,
        elder: Option<ElderId>,
    ) -> Result<Vec<StoredRecord<T>>, StoreError> {
        debug!(kind = T::KIND.as_str(), ?scope, ?elder, "Listing records");
        let raw = {
            let conn = self.conn()?;
            let mut stmt = conn.prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM care_records r
                 JOIN elders e ON e.id = r.elder_id
                 WHERE r.kind = ?1
                   AND (?2 IS NULL OR e.guardian_id = ?2)
                   AND (?3 IS NULL OR r.elder_id = ?3)
                 ORDER BY r.created_at DESC, r.id DESC"
            ))?;
            let rows = stmt
                .query_map(
                    params![
                        T::KIND.as_str(),
                        scope.guardian_filter().map(|g| g.0),
                        elder.map(|e| e.0)
                    ],
                    RawRecord::from_row,
                )?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };
        decode_all(raw)
    }

    /// Records of kind `T` inside `scope` whose `title` contains `term`.
    pub fn search_records<T: CareRecord>(
        &self,
        scope: &AccessScope,
        term: &str,
    ) -> Result<Vec<StoredRecord<T>>, StoreError> {
        let raw = {
            let conn = self.conn()?;
            let mut stmt = conn.prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM care_records r
                 JOIN elders e ON e.id = r.elder_id
                 WHERE r.kind = ?1
                   AND (?2 IS NULL OR e.guardian_id = ?2)
                   AND json_extract(r.payload, '$.title') LIKE ?3 ESCAPE '\\'
                 ORDER BY r.created_at DESC, r.id DESC"
            ))?;
            let rows = stmt
                .query_map(
                    params![
                        T::KIND.as_str(),
                        scope.guardian_filter().map(|g| g.0),
                        contains_pattern(term)
                    ],
                    RawRecord::from_row,
                )?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };
        decode_all(raw)
    }

    /// Replace a record's body and elder. Returns `None` when no record of
    /// kind `T` has this id.
    pub fn update_record<T: CareRecord>(
        &self,
        id: i64,
        elder: ElderId,
        body: &T,
    ) -> Result<Option<StoredRecord<T>>, StoreError> {
        let payload = serde_json::to_string(body)?;
        let now = Utc::now();
        {
            let mut conn = self.conn()?;
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE care_records SET elder_id = ?3, payload = ?4, updated_at = ?5
                 WHERE kind = ?1 AND id = ?2",
                params![T::KIND.as_str(), id, elder.0, payload, now],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            // Logs follow their schedule to its new elder.
            if T::KIND == RecordKind::MedicationSchedule {
                let logs = tx.execute(
                    "UPDATE care_records SET elder_id = ?3, updated_at = ?4
                     WHERE kind = ?1 AND json_extract(payload, '$.schedule') = ?2
                       AND elder_id <> ?3",
                    params![RecordKind::MedicationLog.as_str(), id, elder.0, now],
                )?;
                if logs > 0 {
                    debug!(schedule_id = id, logs, elder_id = %elder, "Moved schedule logs");
                }
            }
            tx.commit()?;
        }
        info!(kind = T::KIND.as_str(), id, elder_id = %elder, "Updated record");
        self.record(id)
    }

    /// Delete a record. Deleting a medication schedule also deletes its logs.
    pub fn delete_record(&self, kind: RecordKind, id: i64) -> Result<bool, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let deleted = tx.execute(
            "DELETE FROM care_records WHERE kind = ?1 AND id = ?2",
            params![kind.as_str(), id],
        )?;
        if deleted > 0 && kind == RecordKind::MedicationSchedule {
            let logs = tx.execute(
                "DELETE FROM care_records
                 WHERE kind = ?1 AND json_extract(payload, '$.schedule') = ?2",
                params![RecordKind::MedicationLog.as_str(), id],
            )?;
            debug!(schedule_id = id, logs, "Deleted schedule logs");
        }
        tx.commit()?;
        if deleted > 0 {
            info!(kind = kind.as_str(), id, "Deleted record");
        }
        Ok(deleted > 0)
    }

    /// Logs recorded against one medication schedule, newest first.
    pub fn medication_logs(
        &self,
        schedule: i64,
    ) -> Result<Vec<StoredRecord<MedicationLog>>, StoreError> {
        let raw = {
            let conn = self.conn()?;
            let mut stmt = conn.prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM care_records r
                 WHERE r.kind = ?1 AND json_extract(r.payload, '$.schedule') = ?2
                 ORDER BY r.created_at DESC, r.id DESC"
            ))?;
            let rows = stmt
                .query_map(
                    params![RecordKind::MedicationLog.as_str(), schedule],
                    RawRecord::from_row,
                )?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };
        decode_all(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;
    use crate::models::{
        CareTask, DoseFrequency, MedicationSchedule, Priority, TaskFrequency, TaskType, VitalsLog,
    };
    use chrono::NaiveDate;
    use wards::Role;

    fn task(title: &str) -> CareTask {
        CareTask {
            title: title.to_string(),
            description: None,
            task_type: TaskType::Meal,
            frequency: TaskFrequency::Daily,
            assigned_to: None,
            priority: Priority::Medium,
            due_date: None,
            notes: None,
            is_completed: false,
        }
    }

    fn schedule(medication: i64) -> MedicationSchedule {
        MedicationSchedule {
            medication,
            dosage: "1 tablet".into(),
            frequency: DoseFrequency::OnceDaily,
            start_date: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
            end_date: None,
            time_1: None,
            time_2: None,
            time_3: None,
            instructions: None,
            is_active: true,
        }
    }

    #[test]
    fn records_follow_elder_scope() {
        let store = CareStore::open_in_memory().unwrap();
        let family = user(&store, "family1", None);
        let other = user(&store, "family2", None);
        let mine = elder(&store, family, "John Doe");
        let theirs = elder(&store, other, "Mary Major");
        store.insert_record(mine.id, family, &task("Lunch")).unwrap();
        store.insert_record(theirs.id, other, &task("Dinner")).unwrap();

        let visible: Vec<StoredRecord<CareTask>> =
            store.records(&AccessScope::GuardedBy(family), None).unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].body.title, "Lunch");

        let all: Vec<StoredRecord<CareTask>> = store.records(&AccessScope::AllElders, None).unwrap();
        assert_eq!(all.len(), 2);
        let narrowed: Vec<StoredRecord<CareTask>> = store
            .records(&AccessScope::AllElders, Some(theirs.id))
            .unwrap();
        assert_eq!(narrowed.len(), 1);
        assert_eq!(narrowed[0].elder, theirs.id);
    }

    #[test]
    fn kinds_do_not_leak_into_each_other() {
        let store = CareStore::open_in_memory().unwrap();
        let family = user(&store, "family1", None);
        let e = elder(&store, family, "John Doe");
        let stored = store.insert_record(e.id, family, &task("Walk")).unwrap();

        assert!(store.record::<VitalsLog>(stored.id).unwrap().is_none());
        assert!(!store.delete_record(RecordKind::Vitals, stored.id).unwrap());
        assert!(store.record::<CareTask>(stored.id).unwrap().is_some());
    }

    #[test]
    fn deleting_schedule_removes_its_logs() {
        let store = CareStore::open_in_memory().unwrap();
        let nurse = user(&store, "nurse1", Some(Role::Nurse));
        let e = elder(&store, nurse, "John Doe");
        let aspirin = medication(&store, "Aspirin");
        let sched = store.insert_record(e.id, nurse, &schedule(aspirin.id)).unwrap();
        let log = MedicationLog {
            schedule: sched.id,
            logged_at: Utc::now(),
            notes: None,
            was_skipped: false,
            skip_reason: None,
        };
        store.insert_record(e.id, nurse, &log).unwrap();
        assert_eq!(store.medication_logs(sched.id).unwrap().len(), 1);

        assert!(store
            .delete_record(RecordKind::MedicationSchedule, sched.id)
            .unwrap());
        assert!(store.medication_logs(sched.id).unwrap().is_empty());
    }

    #[test]
    fn deleting_elder_cascades_to_records() {
        let store = CareStore::open_in_memory().unwrap();
        let family = user(&store, "family1", None);
        let e = elder(&store, family, "John Doe");
        let stored = store.insert_record(e.id, family, &task("Walk")).unwrap();

        assert!(store.delete_elder(e.id).unwrap());
        assert!(store.record::<CareTask>(stored.id).unwrap().is_none());
    }

    #[test]
    fn search_matches_title_within_scope() {
        let store = CareStore::open_in_memory().unwrap();
        let family = user(&store, "family1", None);
        let other = user(&store, "family2", None);
        let mine = elder(&store, family, "John Doe");
        let theirs = elder(&store, other, "Mary Major");
        store.insert_record(mine.id, family, &task("Morning walk")).unwrap();
        store.insert_record(theirs.id, other, &task("Evening walk")).unwrap();

        let hits: Vec<StoredRecord<CareTask>> = store
            .search_records(&AccessScope::GuardedBy(family), "WALK")
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].body.title, "Morning walk");
    }

    #[test]
    fn update_moves_record_to_another_elder() {
        let store = CareStore::open_in_memory().unwrap();
        let family = user(&store, "family1", None);
        let first = elder(&store, family, "John Doe");
        let second = elder(&store, family, "Jane Doe");
        let stored = store.insert_record(first.id, family, &task("Walk")).unwrap();

        let updated = store
            .update_record(stored.id, second.id, &task("Long walk"))
            .unwrap()
            .unwrap();
        assert_eq!(updated.elder, second.id);
        assert_eq!(updated.body.title, "Long walk");
        assert_eq!(updated.created_by, family);
    }
}
