//! Records that reference exactly one elder.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use wards::{ElderId, UserId};

use super::choices::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    MedicationSchedule,
    MedicationLog,
    Appointment,
    CareTask,
    IncidentReport,
    Vitals,
    EmergencyContact,
    Notification,
}

impl RecordKind {
    /// Value stored in `care_records.kind`.
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::MedicationSchedule => "medication_schedule",
            RecordKind::MedicationLog => "medication_log",
            RecordKind::Appointment => "appointment",
            RecordKind::CareTask => "care_task",
            RecordKind::IncidentReport => "incident_report",
            RecordKind::Vitals => "vitals",
            RecordKind::EmergencyContact => "emergency_contact",
            RecordKind::Notification => "notification",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RecordKind::MedicationSchedule => "Medication schedule",
            RecordKind::MedicationLog => "Medication log",
            RecordKind::Appointment => "Appointment",
            RecordKind::CareTask => "Care task",
            RecordKind::IncidentReport => "Incident report",
            RecordKind::Vitals => "Vitals log",
            RecordKind::EmergencyContact => "Emergency contact",
            RecordKind::Notification => "Notification",
        }
    }
}

/// Body of a record stored in `care_records`.
pub trait CareRecord: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: RecordKind;
}

/// Request body for creating or editing an elder-bound record.
#[derive(Debug, Clone, Deserialize)]
pub struct ElderRecordForm<T> {
    pub elder: ElderId,
    #[serde(flatten)]
    pub body: T,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord<T> {
    pub id: i64,
    pub elder: ElderId,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub body: T,
}

fn default_true() -> bool {
    true
}

fn default_duration() -> u32 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MedicationSchedule {
    pub medication: i64,
    pub dosage: String,
    pub frequency: DoseFrequency,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default, rename = "time1")]
    pub time_1: Option<NaiveTime>,
    #[serde(default, rename = "time2")]
    pub time_2: Option<NaiveTime>,
    #[serde(default, rename = "time3")]
    pub time_3: Option<NaiveTime>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl CareRecord for MedicationSchedule {
    const KIND: RecordKind = RecordKind::MedicationSchedule;
}

/// A dose given or skipped against a schedule. The elder is the schedule's.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MedicationLog {
    pub schedule: i64,
    pub logged_at: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub was_skipped: bool,
    #[serde(default)]
    pub skip_reason: Option<String>,
}

impl CareRecord for MedicationLog {
    const KIND: RecordKind = RecordKind::MedicationLog;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationLogForm {
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub was_skipped: bool,
    #[serde(default)]
    pub skip_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub title: String,
    pub appointment_type: AppointmentType,
    pub appointment_date: NaiveDateTime,
    /// Minutes.
    #[serde(default = "default_duration")]
    pub duration: u32,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub doctor_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CareRecord for Appointment {
    const KIND: RecordKind = RecordKind::Appointment;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CareTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub task_type: TaskType,
    pub frequency: TaskFrequency,
    #[serde(default)]
    pub assigned_to: Option<UserId>,
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_completed: bool,
}

impl CareRecord for CareTask {
    const KIND: RecordKind = RecordKind::CareTask;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IncidentReport {
    pub incident_type: IncidentType,
    pub incident_date: NaiveDateTime,
    pub description: String,
    pub severity: Severity,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub witnesses: Option<String>,
    #[serde(default)]
    pub actions_taken: Option<String>,
    #[serde(default)]
    pub follow_up_required: bool,
    #[serde(default)]
    pub follow_up_notes: Option<String>,
}

impl CareRecord for IncidentReport {
    const KIND: RecordKind = RecordKind::IncidentReport;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VitalsLog {
    #[serde(default)]
    pub blood_pressure_systolic: Option<u32>,
    #[serde(default)]
    pub blood_pressure_diastolic: Option<u32>,
    #[serde(default)]
    pub heart_rate: Option<u32>,
    /// Degrees Fahrenheit.
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Pounds.
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub oxygen_saturation: Option<u32>,
    /// mg/dL.
    #[serde(default)]
    pub blood_sugar: Option<u32>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CareRecord for VitalsLog {
    const KIND: RecordKind = RecordKind::Vitals;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    pub name: String,
    pub relation: Relation,
    pub phone: String,
    #[serde(default, rename = "phone2")]
    pub phone_2: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CareRecord for EmergencyContact {
    const KIND: RecordKind = RecordKind::EmergencyContact;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub notification_type: NotificationType,
    pub message: String,
    pub priority: Priority,
    #[serde(default)]
    pub expires_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub is_read: bool,
}

impl CareRecord for Notification {
    const KIND: RecordKind = RecordKind::Notification;
}
