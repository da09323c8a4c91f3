//! Medication catalogue and dose log handlers.

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    Extension,
};
use chrono::Utc;
use tracing::{debug, info};
use wards::Actor;

use super::created;
use super::records::visible_record;
use crate::extract::{JsonBody, Path};
use crate::forms::validate;
use crate::models::{
    Medication, MedicationForm, MedicationLog, MedicationLogForm, MedicationSchedule, StoredRecord,
};
use crate::{AppResult, AppState};

/// GET /api/medications - The shared catalogue
pub async fn list(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> AppResult<Json<Vec<Medication>>> {
    debug!("Handling GET /api/medications for {}", actor.username);
    Ok(Json(state.store.medications()?))
}

/// POST /api/medications
pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    JsonBody(form): JsonBody<MedicationForm>,
) -> AppResult<(StatusCode, Json<Medication>)> {
    debug!("Handling POST /api/medications for {}", actor.username);
    validate(&form, &state.store)??;
    let medication = state.store.insert_medication(&form)?;
    info!("Medication {} added by {}", medication.name, actor.username);
    Ok(created(medication))
}

/// GET /api/medication-schedules/:id/logs
pub async fn list_logs(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<StoredRecord<MedicationLog>>>> {
    debug!("Handling GET /api/medication-schedules/{}/logs", id);
    let schedule = visible_record::<MedicationSchedule>(&state, &actor, id)?;
    Ok(Json(state.store.medication_logs(schedule.id)?))
}

/// POST /api/medication-schedules/:id/logs - Record a dose as given or skipped
pub async fn create_log(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    JsonBody(form): JsonBody<MedicationLogForm>,
) -> AppResult<(StatusCode, Json<StoredRecord<MedicationLog>>)> {
    debug!("Handling POST /api/medication-schedules/{}/logs", id);
    // The log inherits the schedule's elder, so a visible schedule is in scope.
    let schedule = visible_record::<MedicationSchedule>(&state, &actor, id)?;
    validate(&form, &state.store)??;

    let log = MedicationLog {
        schedule: schedule.id,
        logged_at: Utc::now(),
        notes: form.notes,
        was_skipped: form.was_skipped,
        skip_reason: form.skip_reason.filter(|r| !r.trim().is_empty()),
    };
    let stored = state
        .store
        .insert_record(schedule.elder, actor.user_id, &log)?;
    info!(
        "Dose {} for schedule {} by {}",
        if log.was_skipped { "skipped" } else { "logged" },
        schedule.id,
        actor.username
    );
    Ok(created(stored))
}
