//! HTTP route handlers for the care desk API

pub mod accounts;
pub mod elders;
pub mod medications;
pub mod options;
pub mod records;
pub mod search;

use axum::{
    http::StatusCode,
    routing::{get, put},
    Router,
};
use wards::{AccessScope, Actor, ElderId, PolicyError};

use crate::forms::FormErrors;
use crate::models::{
    Appointment, CareTask, Elder, EmergencyContact, IncidentReport, MedicationSchedule,
    Notification, VitalsLog,
};
use crate::{AppError, AppResult, AppState};

pub const INVALID_CHOICE: &str = "Select a valid choice.";

/// Routes that require an authenticated actor.
pub fn api_router() -> Router<AppState> {
    let router = Router::new()
        .route("/api/me", get(accounts::me))
        .route("/api/users/:id/profile", put(accounts::update_profile))
        .route("/api/form-options", get(options::form_options))
        .route("/api/elders", get(elders::list).post(elders::create))
        .route(
            "/api/elders/:id",
            get(elders::fetch).put(elders::update).delete(elders::remove),
        )
        .route(
            "/api/medications",
            get(medications::list).post(medications::create),
        )
        .route(
            "/api/medication-schedules/:id/logs",
            get(medications::list_logs).post(medications::create_log),
        )
        .route("/api/search", get(search::search));

    let router = records::mount::<MedicationSchedule>(router, "/api/medication-schedules");
    let router = records::mount::<Appointment>(router, "/api/appointments");
    let router = records::mount::<CareTask>(router, "/api/care-tasks");
    let router = records::mount::<IncidentReport>(router, "/api/incident-reports");
    let router = records::mount::<VitalsLog>(router, "/api/vitals");
    let router = records::mount::<EmergencyContact>(router, "/api/emergency-contacts");
    records::mount::<Notification>(router, "/api/notifications")
}

/// Finish cleaning a form that points at an elder and check the elder
/// against the actor's scope.
///
/// A missing elder is reported with the other field errors; one outside the
/// scope is a policy denial.
pub(crate) fn chosen_elder(
    state: &AppState,
    actor: &Actor,
    id: ElderId,
    mut errors: FormErrors,
) -> AppResult<Elder> {
    let elder = state.store.elder(id)?;
    if elder.is_none() {
        errors.add("elder", INVALID_CHOICE);
    }
    errors.into_result()?;
    let Some(elder) = elder else {
        return Err(AppError::not_found("Elder"));
    };
    wards::validate_elder_choice(actor, &elder.elder_ref()).map_err(|e| denied(actor, e))?;
    Ok(elder)
}

/// Load an elder for reading. Elders outside the scope look absent.
pub(crate) fn visible_elder(state: &AppState, actor: &Actor, id: ElderId) -> AppResult<Elder> {
    match state.store.elder(id)? {
        Some(elder) if AccessScope::for_actor(actor).contains(&elder.elder_ref()) => Ok(elder),
        _ => Err(AppError::not_found("Elder")),
    }
}

/// Log a policy rejection and turn it into a response.
pub(crate) fn denied(actor: &Actor, err: PolicyError) -> AppError {
    tracing::warn!(
        "Denied {} (role {}): {}",
        actor.username,
        actor.effective_role(),
        err
    );
    err.into()
}

pub(crate) fn created<T>(body: T) -> (StatusCode, axum::Json<T>) {
    (StatusCode::CREATED, axum::Json(body))
}
