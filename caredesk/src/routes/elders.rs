//! Elder handlers.

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    Extension,
};
use tracing::{debug, info};
use wards::{AccessScope, Actor, ElderId};

use super::{created, denied, visible_elder};
use crate::extract::{JsonBody, Path};
use crate::forms::validate;
use crate::models::{Elder, ElderForm};
use crate::{AppError, AppResult, AppState};

/// GET /api/elders - Elders in the actor's scope
pub async fn list(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> AppResult<Json<Vec<Elder>>> {
    debug!("Handling GET /api/elders for {}", actor.username);
    let elders = state.store.elders(&AccessScope::for_actor(&actor))?;
    Ok(Json(elders))
}

/// POST /api/elders - Add an elder; non-admins always become its guardian
pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    JsonBody(form): JsonBody<ElderForm>,
) -> AppResult<(StatusCode, Json<Elder>)> {
    debug!("Handling POST /api/elders for {}", actor.username);

    validate(&form, &state.store)??;
    let guardian = wards::assign_guardian(&actor, form.guardian).map_err(|e| denied(&actor, e))?;

    let elder = state.store.insert_elder(guardian, &form)?;
    info!(
        "Elder {} added by {} under guardian {}",
        elder.id, actor.username, guardian
    );
    Ok(created(elder))
}

/// GET /api/elders/:id
pub async fn fetch(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> AppResult<Json<Elder>> {
    debug!("Handling GET /api/elders/{}", id);
    Ok(Json(visible_elder(&state, &actor, ElderId(id))?))
}

/// PUT /api/elders/:id - Edit an elder; only admins may change the guardian
pub async fn update(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    JsonBody(form): JsonBody<ElderForm>,
) -> AppResult<Json<Elder>> {
    debug!("Handling PUT /api/elders/{} by {}", id, actor.username);
    let current = visible_elder(&state, &actor, ElderId(id))?;

    validate(&form, &state.store)??;
    let guardian = wards::reassign_guardian(&actor, current.guardian, form.guardian)
        .map_err(|e| denied(&actor, e))?;

    let elder = state
        .store
        .update_elder(current.id, guardian, &form)?
        .ok_or_else(|| AppError::not_found("Elder"))?;
    info!("Elder {} updated by {}", elder.id, actor.username);
    Ok(Json(elder))
}

/// DELETE /api/elders/:id - Remove an elder and everything recorded for it
pub async fn remove(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    debug!("Handling DELETE /api/elders/{} by {}", id, actor.username);
    let elder = visible_elder(&state, &actor, ElderId(id))?;

    if !state.store.delete_elder(elder.id)? {
        return Err(AppError::not_found("Elder"));
    }
    info!("Elder {} deleted by {}", elder.id, actor.username);
    Ok(StatusCode::NO_CONTENT)
}
