//! Handlers shared by every record kind that hangs off an elder.

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::get,
    Extension, Router,
};
use serde::Deserialize;
use tracing::{debug, info};
use wards::{AccessScope, Actor, ElderId};

use super::{chosen_elder, created};
use crate::extract::{JsonBody, Path, Query};
use crate::forms::{Clean, FormErrors};
use crate::models::{CareRecord, ElderRecordForm, StoredRecord};
use crate::{AppError, AppResult, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct RecordFilter {
    pub elder: Option<ElderId>,
}

/// Register list/create on `base` and fetch/update/delete on `base/:id`.
pub fn mount<T>(router: Router<AppState>, base: &str) -> Router<AppState>
where
    T: CareRecord + Clean,
{
    router.route(base, get(list::<T>).post(create::<T>)).route(
        &format!("{base}/:id"),
        get(fetch::<T>).put(update::<T>).delete(remove::<T>),
    )
}

/// Load a record of kind `T` whose elder is inside the actor's scope.
pub(crate) fn visible_record<T: CareRecord>(
    state: &AppState,
    actor: &Actor,
    id: i64,
) -> AppResult<StoredRecord<T>> {
    let scope = AccessScope::for_actor(actor);
    if let Some(record) = state.store.record::<T>(id)? {
        if let Some(elder) = state.store.elder(record.elder)? {
            if scope.contains(&elder.elder_ref()) {
                return Ok(record);
            }
        }
    }
    debug!("{} {} not visible to {}", T::KIND.label(), id, actor.username);
    Err(AppError::not_found(T::KIND.label()))
}

pub async fn list<T: CareRecord>(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(filter): Query<RecordFilter>,
) -> AppResult<Json<Vec<StoredRecord<T>>>> {
    debug!("Handling list {} for {}", T::KIND.as_str(), actor.username);
    let scope = AccessScope::for_actor(&actor);
    let records = state.store.records::<T>(&scope, filter.elder)?;
    Ok(Json(records))
}

pub async fn create<T: CareRecord + Clean>(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    JsonBody(form): JsonBody<ElderRecordForm<T>>,
) -> AppResult<(StatusCode, Json<StoredRecord<T>>)> {
    debug!("Handling create {} for {}", T::KIND.as_str(), actor.username);

    let mut errors = FormErrors::new();
    form.body.clean(&state.store, &mut errors)?;
    let elder = chosen_elder(&state, &actor, form.elder, errors)?;

    let stored = state
        .store
        .insert_record(elder.id, actor.user_id, &form.body)?;
    info!(
        "{} {} created for elder {} by {}",
        T::KIND.label(),
        stored.id,
        elder.id,
        actor.username
    );
    Ok(created(stored))
}

pub async fn fetch<T: CareRecord>(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> AppResult<Json<StoredRecord<T>>> {
    debug!("Handling fetch {} {}", T::KIND.as_str(), id);
    Ok(Json(visible_record::<T>(&state, &actor, id)?))
}

pub async fn update<T: CareRecord + Clean>(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    JsonBody(form): JsonBody<ElderRecordForm<T>>,
) -> AppResult<Json<StoredRecord<T>>> {
    debug!("Handling update {} {}", T::KIND.as_str(), id);
    visible_record::<T>(&state, &actor, id)?;

    let mut errors = FormErrors::new();
    form.body.clean(&state.store, &mut errors)?;
    let elder = chosen_elder(&state, &actor, form.elder, errors)?;

    let updated = state
        .store
        .update_record(id, elder.id, &form.body)?
        .ok_or_else(|| AppError::not_found(T::KIND.label()))?;
    info!("{} {} updated by {}", T::KIND.label(), id, actor.username);
    Ok(Json(updated))
}

pub async fn remove<T: CareRecord>(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    debug!("Handling delete {} {}", T::KIND.as_str(), id);
    visible_record::<T>(&state, &actor, id)?;

    if !state.store.delete_record(T::KIND, id)? {
        return Err(AppError::not_found(T::KIND.label()));
    }
    info!("{} {} deleted by {}", T::KIND.label(), id, actor.username);
    Ok(StatusCode::NO_CONTENT)
}
