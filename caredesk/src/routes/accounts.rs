//! Registration and profile handlers.

use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    Extension,
};
use tracing::{debug, info};
use wards::{Actor, UserId};

use super::{created, denied};
use crate::extract::{JsonBody, Path};
use crate::forms::{validate, FormErrors};
use crate::models::{Account, Profile, ProfileForm, RegistrationForm};
use crate::store::{NewUser, StoreError};
use crate::{AppError, AppResult, AppState};

/// POST /api/users - Self-service registration
pub async fn register(
    State(state): State<AppState>,
    JsonBody(form): JsonBody<RegistrationForm>,
) -> AppResult<(StatusCode, Json<Account>)> {
    debug!("Handling POST /api/users for {}", form.username);

    validate(&form, &state.store)??;
    let role = wards::registration_role(form.role).map_err(|e| {
        tracing::warn!("Registration of {} asked for role {:?}", form.username, form.role);
        AppError::from(e)
    })?;

    let new_user = NewUser {
        username: form.username.trim().to_string(),
        first_name: form.first_name.trim().to_string(),
        last_name: form.last_name.trim().to_string(),
        email: form.email.trim().to_string(),
    };
    // Password hashing is CPU bound; keep it off the async workers.
    let store = state.store.clone();
    let password = form.password1.clone();
    let outcome =
        tokio::task::spawn_blocking(move || store.create_user(&new_user, &password, Some(role)))
            .await
            .context("joining user creation task")?;
    let user = match outcome {
        Ok(user) => user,
        Err(StoreError::DuplicateUsername(_)) => {
            let mut errors = FormErrors::new();
            errors.add("username", "A user with that username already exists.");
            return Err(errors.into());
        }
        Err(e) => return Err(e.into()),
    };

    let account = state
        .store
        .account(user.id)?
        .ok_or_else(|| AppError::not_found("User"))?;
    info!("Registered {} as {}", account.user.username, role);
    Ok(created(account))
}

/// GET /api/me - The authenticated user and their profile
pub async fn me(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> AppResult<Json<Account>> {
    debug!("Handling GET /api/me for {}", actor.username);
    let account = state
        .store
        .account(actor.user_id)?
        .ok_or_else(|| AppError::not_found("User"))?;
    Ok(Json(account))
}

/// PUT /api/users/:id/profile - Edit names, contact details and role
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    JsonBody(form): JsonBody<ProfileForm>,
) -> AppResult<Json<Account>> {
    let target = UserId(id);
    debug!("Handling PUT /api/users/{}/profile by {}", target, actor.username);

    wards::authorize_profile_edit(&actor, target).map_err(|e| denied(&actor, e))?;
    let current = state
        .store
        .account(target)?
        .ok_or_else(|| AppError::not_found("User"))?;

    validate(&form, &state.store)??;
    wards::authorize_role_change(&actor, current.effective_role, form.role)
        .map_err(|e| denied(&actor, e))?;

    let profile = Profile {
        user_id: target,
        role: form.role,
        phone: form.phone,
        address: form.address,
        emergency_contact: form.emergency_contact,
        emergency_phone: form.emergency_phone,
    };
    state.store.save_profile(
        form.first_name.trim(),
        form.last_name.trim(),
        form.email.trim(),
        &profile,
    )?;

    let account = state
        .store
        .account(target)?
        .ok_or_else(|| AppError::not_found("User"))?;
    info!(
        "Profile of {} saved by {} (role {})",
        account.user.username, actor.username, account.effective_role
    );
    Ok(Json(account))
}
