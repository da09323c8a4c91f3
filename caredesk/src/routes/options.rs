//! Picker contents for the actor's forms.

use axum::{extract::State, response::Json, Extension};
use serde::Serialize;
use tracing::debug;
use wards::{AccessScope, Actor, ElderId, GuardianChoices, Role, UserId};

use crate::models::SearchCategory;
use crate::{AppResult, AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElderOption {
    pub id: ElderId,
    pub full_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOption {
    pub id: UserId,
    pub username: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardianField {
    #[serde(flatten)]
    pub choices: GuardianChoices,
    pub editable: bool,
    pub help_text: Option<&'static str>,
    pub users: Vec<UserOption>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormOptions {
    pub elders: Vec<ElderOption>,
    pub guardian: GuardianField,
    pub role_editable: bool,
    pub roles: &'static [Role],
    pub search_categories: &'static [SearchCategory],
}

/// GET /api/form-options
pub async fn form_options(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> AppResult<Json<FormOptions>> {
    debug!("Handling GET /api/form-options for {}", actor.username);

    let elders = state
        .store
        .elders(&AccessScope::for_actor(&actor))?
        .into_iter()
        .map(|e| ElderOption {
            id: e.id,
            full_name: e.full_name,
        })
        .collect();

    let choices = GuardianChoices::for_actor(&actor);
    let users = match choices {
        GuardianChoices::AnyUser => state
            .store
            .users()?
            .into_iter()
            .map(|u| UserOption {
                id: u.id,
                username: u.username,
            })
            .collect(),
        GuardianChoices::OnlySelf { user_id } => vec![UserOption {
            id: user_id,
            username: actor.username.clone(),
        }],
    };

    Ok(Json(FormOptions {
        elders,
        guardian: GuardianField {
            editable: choices.editable(),
            help_text: choices.help_text(),
            choices,
            users,
        },
        role_editable: actor.is_admin(),
        roles: &Role::ALL,
        search_categories: SearchCategory::ALL,
    }))
}
