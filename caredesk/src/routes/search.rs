//! Scoped search across elders, medications, tasks and appointments.

use axum::{
    extract::State,
    response::Json,
    Extension,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use wards::{AccessScope, Actor};

use crate::extract::Query;
use crate::models::{Appointment, CareTask, Elder, Medication, SearchCategory, StoredRecord};
use crate::{AppResult, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub category: SearchCategory,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub query: String,
    pub category: SearchCategory,
    pub elders: Vec<Elder>,
    pub medications: Vec<Medication>,
    pub tasks: Vec<StoredRecord<CareTask>>,
    pub appointments: Vec<StoredRecord<Appointment>>,
}

/// GET /api/search?query=&category=
///
/// Elders, tasks and appointments are limited to the actor's scope. The
/// medication catalogue is shared.
pub async fn search(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<SearchResults>> {
    let term = params.query.trim();
    debug!(
        "Handling search for {:?} in {} by {}",
        term,
        params.category.as_str(),
        actor.username
    );

    let mut results = SearchResults {
        query: term.to_string(),
        category: params.category,
        ..SearchResults::default()
    };
    if term.is_empty() {
        return Ok(Json(results));
    }

    let scope = AccessScope::for_actor(&actor);
    let wants = |category: SearchCategory| {
        params.category == SearchCategory::All || params.category == category
    };
    if wants(SearchCategory::Elders) {
        results.elders = state.store.search_elders(&scope, term)?;
    }
    if wants(SearchCategory::Medications) {
        results.medications = state.store.search_medications(term)?;
    }
    if wants(SearchCategory::Tasks) {
        results.tasks = state.store.search_records(&scope, term)?;
    }
    if wants(SearchCategory::Appointments) {
        results.appointments = state.store.search_records(&scope, term)?;
    }
    Ok(Json(results))
}
