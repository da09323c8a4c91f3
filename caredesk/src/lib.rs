//! Eldercare desk service
//!
//! REST API over users, elders and the care records attached to them. Every
//! elder reference goes through the access policy in the `wards` crate.

pub mod auth;
pub mod config;
pub mod extract;
pub mod forms;
pub mod models;
pub mod routes;
pub mod store;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use wards::PolicyError;

use crate::auth::JwtConfig;
use crate::config::{DatabaseLocation, ServiceConfig};
use crate::forms::FormErrors;
use crate::store::{CareStore, StoreError};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<CareStore>,
    pub jwt: JwtConfig,
}

impl AppState {
    pub fn new(store: CareStore, jwt: JwtConfig) -> Self {
        Self {
            store: Arc::new(store),
            jwt,
        }
    }

    /// Open the configured database and build state from it.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let store = match &config.database {
            DatabaseLocation::File(path) => CareStore::open(path)
                .with_context(|| format!("failed to open database {}", path.display()))?,
            DatabaseLocation::Memory => {
                CareStore::open_in_memory().context("failed to open in-memory database")?
            }
        };
        info!("Initialized care desk application state");
        Ok(Self::new(store, config.jwt.clone()))
    }
}

/// Error returned by handlers. Serialized as `{"error": .., "fields": ..}`.
#[derive(Debug)]
pub struct AppError {
    pub status_code: StatusCode,
    pub message: String,
    pub fields: Option<FormErrors>,
}

impl AppError {
    pub fn new(status_code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
            fields: None,
        }
    }

    pub fn not_found(what: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("{what} not found"))
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        error!("Store operation failed: {}", err);
        AppError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl From<PolicyError> for AppError {
    fn from(err: PolicyError) -> Self {
        let mut fields = FormErrors::new();
        fields.add(err.field(), err.message());
        AppError {
            status_code: StatusCode::FORBIDDEN,
            message: err.message().to_string(),
            fields: Some(fields),
        }
    }
}

impl From<FormErrors> for AppError {
    fn from(fields: FormErrors) -> Self {
        AppError {
            status_code: StatusCode::UNPROCESSABLE_ENTITY,
            message: "Validation failed".to_string(),
            fields: Some(fields),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        error!("Internal error: {:#}", err);
        AppError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = match self.fields {
            Some(fields) => json!({ "error": self.message, "fields": fields }),
            None => json!({ "error": self.message }),
        };
        (self.status_code, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Health check endpoint
async fn healthz() -> impl IntoResponse {
    "OK"
}

/// Create the Axum application router
pub fn create_app(state: AppState) -> Router {
    let protected = routes::api_router()
        .layer(middleware::from_fn_with_state(state.clone(), auth::jwt_middleware));

    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/users", post(routes::accounts::register))
        .merge(protected)
        // Avoid logging request headers so Authorization tokens never reach logs.
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
