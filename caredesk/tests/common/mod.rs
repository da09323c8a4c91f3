//! Shared harness for the HTTP specs: an app over an in-memory store plus
//! helpers to seed users and send authenticated JSON requests.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use caredesk::auth::{issue_token, JwtConfig};
use caredesk::store::{CareStore, NewUser};
use caredesk::{create_app, AppState};
use jsonwebtoken::Algorithm;
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot`
use wards::{Role, UserId};

pub const TEST_SECRET: &str = "test-secret";

pub struct Desk {
    pub app: Router,
    pub state: AppState,
}

pub struct Login {
    pub id: UserId,
    pub token: String,
}

pub fn desk() -> Desk {
    let store = CareStore::open_in_memory().unwrap();
    let jwt = JwtConfig::new(TEST_SECRET.to_string(), Algorithm::HS256);
    let state = AppState::new(store, jwt);
    Desk {
        app: create_app(state.clone()),
        state,
    }
}

impl Desk {
    /// Seed a user directly in the store and mint a token for them.
    pub fn login(&self, username: &str, role: Option<Role>) -> Login {
        let user = self
            .state
            .store
            .create_user(
                &NewUser {
                    username: username.to_string(),
                    first_name: "Test".to_string(),
                    last_name: "User".to_string(),
                    email: format!("{username}@example.com"),
                },
                "password123",
                role,
            )
            .unwrap();
        Login {
            id: user.id,
            token: issue_token(&self.state.jwt, username).unwrap(),
        }
    }

    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, login: &Login) -> (StatusCode, Value) {
        self.send("GET", uri, Some(&login.token), None).await
    }

    pub async fn post(&self, uri: &str, login: &Login, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, Some(&login.token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, login: &Login, body: Value) -> (StatusCode, Value) {
        self.send("PUT", uri, Some(&login.token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, login: &Login) -> (StatusCode, Value) {
        self.send("DELETE", uri, Some(&login.token), None).await
    }

    /// Create an elder through the API and return its id.
    pub async fn add_elder(&self, login: &Login, name: &str) -> i64 {
        let (status, body) = self
            .post("/api/elders", login, json!({ "fullName": name, "dateOfBirth": "1940-03-14" }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().unwrap()
    }
}

pub fn care_task(elder: i64, title: &str) -> Value {
    json!({
        "elder": elder,
        "title": title,
        "taskType": "MEAL",
        "frequency": "DAILY",
        "priority": "MEDIUM"
    })
}

pub fn ids(list: &Value) -> Vec<i64> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_i64().unwrap())
        .collect()
}
