//! Registration and profile role changes

mod common;

use axum::http::StatusCode;
use caredesk::auth::issue_token;
use common::desk;
use serde_json::{json, Value};
use wards::Role;

fn registration(username: &str) -> Value {
    json!({
        "username": username,
        "firstName": "Jane",
        "lastName": "Doe",
        "email": format!("{username}@example.com"),
        "password1": "correct horse",
        "password2": "correct horse"
    })
}

fn profile(role: &str) -> Value {
    json!({
        "firstName": "Jane",
        "lastName": "Doe",
        "email": "jane@example.com",
        "role": role,
        "phone": "+1234567890"
    })
}

#[tokio::test]
async fn given_registration_without_role_when_submitted_then_user_is_caregiver() {
    let desk = desk();

    let (status, body) = desk
        .send("POST", "/api/users", None, Some(registration("carer1")))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "carer1");
    assert_eq!(body["effectiveRole"], "CAREGIVER");
    assert_eq!(body["profile"]["role"], "CAREGIVER");
    assert!(body.get("password1").is_none());

    let token = issue_token(&desk.state.jwt, "carer1").unwrap();
    let (status, me) = desk.send("GET", "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], body["id"]);
}

#[tokio::test]
async fn given_registration_asking_for_admin_when_submitted_then_permission_denied() {
    let desk = desk();
    let mut form = registration("sneaky");
    form["role"] = json!("ADMIN");

    let (status, body) = desk.send("POST", "/api/users", None, Some(form)).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["fields"]["role"].is_array());
    assert!(desk.state.store.user_by_username("sneaky").unwrap().is_none());
}

#[tokio::test]
async fn given_mismatched_passwords_when_registering_then_validation_fails() {
    let desk = desk();
    let mut form = registration("family1");
    form["password2"] = json!("battery staple");

    let (status, body) = desk.send("POST", "/api/users", None, Some(form)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["fields"]["password2"][0], "Passwords don't match");
}

#[tokio::test]
async fn given_taken_username_when_registering_then_validation_fails() {
    let desk = desk();
    desk.login("family1", Some(Role::Guardian));

    let (status, body) = desk
        .send("POST", "/api/users", None, Some(registration("family1")))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["fields"]["username"].is_array());
}

#[tokio::test]
async fn given_nurse_when_changing_own_role_then_permission_denied() {
    let desk = desk();
    let nurse = desk.login("nurse1", Some(Role::Nurse));
    let uri = format!("/api/users/{}/profile", nurse.id);

    let (status, body) = desk.put(&uri, &nurse, profile("ADMIN")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Only administrators can change user roles.");
    assert!(body["fields"]["role"].is_array());

    let (status, body) = desk.put(&uri, &nurse, profile("NURSE")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["effectiveRole"], "NURSE");
    assert_eq!(body["firstName"], "Jane");
    assert_eq!(body["profile"]["phone"], "+1234567890");
}

#[tokio::test]
async fn given_user_without_profile_when_saving_profile_then_guardian_role_is_kept() {
    let desk = desk();
    let bare = desk.login("bare", None);
    let uri = format!("/api/users/{}/profile", bare.id);

    let (status, _) = desk.put(&uri, &bare, profile("DOCTOR")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = desk.put(&uri, &bare, profile("GUARDIAN")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["role"], "GUARDIAN");
}

#[tokio::test]
async fn given_admin_when_changing_role_then_new_role_takes_effect() {
    let desk = desk();
    let admin = desk.login("admin1", Some(Role::Admin));
    let family = desk.login("family1", Some(Role::Guardian));
    let other = desk.login("family2", Some(Role::Guardian));
    desk.add_elder(&other, "Mary Major").await;

    let (_, before) = desk.get("/api/elders", &family).await;
    assert!(before.as_array().unwrap().is_empty());

    let (status, _) = desk
        .put(
            &format!("/api/users/{}/profile", family.id),
            &admin,
            profile("NURSE"),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, after) = desk.get("/api/elders", &family).await;
    assert_eq!(after.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn given_non_admin_when_editing_another_profile_then_permission_denied() {
    let desk = desk();
    let doctor = desk.login("doctor1", Some(Role::Doctor));
    let family = desk.login("family1", Some(Role::Guardian));

    let (status, body) = desk
        .put(
            &format!("/api/users/{}/profile", family.id),
            &doctor,
            profile("GUARDIAN"),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "You can only edit your own profile.");
}

#[tokio::test]
async fn given_long_names_when_saving_profile_then_validation_fails() {
    let desk = desk();
    let family = desk.login("family1", Some(Role::Guardian));
    let mut form = profile("GUARDIAN");
    form["firstName"] = json!("J".repeat(31));
    form["email"] = json!("not-an-email");

    let (status, body) = desk
        .put(&format!("/api/users/{}/profile", family.id), &family, form)
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["fields"]["firstName"].is_array());
    assert!(body["fields"]["email"].is_array());
}
