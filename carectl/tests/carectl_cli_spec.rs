use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn carectl(db: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("carectl").unwrap();
    cmd.env(
        "DATABASE_URL",
        format!("sqlite://{}", db.path().join("care.db").display()),
    )
    .env_remove("JWT_SECRET")
    .env_remove("JWT_ALGORITHM")
    .env_remove("TOKEN_TTL_HOURS")
    .env_remove("CARECTL_PASSWORD");
    cmd
}

#[test]
fn given_version_command_when_run_then_prints_package_version() {
    let db = TempDir::new().unwrap();
    carectl(&db)
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn given_fresh_directory_when_init_db_then_database_file_exists() {
    let db = TempDir::new().unwrap();
    carectl(&db).arg("init-db").assert().success();
    assert!(db.path().join("care.db").exists());
}

#[test]
fn given_admin_user_when_issuing_token_then_token_is_printed() {
    let db = TempDir::new().unwrap();
    carectl(&db)
        .args([
            "create-user",
            "--username",
            "demo_user",
            "--role",
            "admin",
            "--password",
            "demo_password",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("role ADMIN"));

    carectl(&db)
        .env("JWT_SECRET", "test-secret")
        .args(["issue-token", "--username", "demo_user"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^[\w-]+\.[\w-]+\.[\w-]+\s*$").unwrap());
}

#[test]
fn given_no_password_when_creating_user_then_generated_password_is_printed() {
    let db = TempDir::new().unwrap();
    carectl(&db)
        .args(["create-user", "--username", "family1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no profile"))
        .stdout(predicate::str::contains("password: "));
}

#[test]
fn given_existing_username_when_creating_user_then_fails() {
    let db = TempDir::new().unwrap();
    let args = ["create-user", "--username", "nurse1", "--role", "NURSE"];
    carectl(&db).args(args).assert().success();
    carectl(&db)
        .args(args)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn given_missing_secret_when_issuing_token_then_fails() {
    let db = TempDir::new().unwrap();
    carectl(&db)
        .args(["create-user", "--username", "nurse1", "--role", "nurse"])
        .assert()
        .success();
    carectl(&db)
        .args(["issue-token", "--username", "nurse1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("JWT_SECRET"));
}

#[test]
fn given_unknown_role_when_creating_user_then_usage_error() {
    let db = TempDir::new().unwrap();
    carectl(&db)
        .args(["create-user", "--username", "x", "--role", "janitor"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown role"));
}
