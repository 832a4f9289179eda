//! Integration tests for login/logout commands.

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::tempdir;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

async fn auth_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({"username": "admin", "password": "admin123"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "jwt-admin-token",
            "username": "admin",
            "role": "ROLE_ADMIN",
            "name": "Campus Admin",
            "email": "admin@campus.test"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_login_stores_session() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let temp = tempdir().unwrap();
    let server = auth_server().await;

    cargo_bin_cmd!("campus")
        .env("CAMPUS_HOME", temp.path())
        .env("CAMPUS_AUTH_BASE_URL", format!("{}/api/auth", server.uri()))
        .args(["login", "--username", "admin", "--password", "admin123"])
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Logged in as Campus Admin"))
        .stdout(predicate::str::contains("session.json"));

    let stored: Value =
        serde_json::from_str(&fs::read_to_string(temp.path().join("session.json")).unwrap())
            .unwrap();
    assert_eq!(stored["token"], "jwt-admin-token");
    assert_eq!(stored["role"], "ROLE_ADMIN");

    cargo_bin_cmd!("campus")
        .env("CAMPUS_HOME", temp.path())
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("username: admin"))
        .stdout(predicate::str::contains("jwt-admin-token").not());
}

#[tokio::test]
async fn test_login_prompts_for_missing_credentials() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let temp = tempdir().unwrap();
    let server = auth_server().await;

    cargo_bin_cmd!("campus")
        .env("CAMPUS_HOME", temp.path())
        .env("CAMPUS_AUTH_BASE_URL", format!("{}/api/auth", server.uri()))
        .env_remove("CAMPUS_PASSWORD")
        .arg("login")
        .write_stdin("admin\nadmin123\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Username: "))
        .stdout(predicate::str::contains("✓ Logged in"));

    assert!(temp.path().join("session.json").exists());
}

#[tokio::test]
async fn test_wrong_password_is_rejected_without_writing() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let temp = tempdir().unwrap();
    let server = auth_server().await;

    cargo_bin_cmd!("campus")
        .env("CAMPUS_HOME", temp.path())
        .env("CAMPUS_AUTH_BASE_URL", format!("{}/api/auth", server.uri()))
        .env("CAMPUS_PASSWORD", "wrongpass")
        .args(["login", "--username", "admin"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid username or password"));

    assert!(!temp.path().join("session.json").exists());
}

#[test]
fn test_logout_when_not_logged_in() {
    let temp = tempdir().unwrap();

    cargo_bin_cmd!("campus")
        .env("CAMPUS_HOME", temp.path())
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in"));
}

#[test]
fn test_logout_removes_session() {
    let temp = tempdir().unwrap();
    let session_path = temp.path().join("session.json");
    fs::write(
        &session_path,
        r#"{"token":"tok","username":"user","role":"ROLE_USER"}"#,
    )
    .unwrap();

    cargo_bin_cmd!("campus")
        .env("CAMPUS_HOME", temp.path())
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Logged out"));

    assert!(!session_path.exists());
}

#[test]
fn test_oauth_redirect_with_token_stores_session() {
    let temp = tempdir().unwrap();

    cargo_bin_cmd!("campus")
        .env("CAMPUS_HOME", temp.path())
        .env("CAMPUS_NO_BROWSER", "1")
        .args(["login", "--oauth"])
        .write_stdin(
            "http://localhost:3000/oauth2/redirect?token=oauth-jwt&username=alice&role=ROLE_USER&name=Alice%20Smith\n",
        )
        .assert()
        .success()
        .stdout(predicate::str::contains("Authorization URL"))
        .stdout(predicate::str::contains("✓ Logged in as Alice Smith"));

    let stored: Value =
        serde_json::from_str(&fs::read_to_string(temp.path().join("session.json")).unwrap())
            .unwrap();
    assert_eq!(stored["token"], "oauth-jwt");
    assert_eq!(stored["username"], "alice");
}

#[test]
fn test_oauth_redirect_without_token_fails() {
    let temp = tempdir().unwrap();

    cargo_bin_cmd!("campus")
        .env("CAMPUS_HOME", temp.path())
        .env("CAMPUS_NO_BROWSER", "1")
        .args(["login", "--oauth"])
        .write_stdin("/oauth2/redirect?username=alice\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Sign-in with the identity provider failed"));

    assert!(!temp.path().join("session.json").exists());
}

#[test]
fn test_whoami_without_session() {
    let temp = tempdir().unwrap();

    cargo_bin_cmd!("campus")
        .env("CAMPUS_HOME", temp.path())
        .arg("whoami")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in"));
}
