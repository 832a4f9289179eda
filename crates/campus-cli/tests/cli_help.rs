use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_lists_commands() {
    cargo_bin_cmd!("campus")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("resources"))
        .stdout(predicate::str::contains("shell"));
}

#[test]
fn test_oauth_conflicts_with_password_flags() {
    cargo_bin_cmd!("campus")
        .args(["login", "--oauth", "--username", "admin"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}
