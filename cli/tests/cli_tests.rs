use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// A `pbctl` invocation rooted in `dir`, isolated from the caller's environment.
fn pbctl(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pbctl").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("DATA_PATH")
        .env_remove("AUTHZ_CONFIG")
        .env_remove("API_URL")
        .env_remove("RUST_LOG");
    cmd
}

fn stdout_json(output: &[u8]) -> serde_json::Value {
    serde_json::from_slice(output).expect("stdout is JSON")
}

#[test]
fn test_cli_help() {
    let dir = TempDir::new().unwrap();
    pbctl(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Postboard CLI"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn test_cli_version() {
    let dir = TempDir::new().unwrap();
    pbctl(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pbctl"));
}

#[test]
fn test_roles_list_json() {
    let dir = TempDir::new().unwrap();
    let output = pbctl(&dir)
        .args(["roles", "list", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let roles = stdout_json(&output.stdout);
    let names: Vec<&str> = roles
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["admin", "client", "professor"]);

    let professor = &roles[2]["permissions"];
    assert_eq!(
        professor,
        &serde_json::json!(["post.create", "post.read", "post.update"])
    );
}

#[test]
fn test_roles_list_text() {
    let dir = TempDir::new().unwrap();
    pbctl(&dir)
        .args(["roles", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("user.manage"))
        .stdout(predicate::str::contains("Total roles: 3"));
}

#[test]
fn test_check_route_wrong_section_redirects_home() {
    let dir = TempDir::new().unwrap();
    let output = pbctl(&dir)
        .args([
            "check", "route", "/admin/users", "--role", "client", "--format", "json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let decision = stdout_json(&output.stdout);
    assert_eq!(decision["decision"], "redirect");
    assert_eq!(decision["to"], "/client");
}

#[test]
fn test_check_route_section_root_goes_to_dashboard() {
    let dir = TempDir::new().unwrap();
    let output = pbctl(&dir)
        .args(["check", "route", "/admin", "--role", "admin", "--format", "json"])
        .output()
        .unwrap();

    let decision = stdout_json(&output.stdout);
    assert_eq!(decision["decision"], "redirect");
    assert_eq!(decision["to"], "/admin/dashboard");
}

#[test]
fn test_check_route_role_without_section_is_logged_out() {
    let dir = TempDir::new().unwrap();
    pbctl(&dir)
        .args(["check", "route", "/client/posts", "--role", "professor"])
        .assert()
        .success()
        .stdout(predicate::str::contains("FORCE LOGOUT"))
        .stdout(predicate::str::contains("/login"));
}

#[test]
fn test_check_route_anonymous_keeps_destination() {
    let dir = TempDir::new().unwrap();
    let output = pbctl(&dir)
        .args(["check", "route", "/client/posts", "--anonymous", "--format", "json"])
        .output()
        .unwrap();

    let decision = stdout_json(&output.stdout);
    assert_eq!(decision["to"], "/login");
    assert_eq!(decision["redirect"], "/client/posts");
}

#[test]
fn test_check_perms_all_and_any() {
    let dir = TempDir::new().unwrap();
    pbctl(&dir)
        .args([
            "check",
            "perms",
            "--role",
            "professor",
            "post.update",
            "post.delete",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("HIDDEN"));

    pbctl(&dir)
        .args([
            "check",
            "perms",
            "--role",
            "professor",
            "--any",
            "post.update",
            "post.delete",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("RENDER"));
}

#[test]
fn test_check_perms_unknown_permission_fails() {
    let dir = TempDir::new().unwrap();
    pbctl(&dir)
        .args(["check", "perms", "--role", "admin", "post.publish"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("post.publish"));
}

#[test]
fn test_check_policy_owner_rule() {
    let dir = TempDir::new().unwrap();
    let output = pbctl(&dir)
        .args([
            "check", "policy", "--user-id", "7", "--role", "admin", "update", "post", "--id",
            "1", "--owner", "3", "--format", "json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let decision = stdout_json(&output.stdout);
    assert_eq!(decision["allowed"], false);
    assert_eq!(decision["reason"], "not owner of resource");

    pbctl(&dir)
        .args([
            "check", "policy", "--user-id", "3", "--role", "professor", "update", "post",
            "--id", "1", "--owner", "3",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("ALLOWED"));
}

#[test]
fn test_seed_then_create_and_list_users() {
    let dir = TempDir::new().unwrap();

    pbctl(&dir)
        .arg("seed")
        .assert()
        .success()
        .stdout(predicate::str::contains("created"))
        .stdout(predicate::str::contains("admin"));
    assert!(dir.path().join("data").join("postboard.db").exists());

    // A second run has nothing left to sync.
    pbctl(&dir)
        .arg("seed")
        .assert()
        .success()
        .stdout(predicate::str::contains("already in sync"));

    pbctl(&dir)
        .args([
            "user",
            "create",
            "--name",
            "Ada",
            "--email",
            "ada@example.com",
            "--password",
            "correct horse",
            "--role",
            "client",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("ada@example.com"));

    pbctl(&dir)
        .args([
            "user",
            "assign-roles",
            "--email",
            "ada@example.com",
            "--role",
            "admin",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("primary: admin"));

    let output = pbctl(&dir)
        .args(["user", "list", "--format", "json"])
        .output()
        .unwrap();
    let users = stdout_json(&output.stdout);
    assert_eq!(users[0]["email"], "ada@example.com");
    assert_eq!(users[0]["roles"], serde_json::json!(["admin"]));
}

#[test]
fn test_user_create_rejects_unknown_role() {
    let dir = TempDir::new().unwrap();
    pbctl(&dir)
        .args([
            "user",
            "create",
            "--name",
            "Eve",
            "--email",
            "eve@example.com",
            "--password",
            "long enough",
            "--role",
            "superuser",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("superuser"));
}

#[test]
fn test_data_path_from_env() {
    let dir = TempDir::new().unwrap();
    pbctl(&dir)
        .env("DATA_PATH", "elsewhere")
        .arg("seed")
        .assert()
        .success();

    assert!(dir.path().join("elsewhere").join("postboard.db").exists());
}

#[test]
fn test_config_init_show_and_validate() {
    let dir = TempDir::new().unwrap();

    pbctl(&dir)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));
    assert!(dir.path().join("config").join("authz.yaml").exists());

    // Refuses to clobber without --force.
    pbctl(&dir)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    pbctl(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("login_path: /login"));

    pbctl(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 roles"));
}

#[test]
fn test_config_changes_take_effect() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("config")).unwrap();
    fs::write(
        dir.path().join("config").join("authz.yaml"),
        r#"roles:
  - name: admin
    permissions: [post.read, user.manage]
  - name: editor
    permissions: [post.read, post.update]
sections:
  - role: admin
    root: /admin
    dashboard: /admin/dashboard
  - role: editor
    root: /editor
    dashboard: /editor/dashboard
"#,
    )
    .unwrap();

    let output = pbctl(&dir)
        .args(["check", "route", "/admin", "--role", "editor", "--format", "json"])
        .output()
        .unwrap();
    let decision = stdout_json(&output.stdout);
    assert_eq!(decision["to"], "/editor");
}

#[test]
fn test_config_validate_rejects_unknown_permission() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("config")).unwrap();
    fs::write(
        dir.path().join("config").join("authz.yaml"),
        "roles:\n  - name: admin\n    permissions: [post.publish]\n",
    )
    .unwrap();

    pbctl(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("post.publish"));
}

#[test]
fn test_health_command_json() {
    let dir = TempDir::new().unwrap();
    let output = pbctl(&dir)
        .args(["health", "--format", "json", "--url", "http://127.0.0.1:9"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let health = stdout_json(&output.stdout);
    assert_eq!(health["status"], "degraded");
    assert_eq!(health["components"]["database"]["status"], "not_initialized");
    assert_eq!(health["components"]["configuration"]["status"], "healthy");
    assert_eq!(health["components"]["api"]["status"], "offline");
}

#[test]
fn test_health_command_text() {
    let dir = TempDir::new().unwrap();
    pbctl(&dir)
        .args(["health", "--url", "http://127.0.0.1:9"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Postboard System Health Check"))
        .stdout(predicate::str::contains("Overall Status"));
}
