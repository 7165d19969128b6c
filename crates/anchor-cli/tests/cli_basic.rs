//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run against the dev data directory
//! with the offline backend.

use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-q", "-p", "anchor-cli", "--"])
        .args(args)
        .env("ANCHOR_ENV", "dev")
        .env("ANCHOR_BACKEND", "local")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(args: &[&str]) -> serde_json::Value {
    let (stdout, stderr, code) = run_cli(args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

#[test]
fn test_relax_list() {
    let envs = run_json(&["relax", "list"]);
    let ids: Vec<&str> = envs
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["forest", "ocean", "mountain", "clouds"]);
}

#[test]
fn test_relax_show() {
    let (stdout, _, code) = run_cli(&["relax", "show", "ocean"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Ocean Waves"));
    assert!(stdout.contains("Gentle ocean waves"));
}

#[test]
fn test_relax_show_unknown() {
    let (_, stderr, code) = run_cli(&["relax", "show", "desert"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_chat_rooms() {
    let (stdout, _, code) = run_cli(&["chat", "rooms"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.lines().count(), 8);
    assert!(stdout.contains("Anxiety Support"));
}

#[test]
fn test_chat_open_seeds_welcome() {
    let history = run_json(&["chat", "open", "mindfulness", "--json"]);
    let first = &history.as_array().unwrap()[0];
    assert_eq!(first["content"], "Welcome to Mindfulness & Meditation! 👋");
    assert_eq!(first["isOwn"], false);
}

#[test]
fn test_chat_send_empty_fails() {
    let (_, stderr, code) = run_cli(&["chat", "send", "general", "   "]);
    assert_ne!(code, 0);
    assert!(stderr.contains("must not be empty"));
}

#[test]
fn test_checkin_rejects_out_of_range() {
    let (_, stderr, code) = run_cli(&["checkin", "submit", "--mood", "9"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("mood must be between 1 and 5"));
}

#[test]
fn test_achievements_lists_catalog() {
    let achievements = run_json(&["achievements"]);
    let earned = achievements["earned"].as_array().unwrap().len();
    let upcoming = achievements["upcoming"].as_array().unwrap().len();
    assert!(earned + upcoming >= 6);
}

#[test]
fn test_dashboard() {
    let (_, stderr, code) = run_cli(&["profile", "name", "Tester"]);
    assert_eq!(code, 0, "{stderr}");
    let (stdout, _, code) = run_cli(&["dashboard"]);
    assert_eq!(code, 0);
    assert!(stdout.starts_with("Good "));
    assert!(stdout.contains("Streak:"));
}

#[test]
fn test_auth_status_local() {
    let status = run_json(&["auth", "status"]);
    assert_eq!(status["backend"], "local");
    assert_eq!(status["signed_in"], true);
    assert_eq!(status["user_id"], "local");
}

#[test]
fn test_auth_login_needs_hosted_backend() {
    let (_, stderr, code) = run_cli(&["auth", "login", "--email", "a@b.c", "--password", "x"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("supabase"));
}

#[test]
fn test_config_get() {
    let (stdout, _, code) = run_cli(&["config", "get", "gamification.level_up"]);
    assert_eq!(code, 0);
    assert!(!stdout.trim().is_empty());
}

#[test]
fn test_config_get_unknown_key() {
    let (_, stderr, code) = run_cli(&["config", "get", "nope.nothing"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("unknown key"));
}
