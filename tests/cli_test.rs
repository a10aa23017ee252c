//! Command-line surface tests
//!
//! Runs the `mediagraph` binary with `assert_cmd`, against a `wiremock`
//! backend where a command needs one.

use assert_cmd::assert::{Assert, OutputAssertExt};
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

fn mediagraph() -> Command {
    let mut cmd = Command::cargo_bin("mediagraph").unwrap();
    cmd.env_remove("MEDIAGRAPH_API_BASE_URL")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg("/nonexistent/mediagraph.yaml");
    cmd
}

/// Run a blocking command without stalling the mock server's runtime
async fn run(mut cmd: Command) -> Assert {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
        .assert()
}

#[test]
fn test_help_lists_commands() {
    mediagraph()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("ask"))
        .stdout(predicate::str::contains("sessions"));
}

#[test]
fn test_ask_requires_query() {
    mediagraph()
        .arg("ask")
        .assert()
        .failure()
        .stderr(predicate::str::contains("<QUERY>"));
}

#[test]
fn test_blank_query_is_rejected() {
    mediagraph()
        .args(["ask", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Query cannot be empty"));
}

#[test]
fn test_invalid_config_fails_validation() {
    let (_temp_dir, config_path) =
        common::temp_config_file("api:\n  base_url: ftp://movies.example\n");

    let mut cmd = Command::cargo_bin("mediagraph").unwrap();
    cmd.env_remove("MEDIAGRAPH_API_BASE_URL")
        .arg("--config")
        .arg(config_path)
        .arg("health");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("http or https"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sessions_list_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chat/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "_id": "a", "created_at": "2024-01-01T00:00:00Z", "messages": [] }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = mediagraph();
    cmd.args(["--base-url", server.uri().as_str(), "sessions", "list", "--json"]);
    let assert = run(cmd).await.success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let sessions: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(sessions[0]["id"], "a");
    assert_eq!(sessions[0]["title"], "Chat 1/1/2024");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_ask_json_reports_new_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "_id": "sess-1" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .and(query_param("session_id", "sess-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::query_body(
            "Try Chinatown",
            "movie",
            3,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = mediagraph();
    cmd.args([
        "--base-url",
        server.uri().as_str(),
        "ask",
        "Show me movies about betrayal",
        "--json",
    ]);
    let assert = run(cmd).await.success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let result: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(result["session_id"], "sess-1");
    assert_eq!(result["messages"][0]["role"], "user");
    assert_eq!(result["messages"][1]["content"], "Try Chinatown");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_ask_prints_reply_and_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .and(query_param("session_id", "existing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::query_body(
            "Try Chinatown",
            "movie",
            3,
        )))
        .mount(&server)
        .await;

    let mut cmd = mediagraph();
    cmd.args([
        "--base-url",
        server.uri().as_str(),
        "ask",
        "betrayal",
        "--session",
        "existing",
    ]);
    run(cmd)
        .await
        .success()
        .stdout(predicate::str::contains("Try Chinatown"))
        .stdout(predicate::str::contains("Query type: movie"))
        .stdout(predicate::str::contains("Found 3 relevant results"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_health_failure_exits_nonzero() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut cmd = mediagraph();
    cmd.args(["--base-url", server.uri().as_str(), "health"]);
    run(cmd)
        .await
        .failure()
        .stderr(predicate::str::contains("HTTP 500"));
}
