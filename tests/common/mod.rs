use std::fs;
use std::path::PathBuf;

use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::MockServer;

use mediagraph::config::{ApiConfig, ChatConfig};
use mediagraph::transport::HttpSessionTransport;

/// Transport pointed at a running mock server
#[allow(dead_code)]
pub fn transport_for(server: &MockServer) -> HttpSessionTransport {
    HttpSessionTransport::new(&ApiConfig {
        base_url: server.uri(),
        timeout_seconds: 5,
        ..Default::default()
    })
    .expect("failed to build transport")
}

/// Controller settings with lazy session creation
#[allow(dead_code)]
pub fn lazy_chat() -> ChatConfig {
    ChatConfig {
        eager_session: false,
        ..Default::default()
    }
}

/// Body of a successful `POST /query`
#[allow(dead_code)]
pub fn query_body(response: &str, label: &str, results: usize) -> Value {
    json!({
        "response": response,
        "original_query": "q",
        "enhanced_query": "enhanced q",
        "detected_label": label,
        "results": (0..results)
            .map(|i| json!({ "node_id": format!("node-{}", i), "similarity": 0.9 }))
            .collect::<Vec<_>>(),
    })
}

/// Stored session document the way the backend returns it
#[allow(dead_code)]
pub fn session_doc(id: &str, title: Option<&str>, messages: Value) -> Value {
    let mut doc = json!({
        "_id": id,
        "created_at": "2024-01-01T00:00:00",
        "messages": messages,
    });
    if let Some(title) = title {
        doc["title"] = json!(title);
    }
    doc
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}
