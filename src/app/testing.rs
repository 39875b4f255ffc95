//! Router fixture shared by the handler tests: a user file and a matching
//! v2ray server config in a temp dir.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;

use crate::app::{router, AppState};
use crate::config::Settings;

pub const USERS: &str = r#"{"clients": [
    {"id": "abcd1234-ef56-4a1b-9c2d-3e4f5a6b7890", "alterId": 1, "username": "mgmg",
     "deviceId": "", "startDate": "2024-12-01", "expireDate": "2025-01-01"},
    {"id": "11112222-3333-4444-8555-666677778888", "alterId": 1, "username": "aye",
     "deviceId": "5f0c2a9e-77d1-4b3c-a0e8-0d9c8b7a6f54", "startDate": "2025-02-01", "expireDate": "2999-03-01"}
]}"#;

pub const SERVER: &str = r#"{"inbounds": [{"port": 443, "protocol": "vmess", "settings": {"clients": [
    {"id": "abcd1234-ef56-4a1b-9c2d-3e4f5a6b7890", "alterId": 1},
    {"id": "11112222-3333-4444-8555-666677778888", "alterId": 1}
]}}]}"#;

pub struct TestApp {
    _dir: tempfile::TempDir,
    pub router: Router,
    pub user_file: PathBuf,
    pub server_config: PathBuf,
}

impl TestApp {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let user_file = dir.path().join("user_data.json");
        let server_config = dir.path().join("server.json");
        std::fs::write(&user_file, USERS).unwrap();
        std::fs::write(&server_config, SERVER).unwrap();

        let settings = Settings {
            server_host: "sg1-v2.example.shop".to_string(),
            user_file: user_file.clone(),
            v2ray_config: server_config.clone(),
            ..Settings::default()
        };
        Self {
            _dir: dir,
            router: router(Arc::new(AppState::new(settings))),
            user_file,
            server_config,
        }
    }

    pub async fn call(
        &self,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let body = body.map(|v| serde_json::to_string(&v).unwrap());
        self.call_raw(method, uri, body).await
    }

    /// Sends `body` as is, for payloads that are not valid JSON.
    pub async fn call_raw(
        &self,
        method: &str,
        uri: &str,
        body: Option<String>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("host", "sg1.panel.example.com:8888");
        if body.is_some() {
            builder = builder.header("content-type", "application/json");
        }
        let body = body.map(Body::from).unwrap_or_else(Body::empty);
        let resp = self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    pub fn user_names(&self) -> Vec<String> {
        let text = std::fs::read_to_string(&self.user_file).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
        doc["clients"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["username"].as_str().unwrap().to_string())
            .collect()
    }

    pub fn inbound_ids(&self) -> Vec<String> {
        let text = std::fs::read_to_string(&self.server_config).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
        doc["inbounds"][0]["settings"]["clients"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["id"].as_str().unwrap().to_string())
            .collect()
    }
}
