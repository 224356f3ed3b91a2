#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use yamdb::api::AppState;
use yamdb::config::Config;
use yamdb::db::NewUser;
use yamdb::domain::Role;
use yamdb::services::{Blake3TokenCodec, MailMessage, Mailer, TokenCodec};

/// Keeps every message instead of delivering it.
#[derive(Default)]
pub struct CapturingMailer {
    pub sent: Mutex<Vec<MailMessage>>,
}

impl CapturingMailer {
    pub fn last_code(&self) -> Option<String> {
        let sent = self.sent.lock().unwrap();
        sent.last()
            .and_then(|m| m.body.rsplit(' ').next())
            .map(ToString::to_string)
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Mailer for CapturingMailer {
    async fn send(&self, message: MailMessage) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

pub struct FailingMailer;

#[async_trait::async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _message: MailMessage) -> anyhow::Result<()> {
        anyhow::bail!("connection refused")
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub mailer: Arc<CapturingMailer>,
    db_path: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut path = self.db_path.clone().into_os_string();
            path.push(suffix);
            let _ = std::fs::remove_file(path);
        }
    }
}

fn test_config() -> (Config, PathBuf) {
    let db_path = std::env::temp_dir().join(format!("yamdb-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.security.confirmation_secret = "test-secret".to_string();
    // Cheap hashes keep the password tests fast.
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    (config, db_path)
}

pub async fn spawn_app() -> TestApp {
    let mailer = Arc::new(CapturingMailer::default());
    spawn_app_with(mailer.clone(), mailer).await
}

pub async fn spawn_app_with(mailer: Arc<CapturingMailer>, outgoing: Arc<dyn Mailer>) -> TestApp {
    let (config, db_path) = test_config();
    let codec: Arc<dyn TokenCodec> = Arc::new(Blake3TokenCodec::new("test-secret"));

    let state = yamdb::api::create_app_state_with(config, outgoing, codec)
        .await
        .expect("Failed to create app state");
    let router = yamdb::api::router(state.clone()).await;

    TestApp {
        router,
        state,
        mailer,
        db_path,
    }
}

impl TestApp {
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
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send("GET", uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send("PATCH", uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send("DELETE", uri, token, None).await
    }

    /// Creates an active account with `role` and returns its bearer token.
    pub async fn user_with_role(&self, username: &str, role: Role) -> String {
        let store = &self.state.shared.store;
        let user = store
            .create_user(NewUser {
                email: format!("{username}@example.com"),
                username: username.to_string(),
                first_name: String::new(),
                last_name: String::new(),
                bio: String::new(),
                role,
                is_active: true,
            })
            .await
            .unwrap();
        store.activate_user(user.id).await.unwrap()
    }

    pub async fn admin(&self) -> String {
        self.user_with_role("admin", Role::Admin).await
    }

    /// Creates a title through the API and returns its id.
    pub async fn create_title(&self, admin: &str, body: Value) -> i64 {
        let (status, json) = self.post("/api/v1/titles", Some(admin), body).await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
        json["data"]["id"].as_i64().unwrap()
    }

    pub async fn create_review(&self, token: &str, title_id: i64, score: i32) -> i64 {
        let (status, json) = self
            .post(
                &format!("/api/v1/titles/{title_id}/reviews"),
                Some(token),
                serde_json::json!({ "text": "Worth a watch", "score": score }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
        json["data"]["id"].as_i64().unwrap()
    }

    pub async fn rating(&self, title_id: i64) -> Value {
        let (status, json) = self.get(&format!("/api/v1/titles/{title_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        json["data"]["rating"].clone()
    }
}
