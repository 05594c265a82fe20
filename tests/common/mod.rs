//! Shared harness: full request dispatch against the in-memory repository

#![allow(dead_code)]

use async_trait::async_trait;
use clap::Parser;
use http_body_util::BodyExt;
use hyper::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use hyper::{Method, StatusCode};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use scholarship_tracker::auth::TokenInput;
use scholarship_tracker::config::Args;
use scholarship_tracker::mailer::{InvitationMailer, InviteMessage};
use scholarship_tracker::routes::{dispatch, ApiRequest};
use scholarship_tracker::server::AppState;
use scholarship_tracker::store::MemoryRepository;
use scholarship_tracker::{Result, TrackerError};

pub const WEBHOOK_SECRET: &str = "hook-secret";

/// Keeps every message; can be switched to fail
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<InviteMessage>>,
    pub fail: AtomicBool,
}

impl RecordingMailer {
    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Token from the most recent invite link
    pub fn last_token(&self) -> String {
        let sent = self.sent.lock().unwrap();
        let link = &sent.last().expect("no invitation sent").link;
        link.rsplit('/').next().unwrap().to_string()
    }
}

#[async_trait]
impl InvitationMailer for RecordingMailer {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, message: &InviteMessage) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(TrackerError::Mailer("mail service unavailable".into()));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

pub struct TestApp {
    pub state: Arc<AppState>,
    pub repo: Arc<MemoryRepository>,
    pub mailer: Arc<RecordingMailer>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        let args = Args::parse_from([
            "scholarship-tracker",
            "--dev-mode",
            "--app-base-url",
            "https://tracker.example.org",
            "--mailer-webhook-secret",
            WEBHOOK_SECRET,
        ]);
        let repo = Arc::new(MemoryRepository::new());
        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState::new(args, repo.clone(), mailer.clone()).expect("app state");

        Self {
            state: Arc::new(state),
            repo,
            mailer,
        }
    }

    pub fn token(&self, student: &str) -> String {
        self.state
            .jwt
            .generate_token(TokenInput {
                user_id: student.to_string(),
                email: Some(format!("{student}@example.org")),
            })
            .unwrap()
    }

    /// Send a request as `student` (None = unauthenticated)
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        student: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let (path, query) = match path.split_once('?') {
            Some((p, q)) => (p, Some(q.to_string())),
            None => (path, None),
        };

        let mut req = ApiRequest::new(method, path);
        req.query = query;
        if let Some(student) = student {
            let value = format!("Bearer {}", self.token(student));
            req.headers
                .insert(AUTHORIZATION, HeaderValue::from_str(&value).unwrap());
        }
        if let Some(body) = body {
            req.headers
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            req.body = serde_json::to_vec(&body).unwrap().into();
        }

        self.send(req).await
    }

    pub async fn send(&self, req: ApiRequest) -> TestResponse {
        let response = dispatch(req, &self.state).await;
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        TestResponse { status, body }
    }

    pub async fn get(&self, path: &str, student: &str) -> TestResponse {
        self.call(Method::GET, path, Some(student), None).await
    }

    pub async fn post(&self, path: &str, student: &str, body: Value) -> TestResponse {
        self.call(Method::POST, path, Some(student), Some(body)).await
    }

    pub async fn patch(&self, path: &str, student: &str, body: Value) -> TestResponse {
        self.call(Method::PATCH, path, Some(student), Some(body)).await
    }

    pub async fn delete(&self, path: &str, student: &str) -> TestResponse {
        self.call(Method::DELETE, path, Some(student), None).await
    }

    /// Create a collaborator and an application; returns their ids
    pub async fn seed(&self, student: &str) -> (String, String) {
        let collaborator = self
            .post(
                "/api/collaborators",
                student,
                serde_json::json!({
                    "name": "Dr. Smith",
                    "email": "smith@school.edu",
                    "relationship": "teacher"
                }),
            )
            .await;
        assert_eq!(collaborator.status, StatusCode::CREATED);

        let application = self
            .post(
                "/api/applications",
                student,
                serde_json::json!({ "scholarshipName": "Merit Award", "amount": 5000 }),
            )
            .await;
        assert_eq!(application.status, StatusCode::CREATED);

        (
            collaborator.body["id"].as_str().unwrap().to_string(),
            application.body["id"].as_str().unwrap().to_string(),
        )
    }
}
