#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use parking_lot::Mutex;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::{json, Value};
use tower::ServiceExt;

use workboard::config::{JwtConfig, WorkboardConfig};
use workboard::domain::ports::{MailTransport, OutboundEmail};
use workboard::Workboard;

pub const PASSWORD: &str = "P@ssw0rd1";

/// Fresh in-memory database with the schema applied. A single pooled
/// connection keeps every query on the same in-memory database.
pub async fn create_test_db() -> DatabaseConnection {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).sqlx_logging(false);
    let db = Database::connect(opts)
        .await
        .expect("Failed to connect to test database");
    Workboard::migrate(&db)
        .await
        .expect("Failed to run migrations");
    db
}

pub fn test_config() -> WorkboardConfig {
    WorkboardConfig {
        jwt: JwtConfig {
            secret: "integration-test-secret".into(),
            ..JwtConfig::default()
        },
        ..WorkboardConfig::default()
    }
}

/// Transport that records messages, or fails every send.
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<OutboundEmail>>,
    pub fail: bool,
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, email: &OutboundEmail) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("SMTP relay unavailable");
        }
        self.sent.lock().push(email.clone());
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub workboard: Workboard,
    pub mail: Arc<RecordingTransport>,
    pub db: DatabaseConnection,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_transport(RecordingTransport::default()).await
    }

    pub async fn with_transport(transport: RecordingTransport) -> Self {
        let db = create_test_db().await;
        let mail = Arc::new(transport);
        let workboard = Workboard::with_transport(&test_config(), db.clone(), mail.clone())
            .expect("workboard init");
        let router = workboard.register_routes(Router::new());
        Self {
            router,
            workboard,
            mail,
            db,
        }
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        let req = match body {
            Some(b) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&b).unwrap()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };

        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::PUT, uri, Some(token), Some(body)).await
    }

    /// Register an account with `role` and log in. Returns (token, user id).
    pub async fn account(&self, email: &str, role: &str) -> (String, String) {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({
                    "email": email,
                    "password": PASSWORD,
                    "firstName": "Test",
                    "lastName": role,
                    "role": role
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "register {email}: {body}");

        let (status, body) = self
            .call(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login {email}: {body}");
        (
            body["token"].as_str().unwrap().to_string(),
            body["user"]["id"].as_str().unwrap().to_string(),
        )
    }

    /// Create a project as `manager_token`, led by `team_lead_id`.
    pub async fn project(&self, manager_token: &str, title: &str, team_lead_id: &str) -> String {
        let (status, body) = self
            .post(
                "/api/project",
                manager_token,
                project_body(title, Some(team_lead_id)),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create project: {body}");
        body["id"].as_str().unwrap().to_string()
    }

    /// Stop the mail worker and return everything it delivered.
    pub async fn drain_mail(self) -> Vec<OutboundEmail> {
        let mail = self.mail.clone();
        self.workboard.shutdown().await.expect("shutdown");
        let sent = mail.sent.lock().clone();
        sent
    }
}

pub fn project_body(title: &str, team_lead_id: Option<&str>) -> Value {
    let mut body = json!({
        "title": title,
        "description": "Rebuild the billing pipeline",
        "requirements": "Rust, SQL",
        "skillsRequired": "Rust",
        "startDate": "2030-01-01T00:00:00Z",
        "endDate": "2030-06-30T00:00:00Z",
        "status": "Active",
        "priority": "High",
        "criticality": "Critical",
        "numberOfPeopleNeeded": 3
    });
    if let Some(id) = team_lead_id {
        body["teamLeadId"] = json!(id);
    }
    body
}

pub fn task_body(title: &str, project_id: &str, employee_id: &str) -> Value {
    json!({
        "title": title,
        "description": "Write the migration",
        "priority": "High",
        "dueDate": "2030-02-01T00:00:00Z",
        "projectId": project_id,
        "employeeId": employee_id
    })
}
