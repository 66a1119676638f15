//! Shared harness for API integration tests
//!
//! Every test gets its own router over a fresh `MemoryStore`; no external
//! services are needed. Requests are driven with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tickettrack_api::{
    app::{build_router, AppState},
    config::Config,
};
use tickettrack_shared::{
    auth::{jwt, password},
    models::user::{CreateUser, User, UserRole},
    store::{memory::MemoryStore, Store},
};
use tower::ServiceExt;

pub const JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";

pub struct TestContext {
    pub app: Router,
    pub store: Arc<MemoryStore>,
    pub config: Config,
}

/// A signed-up user and their access token
pub struct TestUser {
    pub id: String,
    pub email: String,
    pub token: String,
}

impl TestContext {
    pub fn new() -> Self {
        let config = Config::from_lookup(|key| match key {
            "STORE_BACKEND" => Some("memory".to_string()),
            "JWT_SECRET" => Some(JWT_SECRET.to_string()),
            _ => None,
        })
        .expect("test config");

        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone() as Arc<dyn Store>, config.clone());

        Self {
            app: build_router(state),
            store,
            config,
        }
    }

    /// Sends a request and returns the status and the JSON body (`Null` if empty)
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }

    /// Signs a user up through the API
    pub async fn signup(&self, email: &str, name: &str) -> TestUser {
        let (status, body) = self
            .request(
                "POST",
                "/v1/auth/signup",
                None,
                Some(json!({ "email": email, "password": "password123", "name": name })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "signup failed: {}", body);

        TestUser {
            id: body["user"]["id"].as_str().unwrap().to_string(),
            email: body["user"]["email"].as_str().unwrap().to_string(),
            token: body["access_token"].as_str().unwrap().to_string(),
        }
    }

    /// Creates a user with the global admin role directly in the store
    pub async fn global_admin(&self, email: &str) -> TestUser {
        let user: User = self
            .store
            .create_user(CreateUser {
                email: email.to_string(),
                password_hash: password::hash_password("password123").unwrap(),
                name: "Global Admin".to_string(),
                role: UserRole::Admin,
            })
            .await
            .unwrap();

        let tokens = jwt::issue_token_pair(user.id, JWT_SECRET).unwrap();

        TestUser {
            id: user.id.to_string(),
            email: user.email,
            token: tokens.access_token,
        }
    }

    /// Creates a board and returns its JSON view
    pub async fn create_board(&self, owner: &TestUser, name: &str) -> Value {
        let (status, body) = self
            .request(
                "POST",
                "/v1/boards",
                Some(&owner.token),
                Some(json!({ "name": name })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create board failed: {}", body);
        body["board"].clone()
    }

    /// Invites `invitee` to `board_id` and has them accept
    pub async fn add_member(&self, inviter: &TestUser, board_id: &str, invitee: &TestUser) {
        let (status, body) = self
            .request(
                "POST",
                &format!("/v1/boards/{}/invite", board_id),
                Some(&inviter.token),
                Some(json!({ "email": invitee.email })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "invite failed: {}", body);

        let (status, body) = self
            .request(
                "POST",
                &format!("/v1/boards/{}/accept-invitation", board_id),
                Some(&invitee.token),
                Some(json!({ "email": invitee.email })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "accept failed: {}", body);
    }

    /// Creates a ticket and returns its JSON view
    pub async fn create_ticket(&self, user: &TestUser, board_id: &str, fields: Value) -> Value {
        let mut body = json!({
            "board_id": board_id,
            "title": "Untitled",
            "description": "No description",
        });
        if let (Some(target), Some(extra)) = (body.as_object_mut(), fields.as_object()) {
            for (k, v) in extra {
                target.insert(k.clone(), v.clone());
            }
        }

        let (status, body) = self
            .request("POST", "/v1/tickets", Some(&user.token), Some(body))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create ticket failed: {}", body);
        body["ticket"].clone()
    }
}
