#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method, Request, StatusCode,
    },
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tech_hunt::api::auth::{TokenKeys, ISSUER_KEY_HEADER};
use tech_hunt::domain::model::{Role, UserProfile};
use tech_hunt::domain::ports::UserStore;
use tech_hunt::{AppState, MemoryStore};
use tower::ServiceExt;

pub const SECRET: &str = "integration-test-secret";
pub const ISSUER_KEY: &str = "integration-issuer-key";

pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub state: AppState,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::from_state_fn(|state| state)
    }

    pub fn from_state_fn(customize: impl FnOnce(AppState) -> AppState) -> Self {
        let store = Arc::new(MemoryStore::new());
        let tokens = TokenKeys::new(SECRET, 1).with_issuer_key(Some(ISSUER_KEY.to_string()));
        let state = customize(AppState::new(store.clone(), tokens));
        let router = tech_hunt::router(state.clone());
        Self {
            store,
            state,
            router,
        }
    }

    /// Registers a user with the given role and returns a bearer token for them.
    pub async fn login(&self, email: &str, role: Role) -> String {
        self.store
            .upsert_user(&UserProfile {
                name: email.split('@').next().unwrap_or(email).to_string(),
                email: email.to_string(),
                image: None,
            })
            .await
            .unwrap();
        self.store.set_role(email, role).await.unwrap();
        self.state.tokens.issue(email).unwrap()
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.dispatch(builder.body(body).unwrap()).await
    }

    /// Asks `POST /jwt` for a token, optionally presenting an issuer key.
    pub async fn request_token(&self, email: &str, issuer_key: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/jwt")
            .header(CONTENT_TYPE, "application/json");
        if let Some(key) = issuer_key {
            builder = builder.header(ISSUER_KEY_HEADER, key);
        }
        let body = Body::from(serde_json::json!({ "email": email }).to_string());
        self.dispatch(builder.body(body).unwrap()).await
    }

    /// Sends a raw body with a JSON content type.
    pub async fn send_raw(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        raw: &str,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        self.dispatch(builder.body(Body::from(raw.to_string())).unwrap())
            .await
    }

    async fn dispatch(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, json)
    }

    /// Submits a product as `token`'s user and returns its id.
    pub async fn submit_product(&self, token: &str, name: &str, tags: &[&str]) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/products",
                Some(token),
                Some(serde_json::json!({
                    "name": name,
                    "description": "test product",
                    "tags": tags,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["insertedId"].as_str().unwrap().to_string()
    }
}
