#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use fake::Fake;
use fake::faker::name::en::Name;
use http_body_util::BodyExt;
use learnhub::learnhub_auth::{AdminRole, create_admin_token};
use learnhub::learnhub_models::schools::{CreateSchoolDto, School};
use learnhub::modules::schools::SchoolStore;
use learnhub::modules::students::store::MemoryStore;
use learnhub::router::init_router;
use learnhub::state::AppState;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::in_memory(store.clone());
        Self { state, store }
    }

    pub fn router(&self) -> Router {
        init_router(self.state.clone())
    }

    pub async fn create_school(&self, code: &str) -> School {
        let dto = CreateSchoolDto {
            name: format!("{} School", code),
            code: code.to_string(),
            address: None,
        };
        SchoolStore::create(self.store.as_ref(), &dto).await.unwrap()
    }

    pub fn school_admin_token(&self, school_id: impl Into<Uuid>) -> String {
        create_admin_token(
            "admin@school.test",
            AdminRole::SchoolAdmin,
            Some(school_id.into()),
            &self.state.jwt_config,
        )
        .unwrap()
    }

    pub fn system_admin_token(&self) -> String {
        create_admin_token("ops@learnhub.test", AdminRole::SystemAdmin, None, &self.state.jwt_config)
            .unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body.to_vec())
    }

    pub async fn send_json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, body) = self.send(request).await;
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, value)
    }
}

pub fn get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

pub fn delete(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn csv_request(uri: &str, token: &str, csv: impl Into<String>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "text/csv")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(csv.into()))
        .unwrap()
}

/// A valid CSV of `count` students in one class with distinct mobiles.
pub fn roster_csv(class: &str, count: usize) -> String {
    let mut csv = String::from("student_name,class,section,mobile_number,email\n");
    for i in 0..count {
        let name: String = Name().fake();
        csv.push_str(&format!(
            "\"{}\",{},A,98765{:05},\n",
            name.replace('"', ""),
            class,
            i
        ));
    }
    csv
}
