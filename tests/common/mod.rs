#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use library_api::{
    AppConfig, AppState, InMemoryRepository, MockImageStore, auth, create_router,
    models::{NewUser, Role},
    repository::Repository,
};
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt;
use uuid::Uuid;

pub const BOUNDARY: &str = "library-api-test-boundary";

/// TestApp
///
/// A router wired to in-memory persistence and a mock image store. The repo and
/// store handles share state with the router, so tests can inspect both.
pub struct TestApp {
    pub router: Router,
    pub repo: Arc<InMemoryRepository>,
    pub images: MockImageStore,
    pub config: AppConfig,
}

pub fn test_app() -> TestApp {
    test_app_with(MockImageStore::new())
}

pub fn test_app_with(images: MockImageStore) -> TestApp {
    let repo = Arc::new(InMemoryRepository::new());
    let config = AppConfig::default();

    let state = AppState {
        repo: repo.clone(),
        storage: Arc::new(images.clone()),
        config: config.clone(),
    };

    TestApp {
        router: create_router(state),
        repo,
        images,
        config,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub fn token_for(&self, role: Role) -> String {
        auth::issue_token(&self.config, Uuid::new_v4(), "someone@library.org", role).unwrap()
    }

    pub fn librarian_token(&self) -> String {
        self.token_for(Role::Librarian)
    }

    pub fn student_token(&self) -> String {
        self.token_for(Role::Student)
    }

    /// Inserts a user directly, hashed at the lowest bcrypt cost to keep tests fast.
    pub async fn seed_user(&self, email: &str, password: &str, role: Role) {
        let password_hash = bcrypt::hash(password, 4).unwrap();
        self.repo
            .create_user(NewUser {
                email: email.to_string(),
                password_hash,
                role,
            })
            .await
            .unwrap();
    }

    /// Adds a book through the API and returns its id.
    pub async fn add_book(&self, name: &str, author: &str) -> Uuid {
        let token = self.librarian_token();
        let (status, body) = self
            .send(multipart_request(
                "POST",
                "/api/book/add",
                &token,
                &book_form(name, author, "science fiction", "1965/08/01", png()),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "add failed: {body}");
        body["id"].as_str().unwrap().parse().unwrap()
    }
}

// --- Request builders ---

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn delete_request(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

// --- Multipart ---

/// One part of a multipart form. `file` carries (file name, content type).
pub struct Part {
    pub name: &'static str,
    pub file: Option<(&'static str, &'static str)>,
    pub data: Vec<u8>,
}

pub fn text(name: &'static str, value: &str) -> Part {
    Part {
        name,
        file: None,
        data: value.as_bytes().to_vec(),
    }
}

pub fn file(name: &'static str, file_name: &'static str, content_type: &'static str, data: Vec<u8>) -> Part {
    Part {
        name,
        file: Some((file_name, content_type)),
        data,
    }
}

pub fn png() -> Part {
    file("bookImage", "cover.png", "image/png", b"\x89PNG\r\n\x1a\nfake".to_vec())
}

pub fn book_form(name: &str, author: &str, genre: &str, date: &str, image: Part) -> Vec<Part> {
    vec![
        text("bookName", name),
        text("author", author),
        text("genre", genre),
        text("releaseDate", date),
        image,
    ]
}

pub fn multipart_body(parts: &[Part]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part.file {
            Some((file_name, content_type)) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        part.name, file_name, content_type
                    )
                    .as_bytes(),
                );
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.name).as_bytes(),
                );
            }
        }
        body.extend_from_slice(&part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_request(method: &str, uri: &str, token: &str, parts: &[Part]) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}
