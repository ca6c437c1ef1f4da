#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use axum_extra::extract::cookie::Key;
use serde_json::{Value, json};
use sqlx::SqlitePool;
use tower::ServiceExt;

use classroom::api::router;
use classroom::db;
use classroom::services::AliasGenerator;
use classroom::state::AppState;
use classroom::storage::{BlobStore, MemoryBlobStore};

pub const BOUNDARY: &str = "classroom-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub db: SqlitePool,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub bytes: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        if self.bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&self.bytes).expect("response is not JSON")
        }
    }
}

pub async fn spawn_app(blobs: Arc<dyn BlobStore>) -> TestApp {
    let pool = db::connect("sqlite::memory:").await.expect("Failed to create test db");
    db::migrate(&pool).await.expect("Failed to run migrations");

    let state = AppState {
        db: pool.clone(),
        blobs,
        cookie_key: Key::generate(),
        aliases: AliasGenerator::default(),
    };

    TestApp { router: router(state), db: pool }
}

pub async fn spawn_default_app() -> (TestApp, Arc<MemoryBlobStore>) {
    let blobs = Arc::new(MemoryBlobStore::new());
    let app = spawn_app(blobs.clone()).await;
    (app, blobs)
}

impl TestApp {
    /// Serves the router on a real socket, for tests that need to control
    /// how a request body arrives.
    pub async fn serve(&self) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
        let addr = listener.local_addr().expect("no local addr");
        let router = self.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("server failed");
        });
        addr
    }

    pub async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(req).await.expect("request failed");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read body")
            .to_vec();
        TestResponse { status, headers, bytes }
    }

    pub async fn request(&self, method: Method, uri: &str, cookie: Option<&str>, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let req = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("failed to build request");
        self.send(req).await
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, cookie, None).await
    }

    pub async fn post(&self, uri: &str, cookie: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, cookie, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, cookie: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::PATCH, uri, cookie, Some(body)).await
    }

    pub async fn put(&self, uri: &str, cookie: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, cookie, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, cookie, None).await
    }

    /// Registers an instructor and returns the `Cookie` header value of
    /// their session.
    pub async fn login_as(&self, username: &str) -> String {
        let password = "correct horse battery";
        let res = self
            .post(
                "/auth/register",
                None,
                json!({
                    "username": username,
                    "email": format!("{username}@example.com"),
                    "password": password,
                    "password2": password,
                }),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "register failed: {:?}", res.json());

        let res = self
            .post("/auth/login", None, json!({ "username": username, "password": password }))
            .await;
        assert_eq!(res.status, StatusCode::OK);

        let set_cookie = res
            .headers
            .get(header::SET_COOKIE)
            .expect("no session cookie")
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    pub async fn create_course(&self, cookie: &str, title: &str) -> Value {
        let res = self.post("/courses", Some(cookie), json!({ "title": title })).await;
        assert_eq!(res.status, StatusCode::CREATED);
        res.json()
    }

    pub async fn create_task(&self, cookie: &str, course_id: &str, title: &str) -> Value {
        let res = self
            .post(
                &format!("/courses/{course_id}/tasks"),
                Some(cookie),
                json!({ "title": title, "max_score": 10, "is_visible": true }),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED);
        res.json()
    }

    pub async fn add_students(&self, cookie: &str, course_id: &str, count: u32) -> Vec<Value> {
        let res = self
            .post(&format!("/courses/{course_id}/students"), Some(cookie), json!({ "count": count }))
            .await;
        assert_eq!(res.status, StatusCode::CREATED);
        res.json().as_array().expect("expected a list").clone()
    }

    pub async fn upload(&self, alias: &str, task_id: &str, filename: &str, contents: &[u8]) -> TestResponse {
        let req = Request::builder()
            .method(Method::POST)
            .uri(format!("/s/{alias}/tasks/{task_id}/submissions"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(filename, contents)))
            .expect("failed to build request");
        self.send(req).await
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.db)
            .await
            .expect("count failed")
    }
}

pub fn multipart_body(filename: &str, contents: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n").as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn str_field<'a>(value: &'a Value, key: &str) -> &'a str {
    value[key].as_str().unwrap_or_else(|| panic!("missing string field {key}"))
}
