use super::*;
use crate::test_helpers::spawn_server;
use axum::Json;
use axum::Router;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{any, get};
use serde_json::{Value, json};

async fn echo(method: axum::http::Method, headers: HeaderMap, body: String) -> Json<Value> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_owned);
    Json(json!({
        "method": method.as_str(),
        "authorization": header("authorization"),
        "content_type": header("content-type"),
        "body": body,
    }))
}

fn app() -> Router {
    Router::new()
        .route("/api/echo", any(echo))
        .route("/api/missing", get(|| async { (StatusCode::NOT_FOUND, r#"{"message":"nope"}"#) }))
}

fn request(method: Method, url: String, body: Option<&str>) -> HttpRequest {
    HttpRequest {
        method,
        url,
        headers: vec![
            ("Content-Type".to_owned(), CONTENT_TYPE_JSON.to_owned()),
            ("Authorization".to_owned(), "Bearer tok".to_owned()),
        ],
        body: body.map(str::to_owned),
    }
}

// =============================================================
// Pure helpers
// =============================================================

#[test]
fn header_lookup_is_case_insensitive() {
    let req = request(Method::Get, "/api/x".into(), None);
    assert_eq!(req.header("authorization"), Some("Bearer tok"));
    assert_eq!(req.header("CONTENT-TYPE"), Some(CONTENT_TYPE_JSON));
    assert_eq!(req.header("x-missing"), None);
}

#[test]
fn response_ok_covers_2xx_only() {
    let resp = |status| HttpResponse { status, body: String::new() };
    assert!(resp(200).ok());
    assert!(resp(204).ok());
    assert!(!resp(301).ok());
    assert!(!resp(401).ok());
}

#[test]
fn absolute_prefixes_relative_paths_with_origin() {
    let transport = ReqwestTransport::new("http://proxy.test/").unwrap();
    assert_eq!(transport.absolute("/api/users"), "http://proxy.test/api/users");
    assert_eq!(transport.absolute("https://api.test/api/users"), "https://api.test/api/users");
}

// =============================================================
// Live exchange against an in-process server
// =============================================================

#[tokio::test]
async fn send_forwards_method_headers_and_body() {
    let base = spawn_server(app()).await;
    let transport = ReqwestTransport::new("http://unused.invalid").unwrap();

    let resp = transport
        .send(request(Method::Put, format!("{base}/api/echo"), Some(r#"{"a":1}"#)))
        .await
        .unwrap();

    assert_eq!(resp.status, 200);
    let body: Value = resp.json().unwrap();
    assert_eq!(body["method"], "PUT");
    assert_eq!(body["authorization"], "Bearer tok");
    assert_eq!(body["content_type"], CONTENT_TYPE_JSON);
    assert_eq!(body["body"], r#"{"a":1}"#);
}

#[tokio::test]
async fn send_resolves_relative_path_against_origin() {
    let base = spawn_server(app()).await;
    let transport = ReqwestTransport::new(base).unwrap();

    let resp = transport.send(request(Method::Get, "/api/echo".into(), None)).await.unwrap();

    let body: Value = resp.json().unwrap();
    assert_eq!(body["method"], "GET");
    assert_eq!(body["body"], "");
}

#[tokio::test]
async fn send_returns_error_status_as_response() {
    let base = spawn_server(app()).await;
    let transport = ReqwestTransport::new(base).unwrap();

    let resp = transport.send(request(Method::Get, "/api/missing".into(), None)).await.unwrap();

    assert_eq!(resp.status, 404);
    assert!(!resp.ok());
    assert_eq!(resp.json::<Value>().unwrap()["message"], "nope");
}

#[tokio::test]
async fn send_connection_refused_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let transport = ReqwestTransport::new(format!("http://{addr}")).unwrap();

    let result = transport.send(request(Method::Get, "/api/echo".into(), None)).await;

    assert!(result.is_err());
}
