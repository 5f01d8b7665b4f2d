use api_gateway::{build_router, AppState, GatewayConfig};
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use httpmock::prelude::*;
use serde_json::{json, Value};
use tower::util::ServiceExt; // for oneshot

fn app_for(upstream_base: &str) -> axum::Router {
    let config = GatewayConfig {
        upstream_base: upstream_base.trim_end_matches('/').to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        upstream_timeout_secs: 5,
    };
    build_router(AppState::new(config).expect("state"))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("body is JSON")
}

#[tokio::test]
async fn relays_multipart_with_fresh_boundary_and_auth_header() {
    let server = MockServer::start();

    // If the inbound boundary string survives into the upstream body, the
    // relay copied bytes instead of rebuilding the form.
    let stale_boundary = server.mock(|when, then| {
        when.method(POST)
            .path("/Session/Create")
            .body_contains("XSEAMX");
        then.status(500);
    });
    let relayed = server.mock(|when, then| {
        when.method(POST)
            .path("/Session/Create")
            .header("authorization", "Bearer abc")
            .header_exists("content-type")
            .body_contains("Thermodynamics II")
            .body_contains("lecture.mp3")
            .body_contains("RIFFDATA");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({ "status": true, "message": "Success", "data": null }));
    });

    let boundary = "XSEAMX";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"name\"\r\n\r\n\
         Thermodynamics II\r\n\
         --{boundary}\r\n\
         Content-Disposition: form-data; name=\"language\"\r\n\r\n\
         en\r\n\
         --{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"lecture.mp3\"\r\n\
         Content-Type: audio/mpeg\r\n\r\n\
         RIFFDATA\r\n\
         --{boundary}--\r\n"
    );

    let app = app_for(&server.base_url());
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/proxy/Session/Create")
                .header("authorization", "Bearer abc")
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(stale_boundary.hits(), 0);
    relayed.assert();
    let payload = body_json(response).await;
    assert_eq!(payload["status"], json!(true));
}

#[tokio::test]
async fn wraps_plain_text_success_in_envelope() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/Misc/Ping");
        then.status(200)
            .header("content-type", "text/plain")
            .body("not json");
    });

    let app = app_for(&server.base_url());
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/proxy/Misc/Ping")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "status": true, "message": "Success", "data": "not json" })
    );
}

#[tokio::test]
async fn wraps_plain_text_failure_with_upstream_status() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/Misc/Ping");
        then.status(503)
            .header("content-type", "text/plain")
            .body("backend down");
    });

    let app = app_for(&server.base_url());
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/proxy/Misc/Ping")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        body_json(response).await,
        json!({ "status": false, "message": "Upstream error (503)", "data": "backend down" })
    );
}

#[tokio::test]
async fn passes_mislabeled_json_through_verbatim() {
    let server = MockServer::start();
    let mislabeled = json!({ "status": true, "message": "ok", "data": [1, 2] });
    server.mock(|when, then| {
        when.method(GET).path("/Session/GetAll");
        then.status(200)
            .header("content-type", "text/plain")
            .body(mislabeled.to_string());
    });

    let app = app_for(&server.base_url());
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/proxy/Session/GetAll")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, mislabeled);
}

#[tokio::test]
async fn relays_json_bodies_and_echoes_upstream_status() {
    let server = MockServer::start();
    let create = server.mock(|when, then| {
        when.method(POST)
            .path("/SessionTranslation/Create/6e7b1a66")
            .header("content-type", "application/json")
            .json_body(json!({ "language": "fr" }));
        then.status(404)
            .header("content-type", "application/json")
            .json_body(json!({ "status": false, "message": "Session not found", "data": null }));
    });

    let app = app_for(&server.base_url());
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/proxy/SessionTranslation/Create/6e7b1a66")
                .header("content-type", "application/json")
                .body(Body::from(json!({ "language": "fr" }).to_string()))
                .expect("request"),
        )
        .await
        .expect("response");

    create.assert();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["message"], json!("Session not found"));
}

#[tokio::test]
async fn preserves_query_string_verbatim() {
    let server = MockServer::start();
    let listed = server.mock(|when, then| {
        when.method(GET)
            .path("/Session/GetAll")
            .query_param("page", "2")
            .query_param("pageSize", "25");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({ "status": true, "message": "Success", "data": [] }));
    });

    let app = app_for(&server.base_url());
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/proxy/Session/GetAll?page=2&pageSize=25")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    listed.assert();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn relays_delete_without_authorization_or_body() {
    let server = MockServer::start();
    let deleted = server.mock(|when, then| {
        when.method(DELETE).path("/Session/Delete/6e7b1a66");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({ "status": true, "message": "Deleted", "data": null }));
    });

    let app = app_for(&server.base_url());
    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/proxy/Session/Delete/6e7b1a66")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    deleted.assert();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_content_type_falls_back_to_raw_text_relay() {
    let server = MockServer::start();
    let relayed = server.mock(|when, then| {
        when.method(POST)
            .path("/Session/Create")
            .body("opaque payload");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({ "status": true, "message": "Success", "data": null }));
    });

    let app = app_for(&server.base_url());
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/proxy/Session/Create")
                .body(Body::from("opaque payload"))
                .expect("request"),
        )
        .await
        .expect("response");

    relayed.assert();
    assert_eq!(response.status(), StatusCode::OK);
}
