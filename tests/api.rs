//! End-to-end tests of the HTTP API.

use breach_lookup::config::ServiceConfig;
use serde_json::{json, Value};

mod common;

async fn search(server: &common::TestServer, path: &str, body: Value) -> (u16, Value) {
    let res = common::client()
        .post(server.url(path))
        .json(&body)
        .send()
        .await
        .expect("server unreachable");
    let status = res.status().as_u16();
    (status, res.json().await.unwrap())
}

fn pairs(body: &Value) -> Vec<(String, String)> {
    let mut out: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|m| {
            (
                m["matched_string"].as_str().unwrap().to_string(),
                m["source"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    out.sort();
    out
}

#[tokio::test]
async fn health_is_ok() {
    let server = common::start_server(ServiceConfig::default()).await;
    let res = common::client().get(server.url("/health")).send().await.unwrap();

    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "status": "ok" }));
}

#[tokio::test]
async fn exact_password_match_lists_every_source() {
    let server = common::start_server(ServiceConfig::default()).await;
    let (status, body) = search(
        &server,
        "/password",
        json!({ "query_string": "password", "ignore_case": false, "include_substring_matches": false }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(
        pairs(&body),
        vec![
            ("password".into(), "linkedin".into()),
            ("password".into(), "rockyou".into()),
        ]
    );
}

#[tokio::test]
async fn substring_and_case_flags() {
    let server = common::start_server(ServiceConfig::default()).await;

    let (_, body) = search(
        &server,
        "/password",
        json!({ "query_string": "PASS", "ignore_case": true, "include_substring_matches": true }),
    )
    .await;
    assert_eq!(pairs(&body).len(), 3);

    let (_, body) = search(
        &server,
        "/password",
        json!({ "query_string": "PASS", "ignore_case": false, "include_substring_matches": true }),
    )
    .await;
    assert!(pairs(&body).is_empty());
}

#[tokio::test]
async fn username_lookup_with_defaults() {
    let server = common::start_server(ServiceConfig::default()).await;
    let (status, body) = search(&server, "/username", json!({ "query_string": "aaron" })).await;

    assert_eq!(status, 200);
    assert_eq!(pairs(&body), vec![("aaron".into(), "names".into())]);
}

#[tokio::test]
async fn no_matches_is_empty_array() {
    let server = common::start_server(ServiceConfig::default()).await;
    let (status, body) = search(
        &server,
        "/password",
        json!({ "query_string": "xyznonexistentpassword123xyz", "include_substring_matches": true }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn injection_payload_is_a_literal() {
    let server = common::start_server(ServiceConfig::default()).await;
    let (status, body) = search(&server, "/password", json!({ "query_string": "' OR '1'='1" })).await;

    assert_eq!(status, 200);
    assert_eq!(pairs(&body), vec![("' OR '1'='1".into(), "rockyou".into())]);

    let (status, body) = search(&server, "/password", json!({ "query_string": "'; DROP TABLE passwords--" })).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!([]));

    let stats: Value = common::client()
        .get(server.url("/stats"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["total_passwords"], 8);
}

#[tokio::test]
async fn markup_is_searched_and_returned_verbatim() {
    let server = common::start_server(ServiceConfig::default()).await;
    let (status, body) = search(
        &server,
        "/password",
        json!({ "query_string": "<script>", "include_substring_matches": true }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(
        pairs(&body),
        vec![("<script>alert('xss')</script>".into(), "rockyou".into())]
    );
}

#[tokio::test]
async fn length_bounds_are_422() {
    let server = common::start_server(ServiceConfig::default()).await;

    let (status, body) = search(&server, "/password", json!({ "query_string": "" })).await;
    assert_eq!(status, 422);
    assert_eq!(body["detail"][0]["type"], "string_too_short");
    assert_eq!(body["detail"][0]["loc"], json!(["body", "query_string"]));

    let (status, body) = search(&server, "/username", json!({ "query_string": "a".repeat(1001) })).await;
    assert_eq!(status, 422);
    assert_eq!(body["detail"][0]["type"], "string_too_long");

    let (status, _) = search(&server, "/username", json!({ "query_string": "a".repeat(1000) })).await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn wrong_field_types_are_rejected() {
    let server = common::start_server(ServiceConfig::default()).await;
    let (status, body) = search(&server, "/password", json!({ "query_string": 42 })).await;

    assert_eq!(status, 422);
    assert_eq!(body["detail"][0]["type"], "payload");
}

#[tokio::test]
async fn stats_report_sources() {
    let server = common::start_server(ServiceConfig::default()).await;
    let res = common::client().get(server.url("/stats")).send().await.unwrap();
    assert_eq!(res.status(), 200);

    let stats: Value = res.json().await.unwrap();
    assert_eq!(stats["total_passwords"], 8);
    assert_eq!(stats["total_usernames"], 3);
    assert_eq!(
        stats["sources"],
        json!([
            { "name": "rockyou", "count": 6 },
            { "name": "linkedin", "count": 2 },
        ])
    );
}

#[tokio::test]
async fn interface_is_served_with_security_headers() {
    let server = common::start_server(ServiceConfig::default()).await;

    let res = common::client().get(server.url("/")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["x-content-type-options"], "nosniff");
    assert!(res.text().await.unwrap().contains("<script src=\"/app.js\">"));

    let res = common::client().get(server.url("/app.js")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.text().await.unwrap().contains("textContent"));
}
